//! Sea-ORM entities for `users` and `personal_access_tokens`.

pub mod user {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
        #[sea_orm(unique)]
        pub email: String,
        pub password_hash: String,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::access_token::Entity")]
        AccessTokens,
    }

    impl Related<super::access_token::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::AccessTokens.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod access_token {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "personal_access_tokens")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub user_id: Uuid,
        pub name: String,
        #[sea_orm(unique)]
        pub token_hash: String,
        pub last_used_at: Option<DateTimeWithTimeZone>,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::user::Entity",
            from = "Column::UserId",
            to = "super::user::Column::Id",
            on_delete = "Cascade"
        )]
        User,
    }

    impl Related<super::user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

use sea_orm::ActiveValue::Set;

use crate::models::{PersonalAccessToken, User};

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            password_hash: model.password_hash,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<User> for user::ActiveModel {
    fn from(user: User) -> Self {
        Self {
            id: Set(user.id),
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
        }
    }
}

impl From<access_token::Model> for PersonalAccessToken {
    fn from(model: access_token::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            token_hash: model.token_hash,
            last_used_at: model.last_used_at.map(Into::into),
            created_at: model.created_at.into(),
        }
    }
}

impl From<PersonalAccessToken> for access_token::ActiveModel {
    fn from(token: PersonalAccessToken) -> Self {
        Self {
            id: Set(token.id),
            user_id: Set(token.user_id),
            name: Set(token.name),
            token_hash: Set(token.token_hash),
            last_used_at: Set(token.last_used_at.map(Into::into)),
            created_at: Set(token.created_at.into()),
        }
    }
}
