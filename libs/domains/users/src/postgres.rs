use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::is_unique_violation;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::{access_token, user},
    error::{UserError, UserResult},
    models::{PersonalAccessToken, User},
    repository::{TokenRepository, UserRepository},
};

/// PostgreSQL implementation of UserRepository using SeaORM
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, input: User) -> UserResult<User> {
        let email = input.email.clone();
        let active_model: user::ActiveModel = input.into();

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserError::DuplicateEmail(email)
            } else {
                UserError::Database(e)
            }
        })?;

        tracing::info!(user_id = %model.id, "Created user");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let model = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }
}

/// PostgreSQL implementation of TokenRepository using SeaORM
#[derive(Clone)]
pub struct PgTokenRepository {
    db: DatabaseConnection,
}

impl PgTokenRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn create(&self, token: PersonalAccessToken) -> UserResult<PersonalAccessToken> {
        let active_model: access_token::ActiveModel = token.into();
        let model = active_model.insert(&self.db).await?;

        tracing::debug!(token_id = %model.id, user_id = %model.user_id, "Issued token");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<PersonalAccessToken>> {
        let model = access_token::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_hash(&self, token_hash: &str) -> UserResult<Option<PersonalAccessToken>> {
        let model = access_token::Entity::find()
            .filter(access_token::Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> UserResult<()> {
        access_token::Entity::update_many()
            .col_expr(access_token::Column::LastUsedAt, Expr::value(at))
            .filter(access_token::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let result = access_token::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(token_id = %id, "Revoked token");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
