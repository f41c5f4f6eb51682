use async_trait::async_trait;
use database::is_unique_violation;
use sea_orm::sea_query::{Expr, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{ProductError, ProductResult},
    models::{Product, SortField, SortOrder},
    query::ProductQuery,
    repository::ProductRepository,
};

/// PostgreSQL implementation of ProductRepository using SeaORM
#[derive(Clone)]
pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn sort_column(field: SortField) -> entity::Column {
    match field {
        SortField::Price => entity::Column::Price,
        SortField::Rating => entity::Column::Rating,
        SortField::CreatedAt => entity::Column::CreatedAt,
        SortField::Name => entity::Column::Name,
    }
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

fn write_error(err: DbErr, product: &Product) -> ProductError {
    if is_unique_violation(&err) {
        ProductError::DuplicateName(product.name.clone())
    } else if matches!(err, DbErr::RecordNotUpdated) {
        ProductError::NotFound(product.id)
    } else {
        ProductError::Database(err)
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, product: Product) -> ProductResult<Product> {
        let active_model: entity::ActiveModel = product.clone().into();

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| write_error(e, &product))?;

        tracing::info!(product_id = %model.id, "Created product");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self, query: &ProductQuery) -> ProductResult<(Vec<Product>, u64)> {
        let mut select = entity::Entity::find();

        // `%` and `_` in the search term keep their LIKE meaning
        if let Some(search) = &query.search {
            select = select
                .filter(Expr::col(entity::Column::Name).ilike(format!("%{}%", search)));
        }

        if let Some(category) = &query.category {
            select = select.filter(entity::Column::Category.eq(category.as_str()));
        }

        if let Some(min) = query.min_price {
            select = select.filter(entity::Column::Price.gte(min));
        }

        if let Some(max) = query.max_price {
            select = select.filter(entity::Column::Price.lte(max));
        }

        let total = select.clone().count(&self.db).await?;

        if let Some((field, order)) = query.sort {
            select = select.order_by(sort_column(field), order.into());
        }

        let models = select
            .offset(query.offset())
            .limit(query.per_page)
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn update(&self, product: Product) -> ProductResult<Product> {
        let active_model: entity::ActiveModel = product.clone().into();

        let model = active_model
            .update(&self.db)
            .await
            .map_err(|e| write_error(e, &product))?;

        tracing::info!(product_id = %model.id, "Updated product");
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let result = entity::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(product_id = %id, "Deleted product");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn exists_by_name(&self, name: &str, except: Option<Uuid>) -> ProductResult<bool> {
        let mut select = entity::Entity::find().filter(entity::Column::Name.eq(name));

        if let Some(id) = except {
            select = select.filter(entity::Column::Id.ne(id));
        }

        Ok(select.count(&self.db).await? > 0)
    }
}
