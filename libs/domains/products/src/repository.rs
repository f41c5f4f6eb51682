use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, SortField, SortOrder};
use crate::query::ProductQuery;

/// Repository trait for Product persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product; fails with `DuplicateName` if the name is taken
    async fn create(&self, product: Product) -> ProductResult<Product>;

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// One page of matching products plus the total number of matches
    async fn list(&self, query: &ProductQuery) -> ProductResult<(Vec<Product>, u64)>;

    /// Persist every field of `product`; fails with `NotFound` if it is gone
    async fn update(&self, product: Product) -> ProductResult<Product>;

    /// Returns `false` if no such product existed
    async fn delete(&self, id: Uuid) -> ProductResult<bool>;

    /// Whether another product (not `except`) already uses `name`
    async fn exists_by_name(&self, name: &str, except: Option<Uuid>) -> ProductResult<bool>;
}

/// In-memory implementation of ProductRepository (for development/testing).
///
/// Rows are kept in insertion order, which is the order an unsorted listing
/// returns.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(product: &Product, query: &ProductQuery) -> bool {
    if let Some(search) = &query.search {
        if !product.name.to_lowercase().contains(&search.to_lowercase()) {
            return false;
        }
    }
    if let Some(category) = &query.category {
        if &product.category != category {
            return false;
        }
    }
    if query.min_price.is_some_and(|min| product.price < min) {
        return false;
    }
    if query.max_price.is_some_and(|max| product.price > max) {
        return false;
    }
    true
}

/// Ascending comparison with nulls last, as PostgreSQL orders them.
fn compare(a: &Product, b: &Product, field: SortField) -> Ordering {
    match field {
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Rating => match (a.rating, b.rating) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.total_cmp(&b),
        },
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Name => a.name.cmp(&b.name),
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;

        if products.iter().any(|p| p.name == product.name) {
            return Err(ProductError::DuplicateName(product.name));
        }

        products.push(product.clone());

        tracing::info!(product_id = %product.id, "Created product");
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, query: &ProductQuery) -> ProductResult<(Vec<Product>, u64)> {
        let products = self.products.read().await;

        let mut matching: Vec<Product> = products
            .iter()
            .filter(|p| matches(p, query))
            .cloned()
            .collect();

        if let Some((field, order)) = query.sort {
            matching.sort_by(|a, b| match order {
                SortOrder::Asc => compare(a, b, field),
                SortOrder::Desc => compare(b, a, field),
            });
        }

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(query.per_page).unwrap_or(usize::MAX))
            .collect();

        Ok((page, total))
    }

    async fn update(&self, product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;

        if products
            .iter()
            .any(|p| p.id != product.id && p.name == product.name)
        {
            return Err(ProductError::DuplicateName(product.name));
        }

        let slot = products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(ProductError::NotFound(product.id))?;
        *slot = product.clone();

        tracing::info!(product_id = %product.id, "Updated product");
        Ok(product)
    }

    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);

        let deleted = products.len() < before;
        if deleted {
            tracing::info!(product_id = %id, "Deleted product");
        }
        Ok(deleted)
    }

    async fn exists_by_name(&self, name: &str, except: Option<Uuid>) -> ProductResult<bool> {
        let products = self.products.read().await;
        Ok(products
            .iter()
            .any(|p| p.name == name && Some(p.id) != except))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProduct;
    use chrono::{Duration, Utc};

    fn product(name: &str, category: &str, price: f64, rating: Option<f64>) -> Product {
        Product::new(
            NewProduct {
                name: name.to_string(),
                category: category.to_string(),
                price,
                rating,
                description: None,
                image: None,
            },
            None,
        )
    }

    async fn seeded() -> InMemoryProductRepository {
        let repo = InMemoryProductRepository::new();
        let base = Utc::now();
        for (i, mut p) in [
            product("Desk Lamp", "Home", 40.0, Some(4.0)),
            product("Floor Lamp", "Home", 120.0, None),
            product("Laptop", "Electronics", 999.0, Some(4.8)),
            product("Mouse", "Electronics", 25.0, Some(3.5)),
        ]
        .into_iter()
        .enumerate()
        {
            p.created_at = base + Duration::seconds(i as i64);
            repo.create(p).await.unwrap();
        }
        repo
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let repo = seeded().await;
        let err = repo
            .create(product("Mouse", "Other", 1.0, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::DuplicateName(name) if name == "Mouse"));
    }

    #[tokio::test]
    async fn test_default_listing_is_newest_first() {
        let repo = seeded().await;
        let (items, total) = repo.list(&ProductQuery::default()).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(names(&items), ["Mouse", "Laptop", "Floor Lamp", "Desk Lamp"]);
    }

    #[tokio::test]
    async fn test_unsorted_listing_keeps_insertion_order() {
        let repo = seeded().await;
        let query = ProductQuery {
            sort: None,
            ..Default::default()
        };
        let (items, _) = repo.list(&query).await.unwrap();
        assert_eq!(names(&items), ["Desk Lamp", "Floor Lamp", "Laptop", "Mouse"]);
    }

    #[tokio::test]
    async fn test_filters_combine() {
        let repo = seeded().await;
        let query = ProductQuery {
            search: Some("LAMP".to_string()),
            category: Some("Home".to_string()),
            min_price: Some(40.0),
            max_price: Some(100.0),
            ..Default::default()
        };

        let (items, total) = repo.list(&query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(names(&items), ["Desk Lamp"]);
    }

    #[tokio::test]
    async fn test_rating_sort_puts_nulls_like_postgres() {
        let repo = seeded().await;

        let asc = ProductQuery {
            sort: Some((SortField::Rating, SortOrder::Asc)),
            ..Default::default()
        };
        let (items, _) = repo.list(&asc).await.unwrap();
        assert_eq!(names(&items), ["Mouse", "Desk Lamp", "Laptop", "Floor Lamp"]);

        let desc = ProductQuery {
            sort: Some((SortField::Rating, SortOrder::Desc)),
            ..Default::default()
        };
        let (items, _) = repo.list(&desc).await.unwrap();
        assert_eq!(names(&items), ["Floor Lamp", "Laptop", "Desk Lamp", "Mouse"]);
    }

    #[tokio::test]
    async fn test_pagination_window() {
        let repo = seeded().await;
        let query = ProductQuery {
            sort: Some((SortField::Price, SortOrder::Asc)),
            page: 2,
            per_page: 3,
            ..Default::default()
        };

        let (items, total) = repo.list(&query).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(names(&items), ["Laptop"]);
    }

    #[tokio::test]
    async fn test_exists_by_name_respects_except() {
        let repo = seeded().await;
        let (items, _) = repo.list(&ProductQuery::default()).await.unwrap();
        let mouse = items.iter().find(|p| p.name == "Mouse").unwrap();

        assert!(repo.exists_by_name("Mouse", None).await.unwrap());
        assert!(!repo.exists_by_name("Mouse", Some(mouse.id)).await.unwrap());
        assert!(!repo.exists_by_name("mouse", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = seeded().await;
        let (items, _) = repo.list(&ProductQuery::default()).await.unwrap();
        let mut lamp = items.iter().find(|p| p.name == "Desk Lamp").unwrap().clone();
        lamp.price = 35.0;

        let updated = repo.update(lamp.clone()).await.unwrap();
        assert_eq!(updated.price, 35.0);

        lamp.name = "Laptop".to_string();
        assert!(matches!(
            repo.update(lamp.clone()).await,
            Err(ProductError::DuplicateName(_))
        ));

        lamp.name = "Desk Lamp".to_string();
        assert!(repo.delete(lamp.id).await.unwrap());
        assert!(!repo.delete(lamp.id).await.unwrap());
        assert!(matches!(
            repo.update(lamp.clone()).await,
            Err(ProductError::NotFound(_))
        ));
    }
}
