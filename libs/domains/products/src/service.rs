//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::input::ProductInput;
use crate::models::{IMAGE_DIR, Product, ProductResponse};
use crate::pagination::{Page, PageUrl};
use crate::query::ProductQuery;
use crate::repository::ProductRepository;
use crate::rules::{self, Uniqueness};
use crate::storage::ImageStorage;

/// Product CRUD, including the lifecycle of each product's image file
pub struct ProductService<R: ProductRepository, S: ImageStorage> {
    repository: Arc<R>,
    storage: Arc<S>,
}

impl<R: ProductRepository, S: ImageStorage> ProductService<R, S> {
    pub fn new(repository: R, storage: S) -> Self {
        Self {
            repository: Arc::new(repository),
            storage: Arc::new(storage),
        }
    }

    /// One page of products matching `query`
    #[instrument(skip(self, url))]
    pub async fn list_products(
        &self,
        query: ProductQuery,
        url: &PageUrl,
    ) -> ProductResult<Page<ProductResponse>> {
        let (products, total) = self.repository.list(&query).await?;

        let page = Page::new(products, total, query.page, query.per_page, url);
        Ok(page.map(|p| self.to_response(p)))
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<ProductResponse> {
        let product = self.find(id).await?;
        Ok(self.to_response(product))
    }

    /// Validate, store the image if one was sent, then insert
    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: ProductInput) -> ProductResult<ProductResponse> {
        let uniqueness = self.uniqueness(&input, None).await?;
        let mut new_product = rules::validate_store(&input, &uniqueness)?;

        let image = match new_product.image.take() {
            Some(upload) => Some(self.storage.put(IMAGE_DIR, &upload).await?),
            None => None,
        };

        let product = Product::new(new_product, image.clone());
        let product = match self.repository.create(product).await {
            Ok(product) => product,
            Err(e) => {
                if let Some(path) = image {
                    self.discard(&path).await;
                }
                return Err(e);
            }
        };

        tracing::info!(product_id = %product.id, "Product created");
        Ok(self.to_response(product))
    }

    /// Apply a partial update. A new image replaces the old file; without
    /// one, the stored image is left as it is.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: ProductInput,
    ) -> ProductResult<ProductResponse> {
        let mut product = self.find(id).await?;

        let uniqueness = self.uniqueness(&input, Some(id)).await?;
        let changes = rules::validate_update(&input, &uniqueness)?;

        // Known race: two concurrent replacements can each delete the
        // other's freshly stored file. No locking is done here.
        if let Some(upload) = &changes.image {
            if let Some(old) = &product.image {
                self.storage.delete(old).await?;
            }
            product.image = Some(self.storage.put(IMAGE_DIR, upload).await?);
        }

        product.apply(&changes);
        let product = self.repository.update(product).await?;

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(self.to_response(product))
    }

    /// Remove the image file first, then the record
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<()> {
        let product = self.find(id).await?;

        if let Some(path) = &product.image {
            self.storage.delete(path).await?;
        }

        if !self.repository.delete(id).await? {
            return Err(ProductError::NotFound(id));
        }

        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    pub fn to_response(&self, product: Product) -> ProductResponse {
        let url = product.image.as_deref().map(|path| self.storage.url(path));
        ProductResponse::new(product, url)
    }

    async fn find(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Answer the `unique` rule for the submitted name
    async fn uniqueness(
        &self,
        input: &ProductInput,
        except: Option<Uuid>,
    ) -> ProductResult<Uniqueness> {
        let mut uniqueness = Uniqueness::none();
        if let Some(name) = input.str("name") {
            if self.repository.exists_by_name(name, except).await? {
                uniqueness = uniqueness.with_taken("name");
            }
        }
        Ok(uniqueness)
    }

    async fn discard(&self, path: &str) {
        if let Err(e) = self.storage.delete(path).await {
            tracing::warn!(path = %path, error = %e, "Failed to remove orphaned image");
        }
    }
}

impl<R: ProductRepository, S: ImageStorage> Clone for ProductService<R, S> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            storage: Arc::clone(&self.storage),
        }
    }
}
