//! Products API routes backing

use domain_products::{LocalImageStorage, PgProductRepository, ProductService};

use crate::state::AppState;

/// Product service over PostgreSQL with images in the public storage area
pub fn service(state: &AppState) -> ProductService<PgProductRepository, LocalImageStorage> {
    let repository = PgProductRepository::new(state.db.clone());
    let storage = LocalImageStorage::new(&state.config.storage);
    ProductService::new(repository, storage)
}
