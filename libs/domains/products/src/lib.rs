//! Products Domain
//!
//! The product catalog: CRUD over products with search, filtering, sorting
//! and pagination, plus the image file that belongs to each product.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, bearer auth, audit events
//! └──────┬──────┘
//!        │  ProductInput (JSON or multipart)
//! ┌──────▼──────┐
//! │   Service   │  ← Rules, image lifecycle, page assembly
//! └──┬───────┬──┘
//!    │       │
//! ┌──▼─────┐ ┌▼────────────┐
//! │ Repo   │ │ ImageStorage│  ← In-memory or PostgreSQL / local filesystem
//! └──┬─────┘ └─────────────┘
//!    │
//! ┌──▼──────────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum_helpers::TokenVerifier;
//! use domain_products::{
//!     handlers,
//!     repository::InMemoryProductRepository,
//!     service::ProductService,
//!     storage::InMemoryImageStorage,
//! };
//!
//! # fn example(verifier: Arc<dyn TokenVerifier>) {
//! let service = ProductService::new(InMemoryProductRepository::new(), InMemoryImageStorage::default());
//! let router = handlers::router(service, verifier);
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod image;
pub mod input;
pub mod models;
pub mod pagination;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod rules;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use input::{ProductInput, UploadedFile};
pub use models::{NewProduct, Product, ProductChanges, ProductResponse, SortField, SortOrder};
pub use pagination::{Page, PageUrl};
pub use postgres::PgProductRepository;
pub use query::{ListQuery, ProductQuery};
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use service::ProductService;
pub use storage::{ImageStorage, InMemoryImageStorage, LocalImageStorage, StorageError};
