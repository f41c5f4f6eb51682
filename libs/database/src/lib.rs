//! PostgreSQL connection management for the catalog services.
//!
//! # Features
//!
//! - `postgres` (default) - SeaORM connection pool, migrations, health checks
//! - `config` (default) - `core_config::FromEnv` for [`postgres::PostgresConfig`]
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig};
//! use migration::Migrator;
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::run_migrations::<Migrator>(&db, "catalog_api").await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult};

#[cfg(feature = "postgres")]
pub use common::is_unique_violation;
