//! Configuration for Catalog API

use core_config::{
    AppInfo, FromEnv, app_info, cors::CorsConfig, server::ServerConfig, storage::StorageConfig,
};
use database::postgres::PostgresConfig;

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub postgres: PostgresConfig,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let postgres = PostgresConfig::from_env()?;
        let server = ServerConfig::from_env()?;
        let cors = CorsConfig::from_env()?;
        let storage = StorageConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            postgres,
            server,
            cors,
            storage,
            environment,
        })
    }
}
