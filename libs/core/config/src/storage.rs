use crate::{env_or_default, ConfigError, FromEnv};
use std::path::PathBuf;

/// Location of the public storage area that holds uploaded files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Filesystem directory backing the public area
    pub public_root: PathBuf,
    /// URL prefix the public area is served under (no trailing slash)
    pub public_url: String,
}

impl StorageConfig {
    pub fn new(public_root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        let public_url: String = public_url.into();
        Self {
            public_root: public_root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new("storage/app/public", "/storage")
    }
}

impl FromEnv for StorageConfig {
    /// - STORAGE_PUBLIC_ROOT: defaults to `storage/app/public`
    /// - STORAGE_PUBLIC_URL: defaults to `/storage`
    fn from_env() -> Result<Self, ConfigError> {
        let root = env_or_default("STORAGE_PUBLIC_ROOT", "storage/app/public");
        let url = env_or_default("STORAGE_PUBLIC_URL", "/storage");

        if root.trim().is_empty() {
            return Err(ConfigError::ParseError {
                key: "STORAGE_PUBLIC_ROOT".to_string(),
                details: "path must not be empty".to_string(),
            });
        }

        Ok(Self::new(root, url))
    }
}
