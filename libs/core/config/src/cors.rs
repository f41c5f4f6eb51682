use crate::{env_required, ConfigError, Environment, FromEnv};

const DEV_ORIGIN: &str = "http://localhost:3000";

/// Allowed origins for cross-origin requests.
///
/// Read from `CORS_ALLOWED_ORIGIN` as a comma-separated list. Production
/// requires the variable; development falls back to `http://localhost:3000`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let allowed_origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if allowed_origins.is_empty() {
            return Err(ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: "at least one origin is required".to_string(),
            });
        }

        Ok(Self { allowed_origins })
    }
}

impl FromEnv for CorsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        match env_required("CORS_ALLOWED_ORIGIN") {
            Ok(raw) => Self::parse(&raw),
            Err(_) if Environment::from_env().is_development() => Ok(Self::new([DEV_ORIGIN])),
            Err(e) => Err(e),
        }
    }
}
