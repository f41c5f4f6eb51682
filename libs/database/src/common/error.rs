/// Errors raised while connecting to or probing the database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sea_orm::DbErr),

    /// Connection failed after retries
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Returns true when `err` was caused by a unique constraint violation.
///
/// Repositories use this to turn an insert/update race on a unique column
/// into a domain conflict instead of a generic database failure.
#[cfg(feature = "postgres")]
pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}

#[cfg(all(test, feature = "postgres"))]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_plain_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&DbErr::RecordNotFound("x".into())));
        assert!(!is_unique_violation(&DbErr::Custom("duplicate".into())));
    }

    #[test]
    fn test_database_error_display() {
        let err = DatabaseError::HealthCheckFailed("timeout".into());
        assert_eq!(err.to_string(), "Health check failed: timeout");

        let err: DatabaseError = DbErr::Custom("boom".into()).into();
        assert!(err.to_string().starts_with("PostgreSQL error"));
    }
}
