use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, FieldErrors};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Product with name '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl From<FieldErrors> for ProductError {
    fn from(errors: FieldErrors) -> Self {
        ProductError::Validation(errors)
    }
}

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => AppError::NotFound("Product not found".to_string()),
            // The unique index caught a race the pre-check missed
            ProductError::DuplicateName(_) => {
                AppError::validation("name", "The name has already been taken.")
            }
            ProductError::Validation(errors) => AppError::Validation(errors),
            ProductError::Storage(StorageError::Io(e)) => AppError::Io(e),
            ProductError::Storage(e) => AppError::InternalServerError(e.to_string()),
            ProductError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
