//! Raw product input, read from either a JSON body or `multipart/form-data`.
//!
//! The extractor only normalises the request. Deciding what is valid is left
//! to [`rules`](crate::rules).

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::{StatusCode, header},
};
use axum_helpers::AppError;
use bytes::Bytes;
use serde_json::{Map, Value};

/// Name of the multipart part / JSON key carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// A file part from a multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Size in kilobytes
    pub fn kilobytes(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

/// Request fields after trimming, with empty strings turned into `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductInput {
    fields: Map<String, Value>,
    image: Option<UploadedFile>,
}

impl ProductInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Non-object bodies are treated as empty.
    pub fn from_json(value: Value) -> Self {
        let mut input = Self::new();
        if let Value::Object(map) = value {
            for (key, value) in map {
                input.insert(key, value);
            }
        }
        input
    }

    /// Insert a field, applying the trim / empty-to-null normalisation.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), normalize(value));
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value.into());
        self
    }

    pub fn with_image(mut self, file: UploadedFile) -> Self {
        self.image = Some(file);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field is present in the request, even if `null`.
    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key) || (key == IMAGE_FIELD && self.image.is_some())
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn image(&self) -> Option<&UploadedFile> {
        self.image.as_ref()
    }
}

fn normalize(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Null
            } else if trimmed.len() == s.len() {
                Value::String(s)
            } else {
                Value::String(trimmed.to_string())
            }
        }
        other => other,
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

impl<S> FromRequest<S> for ProductInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        match content_type.as_deref() {
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let mut multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                read_multipart(&mut multipart).await
            }
            Some(_) => {
                let Json(value) = Json::<Value>::from_request(req, state).await?;
                Ok(Self::from_json(value))
            }
            None => {
                let body = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if body.is_empty() {
                    Ok(Self::new())
                } else {
                    Err(AppError::BadRequest(
                        "Expected request with `Content-Type: application/json` or `multipart/form-data`"
                            .to_string(),
                    ))
                }
            }
        }
    }
}

async fn read_multipart(multipart: &mut Multipart) -> Result<ProductInput, AppError> {
    let mut input = ProductInput::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;

            // An empty file input is submitted as a nameless, empty part
            if bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                input.insert(name, Value::Null);
                continue;
            }

            if name == IMAGE_FIELD {
                input.fields.remove(IMAGE_FIELD);
                input.image = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            } else {
                tracing::debug!(field = %name, "Ignoring unexpected file part");
            }
        } else {
            let text = field.text().await.map_err(multipart_error)?;
            input.insert(name, Value::String(text));
        }
    }

    Ok(input)
}
