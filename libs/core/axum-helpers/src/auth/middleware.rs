use crate::errors::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use std::sync::Arc;
use uuid::Uuid;

/// Identity attached to a request after its bearer token was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    /// Token used for this request; logout revokes exactly this one
    pub token_id: Uuid,
    pub name: String,
    pub email: String,
}

/// Resolves a plaintext bearer token to the identity it belongs to.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// `Ok(None)` for unknown or revoked tokens. `Err` only for backend faults.
    async fn verify(&self, token: &str) -> Result<Option<AuthContext>, AppError>;
}

/// Rejects requests without a valid `Authorization: Bearer` header and
/// stores the [`AuthContext`] in the request extensions.
pub async fn bearer_auth_middleware(
    State(verifier): State<Arc<dyn TokenVerifier>>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|e| {
        tracing::debug!(reason = %e, "Missing or malformed Authorization header");
        AppError::unauthenticated()
    })?;

    let context = verifier.verify(bearer.token()).await?.ok_or_else(|| {
        tracing::debug!("Bearer token rejected");
        AppError::unauthenticated()
    })?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Extractor for the authenticated caller.
///
/// Only valid on routes behind [`bearer_auth_middleware`]; elsewhere it
/// rejects with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(AppError::unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request as HttpRequest, http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct FixedToken(AuthContext);

    #[async_trait]
    impl TokenVerifier for FixedToken {
        async fn verify(&self, token: &str) -> Result<Option<AuthContext>, AppError> {
            Ok((token == "good").then(|| self.0.clone()))
        }
    }

    fn app() -> Router {
        let context = AuthContext {
            user_id: Uuid::new_v4(),
            token_id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
        };
        let verifier: Arc<dyn TokenVerifier> = Arc::new(FixedToken(context));

        Router::new()
            .route("/me", get(|CurrentUser(user): CurrentUser| async move { user.email }))
            .route_layer(axum::middleware::from_fn_with_state(verifier, bearer_auth_middleware))
    }

    async fn call(auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::get("/me");
        if let Some(value) = auth {
            builder = builder.header("authorization", value);
        }
        let response = app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let (status, body) = call(Some("Bearer good")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ada@example.com");
    }

    #[tokio::test]
    async fn test_missing_header_is_401() {
        let (status, body) = call(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Unauthenticated."));
    }

    #[tokio::test]
    async fn test_unknown_token_is_401() {
        let (status, _) = call(Some("Bearer bad")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_401() {
        let (status, _) = call(Some("Basic Z29vZA==")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
