//! HTTP handlers for authentication

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, CurrentUser, TokenVerifier, ValidatedJson, bearer_auth_middleware,
    errors::responses::{
        InternalServerErrorResponse, UnauthorizedResponse, ValidationErrorResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, UserResponse};
use crate::repository::{TokenRepository, UserRepository};
use crate::service::AuthService;

/// OpenAPI documentation for the auth endpoints
#[derive(OpenApi)]
#[openapi(
    paths(register, login, logout, me),
    components(
        schemas(RegisterRequest, LoginRequest, AuthResponse, UserResponse, MessageResponse),
        responses(ValidationErrorResponse, UnauthorizedResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "Auth", description = "Registration, login and token revocation")
    )
)]
pub struct ApiDoc;

/// Create the auth router.
///
/// `/logout` and `/me` sit behind the bearer middleware, backed by the same
/// service that issues the tokens.
pub fn router<U, T>(service: AuthService<U, T>) -> Router
where
    U: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    let shared_service = Arc::new(service);
    let verifier: Arc<dyn TokenVerifier> = shared_service.clone();

    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(verifier, bearer_auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
        .with_state(shared_service)
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = AuthResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<U: UserRepository, T: TokenRepository>(
    State(service): State<Arc<AuthService<U, T>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> UserResult<impl IntoResponse> {
    let response = service.register(input).await?;

    AuditEvent::new(
        Some(response.user.id),
        "auth.register",
        Some(format!("user:{}", response.user.id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchange credentials for a new bearer token
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<U: UserRepository, T: TokenRepository>(
    State(service): State<Arc<AuthService<U, T>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<AuthResponse>> {
    let email = input.email.clone();

    match service.login(input).await {
        Ok(response) => {
            AuditEvent::new(
                Some(response.user.id),
                "auth.login",
                Some(format!("user:{}", response.user.id)),
                AuditOutcome::Success,
            )
            .with_request(&headers)
            .log();
            Ok(Json(response))
        }
        Err(UserError::InvalidCredentials) => {
            AuditEvent::new(None, "auth.login", None, AuditOutcome::Failure)
                .with_request(&headers)
                .with_details(serde_json::json!({ "email": email }))
                .log();
            Err(UserError::InvalidCredentials)
        }
        Err(e) => Err(e),
    }
}

/// Revoke the token used for this request
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn logout<U: UserRepository, T: TokenRepository>(
    State(service): State<Arc<AuthService<U, T>>>,
    CurrentUser(context): CurrentUser,
    headers: HeaderMap,
) -> UserResult<Json<MessageResponse>> {
    service.logout(&context).await?;

    AuditEvent::new(
        Some(context.user_id),
        "auth.logout",
        Some(format!("token:{}", context.token_id)),
        AuditOutcome::Success,
    )
    .with_request(&headers)
    .log();

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// The authenticated user
#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn me<U: UserRepository, T: TokenRepository>(
    State(service): State<Arc<AuthService<U, T>>>,
    CurrentUser(context): CurrentUser,
) -> UserResult<Json<UserResponse>> {
    let user = service.current_user(context.user_id).await?;
    Ok(Json(user))
}
