//! HTTP handlers for Products API

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, OriginalUri, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    AuditEvent, AuditOutcome, CurrentUser, QueryParams, TokenVerifier, UuidPath,
    bearer_auth_middleware,
    errors::responses::{
        BadRequestResponse, InternalServerErrorResponse, NotFoundResponse, PayloadTooLargeResponse,
        UnauthorizedResponse, ValidationErrorResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::input::ProductInput;
use crate::models::{MessageResponse, ProductForm, ProductPayload, ProductResponse};
use crate::pagination::{Page, PageUrl};
use crate::query::{ListQuery, ProductQuery};
use crate::repository::ProductRepository;
use crate::service::ProductService;
use crate::storage::ImageStorage;

/// Largest accepted request body. Leaves room for a 2048 KB image plus fields.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        create_product,
        get_product,
        update_product,
        delete_product,
    ),
    components(
        schemas(ProductResponse, ProductPayload, ProductForm, MessageResponse),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            ValidationErrorResponse,
            UnauthorizedResponse,
            PayloadTooLargeResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router. Every route requires a bearer token checked
/// by `verifier`.
pub fn router<R, S>(service: ProductService<R, S>, verifier: Arc<dyn TokenVerifier>) -> Router
where
    R: ProductRepository + 'static,
    S: ImageStorage + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product)
                .put(update_product)
                .patch(update_product)
                .post(update_product)
                .delete(delete_product),
        )
        .route_layer(middleware::from_fn_with_state(verifier, bearer_auth_middleware))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(shared_service)
}

fn audit(user_id: Uuid, action: &str, product_id: Uuid, headers: &HeaderMap) {
    AuditEvent::new(
        Some(user_id),
        action,
        Some(format!("product:{}", product_id)),
        AuditOutcome::Success,
    )
    .with_request(headers)
    .log();
}

/// List products with optional filters, sorting and pagination
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ListQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "One page of products", body = Page<ProductResponse>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository, S: ImageStorage>(
    State(service): State<Arc<ProductService<R, S>>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    QueryParams(query): QueryParams<ListQuery>,
) -> ProductResult<Json<Page<ProductResponse>>> {
    let query = ProductQuery::try_from(query).map_err(ProductError::Validation)?;
    let url = PageUrl::from_request(&uri, &headers);

    let page = service.list_products(query, &url).await?;
    Ok(Json(page))
}

/// Create a product, optionally with an image
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body(content(
        (ProductPayload = "application/json"),
        (ProductForm = "multipart/form-data")
    )),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository, S: ImageStorage>(
    State(service): State<Arc<ProductService<R, S>>>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    input: ProductInput,
) -> ProductResult<impl IntoResponse> {
    let product = service.create_product(input).await?;
    audit(user.user_id, "product.create", product.id, &headers);

    Ok((StatusCode::CREATED, Json(product)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository, S: ImageStorage>(
    State(service): State<Arc<ProductService<R, S>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<ProductResponse>> {
    let product = service.get_product(id).await?;
    Ok(Json(product))
}

/// Update some or all fields of a product. Also served for PATCH and POST.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body(content(
        (ProductPayload = "application/json"),
        (ProductForm = "multipart/form-data")
    )),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 413, response = PayloadTooLargeResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository, S: ImageStorage>(
    State(service): State<Arc<ProductService<R, S>>>,
    CurrentUser(user): CurrentUser,
    UuidPath(id): UuidPath,
    headers: HeaderMap,
    input: ProductInput,
) -> ProductResult<Json<ProductResponse>> {
    let product = service.update_product(id, input).await?;
    audit(user.user_id, "product.update", id, &headers);

    Ok(Json(product))
}

/// Delete a product and its image
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository, S: ImageStorage>(
    State(service): State<Arc<ProductService<R, S>>>,
    CurrentUser(user): CurrentUser,
    UuidPath(id): UuidPath,
    headers: HeaderMap,
) -> ProductResult<Json<MessageResponse>> {
    service.delete_product(id).await?;
    audit(user.user_id, "product.delete", id, &headers);

    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
