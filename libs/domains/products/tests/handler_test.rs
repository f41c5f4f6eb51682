//! Handler tests for the products endpoints
//!
//! Drive the products router with `oneshot` over the in-memory repository
//! and image storage:
//! - Bearer guard on every route
//! - JSON and multipart bodies
//! - Filtering, sorting and the page object
//! - Image lifecycle across create, update and delete

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_helpers::{AppError, AuthContext, TokenVerifier};
use domain_products::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // For oneshot()
use uuid::Uuid;

const TOKEN: &str = "test-token";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01";
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

struct StaticVerifier;

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<Option<AuthContext>, AppError> {
        Ok((token == TOKEN).then(|| AuthContext {
            user_id: Uuid::nil(),
            token_id: Uuid::nil(),
            name: "Tester".to_string(),
            email: "tester@example.com".to_string(),
        }))
    }
}

fn app() -> (Router, InMemoryImageStorage) {
    let storage = InMemoryImageStorage::default();
    let service = ProductService::new(InMemoryProductRepository::new(), storage.clone());
    let app = Router::new().nest("/products", handlers::router(service, Arc::new(StaticVerifier)));
    (app, storage)
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "localhost")
        .header("authorization", format!("Bearer {}", TOKEN));
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    read(app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()).await
}

/// Send `fields` and an optional image as `multipart/form-data`
async fn send_multipart(
    app: &Router,
    method: &str,
    uri: &str,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> (StatusCode, Value) {
    let boundary = "catalog-test-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                boundary, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", TOKEN))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    read(app.clone().oneshot(request).await.unwrap()).await
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, product) = send(app, "POST", "/products", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", product);
    product
}

async fn seed(app: &Router) {
    for (name, category, price, rating) in [
        ("Desk Lamp", "Home", 40.0, json!(4.0)),
        ("Floor Lamp", "Home", 120.0, Value::Null),
        ("Laptop", "Electronics", 999.0, json!(4.8)),
        ("Mouse", "Electronics", 25.0, json!(3.5)),
    ] {
        create(
            app,
            json!({"name": name, "category": category, "price": price, "rating": rating}),
        )
        .await;
        // Distinct creation times for the default newest-first order
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

fn names(page: &Value) -> Vec<&str> {
    page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_every_route_requires_a_token() {
    let (app, _) = app();
    let id = Uuid::now_v7();

    for (method, uri) in [
        ("GET", "/products".to_string()),
        ("POST", "/products".to_string()),
        ("GET", format!("/products/{}", id)),
        ("PUT", format!("/products/{}", id)),
        ("PATCH", format!("/products/{}", id)),
        ("DELETE", format!("/products/{}", id)),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = read(app.clone().oneshot(request).await.unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["message"], "Unauthenticated.");
    }

    let request = Request::builder()
        .uri("/products")
        .header("authorization", "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = read(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_then_fetch() {
    let (app, _) = app();
    let created = create(
        &app,
        json!({
            "name": "Test Product",
            "category": "Electronics",
            "price": 99.99,
            "rating": 4.5,
            "description": "Test description"
        }),
    )
    .await;

    let (status, fetched) = send(&app, "GET", &format!("/products/{}", created["id"].as_str().unwrap()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Test Product");
    assert_eq!(fetched["category"], "Electronics");
    assert_eq!(fetched["price"], 99.99);
    assert_eq!(fetched["rating"], 4.5);
    assert_eq!(fetched["description"], "Test description");
    assert!(fetched["image"].is_null());
}

#[tokio::test]
async fn test_create_validation_errors() {
    let (app, _) = app();

    let (status, body) = send(&app, "POST", "/products", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "The name field is required.");
    assert_eq!(body["details"]["category"][0], "The category field is required.");
    assert_eq!(body["details"]["price"][0], "The price field is required.");

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(json!({"name": "X", "category": "Y", "price": -1, "rating": 6})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["price"][0], "The price field must be at least 0.");
    assert_eq!(body["details"]["rating"][0], "The rating field must not be greater than 5.");
}

#[tokio::test]
async fn test_duplicate_name_is_422_on_name() {
    let (app, _) = app();
    create(&app, json!({"name": "Lamp", "category": "Home", "price": 10})).await;

    let (status, body) = send(
        &app,
        "POST",
        "/products",
        Some(json!({"name": "Lamp", "category": "Other", "price": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["name"][0], "The name has already been taken.");
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let (app, _) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/products")
        .header("authorization", format!("Bearer {}", TOKEN))
        .header("content-type", "application/json")
        .body(Body::from("{"))
        .unwrap();

    let (status, _) = read(app.oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_and_category_filters() {
    let (app, _) = app();
    seed(&app).await;

    let (status, page) = send(&app, "GET", "/products?search=lamp", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&page), ["Floor Lamp", "Desk Lamp"]);

    let (_, page) = send(&app, "GET", "/products?category=Electronics", None).await;
    assert_eq!(names(&page), ["Mouse", "Laptop"]);
}

#[tokio::test]
async fn test_price_bounds_are_inclusive() {
    let (app, _) = app();
    seed(&app).await;

    let (_, page) = send(&app, "GET", "/products?min_price=40", None).await;
    assert_eq!(names(&page), ["Laptop", "Floor Lamp", "Desk Lamp"]);

    let (_, page) = send(&app, "GET", "/products?min_price=25&max_price=120", None).await;
    assert_eq!(names(&page), ["Mouse", "Floor Lamp", "Desk Lamp"]);
}

#[tokio::test]
async fn test_default_order_is_newest_first() {
    let (app, _) = app();
    for name in ["First", "Second", "Third"] {
        create(&app, json!({"name": name, "category": "Home", "price": 10})).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (status, page) = send(&app, "GET", "/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&page), ["Third", "Second", "First"]);

    let (_, page) = send(&app, "GET", "/products?sort_order=asc", None).await;
    assert_eq!(names(&page), ["First", "Second", "Third"]);
}

#[tokio::test]
async fn test_sorting() {
    let (app, _) = app();
    seed(&app).await;

    let (_, page) = send(&app, "GET", "/products?sort_by=price&sort_order=asc", None).await;
    let prices: Vec<f64> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price"].as_f64().unwrap())
        .collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));

    let (_, page) = send(&app, "GET", "/products?sort_by=name", None).await;
    assert_eq!(names(&page), ["Mouse", "Laptop", "Floor Lamp", "Desk Lamp"]);

    // Unknown column: no ordering at all, not the default
    let (status, page) = send(&app, "GET", "/products?sort_by=stock&sort_order=asc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&page), ["Desk Lamp", "Floor Lamp", "Laptop", "Mouse"]);

    // The direction is only read for a known column
    let (status, page) = send(&app, "GET", "/products?sort_by=stock&sort_order=up", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&page).len(), 4);

    let (status, body) = send(&app, "GET", "/products?sort_by=price&sort_order=up", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["sort_order"].is_array());
}

#[tokio::test]
async fn test_page_object() {
    let (app, _) = app();
    seed(&app).await;

    let (status, page) = send(&app, "GET", "/products?category=Home&per_page=1&page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&page), ["Desk Lamp"]);
    assert_eq!(page["meta"]["current_page"], 2);
    assert_eq!(page["meta"]["per_page"], 1);
    assert_eq!(page["meta"]["total"], 2);
    assert_eq!(page["meta"]["last_page"], 2);
    assert_eq!(page["meta"]["from"], 2);
    assert_eq!(page["meta"]["to"], 2);
    assert_eq!(page["meta"]["path"], "http://localhost/products");
    assert_eq!(
        page["links"]["prev"],
        "http://localhost/products?category=Home&per_page=1&page=1"
    );
    assert!(page["links"]["next"].is_null());

    let (_, page) = send(&app, "GET", "/products", None).await;
    assert_eq!(page["meta"]["per_page"], 15);
}

#[tokio::test]
async fn test_out_of_range_page_values_return_an_empty_page() {
    let (app, _) = app();
    seed(&app).await;

    let (status, page) = send(&app, "GET", "/products?page=9999999999999999999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(names(&page).is_empty());
    assert_eq!(page["meta"]["total"], 4);
    assert_eq!(page["meta"]["current_page"], i64::MAX);

    let (status, page) = send(&app, "GET", "/products?per_page=18446744073709551615", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&page).len(), 4);
    assert_eq!(page["meta"]["per_page"], i64::MAX);
}

#[tokio::test]
async fn test_malformed_price_filter_is_400() {
    let (app, _) = app();
    let (status, _) = send(&app, "GET", "/products?min_price=cheap", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_or_malformed_id_is_404() {
    let (app, _) = app();

    let (status, _) = send(&app, "GET", &format!("/products/{}", Uuid::now_v7()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/products/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/products/{}", Uuid::now_v7()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_multipart_create_stores_image() {
    let (app, storage) = app();

    let (status, product) = send_multipart(
        &app,
        "POST",
        "/products",
        &[("name", "Camera"), ("category", "Electronics"), ("price", "250.00")],
        Some(("camera.jpg", JPEG)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{}", product);
    assert_eq!(product["price"], 250.0);
    let path = product["image"].as_str().unwrap();
    assert!(path.starts_with("products/") && path.ends_with(".jpg"));
    assert_eq!(product["image_url"], format!("/storage/{}", path));
    assert_eq!(storage.get(path).await.as_deref(), Some(JPEG));
}

#[tokio::test]
async fn test_multipart_rejects_non_image() {
    let (app, storage) = app();

    let (status, body) = send_multipart(
        &app,
        "POST",
        "/products",
        &[("name", "Manual"), ("category", "Docs"), ("price", "1")],
        Some(("manual.pdf", &b"%PDF-1.7 not an image"[..])),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["image"][0], "The image field must be an image.");
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn test_update_name_only_keeps_image() {
    let (app, _) = app();
    let (_, product) = send_multipart(
        &app,
        "POST",
        "/products",
        &[("name", "Lamp"), ("category", "Home"), ("price", "10")],
        Some(("lamp.png", PNG)),
    )
    .await;
    let id = product["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/products/{}", id),
        Some(json!({"name": "Brass Lamp"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Brass Lamp");
    assert_eq!(updated["price"], 10.0);
    assert_eq!(updated["image"], product["image"]);
}

#[tokio::test]
async fn test_update_with_new_image_replaces_file() {
    let (app, storage) = app();
    let (_, product) = send_multipart(
        &app,
        "POST",
        "/products",
        &[("name", "Lamp"), ("category", "Home"), ("price", "10")],
        Some(("lamp.png", PNG)),
    )
    .await;
    let id = product["id"].as_str().unwrap();
    let old = product["image"].as_str().unwrap().to_string();

    let (status, updated) = send_multipart(
        &app,
        "POST",
        &format!("/products/{}", id),
        &[("category", "Lighting")],
        Some(("lamp.jpg", JPEG)),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["category"], "Lighting");
    assert_ne!(updated["image"], old.as_str());
    assert_eq!(storage.get(&old).await, None);
    assert_eq!(storage.len().await, 1);
}

#[tokio::test]
async fn test_update_validation_and_own_name() {
    let (app, _) = app();
    let lamp = create(&app, json!({"name": "Lamp", "category": "Home", "price": 10})).await;
    create(&app, json!({"name": "Chair", "category": "Home", "price": 30})).await;
    let uri = format!("/products/{}", lamp["id"].as_str().unwrap());

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({"name": "Lamp"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({"name": "Chair"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["name"][0], "The name has already been taken.");

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({"price": "abc"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["price"][0], "The price field must be a number.");
}

#[tokio::test]
async fn test_delete_removes_record_and_image() {
    let (app, storage) = app();
    let (_, product) = send_multipart(
        &app,
        "POST",
        "/products",
        &[("name", "Lamp"), ("category", "Home"), ("price", "10")],
        Some(("lamp.png", PNG)),
    )
    .await;
    let uri = format!("/products/{}", product["id"].as_str().unwrap());

    let (status, body) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Product deleted successfully"}));
    assert!(storage.is_empty().await);

    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
