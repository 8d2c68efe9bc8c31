use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use storefront::{app::build_app, state::AppState};
use tower::ServiceExt;

fn app() -> Router {
    build_app(AppState::fake())
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };

    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ada Lovelace", "email": email, "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn product(app: &Router, name: &str) -> Value {
    let (_, body) = send(app, Method::GET, "/api/products", None, None).await;
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == name)
        .cloned()
        .unwrap()
}

fn shipping() -> Value {
    json!({
        "name": "Ada Lovelace",
        "address": "12 Analytical Way",
        "city": "London",
        "postalCode": "N1 9GU",
        "country": "United Kingdom"
    })
}

#[tokio::test]
async fn lists_products_with_category_filter() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 6);

    let (_, body) = send(&app, Method::GET, "/api/products?category=electronics", None, None).await;
    let names: Vec<_> = body["data"].as_array().unwrap().iter().map(|p| p["name"].clone()).collect();
    assert_eq!(names, vec![json!("Wireless Bluetooth Headphones"), json!("Smartphone Pro Max")]);

    let (_, body) = send(&app, Method::GET, "/api/products?category=all", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 6);

    let (status, body) = send(&app, Method::GET, "/api/products?category=garden", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn featured_and_single_product() {
    let app = app();

    let (_, body) = send(&app, Method::GET, "/api/products/featured", None, None).await;
    let featured = body["data"].as_array().unwrap();
    assert_eq!(featured.len(), 4);
    assert!(featured.iter().all(|p| p["featured"] == true));

    let coffee = product(&app, "Coffee Maker").await;
    let uri = format!("/api/products/{}", coffee["id"].as_str().unwrap());
    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price"], 79.99);
    assert_eq!(body["data"]["stock"], 15);
}

#[tokio::test]
async fn missing_product_is_404() {
    let app = app();

    let uri = format!("/api/products/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "error": "Product not found" }));

    let (status, _) = send(&app, Method::GET, "/api/products/42", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_login_and_me() {
    let app = app();
    register(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ada Again", "email": "ADA@example.com", "password": "secret2" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong-one" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Ada Lovelace");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn registration_validation_details() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "A", "email": "not-an-email", "password": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No token provided");

    let (status, body) = send(&app, Method::GET, "/api/orders/my-orders", Some("token-1-1700000000"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is not valid");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["error"], "Invalid JSON format");
}

#[tokio::test]
async fn checkout_totals_decrements_stock_and_clears_cart() {
    let app = app();
    let token = register(&app, "ada@example.com").await;
    let tee = product(&app, "Casual T-Shirt").await;
    let book = product(&app, "Programming Book Bundle").await;

    let cart = json!({ "cart": [
        { "product": tee["id"], "name": tee["name"], "price": tee["price"], "image": tee["image"], "quantity": 2 },
        { "product": book["id"], "name": book["name"], "price": book["price"], "image": book["image"], "quantity": 1 }
    ]});
    let (status, body) = send(&app, Method::PUT, "/api/auth/cart", Some(&token), Some(cart)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["cart"].as_array().unwrap().len(), 2);

    let order = json!({
        "items": [
            { "product": tee["id"], "quantity": 2 },
            { "product": book["id"], "quantity": 1 }
        ],
        "shippingAddress": shipping()
    });
    let (status, body) = send(&app, Method::POST, "/api/orders", Some(&token), Some(order)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let data = &body["data"];
    assert_eq!(data["orderStatus"], "processing");
    assert_eq!(data["paymentStatus"], "completed");
    assert!(data["orderNumber"].as_str().unwrap().starts_with("ORD-"));

    let subtotal: f64 = data["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["price"].as_f64().unwrap() * i["quantity"].as_f64().unwrap())
        .sum();
    let total = data["totalAmount"].as_f64().unwrap();
    assert!((total - subtotal).abs() < 1e-9);
    assert!((total - 89.97).abs() < 1e-9);

    assert_eq!(product(&app, "Casual T-Shirt").await["stock"], 98);
    assert_eq!(product(&app, "Programming Book Bundle").await["stock"], 24);

    let (_, body) = send(&app, Method::GET, "/api/auth/cart", Some(&token), None).await;
    assert_eq!(body["user"]["cart"], json!([]));

    let (_, body) = send(&app, Method::GET, "/api/orders/my-orders", Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn insufficient_stock_rejects_whole_order() {
    let app = app();
    let token = register(&app, "ada@example.com").await;
    let tee = product(&app, "Casual T-Shirt").await;
    let coffee = product(&app, "Coffee Maker").await;

    let order = json!({
        "items": [
            { "product": tee["id"], "quantity": 1 },
            { "product": coffee["id"], "quantity": 16 }
        ],
        "shippingAddress": shipping()
    });
    let (status, body) = send(&app, Method::POST, "/api/orders", Some(&token), Some(order)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Insufficient stock for Coffee Maker");

    assert_eq!(product(&app, "Casual T-Shirt").await["stock"], 100);
    assert_eq!(product(&app, "Coffee Maker").await["stock"], 15);
}

#[tokio::test]
async fn order_validation_errors() {
    let app = app();
    let token = register(&app, "ada@example.com").await;
    let tee = product(&app, "Casual T-Shirt").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(json!({ "items": [], "shippingAddress": shipping() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No items in order");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(json!({ "items": [{ "product": tee["id"], "quantity": 1 }], "shippingAddress": { "name": "Ada" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Shipping address is required");

    let ghost = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(json!({ "items": [{ "product": ghost, "quantity": 1 }], "shippingAddress": shipping() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], format!("Product not found: {ghost}"));
}

#[tokio::test]
async fn orders_are_private_and_missing_ones_404() {
    let app = app();
    let ada = register(&app, "ada@example.com").await;
    let bob = register(&app, "bob@example.com").await;
    let book = product(&app, "Programming Book Bundle").await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&ada),
        Some(json!({ "items": [{ "product": book["id"], "quantity": 1 }], "shippingAddress": shipping() })),
    )
    .await;
    let uri = format!("/api/orders/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::GET, &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Order not found");

    let uri = format!("/api/orders/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::GET, &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_status_transitions() {
    let app = app();
    let token = register(&app, "ada@example.com").await;
    let book = product(&app, "Programming Book Bundle").await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&token),
        Some(json!({ "items": [{ "product": book["id"], "quantity": 1 }], "shippingAddress": shipping() })),
    )
    .await;
    let uri = format!("/api/orders/{}/status", body["data"]["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "orderStatus": "delivered" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["orderStatus"], "delivered");

    let (status, body) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "orderStatus": "cancelled" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Order is already delivered");
}

#[tokio::test]
async fn catalog_management_requires_auth() {
    let app = app();
    let new = json!({
        "name": "Yoga Mat",
        "description": "Non-slip exercise mat",
        "price": 29.99,
        "category": "sports",
        "stock": 12
    });

    let (status, _) = send(&app, Method::POST, "/api/products", None, Some(new.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = register(&app, "ada@example.com").await;
    let (status, body) = send(&app, Method::POST, "/api/products", Some(&token), Some(new.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["featured"], false);
    let uri = format!("/api/products/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::POST, "/api/products", Some(&token), Some(new)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Product name already exists");

    let (status, body) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "stock": 3, "featured": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock"], 3);
    assert_eq!(body["data"]["featured"], true);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn banner_health_and_unknown_routes() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "E-commerce API is running!");

    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(&to_bytes(res.into_body(), usize::MAX).await.unwrap()[..], b"ok");

    let (status, body) = send(&app, Method::GET, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "error": "Route not found" }));
}

#[tokio::test]
async fn oversized_prices_and_totals_are_client_errors() {
    let app = app();
    let token = register(&app, "ada@example.com").await;

    let yacht = json!({
        "name": "Yacht",
        "description": "Very large boat",
        "price": 7e28,
        "category": "sports",
        "stock": 10
    });
    let (status, _) = send(&app, Method::POST, "/api/products", Some(&token), Some(yacht)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let villa = json!({
        "name": "Villa",
        "description": "Seaside villa",
        "price": 9999999999.99,
        "category": "home",
        "stock": 1000
    });
    let (status, body) = send(&app, Method::POST, "/api/products", Some(&token), Some(villa)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let villa_id = body["data"]["id"].clone();

    let order = json!({
        "items": [{ "product": villa_id, "quantity": 101 }],
        "shippingAddress": shipping()
    });
    let (status, body) = send(&app, Method::POST, "/api/orders", Some(&token), Some(order)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Order total is too large");

    // the store is still usable afterwards
    let (status, _) = send(&app, Method::GET, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product(&app, "Villa").await["stock"], 1000);
}
