#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tokenwarden::{
    ServerConfig, config::SecretStore, create_app, db::Database, jwt::TokenPair,
    jwt::TokenSigner,
};
use tower::ServiceExt;

pub const ACCESS_SECRET: &str = "test-access-secret-0123456789abcdef";
pub const REFRESH_SECRET: &str = "test-refresh-secret-0123456789abcdef";

pub fn test_secrets() -> SecretStore {
    SecretStore::new(ACCESS_SECRET, REFRESH_SECRET).expect("Invalid test secrets")
}

/// Create a test app and return (app, db, signer).
pub async fn create_test_app() -> (Router, Database, TokenSigner) {
    create_test_app_with_secrets(test_secrets()).await
}

pub async fn create_test_app_with_secrets(
    secrets: SecretStore,
) -> (Router, Database, TokenSigner) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let signer = TokenSigner::new(&secrets);
    let config = ServerConfig {
        db: db.clone(),
        secrets,
        hash_cost: 4,
    };
    (create_app(&config), db, signer)
}

pub fn credentials(email: &str, password: &str) -> Value {
    serde_json::json!({ "email": email, "password": password })
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_bearer(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a request and decode the body as JSON. Empty bodies become `Value::Null`.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

pub fn token_pair(body: Value) -> TokenPair {
    serde_json::from_value(body).expect("Response is not a token pair")
}

pub async fn signup(app: &Router, email: &str, password: &str) -> TokenPair {
    let (status, body) = post_json(app, "/api/auth/local/signup", &credentials(email, password)).await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    token_pair(body)
}

pub async fn signin(app: &Router, email: &str, password: &str) -> TokenPair {
    let (status, body) = post_json(app, "/api/auth/local/signin", &credentials(email, password)).await;
    assert_eq!(status, StatusCode::OK, "signin failed: {}", body);
    token_pair(body)
}
