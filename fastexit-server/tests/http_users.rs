//! HTTP surface: envelopes, status codes, validation and bearer auth

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use fastexit_server::db::{MemoryStore, Persistence};
use fastexit_server::http::{router, AppState, JwtVerifier};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

fn app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(Persistence::memory(Arc::clone(&store)).user_service());
    (store, router(state, false))
}

fn secured_app() -> (JwtVerifier, Router) {
    let store = Arc::new(MemoryStore::new());
    let verifier = JwtVerifier::new(SECRET, "HS256").unwrap();
    let state = AppState::new(Persistence::memory(store).user_service())
        .with_verifier(Arc::new(JwtVerifier::new(SECRET, "HS256").unwrap()));
    (verifier, router(state, false))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn create(app: &Router, username: &str, email: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/api/users",
            json!({"username": username, "email": email, "full_name": "Test User"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn health_is_open() {
    let (_store, app) = app();
    for uri in ["/", "/health"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "FastExit API is running");
        assert_eq!(body["status"], "healthy");
    }
}

#[tokio::test]
async fn create_returns_created_envelope() {
    let (store, app) = app();
    let body = create(&app, "john_doe", "john@example.com").await;

    assert_eq!(body["code"], 0);
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["data"]["username"], "john_doe");
    assert!(body["data"]["id"].as_i64().unwrap() > 0);
    assert!(body["data"]["created_at"].is_string());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn duplicate_is_bad_request() {
    let (_store, app) = app();
    create(&app, "john_doe", "john@example.com").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users",
            json!({"username": "john_doe", "email": "second@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "USER_CREATE_DUPLICATED");
}

#[tokio::test]
async fn malformed_input_is_invalid_request() {
    let (store, app) = app();

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/users", json!({"username": "john_doe"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users",
            json!({"username": "john_doe", "email": "no-at-sign"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"][0]["loc"], "email");

    let (status, body) = send(&app, get("/api/users/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");

    let (status, _) = send(&app, get("/api/users?limit=1001")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.is_empty());
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let (_store, app) = app();
    let (status, body) = send(&app, get("/api/users/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_GET_NOT_FOUND");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn non_positive_ids_are_not_found() {
    let (_store, app) = app();
    create(&app, "john_doe", "john@example.com").await;

    for uri in ["/api/users/0", "/api/users/-3"] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["code"], "USER_GET_NOT_FOUND");
    }

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/users/0")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn skip_beyond_bigint_is_an_empty_page() {
    let (_store, app) = app();
    create(&app, "john_doe", "john@example.com").await;

    let (status, body) = send(&app, get("/api/users?skip=18446744073709551615&limit=3")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["total_count"], 1);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_update_delete_flow() {
    let (store, app) = app();
    for i in 1..=4 {
        create(&app, &format!("user_{i}"), &format!("user{i}@example.com")).await;
    }

    let (status, body) = send(&app, get("/api/users?skip=1&limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_count"], 4);
    assert_eq!(body["data"]["items"][0]["id"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        &app,
        json_request(Method::PATCH, "/api/users/2", json!({"full_name": "Renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User updated successfully");
    assert_eq!(body["data"]["full_name"], "Renamed");

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/users/2")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 2);
    assert_eq!(store.len(), 3);

    let (status, _) = send(&app, get("/api/users/2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bearer_token_is_required_when_configured() {
    let (verifier, app) = secured_app();

    let (status, body) = send(&app, get("/api/users")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let bad = Request::builder()
        .uri("/api/users")
        .header(header::AUTHORIZATION, "Bearer nonsense")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, bad).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = verifier.issue("1", None, Duration::minutes(5)).unwrap();
    let good = Request::builder()
        .uri("/api/users")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, good).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_count"], 0);

    // Health stays open
    let (status, _) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}
