//! Common test helpers for integration tests.
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate, and not every file uses every
//! helper.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use task_tracker_api::api::{AppState, build_router};
use task_tracker_api::domain::UserIdentity;
use task_tracker_api::infrastructure::{InMemoryTaskRepository, StaticTokenVerifier};

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";

// =============================================================================
// AppState Creation Helpers
// =============================================================================

/// Creates an `AppState` with an empty in-memory repository and two users.
pub fn create_test_app_state() -> AppState {
    create_test_app_state_with_repository(Arc::new(InMemoryTaskRepository::new()))
}

/// Creates an `AppState` over the given repository, with two users.
pub fn create_test_app_state_with_repository(repository: Arc<InMemoryTaskRepository>) -> AppState {
    let verifier = StaticTokenVerifier::new()
        .with_token(ALICE_TOKEN, UserIdentity::new("alice"))
        .with_token(BOB_TOKEN, UserIdentity::new("bob"));

    AppState {
        task_repository: repository,
        session_verifier: Arc::new(verifier),
    }
}

/// Creates the application router without a static directory.
pub fn create_test_router() -> Router {
    build_router(create_test_app_state(), None)
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Response status and parsed JSON body (`Value::Null` when the body is empty
/// or not JSON).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// Sends one request through the router.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Creates a task as the given user and returns its id.
pub async fn create_task_as(router: &Router, token: &str, title: &str) -> i64 {
    let body = serde_json::json!({ "title": title }).to_string();
    let response = send(router, Method::POST, "/tasks", Some(token), Some(&body)).await;
    assert_eq!(response.status, StatusCode::OK, "create failed: {}", response.body);
    response.body["id"].as_i64().unwrap()
}

/// Lists task ids visible to the given user, in response order.
pub async fn list_ids_as(router: &Router, token: &str) -> Vec<i64> {
    let response = send(router, Method::GET, "/tasks", Some(token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    response
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["id"].as_i64().unwrap())
        .collect()
}
