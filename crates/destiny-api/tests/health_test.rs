//! Integration tests for the health endpoint.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use destiny_session::application::store::InMemorySessionStore;
use destiny_test_support::FailingOracle;

#[tokio::test]
async fn test_health_returns_200_with_status_ok() {
    let state = common::build_state(Arc::new(InMemorySessionStore::new()), Arc::new(FailingOracle));

    let (status, json) = common::get_json(common::build_test_app(&state), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "destiny-api");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let state = common::build_state(Arc::new(InMemorySessionStore::new()), Arc::new(FailingOracle));

    let (status, _) = common::get_json(common::build_test_app(&state), "/api/v1/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
