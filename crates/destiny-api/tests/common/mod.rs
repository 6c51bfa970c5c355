//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use destiny_core::clock::Clock;
use destiny_core::rng::DeterministicRng;
use destiny_narrative::application::oracle::NarrativeOracle;
use destiny_narrative::application::resolver::ResolverConfig;
use destiny_pvp::application::matchmaking::MatchmakingConfig;
use destiny_session::application::store::SessionStore;
use destiny_test_support::{FixedClock, SequenceRng};
use http_body_util::BodyExt;
use tower::ServiceExt;

use destiny_api::state::AppState;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::at(2026, 1, 15, 10, 0, 0))
}

/// Application state over the given store and oracle, with a deterministic
/// clock and room codes.
pub fn build_state(store: Arc<dyn SessionStore>, oracle: Arc<dyn NarrativeOracle>) -> AppState {
    AppState::assemble(
        store,
        oracle,
        fixed_clock(),
        Arc::new(|| Box::new(SequenceRng::new(vec![424_242, 0])) as Box<dyn DeterministicRng>),
        ResolverConfig::default(),
        MatchmakingConfig::default(),
    )
}

/// The full app router, built the same way as `main.rs`.
pub fn build_test_app(state: &AppState) -> Router {
    destiny_api::app(state.clone())
}

/// Send a request with an optional JSON body and return the response.
pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send_json(app, "POST", uri, Some(body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send_json(app, "GET", uri, None).await
}
