//! Routes for the session boundary calls: lifecycle, actions and settings.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use destiny_character::Character;
use destiny_narrative::domain::message::GameMessage;
use destiny_session::application::service::{SessionView, TurnReport};
use destiny_session::domain::user::Settings;
use destiny_world_state::WorldState;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub username: String,
}

/// Request body for POST /{username}/actions.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    /// Free text typed by the player.
    pub action: String,
}

/// Request body for PUT /{username}/settings.
#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub image_generation: bool,
}

/// Request body for POST /{username}/arc.
#[derive(Debug, Deserialize)]
pub struct EnterArcRequest {
    pub arc_id: String,
}

/// POST /
#[instrument(skip(state, request), fields(username = %request.username))]
async fn open_session(
    State(state): State<AppState>,
    Json(request): Json<OpenSessionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.open_session(&request.username).await?))
}

/// GET /{username}
async fn get_session(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.session(&username).await?))
}

/// POST /{username}/character
#[instrument(skip(state, character), fields(correlation_id = %Uuid::new_v4()))]
async fn character_ready(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(character): Json<Character>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(
        state.sessions.on_character_ready(&username, character).await?,
    ))
}

/// PUT /{username}/character
#[instrument(skip(state, character), fields(correlation_id = %Uuid::new_v4()))]
async fn character_updated(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(character): Json<Character>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(
        state.sessions.on_character_updated(&username, character).await?,
    ))
}

/// POST /{username}/actions
#[instrument(skip(state, request), fields(correlation_id = %Uuid::new_v4()))]
async fn take_action(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<TurnReport>, ApiError> {
    Ok(Json(
        state.sessions.take_action(&username, &request.action).await?,
    ))
}

/// POST /{username}/opening-scene
#[instrument(skip(state), fields(correlation_id = %Uuid::new_v4()))]
async fn opening_scene(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<TurnReport>, ApiError> {
    Ok(Json(state.sessions.open_scene(&username).await?))
}

/// GET /{username}/transcript
async fn transcript(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<GameMessage>>, ApiError> {
    state.sessions.session(&username).await?;
    Ok(Json(state.sessions.transcript(&username)))
}

/// PUT /{username}/settings
async fn update_settings(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<Settings>, ApiError> {
    Ok(Json(
        state
            .sessions
            .set_image_generation(&username, request.image_generation)
            .await?,
    ))
}

/// POST /{username}/permadeath
#[instrument(skip(state), fields(correlation_id = %Uuid::new_v4()))]
async fn permadeath(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.sessions.on_permadeath(&username).await?))
}

/// POST /{username}/arc
#[instrument(skip(state, request), fields(arc_id = %request.arc_id))]
async fn enter_arc(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<EnterArcRequest>,
) -> Result<Json<WorldState>, ApiError> {
    Ok(Json(
        state.sessions.enter_arc(&username, &request.arc_id).await?,
    ))
}

/// Returns the router for the session context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(open_session))
        .route("/{username}", get(get_session))
        .route(
            "/{username}/character",
            post(character_ready).put(character_updated),
        )
        .route("/{username}/actions", post(take_action))
        .route("/{username}/opening-scene", post(opening_scene))
        .route("/{username}/transcript", get(transcript))
        .route("/{username}/settings", put(update_settings))
        .route("/{username}/permadeath", post(permadeath))
        .route("/{username}/arc", post(enter_arc))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use destiny_core::rng::DeterministicRng;
    use destiny_narrative::application::oracle::NarrativeOracle;
    use destiny_narrative::application::resolver::ResolverConfig;
    use destiny_narrative::domain::directive::Directive;
    use destiny_pvp::application::matchmaking::MatchmakingConfig;
    use destiny_session::application::store::InMemorySessionStore;
    use destiny_test_support::{FailingOracle, FixedClock, MockRng, ScriptedOracle, sorcerer_character};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app_state_with(oracle: Arc<dyn NarrativeOracle>) -> AppState {
        AppState::assemble(
            Arc::new(InMemorySessionStore::new()),
            oracle,
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 2, 2, 8, 0, 0).unwrap())),
            Arc::new(|| Box::new(MockRng) as Box<dyn DeterministicRng>),
            ResolverConfig::default(),
            MatchmakingConfig::default(),
        )
    }

    async fn send(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(serde_json::to_vec(&b).unwrap())))
            .unwrap();

        let response = router().with_state(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn playing(state: &AppState, username: &str) {
        state.sessions.open_session(username).await.unwrap();
        state
            .sessions
            .on_character_ready(username, sorcerer_character("Megumi"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_session_returns_awaiting_character() {
        // Arrange
        let state = app_state_with(Arc::new(FailingOracle));

        // Act
        let (status, json) = send(&state, "POST", "/", Some(json!({ "username": "megumi" }))).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["username"], "megumi");
        assert_eq!(json["stage"], "awaiting_character");
    }

    #[tokio::test]
    async fn test_open_session_rejects_bad_username() {
        let state = app_state_with(Arc::new(FailingOracle));

        let (status, json) = send(&state, "POST", "/", Some(json!({ "username": "no spaces" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_character_ready_accepts_a_character_sheet() {
        let state = app_state_with(Arc::new(FailingOracle));
        state.sessions.open_session("megumi").await.unwrap();
        let sheet = serde_json::to_value(sorcerer_character("Megumi")).unwrap();

        let (status, json) = send(&state, "POST", "/megumi/character", Some(sheet)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stage"], "playing");
        assert_eq!(json["character"]["name"], "Megumi");
    }

    #[tokio::test]
    async fn test_take_action_returns_turn_report() {
        // Arrange
        let oracle = ScriptedOracle::new().with_turn(Ok(Directive {
            suggestions: vec!["Summon Divine Dogs".to_owned()],
            ..Directive::narration_only("Shadows pool at your feet.")
        }));
        let state = app_state_with(Arc::new(oracle));
        playing(&state, "megumi").await;

        // Act
        let (status, json) = send(
            &state,
            "POST",
            "/megumi/actions",
            Some(json!({ "action": "Form the hand sign" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fallback"], false);
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["suggestions"][0], "Summon Divine Dogs");
    }

    #[tokio::test]
    async fn test_oracle_outage_is_a_fallback_not_an_error() {
        let state = app_state_with(Arc::new(FailingOracle));
        playing(&state, "megumi").await;

        let (status, json) = send(
            &state,
            "POST",
            "/megumi/actions",
            Some(json!({ "action": "Look around" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["fallback"], true);
        assert_eq!(json["character"]["current_hp"], 200);
    }

    #[tokio::test]
    async fn test_action_for_unknown_session_returns_404() {
        let state = app_state_with(Arc::new(FailingOracle));

        let (status, json) = send(
            &state,
            "POST",
            "/nobody/actions",
            Some(json!({ "action": "Hello?" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_action_returns_422_for_missing_body_field() {
        let state = app_state_with(Arc::new(FailingOracle));
        playing(&state, "megumi").await;

        let (status, _) = send(&state, "POST", "/megumi/actions", Some(json!({}))).await;

        // Axum returns 422 for deserialization failures.
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_settings_and_permadeath() {
        let state = app_state_with(Arc::new(FailingOracle));
        playing(&state, "megumi").await;

        let (settings_status, settings) = send(
            &state,
            "PUT",
            "/megumi/settings",
            Some(json!({ "image_generation": false })),
        )
        .await;
        let (dead_status, dead) = send(&state, "POST", "/megumi/permadeath", None).await;
        let (update_status, _) = send(
            &state,
            "PUT",
            "/megumi/character",
            Some(serde_json::to_value(sorcerer_character("Megumi")).unwrap()),
        )
        .await;

        assert_eq!(settings_status, StatusCode::OK);
        assert_eq!(settings["image_generation"], false);
        assert_eq!(dead_status, StatusCode::OK);
        assert_eq!(dead["stage"], "game_over");
        assert_eq!(dead["epitaph"]["name"], "Megumi");
        assert_eq!(update_status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_enter_unknown_arc_is_a_validation_error() {
        let state = app_state_with(Arc::new(FailingOracle));
        playing(&state, "megumi").await;

        let (status, _) = send(&state, "POST", "/megumi/arc", Some(json!({ "arc_id": "kyoto" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
