//! Routes for the PvP arena: matchmaking and duel turns.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use destiny_pvp::application::arena::ArenaStatus;
use destiny_pvp::application::engine::BattleTurn;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for POST /{username}/rooms.
#[derive(Debug, Serialize)]
pub struct RoomResponse {
    /// Six-digit code the host shares with a guest.
    pub code: String,
}

/// Request body for POST /{username}/turns.
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub action: String,
}

/// POST /{username}/enter
#[instrument(skip(state))]
async fn enter(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ArenaStatus>, ApiError> {
    Ok(Json(state.arena.enter(&username).await?))
}

/// GET /{username}
async fn status(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ArenaStatus>, ApiError> {
    Ok(Json(state.arena.status(&username).await?))
}

/// POST /{username}/rooms
#[instrument(skip(state))]
async fn create_room(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<RoomResponse>, ApiError> {
    let code = state.arena.create_room(&username).await?;
    Ok(Json(RoomResponse { code }))
}

/// POST /{username}/rooms/{code}/join
#[instrument(skip(state))]
async fn join_room(
    State(state): State<AppState>,
    Path((username, code)): Path<(String, String)>,
) -> Result<Json<ArenaStatus>, ApiError> {
    Ok(Json(state.arena.join_room(&username, &code).await?))
}

/// POST /{username}/search
#[instrument(skip(state))]
async fn start_search(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ArenaStatus>, ApiError> {
    Ok(Json(state.arena.start_search(&username).await?))
}

/// DELETE /{username}/search
#[instrument(skip(state))]
async fn cancel_search(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ArenaStatus>, ApiError> {
    Ok(Json(state.arena.cancel_search(&username).await?))
}

/// POST /{username}/turns
#[instrument(skip(state, request), fields(correlation_id = %Uuid::new_v4()))]
async fn take_turn(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<BattleTurn>, ApiError> {
    Ok(Json(state.arena.take_turn(&username, &request.action).await?))
}

/// POST /{username}/leave
#[instrument(skip(state))]
async fn leave(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.arena.leave(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for the PvP context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{username}", get(status))
        .route("/{username}/enter", post(enter))
        .route("/{username}/rooms", post(create_room))
        .route("/{username}/rooms/{code}/join", post(join_room))
        .route("/{username}/search", post(start_search).delete(cancel_search))
        .route("/{username}/turns", post(take_turn))
        .route("/{username}/leave", post(leave))
}
