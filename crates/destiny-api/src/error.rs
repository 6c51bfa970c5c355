//! Line of Destiny — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use destiny_core::error::DomainError;
use destiny_pvp::application::engine::BattleError;
use destiny_pvp::application::matchmaking::MatchError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The session store could not be opened.
    #[error("storage error: {0}")]
    Storage(#[from] DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around the engine's errors that implements
/// `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    Match(MatchError),
    Battle(BattleError),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::Domain(inner) => Self::Domain(inner),
            other => Self::Match(other),
        }
    }
}

impl From<BattleError> for ApiError {
    fn from(err: BattleError) -> Self {
        match err {
            BattleError::Domain(inner) => Self::Domain(inner),
            other => Self::Battle(other),
        }
    }
}

fn classify_domain(err: &DomainError) -> (StatusCode, &'static str) {
    match err {
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        DomainError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::Infrastructure(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Self::Domain(err) => {
                let (status, code) = classify_domain(err);
                (status, code, err.to_string())
            }
            Self::Match(err) => {
                let (status, code) = match err {
                    MatchError::RoomNotFound(_) => (StatusCode::NOT_FOUND, "room_not_found"),
                    MatchError::HostUnresolvable(_) => {
                        (StatusCode::NOT_FOUND, "host_unresolvable")
                    }
                    MatchError::SearchTimeout => (StatusCode::CONFLICT, "search_timeout"),
                    MatchError::InvalidPhase { .. } => (StatusCode::CONFLICT, "invalid_phase"),
                    MatchError::Domain(inner) => classify_domain(inner),
                };
                (status, code, err.to_string())
            }
            Self::Battle(err) => {
                let (status, code) = match err {
                    BattleError::Aborted(_) => (StatusCode::BAD_GATEWAY, "battle_aborted"),
                    BattleError::Busy => (StatusCode::CONFLICT, "turn_in_flight"),
                    BattleError::Finished => (StatusCode::CONFLICT, "battle_finished"),
                    BattleError::Domain(inner) => classify_domain(inner),
                };
                (status, code, err.to_string())
            }
        };

        if status.is_server_error() {
            error!(error = error_code, %message, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}
