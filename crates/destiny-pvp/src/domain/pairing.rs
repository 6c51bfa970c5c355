//! How two sessions end up facing each other.

use chrono::{DateTime, Utc};
use destiny_character::Character;
use serde::{Deserialize, Serialize};

use super::room::MatchRoom;

/// A live character advertised for discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveListing {
    pub username: String,
    pub character: Character,
    /// When the character was first listed. Updates keep the original.
    pub listed_at: DateTime<Utc>,
}

/// Left in a session's mailbox when someone else paired with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Username of the session that made the pairing.
    pub challenger: String,
    /// The room that was claimed, if the pairing came through one.
    pub room: Option<String>,
}

/// What happened when a guest tried to claim a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomClaim {
    /// The room was consumed; the host has been challenged.
    Claimed(MatchRoom),
    /// No open room under that code, or it had expired.
    Missing,
    /// The guest tried to claim their own room. The room stays open.
    OwnRoom,
}

/// The route by which an opponent was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingSource {
    /// This session joined someone else's room.
    JoinedRoom,
    /// Someone joined this session's room.
    HostedRoom,
    /// Two seekers met in the queue.
    Queue,
    /// No seeker turned up; a live character was drafted.
    Discovery,
}

/// An opponent assigned to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub opponent_username: String,
    /// Snapshot of the opponent at pairing time.
    pub opponent: Character,
    pub source: PairingSource,
}

/// A session's position in the matchmaking protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MatchPhase {
    /// Idle. `notice` explains why the last search ended, if it ended on
    /// its own.
    Lobby { notice: Option<String> },
    /// Waiting for an opponent, either in the queue or behind a room code.
    Searching { room: Option<String>, ticks: u32 },
    /// Paired.
    Battle { pairing: Pairing },
}

impl MatchPhase {
    /// The idle phase with no notice.
    #[must_use]
    pub fn lobby() -> Self {
        Self::Lobby { notice: None }
    }

    /// Short name for logs and error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lobby { .. } => "lobby",
            Self::Searching { .. } => "searching",
            Self::Battle { .. } => "battle",
        }
    }
}
