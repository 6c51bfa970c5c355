//! Private match rooms.

use chrono::{DateTime, TimeDelta, Utc};
use destiny_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};

/// Smallest six-digit room code.
pub const ROOM_CODE_MIN: u32 = 100_000;

/// Largest six-digit room code.
pub const ROOM_CODE_MAX: u32 = 999_999;

/// A room waiting for a guest. Rooms are consumed or expire; they are
/// never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRoom {
    pub code: String,
    /// Username of the session that opened the room.
    pub host: String,
    pub created_at: DateTime<Utc>,
}

impl MatchRoom {
    /// Whether the room has outlived `ttl` at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now.signed_duration_since(self.created_at) >= ttl
    }
}

/// Draws a six-digit room code.
pub fn draw_room_code(rng: &mut dyn DeterministicRng) -> String {
    rng.next_u32_range(ROOM_CODE_MIN, ROOM_CODE_MAX).to_string()
}
