//! The shared match directory: rooms, seekers, challenges and live
//! listings.
//!
//! Every operation is atomic with respect to the others. Opening a room is
//! an insert-if-absent and claiming one is a take, so a room can be won by
//! at most one guest.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use destiny_core::error::DomainError;

use crate::domain::pairing::{Challenge, LiveListing, RoomClaim};
use crate::domain::room::MatchRoom;

/// Coordination point shared by every session's matchmaking.
#[async_trait]
pub trait MatchDirectory: Send + Sync {
    /// Inserts `room` unless a live room already holds its code. Returns
    /// whether the room was inserted.
    async fn open_room(&self, room: &MatchRoom, ttl: TimeDelta) -> Result<bool, DomainError>;

    /// Atomically consumes the room under `code` on behalf of `guest` and
    /// leaves a challenge in the host's mailbox.
    async fn claim_room(
        &self,
        code: &str,
        guest: &str,
        now: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Result<RoomClaim, DomainError>;

    /// Removes `host`'s room under `code`, if it is still open.
    async fn close_room(&self, code: &str, host: &str) -> Result<(), DomainError>;

    /// Joins the seeker queue. If another seeker is already waiting, the
    /// oldest one is dequeued, challenged and returned instead.
    async fn enlist_seeker(&self, username: &str) -> Result<Option<String>, DomainError>;

    /// Leaves the seeker queue. Returns whether the session was queued.
    async fn withdraw_seeker(&self, username: &str) -> Result<bool, DomainError>;

    /// Reads and clears `username`'s challenge mailbox.
    async fn take_challenge(&self, username: &str) -> Result<Option<Challenge>, DomainError>;

    /// Lists or refreshes a live character. A refresh keeps the original
    /// listing time.
    async fn publish(&self, listing: LiveListing) -> Result<(), DomainError>;

    /// Removes a live character from discovery.
    async fn delist(&self, username: &str) -> Result<(), DomainError>;

    /// Live characters other than `excluding`, longest-listed first.
    async fn live_characters(&self, excluding: &str) -> Result<Vec<LiveListing>, DomainError>;
}

#[derive(Debug, Default)]
struct DirectoryState {
    rooms: HashMap<String, MatchRoom>,
    seekers: VecDeque<String>,
    mailboxes: HashMap<String, Challenge>,
    listings: HashMap<String, LiveListing>,
}

/// A process-local directory serialized under a single lock.
#[derive(Debug, Default)]
pub struct InMemoryMatchDirectory {
    state: Mutex<DirectoryState>,
}

impl InMemoryMatchDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut DirectoryState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

#[async_trait]
impl MatchDirectory for InMemoryMatchDirectory {
    async fn open_room(&self, room: &MatchRoom, ttl: TimeDelta) -> Result<bool, DomainError> {
        Ok(self.with_state(|state| {
            if let Some(existing) = state.rooms.get(&room.code) {
                if !existing.is_expired(room.created_at, ttl) {
                    return false;
                }
            }
            state.rooms.insert(room.code.clone(), room.clone());
            true
        }))
    }

    async fn claim_room(
        &self,
        code: &str,
        guest: &str,
        now: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Result<RoomClaim, DomainError> {
        Ok(self.with_state(|state| {
            let Some(room) = state.rooms.get(code) else {
                return RoomClaim::Missing;
            };
            if room.is_expired(now, ttl) {
                state.rooms.remove(code);
                return RoomClaim::Missing;
            }
            if room.host == guest {
                return RoomClaim::OwnRoom;
            }
            let Some(room) = state.rooms.remove(code) else {
                return RoomClaim::Missing;
            };
            state.mailboxes.insert(
                room.host.clone(),
                Challenge {
                    challenger: guest.to_owned(),
                    room: Some(room.code.clone()),
                },
            );
            RoomClaim::Claimed(room)
        }))
    }

    async fn close_room(&self, code: &str, host: &str) -> Result<(), DomainError> {
        self.with_state(|state| {
            if state.rooms.get(code).is_some_and(|room| room.host == host) {
                state.rooms.remove(code);
            }
        });
        Ok(())
    }

    async fn enlist_seeker(&self, username: &str) -> Result<Option<String>, DomainError> {
        Ok(self.with_state(|state| {
            if let Some(position) = state.seekers.iter().position(|seeker| seeker != username) {
                let partner = state.seekers.remove(position)?;
                state.seekers.retain(|seeker| seeker != username);
                state.mailboxes.insert(
                    partner.clone(),
                    Challenge {
                        challenger: username.to_owned(),
                        room: None,
                    },
                );
                return Some(partner);
            }
            if !state.seekers.iter().any(|seeker| seeker == username) {
                state.seekers.push_back(username.to_owned());
            }
            None
        }))
    }

    async fn withdraw_seeker(&self, username: &str) -> Result<bool, DomainError> {
        Ok(self.with_state(|state| {
            let before = state.seekers.len();
            state.seekers.retain(|seeker| seeker != username);
            state.seekers.len() != before
        }))
    }

    async fn take_challenge(&self, username: &str) -> Result<Option<Challenge>, DomainError> {
        Ok(self.with_state(|state| state.mailboxes.remove(username)))
    }

    async fn publish(&self, listing: LiveListing) -> Result<(), DomainError> {
        self.with_state(|state| {
            let listed_at = state
                .listings
                .get(&listing.username)
                .map_or(listing.listed_at, |existing| existing.listed_at);
            state.listings.insert(
                listing.username.clone(),
                LiveListing {
                    listed_at,
                    ..listing
                },
            );
        });
        Ok(())
    }

    async fn delist(&self, username: &str) -> Result<(), DomainError> {
        self.with_state(|state| state.listings.remove(username));
        Ok(())
    }

    async fn live_characters(&self, excluding: &str) -> Result<Vec<LiveListing>, DomainError> {
        let mut listings: Vec<LiveListing> = self.with_state(|state| {
            state
                .listings
                .values()
                .filter(|listing| listing.username != excluding)
                .cloned()
                .collect()
        });
        listings.sort_by(|a, b| {
            a.listed_at
                .cmp(&b.listed_at)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(listings)
    }
}
