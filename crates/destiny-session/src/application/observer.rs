//! Hooks fired after a session's lifecycle changes have been persisted.

use async_trait::async_trait;
use destiny_character::Character;

use crate::domain::user::Epitaph;

/// Receives lifecycle notifications from the session service.
///
/// Every method defaults to doing nothing, so an observer only implements
/// the transitions it cares about.
#[async_trait]
pub trait SessionObserver: Send + Sync {
    /// A new cycle began with `character`.
    async fn character_ready(&self, _username: &str, _character: &Character) {}

    /// The living character's sheet changed.
    async fn character_updated(&self, _username: &str, _character: &Character) {}

    /// The living character died.
    async fn permadeath(&self, _username: &str, _epitaph: &Epitaph) {}
}
