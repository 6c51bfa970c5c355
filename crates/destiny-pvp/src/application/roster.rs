//! Keeps the directory's live listings in step with session lifecycles.

use std::sync::Arc;

use async_trait::async_trait;
use destiny_character::Character;
use destiny_core::clock::Clock;
use destiny_session::application::observer::SessionObserver;
use destiny_session::domain::user::Epitaph;
use tracing::warn;

use super::directory::MatchDirectory;
use crate::domain::pairing::LiveListing;

/// Publishes living characters for discovery and withdraws the dead.
pub struct LiveRoster {
    directory: Arc<dyn MatchDirectory>,
    clock: Arc<dyn Clock>,
}

impl LiveRoster {
    #[must_use]
    pub fn new(directory: Arc<dyn MatchDirectory>, clock: Arc<dyn Clock>) -> Self {
        Self { directory, clock }
    }

    async fn publish(&self, username: &str, character: &Character) {
        let listing = LiveListing {
            username: username.to_owned(),
            character: character.clone(),
            listed_at: self.clock.now(),
        };
        if let Err(e) = self.directory.publish(listing).await {
            warn!(username, error = %e, "could not publish live character");
        }
    }
}

#[async_trait]
impl SessionObserver for LiveRoster {
    async fn character_ready(&self, username: &str, character: &Character) {
        self.publish(username, character).await;
    }

    async fn character_updated(&self, username: &str, character: &Character) {
        self.publish(username, character).await;
    }

    async fn permadeath(&self, username: &str, _epitaph: &Epitaph) {
        if let Err(e) = self.directory.delist(username).await {
            warn!(username, error = %e, "could not delist dead character");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::directory::InMemoryMatchDirectory;
    use chrono::{TimeZone, Utc};
    use destiny_character::Origin;
    use destiny_test_support::{FixedClock, curse_character};

    #[tokio::test]
    async fn test_roster_follows_lifecycle() {
        // Arrange
        let directory = Arc::new(InMemoryMatchDirectory::new());
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 20, 0, 0).unwrap();
        let roster = LiveRoster::new(directory.clone(), Arc::new(FixedClock(now)));
        let jogo = curse_character("Jogo");

        // Act
        roster.character_ready("jogo", &jogo).await;
        let listed = directory.live_characters("someone").await.unwrap();
        roster
            .permadeath(
                "jogo",
                &Epitaph {
                    name: "Jogo".to_owned(),
                    origin: Origin::Curse,
                    level: 1,
                    arc_id: "shibuya".to_owned(),
                    died_at: now,
                },
            )
            .await;
        let after = directory.live_characters("someone").await.unwrap();

        // Assert
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].character, jogo);
        assert!(after.is_empty());
    }
}
