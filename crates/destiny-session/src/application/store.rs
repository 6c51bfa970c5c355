//! Session store port and its implementations.
//!
//! Sessions are addressed only by username. The port has no enumeration
//! operation, so nothing can locate a session by scanning.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use destiny_core::error::DomainError;
use tracing::debug;

use crate::domain::user::{User, validate_username};

/// Keyed persistence for user records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the record stored under `username`.
    async fn get(&self, username: &str) -> Result<Option<User>, DomainError>;

    /// Stores `user` under its username, replacing any previous record.
    async fn put(&self, user: &User) -> Result<(), DomainError>;
}

/// A process-local store. Records are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, username: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.get(username).cloned())
    }

    async fn put(&self, user: &User) -> Result<(), DomainError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }
}

/// A store that keeps one JSON document per user in a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write never leaves a truncated record behind.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    /// Opens (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the directory cannot be
    /// created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            DomainError::Infrastructure(format!(
                "cannot create session directory {}: {e}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    /// The directory records live in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, username: &str) -> Result<PathBuf, DomainError> {
        validate_username(username)?;
        Ok(self.root.join(format!("{username}.json")))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, username: &str) -> Result<Option<User>, DomainError> {
        let path = self.path_for(username)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::Infrastructure(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        let user = serde_json::from_slice(&bytes).map_err(|e| {
            DomainError::Infrastructure(format!("corrupt session {}: {e}", path.display()))
        })?;
        Ok(Some(user))
    }

    async fn put(&self, user: &User) -> Result<(), DomainError> {
        let path = self.path_for(&user.username)?;
        let staging = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(user)
            .map_err(|e| DomainError::Infrastructure(format!("serialization failed: {e}")))?;
        tokio::fs::write(&staging, bytes).await.map_err(|e| {
            DomainError::Infrastructure(format!("cannot write {}: {e}", staging.display()))
        })?;
        tokio::fs::rename(&staging, &path).await.map_err(|e| {
            DomainError::Infrastructure(format!("cannot replace {}: {e}", path.display()))
        })?;
        debug!(username = %user.username, "session persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use destiny_test_support::curse_character;
    use destiny_world_state::NpcUpdate;

    fn active_user() -> User {
        let mut user = User::new("mahito", Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        user.begin_cycle(curse_character("Mahito")).unwrap();
        let mut world = user.world_state().unwrap().clone();
        world.apply_npc_update(&NpcUpdate {
            name: "Junpei".to_owned(),
            affinity_delta: 40,
            ..NpcUpdate::default()
        });
        world.record_consequence("Junpei skipped school.");
        user.replace_world(world).unwrap();
        user
    }

    #[tokio::test]
    async fn test_in_memory_store_returns_none_for_unknown_user() {
        let store = InMemorySessionStore::new();

        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_reload_equals_persisted_record() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        let user = active_user();

        // Act
        store.put(&user).await.unwrap();
        let reopened = FileSessionStore::open(dir.path()).await.unwrap();
        let loaded = reopened.get("mahito").await.unwrap();

        // Assert
        assert_eq!(loaded, Some(user));
        assert!(!dir.path().join("mahito.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_put_replaces_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        let mut user = active_user();
        store.put(&user).await.unwrap();

        user.record_match(true);
        store.put(&user).await.unwrap();

        let loaded = store.get("mahito").await.unwrap().unwrap();
        assert_eq!(loaded.pvp.wins, 1);
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_like_usernames() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();

        let result = store.get("../outside").await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_file_store_reports_corrupt_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        tokio::fs::write(dir.path().join("mahito.json"), b"{ not json")
            .await
            .unwrap();

        let result = store.get("mahito").await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
