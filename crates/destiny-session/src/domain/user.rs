//! The persisted per-user record.

use chrono::{DateTime, Utc};
use destiny_character::{Character, Origin};
use destiny_core::error::DomainError;
use destiny_world_state::WorldState;
use serde::{Deserialize, Serialize};

/// Longest accepted username.
pub const MAX_USERNAME_LEN: usize = 64;

/// Checks that `username` is usable as a store key.
///
/// # Errors
///
/// Returns `DomainError::Validation` unless the name is 1 to 64 ASCII
/// letters, digits, `_` or `-`.
pub fn validate_username(username: &str) -> Result<(), DomainError> {
    if username.is_empty() || username.len() > MAX_USERNAME_LEN {
        return Err(DomainError::Validation(format!(
            "username must be 1 to {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(DomainError::Validation(format!(
            "username {username:?} may only contain letters, digits, '_' and '-'"
        )));
    }
    Ok(())
}

/// What remains of a character after permanent death.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epitaph {
    pub name: String,
    pub origin: Origin,
    pub level: u32,
    /// Arc the character died in.
    pub arc_id: String,
    pub died_at: DateTime<Utc>,
}

/// Where a user's current cycle stands.
///
/// There is no way back from `Deceased` to the same character: only a new
/// cycle, started with a freshly created character, leaves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lifecycle {
    /// No character has been created yet.
    Unborn,
    /// A living character and the world around it.
    Active {
        character: Character,
        world_state: WorldState,
    },
    /// The last character died.
    Deceased { epitaph: Epitaph },
}

/// Per-user preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether turn reports carry scene prompts for image generation.
    pub image_generation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_generation: true,
        }
    }
}

/// Lifetime PvP results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvpRecord {
    pub wins: u32,
    pub losses: u32,
}

/// The record a session store keeps per username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub lifecycle: Lifecycle,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub pvp: PvpRecord,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A fresh user with no character.
    #[must_use]
    pub fn new(username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            lifecycle: Lifecycle::Unborn,
            settings: Settings::default(),
            pvp: PvpRecord::default(),
            created_at: now,
        }
    }

    /// The living character, if any.
    #[must_use]
    pub fn character(&self) -> Option<&Character> {
        match &self.lifecycle {
            Lifecycle::Active { character, .. } => Some(character),
            Lifecycle::Unborn | Lifecycle::Deceased { .. } => None,
        }
    }

    /// The living character's world, if any.
    #[must_use]
    pub fn world_state(&self) -> Option<&WorldState> {
        match &self.lifecycle {
            Lifecycle::Active { world_state, .. } => Some(world_state),
            Lifecycle::Unborn | Lifecycle::Deceased { .. } => None,
        }
    }

    /// The epitaph of the last character, if it died.
    #[must_use]
    pub fn epitaph(&self) -> Option<&Epitaph> {
        match &self.lifecycle {
            Lifecycle::Deceased { epitaph } => Some(epitaph),
            Lifecycle::Unborn | Lifecycle::Active { .. } => None,
        }
    }

    /// Starts a new cycle with `character` in its origin's opening world.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if a character is already alive, or
    /// `DomainError::Validation` if the character breaks a sheet invariant.
    pub fn begin_cycle(&mut self, character: Character) -> Result<(), DomainError> {
        if let Lifecycle::Active { character: alive, .. } = &self.lifecycle {
            return Err(DomainError::Conflict(format!(
                "{} already plays {}",
                self.username, alive.name
            )));
        }
        character.validate()?;
        let world_state = WorldState::starting_for(character.origin);
        self.lifecycle = Lifecycle::Active {
            character,
            world_state,
        };
        Ok(())
    }

    /// Replaces the living character's sheet.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if there is no living character, or
    /// `DomainError::Validation` if the new sheet breaks an invariant.
    pub fn replace_character(&mut self, updated: Character) -> Result<(), DomainError> {
        updated.validate()?;
        match &mut self.lifecycle {
            Lifecycle::Active { character, .. } => {
                *character = updated;
                Ok(())
            }
            Lifecycle::Unborn | Lifecycle::Deceased { .. } => Err(self.not_alive()),
        }
    }

    /// Replaces the living character's world.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if there is no living character.
    pub fn replace_world(&mut self, updated: WorldState) -> Result<(), DomainError> {
        match &mut self.lifecycle {
            Lifecycle::Active { world_state, .. } => {
                *world_state = updated;
                Ok(())
            }
            Lifecycle::Unborn | Lifecycle::Deceased { .. } => Err(self.not_alive()),
        }
    }

    /// Kills the living character.
    ///
    /// Returns the new epitaph, or `None` if the character was already
    /// dead, in which case nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if no character was ever created.
    pub fn die(&mut self, now: DateTime<Utc>) -> Result<Option<Epitaph>, DomainError> {
        let epitaph = match &self.lifecycle {
            Lifecycle::Active {
                character,
                world_state,
            } => Epitaph {
                name: character.name.clone(),
                origin: character.origin,
                level: character.level,
                arc_id: world_state.arc.arc_id.clone(),
                died_at: now,
            },
            Lifecycle::Deceased { .. } => return Ok(None),
            Lifecycle::Unborn => return Err(self.not_alive()),
        };
        self.lifecycle = Lifecycle::Deceased {
            epitaph: epitaph.clone(),
        };
        Ok(Some(epitaph))
    }

    /// Records the result of a finished PvP match.
    pub fn record_match(&mut self, won: bool) {
        if won {
            self.pvp.wins = self.pvp.wins.saturating_add(1);
        } else {
            self.pvp.losses = self.pvp.losses.saturating_add(1);
        }
    }

    fn not_alive(&self) -> DomainError {
        DomainError::Conflict(format!("{} has no living character", self.username))
    }
}
