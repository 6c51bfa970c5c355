//! NPC relationship ledger.
//!
//! Entries are created lazily the first time an NPC is referenced and are
//! never removed: a dead NPC stays in the ledger with `alive = false`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upper bound of affinity.
pub const AFFINITY_CAP: u32 = 100;

/// Status given to an NPC the player has just met.
pub const NEWLY_MET_STATUS: &str = "newly met";

/// Location recorded for an NPC whose whereabouts are unknown.
pub const UNKNOWN_LOCATION: &str = "unknown";

/// The player's relationship with one NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcRelationship {
    pub name: String,
    /// Relationship strength, `0..=100`.
    pub affinity: u32,
    pub status: String,
    pub alive: bool,
    pub last_known_location: String,
    pub last_interaction_summary: String,
}

impl NpcRelationship {
    fn newly_met(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            affinity: 0,
            status: NEWLY_MET_STATUS.to_owned(),
            alive: true,
            last_known_location: UNKNOWN_LOCATION.to_owned(),
            last_interaction_summary: String::new(),
        }
    }
}

/// One relationship update, as carried by an oracle directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NpcUpdate {
    pub name: String,
    pub affinity_delta: i32,
    pub new_status: Option<String>,
    pub alive: Option<bool>,
    pub location: Option<String>,
    pub summary: Option<String>,
}

/// What an update did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpcChange {
    /// The entry was materialized by this update.
    pub newly_met: bool,
    /// The NPC went from alive to dead.
    pub died: bool,
}

/// Mapping of NPC name to relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcRelationshipLedger(BTreeMap<String, NpcRelationship>);

impl NpcRelationshipLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the relationship with `name`, if the NPC has been met.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NpcRelationship> {
        self.0.get(name)
    }

    /// Number of NPCs met so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no NPC has been met yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over relationships in name order.
    pub fn iter(&self) -> impl Iterator<Item = &NpcRelationship> {
        self.0.values()
    }

    /// Merges `update` into the ledger.
    ///
    /// Affinity is clamped to `0..=100` after adding the delta. Status,
    /// alive flag, location and summary are replaced only when the update
    /// supplies them.
    pub fn apply(&mut self, update: &NpcUpdate) -> NpcChange {
        let newly_met = !self.0.contains_key(&update.name);
        let entry = self
            .0
            .entry(update.name.clone())
            .or_insert_with(|| NpcRelationship::newly_met(&update.name));
        let was_alive = entry.alive;

        let affinity = i64::from(entry.affinity) + i64::from(update.affinity_delta);
        entry.affinity = u32::try_from(affinity.clamp(0, i64::from(AFFINITY_CAP)))
            .unwrap_or(AFFINITY_CAP);

        if let Some(status) = &update.new_status {
            entry.status.clone_from(status);
        }
        if let Some(alive) = update.alive {
            entry.alive = alive;
        }
        if let Some(location) = &update.location {
            entry.last_known_location.clone_from(location);
        }
        if let Some(summary) = &update.summary {
            entry.last_interaction_summary.clone_from(summary);
        }

        NpcChange {
            newly_met,
            died: was_alive && !entry.alive,
        }
    }
}
