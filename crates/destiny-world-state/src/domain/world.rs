//! The world around a character.

use std::collections::BTreeSet;

use destiny_character::Origin;
use destiny_core::error::DomainError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::arc::{ArcDefinition, ArcProgressTracker, TIMELINE};
use super::ledger::{NpcChange, NpcRelationshipLedger, NpcUpdate};

/// Persistent world state owned by one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Current arc and its completion percentage.
    pub arc: ArcProgressTracker,
    pub current_location: String,
    /// How far the story has drifted from canon.
    pub divergence: u32,
    /// Ordered log of notable changes, oldest first.
    #[serde(default)]
    pub notable_changes: Vec<String>,
    #[serde(default)]
    pub binding_vows: BTreeSet<String>,
    /// NPC deaths witnessed during the current arc.
    #[serde(default)]
    pub deaths_in_arc: u32,
    #[serde(default)]
    pub npcs: NpcRelationshipLedger,
}

impl WorldState {
    /// The opening world for a new character of `origin`.
    ///
    /// Sorcerers arrive at Jujutsu High; curses are born somewhere hostile.
    #[must_use]
    pub fn starting_for(origin: Origin) -> Self {
        let location = match origin {
            Origin::Sorcerer => "Jujutsu High Gate - Tokyo",
            Origin::Curse => "Abandoned sewers beneath Tokyo",
        };
        Self {
            arc: ArcProgressTracker::new(TIMELINE[0].id),
            current_location: location.to_owned(),
            divergence: 0,
            notable_changes: Vec::new(),
            binding_vows: BTreeSet::new(),
            deaths_in_arc: 0,
            npcs: NpcRelationshipLedger::new(),
        }
    }

    /// Merges an NPC update. A death during the arc bumps the death counter.
    pub fn apply_npc_update(&mut self, update: &NpcUpdate) -> NpcChange {
        let change = self.npcs.apply(update);
        if change.died {
            self.deaths_in_arc = self.deaths_in_arc.saturating_add(1);
        }
        debug!(npc = %update.name, newly_met = change.newly_met, died = change.died, "npc ledger updated");
        change
    }

    /// Advances arc progress, clamped to `0..=100`.
    pub fn advance_arc(&mut self, delta: f64) -> f64 {
        self.arc.advance(delta)
    }

    /// Logs a consequence that diverges from canon.
    pub fn record_consequence(&mut self, consequence: &str) {
        let consequence = consequence.trim();
        if consequence.is_empty() {
            return;
        }
        self.notable_changes.push(consequence.to_owned());
        self.divergence = self.divergence.saturating_add(1);
    }

    /// Moves the world into another known arc, resetting arc progress and
    /// the per-arc death counter.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `arc_id` is not a known arc.
    pub fn enter_arc(&mut self, arc_id: &str) -> Result<(), DomainError> {
        let arc = ArcDefinition::find(arc_id)
            .ok_or_else(|| DomainError::Validation(format!("unknown arc: {arc_id}")))?;
        self.arc.restart(arc.id);
        self.deaths_in_arc = 0;
        Ok(())
    }
}
