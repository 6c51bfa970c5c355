//! Context bundles sent to the oracle.
//!
//! Only semantic fields cross the oracle boundary. Portraits, item icons
//! and scene images have no counterpart in these types, so they cannot be
//! transmitted by accident.

use destiny_character::{Character, Grade, Item, Origin, Rarity, Slot, StatBonus, Stats};
use destiny_world_state::WorldState;
use serde::Serialize;

use super::message::{GameMessage, Role};

/// Character sheet as the oracle sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfile {
    pub name: String,
    pub origin: Origin,
    pub appearance: String,
    pub technique: String,
    pub technique_description: String,
    pub mastery: f64,
    pub grade: Grade,
    pub level: u32,
    pub xp: u64,
    pub stats: Stats,
    pub current_hp: u32,
    pub max_hp: u32,
    pub current_qi: u32,
    pub max_qi: u32,
    pub inventory: Vec<ItemProfile>,
}

/// Inventory entry as the oracle sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemProfile {
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    pub slot: Slot,
    pub bonus: StatBonus,
}

impl From<&Item> for ItemProfile {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            rarity: item.rarity,
            slot: item.slot,
            bonus: item.bonus,
        }
    }
}

impl From<&Character> for CharacterProfile {
    fn from(character: &Character) -> Self {
        Self {
            name: character.name.clone(),
            origin: character.origin,
            appearance: character.appearance.clone(),
            technique: character.technique.name.clone(),
            technique_description: character.technique.description.clone(),
            mastery: character.mastery,
            grade: character.grade,
            level: character.level,
            xp: character.xp,
            stats: character.stats,
            current_hp: character.current_hp,
            max_hp: character.max_hp(),
            current_qi: character.current_qi,
            max_qi: character.max_qi(),
            inventory: character.inventory.iter().map(ItemProfile::from).collect(),
        }
    }
}

/// Transcript entry as the oracle sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub kokusen: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consequence: Option<String>,
}

impl From<&GameMessage> for TranscriptEntry {
    fn from(message: &GameMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            kokusen: message.kokusen,
            consequence: message.consequence.clone(),
        }
    }
}

/// Everything the oracle needs to narrate one PvE turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnContext {
    pub origin: Origin,
    pub profile: CharacterProfile,
    pub location: String,
    pub recent: Vec<TranscriptEntry>,
    pub action: String,
}

impl TurnContext {
    /// Builds the sanitized context for a turn.
    #[must_use]
    pub fn build(
        character: &Character,
        world: &WorldState,
        transcript_tail: &[GameMessage],
        action: &str,
    ) -> Self {
        Self {
            origin: character.origin,
            profile: CharacterProfile::from(character),
            location: world.current_location.clone(),
            recent: transcript_tail.iter().map(TranscriptEntry::from).collect(),
            action: action.to_owned(),
        }
    }
}

/// One side of a PvP exchange as the oracle sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantProfile {
    pub name: String,
    pub origin: Origin,
    pub level: u32,
    pub technique: String,
    pub stats: Stats,
    pub current_hp: u32,
    pub current_qi: u32,
}

impl From<&Character> for CombatantProfile {
    fn from(character: &Character) -> Self {
        Self {
            name: character.name.clone(),
            origin: character.origin,
            level: character.level,
            technique: character.technique.name.clone(),
            stats: character.stats,
            current_hp: character.current_hp,
            current_qi: character.current_qi,
        }
    }
}

/// Both sides of a PvP turn, submitted together for arbitration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrationRequest {
    pub p1: CombatantProfile,
    pub p1_action: String,
    pub p2: CombatantProfile,
    pub p2_action: String,
}
