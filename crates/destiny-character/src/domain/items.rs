//! Inventory items.

use serde::{Deserialize, Serialize};

/// Item rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    SpecialGrade,
}

/// Equipment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Weapon,
    Garment,
    Amulet,
}

/// Flat bonus an item grants to the stat block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBonus {
    #[serde(default)]
    pub strength: u32,
    #[serde(default)]
    pub energy: u32,
    #[serde(default)]
    pub qi: u32,
    #[serde(default)]
    pub luck: u32,
}

/// An inventory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    pub slot: Slot,
    #[serde(default)]
    pub bonus: StatBonus,
    /// Reference to the item's icon. Never sent to the oracle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}
