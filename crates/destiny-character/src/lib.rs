//! Line of Destiny — Character bounded context.
//!
//! Responsible for the character sheet: origin, technique and mastery,
//! grade, experience, stats, vitality/energy pools and inventory.

pub mod domain;

pub use domain::character::{Character, Grade, Origin, Stats, Technique};
pub use domain::items::{Item, Rarity, Slot, StatBonus};
