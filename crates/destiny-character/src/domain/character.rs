//! The character sheet and its invariants.

use destiny_core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::items::Item;

/// Vitality granted per point of strength.
pub const HP_PER_STRENGTH: u32 = 20;
/// Cursed energy granted per point of energy.
pub const QI_PER_ENERGY: u32 = 15;
/// Upper bound of technique mastery, in percent.
pub const MASTERY_CAP: f64 = 100.0;

/// Where a character comes from. Drives starting stats and location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A human sorcerer enrolled at Jujutsu High.
    Sorcerer,
    /// A cursed spirit newly born from human fear.
    Curse,
}

impl Origin {
    /// Starting stat block for a freshly created character of this origin.
    #[must_use]
    pub fn starting_stats(self) -> Stats {
        match self {
            Self::Sorcerer => Stats {
                strength: 10,
                energy: 10,
                qi: 10,
                luck: 7,
            },
            Self::Curse => Stats {
                strength: 15,
                energy: 12,
                qi: 15,
                luck: 3,
            },
        }
    }
}

/// Sorcerer grade ladder, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Grade4,
    SemiGrade3,
    Grade3,
    SemiGrade2,
    Grade2,
    SemiGrade1,
    Grade1,
    SpecialGrade,
}

/// The stat block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub strength: u32,
    pub energy: u32,
    pub qi: u32,
    pub luck: u32,
}

/// The cursed technique a character wields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub name: String,
    pub description: String,
}

/// A player character.
///
/// Vitality (`current_hp`) and cursed energy (`current_qi`) are bounded by
/// stat-derived maxima; every mutator on this type clamps into those bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Display name.
    pub name: String,
    /// Sorcerer or curse.
    pub origin: Origin,
    /// Free-text appearance used by the portrait collaborator.
    #[serde(default)]
    pub appearance: String,
    /// Current technique.
    pub technique: Technique,
    /// Technique mastery percentage, `0..=100`.
    pub mastery: f64,
    /// Grade tier.
    pub grade: Grade,
    pub level: u32,
    pub xp: u64,
    pub next_level_xp: u64,
    /// Gacha spin currency.
    pub spins: u32,
    pub stats: Stats,
    pub current_hp: u32,
    pub current_qi: u32,
    #[serde(default)]
    pub inventory: Vec<Item>,
    /// Reference to the generated portrait. Never sent to the oracle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<String>,
}

impl Character {
    /// Creates a level 1 character with the origin's starting stats and
    /// full vitality and energy.
    #[must_use]
    pub fn new(name: impl Into<String>, origin: Origin, technique: Technique) -> Self {
        let stats = origin.starting_stats();
        let mut character = Self {
            name: name.into(),
            origin,
            appearance: String::new(),
            technique,
            mastery: 5.0,
            grade: Grade::Grade4,
            level: 1,
            xp: 0,
            next_level_xp: 500,
            spins: 5,
            stats,
            current_hp: 0,
            current_qi: 0,
            inventory: Vec::new(),
            portrait: None,
        };
        character.current_hp = character.max_hp();
        character.current_qi = character.max_qi();
        character
    }

    /// Maximum vitality: `strength * 20`.
    #[must_use]
    pub fn max_hp(&self) -> u32 {
        self.stats.strength.saturating_mul(HP_PER_STRENGTH)
    }

    /// Maximum cursed energy: `energy * 15`.
    #[must_use]
    pub fn max_qi(&self) -> u32 {
        self.stats.energy.saturating_mul(QI_PER_ENERGY)
    }

    /// Adds a signed vitality delta, clamped to `[0, max_hp]`.
    pub fn apply_hp_delta(&mut self, delta: i64) {
        self.current_hp = clamp_pool(i64::from(self.current_hp).saturating_add(delta), self.max_hp());
    }

    /// Subtracts incoming damage from vitality, clamped to `[0, max_hp]`.
    pub fn take_damage(&mut self, damage: i64) {
        self.apply_hp_delta(damage.saturating_neg());
    }

    /// Subtracts a qi cost, clamped to `[0, max_qi]`. A negative cost
    /// restores energy.
    pub fn spend_qi(&mut self, cost: i64) {
        self.current_qi = clamp_pool(i64::from(self.current_qi).saturating_sub(cost), self.max_qi());
    }

    /// Adds an experience delta. Leveling is decided elsewhere.
    pub fn gain_xp(&mut self, delta: i64) {
        self.xp = self.xp.saturating_add_signed(delta);
    }

    /// Raises technique mastery by `increment`, capped at 100.
    pub fn raise_mastery(&mut self, increment: f64) {
        if increment.is_finite() && increment > 0.0 {
            self.mastery = (self.mastery + increment).min(MASTERY_CAP);
        }
    }

    /// Whether vitality has reached zero.
    #[must_use]
    pub fn is_down(&self) -> bool {
        self.current_hp == 0
    }

    /// Checks the character sheet invariants.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the first violated invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation(
                "character name must not be empty".to_owned(),
            ));
        }
        if self.current_hp > self.max_hp() {
            return Err(DomainError::Validation(format!(
                "current hp {} exceeds maximum {}",
                self.current_hp,
                self.max_hp()
            )));
        }
        if self.current_qi > self.max_qi() {
            return Err(DomainError::Validation(format!(
                "current qi {} exceeds maximum {}",
                self.current_qi,
                self.max_qi()
            )));
        }
        if !self.mastery.is_finite() || !(0.0..=MASTERY_CAP).contains(&self.mastery) {
            return Err(DomainError::Validation(format!(
                "mastery {} must be within 0..=100",
                self.mastery
            )));
        }
        Ok(())
    }
}

fn clamp_pool(value: i64, max: u32) -> u32 {
    u32::try_from(value.clamp(0, i64::from(max))).unwrap_or(max)
}
