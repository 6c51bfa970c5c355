//! Ready-made characters.

use destiny_character::{Character, Origin, Technique};

/// A fresh level-1 sorcerer (max HP 200, max qi 150).
#[must_use]
pub fn sorcerer_character(name: &str) -> Character {
    Character::new(
        name,
        Origin::Sorcerer,
        Technique {
            name: "Divergent Fist".to_owned(),
            description: "A punch whose cursed energy lands a beat late.".to_owned(),
        },
    )
}

/// A fresh level-1 curse (max HP 300, max qi 180).
#[must_use]
pub fn curse_character(name: &str) -> Character {
    Character::new(
        name,
        Origin::Curse,
        Technique {
            name: "Disaster Flames".to_owned(),
            description: "Volcanic heat drawn from the fear of the earth.".to_owned(),
        },
    )
}
