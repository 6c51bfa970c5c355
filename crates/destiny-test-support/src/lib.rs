//! Shared test mocks and utilities for the Line of Destiny session engine.

mod clock;
mod fixtures;
mod oracle;
mod rng;

pub use clock::FixedClock;
pub use fixtures::{curse_character, sorcerer_character};
pub use oracle::{FailingOracle, ScriptedOracle};
pub use rng::{MockRng, SequenceRng};
