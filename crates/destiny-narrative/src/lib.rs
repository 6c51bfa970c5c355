//! Line of Destiny — Narrative Resolution bounded context.
//!
//! Responsible for the per-turn state transition: building the context
//! sent to the narrative oracle, validating what comes back, and folding
//! the resulting directive into the character and world.

pub mod application;
pub mod domain;
