//! Application services for the PvP context.

pub mod arena;
pub mod directory;
pub mod engine;
pub mod matchmaking;
pub mod roster;
