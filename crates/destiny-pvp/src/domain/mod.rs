//! Domain model for the PvP context.

pub mod battle;
pub mod pairing;
pub mod room;
