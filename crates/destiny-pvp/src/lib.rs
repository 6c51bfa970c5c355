//! Line of Destiny — PvP Matchmaking & Battle bounded context.
//!
//! Responsible for pairing two sessions (private room codes, a FIFO seeker
//! queue and discovery among live characters), and for the turn loop of a
//! duel arbitrated by the narrative oracle.

pub mod application;
pub mod domain;
