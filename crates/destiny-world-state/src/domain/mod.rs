//! Domain model for the World State context.

pub mod arc;
pub mod ledger;
pub mod world;
