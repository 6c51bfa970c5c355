//! Route modules organized by bounded context.

pub mod health;
pub mod pvp;
pub mod session;
