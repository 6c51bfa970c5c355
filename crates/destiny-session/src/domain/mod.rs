//! Domain model for the Session & Persistence context.

pub mod user;
