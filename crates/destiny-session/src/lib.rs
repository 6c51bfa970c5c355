//! Line of Destiny — Session & Persistence bounded context.
//!
//! Responsible for the per-user record (character, world, settings and
//! PvP record) and its lifecycle, the keyed session store, and the
//! boundary calls that drive a session from character creation through
//! play to permanent death.

pub mod application;
pub mod domain;
