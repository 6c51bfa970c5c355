//! Line of Destiny — World State bounded context.
//!
//! Responsible for the persistent world around a character: the current
//! narrative arc and its progress, location, canon divergence, and the
//! ledger of NPC relationships.

pub mod domain;

pub use domain::arc::{ArcDefinition, ArcProgressTracker, TIMELINE};
pub use domain::ledger::{NpcChange, NpcRelationship, NpcRelationshipLedger, NpcUpdate};
pub use domain::world::WorldState;
