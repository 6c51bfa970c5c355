//! Domain model for the Narrative Resolution context.

pub mod context;
pub mod directive;
pub mod fold;
pub mod message;
