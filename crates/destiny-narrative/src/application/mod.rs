//! Application services for the Narrative Resolution context.

pub mod oracle;
pub mod resolver;
