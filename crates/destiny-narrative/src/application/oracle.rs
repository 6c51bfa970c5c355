//! Narrative oracle port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::context::{ArbitrationRequest, TurnContext};
use crate::domain::directive::{ArbitrationResult, Directive, SchemaViolation};

/// Why the oracle could not produce a usable answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Network, transport or upstream failure.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// The oracle answered, but the answer failed schema validation.
    #[error("malformed directive: {0}")]
    MalformedDirective(String),

    /// The oracle did not answer before the deadline.
    #[error("oracle deadline exceeded")]
    DeadlineExceeded,
}

impl From<SchemaViolation> for OracleError {
    fn from(violation: SchemaViolation) -> Self {
        Self::MalformedDirective(violation.0)
    }
}

/// External narrative generation and combat arbitration service.
#[async_trait]
pub trait NarrativeOracle: Send + Sync {
    /// Narrates one PvE turn.
    async fn generate_turn(&self, context: &TurnContext) -> Result<Directive, OracleError>;

    /// Arbitrates one PvP exchange between two submitted actions.
    async fn arbitrate(
        &self,
        request: &ArbitrationRequest,
    ) -> Result<ArbitrationResult, OracleError>;
}
