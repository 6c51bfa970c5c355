//! Test oracles — scripted `NarrativeOracle` implementations for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use destiny_narrative::application::oracle::{NarrativeOracle, OracleError};
use destiny_narrative::domain::context::{ArbitrationRequest, TurnContext};
use destiny_narrative::domain::directive::{ArbitrationResult, Directive};

/// An oracle that answers from queued results and records every request.
///
/// When a queue runs dry the oracle reports `Unavailable`, so a test that
/// under-scripts fails loudly on the fallback path instead of hanging.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    turns: Mutex<VecDeque<Result<Directive, OracleError>>>,
    arbitrations: Mutex<VecDeque<Result<ArbitrationResult, OracleError>>>,
    seen_turns: Mutex<Vec<TurnContext>>,
    seen_arbitrations: Mutex<Vec<ArbitrationRequest>>,
}

impl ScriptedOracle {
    /// Creates an oracle with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the answer to the next `generate_turn` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_turn(self, answer: Result<Directive, OracleError>) -> Self {
        self.turns.lock().unwrap().push_back(answer);
        self
    }

    /// Queues the answer to the next `arbitrate` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_arbitration(self, answer: Result<ArbitrationResult, OracleError>) -> Self {
        self.arbitrations.lock().unwrap().push_back(answer);
        self
    }

    /// Returns every turn context the oracle was asked about.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seen_turns(&self) -> Vec<TurnContext> {
        self.seen_turns.lock().unwrap().clone()
    }

    /// Returns every arbitration request the oracle received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seen_arbitrations(&self) -> Vec<ArbitrationRequest> {
        self.seen_arbitrations.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrativeOracle for ScriptedOracle {
    async fn generate_turn(&self, context: &TurnContext) -> Result<Directive, OracleError> {
        self.seen_turns.lock().unwrap().push(context.clone());
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".into())))
    }

    async fn arbitrate(
        &self,
        request: &ArbitrationRequest,
    ) -> Result<ArbitrationResult, OracleError> {
        self.seen_arbitrations.lock().unwrap().push(request.clone());
        self.arbitrations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".into())))
    }
}

/// An oracle that is always down. Useful for testing fallback paths.
#[derive(Debug)]
pub struct FailingOracle;

#[async_trait]
impl NarrativeOracle for FailingOracle {
    async fn generate_turn(&self, _context: &TurnContext) -> Result<Directive, OracleError> {
        Err(OracleError::Unavailable("connection refused".into()))
    }

    async fn arbitrate(
        &self,
        _request: &ArbitrationRequest,
    ) -> Result<ArbitrationResult, OracleError> {
        Err(OracleError::Unavailable("connection refused".into()))
    }
}
