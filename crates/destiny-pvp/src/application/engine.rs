//! The PvP turn loop: submit both actions, arbitrate, apply.

use std::sync::Arc;
use std::time::Duration;

use destiny_character::Character;
use destiny_core::error::DomainError;
use destiny_narrative::application::oracle::{NarrativeOracle, OracleError};
use destiny_narrative::domain::context::ArbitrationRequest;
use destiny_narrative::domain::message::GameMessage;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::battle::{Battle, MatchResult};

/// Why a duel turn did not resolve.
#[derive(Debug, Error)]
pub enum BattleError {
    /// Arbitration failed. The match is void and nothing was applied.
    #[error("the duel collapsed: {0}")]
    Aborted(OracleError),

    #[error("a turn is already being resolved")]
    Busy,

    #[error("the duel is already over")]
    Finished,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// One resolved exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleTurn {
    /// Player, opponent and narrator records, in that order.
    pub messages: Vec<GameMessage>,
    pub local: Character,
    pub remote: Character,
    /// Set when the exchange ended the duel.
    pub result: Option<MatchResult>,
}

/// Resolves duel turns through the oracle's arbitration contract.
pub struct PvpBattleEngine {
    oracle: Arc<dyn NarrativeOracle>,
    deadline: Duration,
}

impl PvpBattleEngine {
    #[must_use]
    pub fn new(oracle: Arc<dyn NarrativeOracle>, deadline: Duration) -> Self {
        Self { oracle, deadline }
    }

    /// Submits both actions for arbitration and applies the result to both
    /// sides at once.
    ///
    /// # Errors
    ///
    /// Returns `BattleError::Finished` once the duel has a result,
    /// `BattleError::Domain` for an empty action, and `BattleError::Aborted`
    /// if the oracle fails or misses its deadline. An aborted turn applies
    /// no damage.
    pub async fn play_turn(
        &self,
        battle: &mut Battle,
        local_action: &str,
        remote_action: &str,
    ) -> Result<BattleTurn, BattleError> {
        if battle.is_over() {
            return Err(BattleError::Finished);
        }
        let local_action = local_action.trim();
        if local_action.is_empty() {
            return Err(DomainError::Validation("an action is required".to_owned()).into());
        }

        let request = ArbitrationRequest {
            p1: (&battle.local).into(),
            p1_action: local_action.to_owned(),
            p2: (&battle.remote).into(),
            p2_action: remote_action.to_owned(),
        };
        let arbitration = match tokio::time::timeout(self.deadline, self.oracle.arbitrate(&request)).await {
            Ok(Ok(arbitration)) => arbitration,
            Ok(Err(error)) => {
                warn!(error = %error, "arbitration failed, aborting the duel");
                return Err(BattleError::Aborted(error));
            }
            Err(_) => {
                warn!("arbitration deadline exceeded, aborting the duel");
                return Err(BattleError::Aborted(OracleError::DeadlineExceeded));
            }
        };
        if let Some(winner) = arbitration.winner {
            debug!(declared = ?winner, "arbitration declared a winner");
        }

        let messages = battle.apply(local_action, remote_action, &arbitration);
        info!(
            local_hp = battle.local.current_hp,
            remote_hp = battle.remote.current_hp,
            kokusen = arbitration.kokusen,
            result = ?battle.result,
            "duel turn resolved"
        );
        Ok(BattleTurn {
            messages,
            local: battle.local.clone(),
            remote: battle.remote.clone(),
            result: battle.result,
        })
    }
}
