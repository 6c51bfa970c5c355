//! Per-user PvP seats tying matchmaking, duels and the session together.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use destiny_core::clock::Clock;
use destiny_core::error::DomainError;
use destiny_core::rng::DeterministicRng;
use destiny_session::application::service::{GameStage, SessionService};
use serde::Serialize;
use tracing::{info, instrument};

use super::directory::MatchDirectory;
use super::engine::{BattleError, BattleTurn, PvpBattleEngine};
use super::matchmaking::{MatchError, MatchmakingConfig, MatchmakingCoordinator};
use crate::domain::battle::{Battle, MatchResult, opponent_action};
use crate::domain::pairing::MatchPhase;

/// Builds a fresh random source for each seat.
pub type RngFactory = Arc<dyn Fn() -> Box<dyn DeterministicRng> + Send + Sync>;

/// What a user sees in the arena.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArenaStatus {
    pub phase: MatchPhase,
    pub battle: Option<Battle>,
}

struct Duel {
    battle: Option<Battle>,
    rng: Box<dyn DeterministicRng>,
}

struct Seat {
    coordinator: MatchmakingCoordinator,
    duel: tokio::sync::Mutex<Duel>,
}

/// The PvP arena. A user holds a seat from entering the lobby until the
/// duel ends or they leave.
pub struct Arena {
    sessions: Arc<SessionService>,
    directory: Arc<dyn MatchDirectory>,
    engine: PvpBattleEngine,
    clock: Arc<dyn Clock>,
    config: MatchmakingConfig,
    rng_factory: RngFactory,
    seats: Mutex<HashMap<String, Arc<Seat>>>,
}

impl Arena {
    #[must_use]
    pub fn new(
        sessions: Arc<SessionService>,
        directory: Arc<dyn MatchDirectory>,
        engine: PvpBattleEngine,
        clock: Arc<dyn Clock>,
        config: MatchmakingConfig,
        rng_factory: RngFactory,
    ) -> Self {
        Self {
            sessions,
            directory,
            engine,
            clock,
            config,
            rng_factory,
            seats: Mutex::new(HashMap::new()),
        }
    }

    /// Takes a seat in the lobby. Entering again returns the current
    /// status.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` unless the user has a living
    /// character and is exploring, or the session's own errors.
    #[instrument(skip(self))]
    pub async fn enter(&self, username: &str) -> Result<ArenaStatus, DomainError> {
        if self.seat(username).is_ok() {
            return self.status(username).await;
        }
        let view = self.sessions.session(username).await?;
        if view.stage != GameStage::Playing {
            return Err(DomainError::Conflict(format!(
                "{username} cannot enter the arena from {:?}",
                view.stage
            )));
        }
        self.sessions.enter_battle(username)?;

        let seat = Arc::new(Seat {
            coordinator: MatchmakingCoordinator::new(
                username,
                Arc::clone(&self.directory),
                self.sessions.store(),
                Arc::clone(&self.clock),
                (self.rng_factory)(),
                self.config.clone(),
            ),
            duel: tokio::sync::Mutex::new(Duel {
                battle: None,
                rng: (self.rng_factory)(),
            }),
        });
        self.seats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(username.to_owned(), seat);
        info!(username, "entered the arena");
        self.status(username).await
    }

    /// Opens a private room. Returns the code to share.
    ///
    /// # Errors
    ///
    /// See [`MatchmakingCoordinator::create_room`].
    pub async fn create_room(&self, username: &str) -> Result<String, MatchError> {
        self.seat(username)?.coordinator.create_room().await
    }

    /// Joins a private room by code.
    ///
    /// # Errors
    ///
    /// See [`MatchmakingCoordinator::join_room`].
    pub async fn join_room(&self, username: &str, code: &str) -> Result<ArenaStatus, MatchError> {
        self.seat(username)?.coordinator.join_room(code).await?;
        Ok(self.status(username).await?)
    }

    /// Starts a random search.
    ///
    /// # Errors
    ///
    /// See [`MatchmakingCoordinator::start_search`].
    pub async fn start_search(&self, username: &str) -> Result<ArenaStatus, MatchError> {
        self.seat(username)?.coordinator.start_search().await?;
        Ok(self.status(username).await?)
    }

    /// Stops a search or closes a room.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the user holds no seat.
    pub async fn cancel_search(&self, username: &str) -> Result<ArenaStatus, DomainError> {
        self.seat(username)?.coordinator.cancel_search().await;
        self.status(username).await
    }

    /// The user's phase and, once paired, the duel.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the user holds no seat.
    pub async fn status(&self, username: &str) -> Result<ArenaStatus, DomainError> {
        let seat = self.seat(username)?;
        let mut duel = seat.duel.lock().await;
        self.ensure_battle(username, &seat, &mut duel).await?;
        Ok(ArenaStatus {
            phase: seat.coordinator.phase(),
            battle: duel.battle.clone(),
        })
    }

    /// Plays one duel turn.
    ///
    /// The local character is persisted after every exchange. When the
    /// exchange ends the duel the result is recorded and the seat is torn
    /// down; an aborted exchange tears the seat down without applying
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns `BattleError::Busy` while another turn for the user is in
    /// flight, `BattleError::Aborted` if arbitration failed, or the engine's
    /// and session's errors.
    #[instrument(skip(self, action))]
    pub async fn take_turn(&self, username: &str, action: &str) -> Result<BattleTurn, BattleError> {
        let seat = self.seat(username)?;
        let mut duel = seat.duel.try_lock().map_err(|_| BattleError::Busy)?;
        self.ensure_battle(username, &seat, &mut duel).await?;

        let Duel { battle, rng } = &mut *duel;
        let Some(battle) = battle.as_mut() else {
            return Err(DomainError::Conflict(format!("{username} has no opponent yet")).into());
        };
        let remote_action = opponent_action(&battle.remote, rng.as_mut());

        let turn = match self.engine.play_turn(battle, action, &remote_action).await {
            Ok(turn) => turn,
            Err(BattleError::Aborted(error)) => {
                self.teardown(username);
                return Err(BattleError::Aborted(error));
            }
            Err(other) => return Err(other),
        };

        match turn.result {
            Some(result) => {
                self.sessions
                    .record_battle(username, turn.local.clone(), result == MatchResult::Victory)
                    .await?;
                self.teardown(username);
            }
            None => {
                self.sessions
                    .on_character_updated(username, turn.local.clone())
                    .await?;
            }
        }
        Ok(turn)
    }

    /// Leaves the arena from any phase.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the user holds no seat.
    #[instrument(skip(self))]
    pub async fn leave(&self, username: &str) -> Result<(), DomainError> {
        let seat = self.seat(username)?;
        seat.coordinator.cancel_search().await;
        self.teardown(username);
        Ok(())
    }

    /// The user's seat. A seat whose session left battle behind the
    /// arena's back (a death clears the flag) is discarded; dropping its
    /// coordinator withdraws any search.
    fn seat(&self, username: &str) -> Result<Arc<Seat>, DomainError> {
        let mut seats = self.seats.lock().unwrap_or_else(PoisonError::into_inner);
        if seats.contains_key(username) && !self.sessions.is_in_battle(username) {
            seats.remove(username);
            info!(username, "discarded a stale arena seat");
        }
        seats
            .get(username)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("{username} is not in the arena")))
    }

    async fn ensure_battle(
        &self,
        username: &str,
        seat: &Seat,
        duel: &mut Duel,
    ) -> Result<(), DomainError> {
        if duel.battle.is_some() {
            return Ok(());
        }
        let MatchPhase::Battle { pairing } = seat.coordinator.phase() else {
            return Ok(());
        };
        let local = self
            .sessions
            .session(username)
            .await?
            .character
            .ok_or_else(|| DomainError::Conflict(format!("{username} has no living character")))?;
        duel.battle = Some(Battle::begin(local, &pairing));
        Ok(())
    }

    fn teardown(&self, username: &str) {
        self.seats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(username);
        self.sessions.on_exit_battle(username);
        info!(username, "left the arena");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use destiny_narrative::application::oracle::{NarrativeOracle, OracleError};
    use destiny_narrative::application::resolver::ResolverConfig;
    use destiny_narrative::domain::context::{ArbitrationRequest, TurnContext};
    use destiny_narrative::domain::directive::{ArbitrationResult, Directive};
    use destiny_session::application::store::InMemorySessionStore;
    use destiny_test_support::{
        FailingOracle, FixedClock, ScriptedOracle, SequenceRng, curse_character,
        sorcerer_character,
    };

    use crate::application::directory::InMemoryMatchDirectory;

    /// Never answers.
    struct SilentOracle;

    #[async_trait]
    impl NarrativeOracle for SilentOracle {
        async fn generate_turn(&self, _context: &TurnContext) -> Result<Directive, OracleError> {
            std::future::pending().await
        }

        async fn arbitrate(
            &self,
            _request: &ArbitrationRequest,
        ) -> Result<ArbitrationResult, OracleError> {
            std::future::pending().await
        }
    }

    async fn arena(oracle: Arc<dyn NarrativeOracle>) -> (Arc<Arena>, Arc<SessionService>) {
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 6, 1, 18, 0, 0).unwrap()));
        let sessions = Arc::new(SessionService::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::clone(&oracle),
            ResolverConfig::default(),
            Arc::clone(&clock),
        ));
        for (username, character) in [
            ("yuji", sorcerer_character("Yuji")),
            ("choso", curse_character("Choso")),
        ] {
            sessions.open_session(username).await.unwrap();
            sessions.on_character_ready(username, character).await.unwrap();
        }
        sessions.open_session("unborn").await.unwrap();

        let arena = Arena::new(
            Arc::clone(&sessions),
            Arc::new(InMemoryMatchDirectory::new()),
            PvpBattleEngine::new(oracle, Duration::from_secs(90)),
            clock,
            MatchmakingConfig::default(),
            Arc::new(|| Box::new(SequenceRng::new(vec![123_456])) as Box<dyn DeterministicRng>),
        );
        (Arc::new(arena), sessions)
    }

    fn knockout(p1_damage: i64, p2_damage: i64) -> ArbitrationResult {
        ArbitrationResult {
            narrative: "Piercing Blood meets Divergent Fist.".to_owned(),
            p1_damage,
            p1_qi_cost: 10,
            p2_damage,
            p2_qi_cost: 10,
            kokusen: false,
            winner: None,
        }
    }

    #[tokio::test]
    async fn test_entering_requires_a_living_explorer() {
        let (arena, _) = arena(Arc::new(FailingOracle)).await;

        let result = arena.enter("unborn").await;

        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_entering_marks_the_session_as_in_battle() {
        let (arena, sessions) = arena(Arc::new(FailingOracle)).await;

        let status = arena.enter("yuji").await.unwrap();

        assert_eq!(status.phase, MatchPhase::lobby());
        assert!(status.battle.is_none());
        assert_eq!(
            sessions.session("yuji").await.unwrap().stage,
            GameStage::PvpBattle
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_winning_a_room_duel_records_the_victory() {
        // Arrange
        let oracle = ScriptedOracle::new().with_arbitration(Ok(knockout(30, 1_000)));
        let (arena, sessions) = arena(Arc::new(oracle)).await;
        arena.enter("choso").await.unwrap();
        let code = arena.create_room("choso").await.unwrap();
        arena.enter("yuji").await.unwrap();

        // Act
        let status = arena.join_room("yuji", &code).await.unwrap();
        let turn = arena.take_turn("yuji", "Divergent Fist").await.unwrap();

        // Assert
        let battle = status.battle.unwrap();
        assert_eq!(
            battle.transcript.messages()[0].content,
            "Invasion confirmed. You challenged Choso!"
        );
        assert_eq!(turn.result, Some(MatchResult::Victory));
        assert_eq!(turn.messages[1].content, "Tries to dodge and recover their stance");
        let view = sessions.session("yuji").await.unwrap();
        assert_eq!(view.stage, GameStage::Playing);
        assert_eq!(view.pvp.wins, 1);
        assert_eq!(view.character.unwrap().current_hp, 170);
        assert!(matches!(arena.status("yuji").await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_turn_before_pairing_is_a_conflict() {
        let (arena, _) = arena(Arc::new(FailingOracle)).await;
        arena.enter("yuji").await.unwrap();

        let result = arena.take_turn("yuji", "Punch").await;

        assert!(matches!(
            result,
            Err(BattleError::Domain(DomainError::Conflict(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_duel_returns_to_exploration_untouched() {
        let (arena, sessions) = arena(Arc::new(FailingOracle)).await;
        arena.enter("choso").await.unwrap();
        let code = arena.create_room("choso").await.unwrap();
        arena.enter("yuji").await.unwrap();
        arena.join_room("yuji", &code).await.unwrap();

        let result = arena.take_turn("yuji", "Punch").await;

        assert!(matches!(result, Err(BattleError::Aborted(_))));
        let view = sessions.session("yuji").await.unwrap();
        assert_eq!(view.stage, GameStage::Playing);
        assert_eq!(view.character.unwrap().current_hp, 200);
        assert_eq!(view.pvp.wins + view.pvp.losses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_turn_while_one_is_in_flight_is_busy() {
        let (arena, _) = arena(Arc::new(SilentOracle)).await;
        arena.enter("choso").await.unwrap();
        let code = arena.create_room("choso").await.unwrap();
        arena.enter("yuji").await.unwrap();
        arena.join_room("yuji", &code).await.unwrap();

        let first = {
            let arena = Arc::clone(&arena);
            tokio::spawn(async move { arena.take_turn("yuji", "Punch").await })
        };
        tokio::task::yield_now().await;
        let second = arena.take_turn("yuji", "Kick").await;

        assert!(matches!(second, Err(BattleError::Busy)));
        first.abort();
    }

    #[tokio::test]
    async fn test_entering_during_a_pending_exploration_turn_is_a_conflict() {
        // Arrange
        let (arena, sessions) = arena(Arc::new(SilentOracle)).await;
        let pending = {
            let sessions = Arc::clone(&sessions);
            tokio::spawn(async move { sessions.take_action("yuji", "Walk").await })
        };
        tokio::task::yield_now().await;

        // Act
        let result = arena.enter("yuji").await;

        // Assert
        assert!(matches!(result, Err(DomainError::Conflict(_))));
        assert!(matches!(arena.status("yuji").await, Err(DomainError::NotFound(_))));
        assert!(!sessions.is_in_battle("yuji"));
        pending.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reborn_character_gets_a_fresh_seat() {
        // Arrange
        let (arena, sessions) = arena(Arc::new(FailingOracle)).await;
        arena.enter("yuji").await.unwrap();
        arena.start_search("yuji").await.unwrap();
        sessions.on_permadeath("yuji").await.unwrap();
        sessions
            .on_character_ready("yuji", sorcerer_character("Megumi"))
            .await
            .unwrap();

        // Act
        let stale = arena.status("yuji").await;
        let status = arena.enter("yuji").await.unwrap();

        // Assert
        assert!(matches!(stale, Err(DomainError::NotFound(_))));
        assert_eq!(status.phase, MatchPhase::lobby());
        assert_eq!(
            sessions.session("yuji").await.unwrap().stage,
            GameStage::PvpBattle
        );
        let refused = sessions.take_action("yuji", "Look around").await;
        assert!(matches!(refused, Err(DomainError::Conflict(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_mid_search_withdraws_and_frees_the_session() {
        let (arena, sessions) = arena(Arc::new(FailingOracle)).await;
        arena.enter("yuji").await.unwrap();
        arena.start_search("yuji").await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        arena.leave("yuji").await.unwrap();

        assert_eq!(
            sessions.session("yuji").await.unwrap().stage,
            GameStage::Playing
        );
        assert!(arena.directory.enlist_seeker("choso").await.unwrap().is_none());
    }
}
