//! Shared application state.

use std::sync::Arc;

use destiny_core::clock::Clock;
use destiny_narrative::application::oracle::NarrativeOracle;
use destiny_narrative::application::resolver::ResolverConfig;
use destiny_pvp::application::arena::{Arena, RngFactory};
use destiny_pvp::application::directory::{InMemoryMatchDirectory, MatchDirectory};
use destiny_pvp::application::engine::PvpBattleEngine;
use destiny_pvp::application::matchmaking::MatchmakingConfig;
use destiny_pvp::application::roster::LiveRoster;
use destiny_session::application::service::SessionService;
use destiny_session::application::store::SessionStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub arena: Arc<Arena>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(sessions: Arc<SessionService>, arena: Arc<Arena>) -> Self {
        Self { sessions, arena }
    }

    /// Wires the session service, the live roster and the arena around one
    /// store, one oracle and a process-local match directory.
    #[must_use]
    pub fn assemble(
        store: Arc<dyn SessionStore>,
        oracle: Arc<dyn NarrativeOracle>,
        clock: Arc<dyn Clock>,
        rng_factory: RngFactory,
        resolver: ResolverConfig,
        matchmaking: MatchmakingConfig,
    ) -> Self {
        let directory: Arc<dyn MatchDirectory> = Arc::new(InMemoryMatchDirectory::new());
        let roster = LiveRoster::new(Arc::clone(&directory), Arc::clone(&clock));
        let engine = PvpBattleEngine::new(Arc::clone(&oracle), resolver.oracle_deadline);
        let sessions = Arc::new(
            SessionService::new(store, oracle, resolver, Arc::clone(&clock))
                .with_observer(Arc::new(roster)),
        );
        let arena = Arc::new(Arena::new(
            Arc::clone(&sessions),
            directory,
            engine,
            clock,
            matchmaking,
            rng_factory,
        ));
        Self::new(sessions, arena)
    }
}
