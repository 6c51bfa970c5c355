//! Per-session matchmaking: LOBBY → SEARCHING → BATTLE.
//!
//! A search runs as one spawned task driven by a fixed-period interval and
//! stopped through a cancellation token. Cancelling, timing out or dropping
//! the coordinator stops all polling; the task withdraws the session from
//! the directory on its way out.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::TimeDelta;
use destiny_character::Character;
use destiny_core::clock::Clock;
use destiny_core::error::DomainError;
use destiny_core::rng::DeterministicRng;
use destiny_session::application::store::SessionStore;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::directory::MatchDirectory;
use crate::domain::pairing::{MatchPhase, Pairing, PairingSource, RoomClaim};
use crate::domain::room::{MatchRoom, draw_room_code};

/// Tunables for matchmaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchmakingConfig {
    /// Length of one search tick.
    pub poll_interval: Duration,
    /// A search gives up on this tick.
    pub search_ceiling_ticks: u32,
    /// How long an unclaimed room stays joinable.
    pub room_ttl: Duration,
    /// Ticks spent in the seeker queue before falling back to discovery.
    pub discovery_after_ticks: u32,
    /// Fresh codes tried before room creation gives up.
    pub room_code_attempts: u32,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            search_ceiling_ticks: 180,
            room_ttl: Duration::from_secs(180),
            discovery_after_ticks: 5,
            room_code_attempts: 8,
        }
    }
}

/// Why a matchmaking request failed.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("private room {0} not found or expired")]
    RoomNotFound(String),

    #[error("the host of room {0} could not be found")]
    HostUnresolvable(String),

    #[error("search cancelled: no sorcerer or curse found")]
    SearchTimeout,

    #[error("cannot {action} while in {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Clone)]
enum SearchMode {
    /// Waiting behind a private room code for a guest.
    Room(String),
    /// Seeker queue, then discovery.
    Queue,
}

enum SearchOutcome {
    Paired(Pairing),
    TimedOut,
    Failed(MatchError),
    Cancelled,
}

/// State shared between a coordinator and its search task.
struct Shared {
    username: String,
    directory: Arc<dyn MatchDirectory>,
    store: Arc<dyn SessionStore>,
    config: MatchmakingConfig,
    phase: watch::Sender<MatchPhase>,
}

impl Shared {
    async fn resolve(&self, username: &str) -> Result<Option<Character>, MatchError> {
        let user = self.store.get(username).await?;
        Ok(user.and_then(|user| user.character().cloned()))
    }

    async fn enlist(&self) -> Result<Option<Pairing>, MatchError> {
        let Some(partner) = self.directory.enlist_seeker(&self.username).await? else {
            return Ok(None);
        };
        Ok(self.resolve(&partner).await?.map(|opponent| Pairing {
            opponent_username: partner,
            opponent,
            source: PairingSource::Queue,
        }))
    }

    async fn discover(&self) -> Result<Option<Pairing>, MatchError> {
        let listings = self.directory.live_characters(&self.username).await?;
        Ok(listings
            .into_iter()
            .find(|listing| !listing.character.is_down())
            .map(|listing| Pairing {
                opponent_username: listing.username,
                opponent: listing.character,
                source: PairingSource::Discovery,
            }))
    }

    /// One search tick.
    async fn poll(&self, mode: &SearchMode, tick: u32) -> Result<Option<Pairing>, MatchError> {
        if let Some(challenge) = self.directory.take_challenge(&self.username).await? {
            if let Some(opponent) = self.resolve(&challenge.challenger).await? {
                let source = if challenge.room.is_some() {
                    PairingSource::HostedRoom
                } else {
                    PairingSource::Queue
                };
                return Ok(Some(Pairing {
                    opponent_username: challenge.challenger,
                    opponent,
                    source,
                }));
            }
            debug!(challenger = %challenge.challenger, "challenger vanished before pairing");
        }

        match mode {
            SearchMode::Room(_) => Ok(None),
            SearchMode::Queue if tick < self.config.discovery_after_ticks => self.enlist().await,
            SearchMode::Queue => {
                self.directory.withdraw_seeker(&self.username).await?;
                self.discover().await
            }
        }
    }

    async fn search(&self, mode: &SearchMode) -> SearchOutcome {
        let period = self.config.poll_interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if matches!(mode, SearchMode::Queue) {
            match self.enlist().await {
                Ok(Some(pairing)) => return SearchOutcome::Paired(pairing),
                Ok(None) => {}
                Err(e) => return SearchOutcome::Failed(e),
            }
        }

        let mut tick = 0;
        loop {
            interval.tick().await;
            tick += 1;
            match self.poll(mode, tick).await {
                Ok(Some(pairing)) => return SearchOutcome::Paired(pairing),
                Ok(None) => {}
                Err(e) => return SearchOutcome::Failed(e),
            }
            if tick >= self.config.search_ceiling_ticks {
                return SearchOutcome::TimedOut;
            }
            self.phase.send_if_modified(|phase| match phase {
                MatchPhase::Searching { ticks, .. } => {
                    *ticks = tick;
                    true
                }
                MatchPhase::Lobby { .. } | MatchPhase::Battle { .. } => false,
            });
        }
    }

    async fn withdraw(&self, mode: &SearchMode) {
        let result = match mode {
            SearchMode::Room(code) => self.directory.close_room(code, &self.username).await,
            SearchMode::Queue => self
                .directory
                .withdraw_seeker(&self.username)
                .await
                .map(|_| ()),
        };
        if let Err(e) = result {
            warn!(username = %self.username, error = %e, "could not withdraw from the directory");
        }
    }
}

async fn run_search(shared: Arc<Shared>, mode: SearchMode, token: CancellationToken) {
    let outcome = tokio::select! {
        () = token.cancelled() => SearchOutcome::Cancelled,
        outcome = shared.search(&mode) => outcome,
    };

    let next = match outcome {
        SearchOutcome::Paired(pairing) => {
            info!(
                username = %shared.username,
                opponent = %pairing.opponent_username,
                source = ?pairing.source,
                "opponent found"
            );
            MatchPhase::Battle { pairing }
        }
        SearchOutcome::TimedOut => {
            shared.withdraw(&mode).await;
            info!(username = %shared.username, "search timed out");
            MatchPhase::Lobby {
                notice: Some(MatchError::SearchTimeout.to_string()),
            }
        }
        SearchOutcome::Failed(e) => {
            shared.withdraw(&mode).await;
            warn!(username = %shared.username, error = %e, "search failed");
            MatchPhase::Lobby {
                notice: Some(e.to_string()),
            }
        }
        SearchOutcome::Cancelled => {
            shared.withdraw(&mode).await;
            return;
        }
    };

    shared.phase.send_if_modified(|phase| {
        if token.is_cancelled() || !matches!(phase, MatchPhase::Searching { .. }) {
            return false;
        }
        *phase = next;
        true
    });
}

/// A running search. Dropping it cancels the search.
struct SearchHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SearchHandle {
    /// Cancels the search and waits for the task to clean up.
    async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "search task ended abnormally");
            }
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Drives one session through matchmaking.
pub struct MatchmakingCoordinator {
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
    rng: Mutex<Box<dyn DeterministicRng>>,
    search: Mutex<Option<SearchHandle>>,
    transitions: tokio::sync::Mutex<()>,
}

impl MatchmakingCoordinator {
    /// Creates a coordinator for `username`, starting in the lobby.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        directory: Arc<dyn MatchDirectory>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn DeterministicRng>,
        config: MatchmakingConfig,
    ) -> Self {
        let (phase, _) = watch::channel(MatchPhase::lobby());
        Self {
            shared: Arc::new(Shared {
                username: username.into(),
                directory,
                store,
                config,
                phase,
            }),
            clock,
            rng: Mutex::new(rng),
            search: Mutex::new(None),
            transitions: tokio::sync::Mutex::new(()),
        }
    }

    /// The session this coordinator belongs to.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.shared.username
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> MatchPhase {
        self.shared.phase.borrow().clone()
    }

    /// A receiver that observes every phase change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MatchPhase> {
        self.shared.phase.subscribe()
    }

    /// Opens a private room and waits behind it. Returns the room code.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidPhase` outside the lobby, or
    /// `MatchError::Domain` if no free code was found or the directory
    /// failed.
    #[instrument(skip(self), fields(username = %self.shared.username))]
    pub async fn create_room(&self) -> Result<String, MatchError> {
        let _transition = self.transitions.lock().await;
        self.ensure_lobby("create a room")?;
        self.discard_stale_challenge().await?;

        let codes: Vec<String> = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            (0..self.shared.config.room_code_attempts)
                .map(|_| draw_room_code(rng.as_mut()))
                .collect()
        };
        for code in codes {
            let room = MatchRoom {
                code: code.clone(),
                host: self.shared.username.clone(),
                created_at: self.clock.now(),
            };
            if self.shared.directory.open_room(&room, self.room_ttl()).await? {
                info!(code = %code, "room opened");
                self.spawn_search(SearchMode::Room(code.clone()));
                return Ok(code);
            }
            debug!(code = %code, "room code taken, drawing another");
        }
        Err(MatchError::Domain(DomainError::Conflict(
            "no free room code".to_owned(),
        )))
    }

    /// Joins someone else's room and goes straight to battle.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::RoomNotFound` for an unknown, expired or own
    /// room and `MatchError::HostUnresolvable` if the host no longer has a
    /// living character. The coordinator stays in the lobby on any error.
    #[instrument(skip(self), fields(username = %self.shared.username))]
    pub async fn join_room(&self, code: &str) -> Result<Pairing, MatchError> {
        let _transition = self.transitions.lock().await;
        self.ensure_lobby("join a room")?;
        let code = code.trim();

        let claim = self
            .shared
            .directory
            .claim_room(code, &self.shared.username, self.clock.now(), self.room_ttl())
            .await?;
        let room = match claim {
            RoomClaim::Claimed(room) => room,
            RoomClaim::Missing | RoomClaim::OwnRoom => {
                return Err(MatchError::RoomNotFound(code.to_owned()));
            }
        };
        let opponent = self
            .shared
            .resolve(&room.host)
            .await?
            .ok_or_else(|| MatchError::HostUnresolvable(code.to_owned()))?;

        let pairing = Pairing {
            opponent_username: room.host,
            opponent,
            source: PairingSource::JoinedRoom,
        };
        info!(opponent = %pairing.opponent_username, "room joined");
        self.shared.phase.send_replace(MatchPhase::Battle {
            pairing: pairing.clone(),
        });
        Ok(pairing)
    }

    /// Starts searching for a random opponent.
    ///
    /// # Errors
    ///
    /// Returns `MatchError::InvalidPhase` outside the lobby.
    #[instrument(skip(self), fields(username = %self.shared.username))]
    pub async fn start_search(&self) -> Result<(), MatchError> {
        let _transition = self.transitions.lock().await;
        self.ensure_lobby("start a search")?;
        self.discard_stale_challenge().await?;
        self.spawn_search(SearchMode::Queue);
        Ok(())
    }

    /// Stops a running search and returns to the lobby. If the search paired
    /// before it could be stopped, the battle stands and is returned.
    #[instrument(skip(self), fields(username = %self.shared.username))]
    pub async fn cancel_search(&self) -> MatchPhase {
        let _transition = self.transitions.lock().await;
        let handle = self
            .search
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
        self.shared.phase.send_if_modified(|phase| {
            if matches!(phase, MatchPhase::Searching { .. }) {
                *phase = MatchPhase::lobby();
                true
            } else {
                false
            }
        });
        self.phase()
    }

    fn spawn_search(&self, mode: SearchMode) {
        let room = match &mode {
            SearchMode::Room(code) => Some(code.clone()),
            SearchMode::Queue => None,
        };
        self.shared
            .phase
            .send_replace(MatchPhase::Searching { room, ticks: 0 });

        let token = CancellationToken::new();
        let task = tokio::spawn(run_search(
            Arc::clone(&self.shared),
            mode,
            token.clone(),
        ));
        *self.search.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(SearchHandle {
                token,
                task: Some(task),
            });
    }

    /// A challenge left over from an earlier search must not pair this one.
    async fn discard_stale_challenge(&self) -> Result<(), MatchError> {
        if let Some(stale) = self.shared.directory.take_challenge(&self.shared.username).await? {
            debug!(challenger = %stale.challenger, "discarded stale challenge");
        }
        Ok(())
    }

    fn ensure_lobby(&self, action: &'static str) -> Result<(), MatchError> {
        let phase = self.shared.phase.borrow();
        match &*phase {
            MatchPhase::Lobby { .. } => Ok(()),
            other => Err(MatchError::InvalidPhase {
                action,
                phase: other.name(),
            }),
        }
    }

    fn room_ttl(&self) -> TimeDelta {
        TimeDelta::from_std(self.shared.config.room_ttl).unwrap_or(TimeDelta::MAX)
    }
}
