//! The session service: boundary calls that drive one user's game.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use destiny_character::Character;
use destiny_core::clock::Clock;
use destiny_core::error::DomainError;
use destiny_narrative::application::oracle::NarrativeOracle;
use destiny_narrative::application::resolver::{ActionResolver, ResolverConfig};
use destiny_narrative::domain::message::{GameMessage, SYSTEM_ACTION_PREFIX, Transcript};
use destiny_world_state::WorldState;
use serde::Serialize;
use tracing::{info, instrument};

use super::observer::SessionObserver;
use super::store::SessionStore;
use crate::domain::user::{Epitaph, Lifecycle, PvpRecord, Settings, User, validate_username};

/// Which screen a session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStage {
    /// No character yet; the creation collaborator is in charge.
    AwaitingCharacter,
    Playing,
    /// The character is in a PvP match; PvE actions are refused.
    PvpBattle,
    /// The last character died.
    GameOver,
}

/// A snapshot of one session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub username: String,
    pub stage: GameStage,
    pub character: Option<Character>,
    pub world_state: Option<WorldState>,
    pub epitaph: Option<Epitaph>,
    pub settings: Settings,
    pub pvp: PvpRecord,
    pub suggestions: Vec<String>,
}

/// What one resolved action produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    /// Messages appended to the transcript by this turn.
    pub messages: Vec<GameMessage>,
    pub suggestions: Vec<String>,
    /// Scene description for the image collaborator. Absent when image
    /// generation is disabled for the user.
    pub scene_prompt: Option<String>,
    /// The character died this turn.
    pub terminal: bool,
    /// The oracle failed and the turn changed nothing.
    pub fallback: bool,
    pub character: Option<Character>,
    pub world_state: Option<WorldState>,
}

/// Per-user state that lives only as long as the process.
#[derive(Debug, Default)]
struct SessionRuntime {
    transcript: Transcript,
    suggestions: Vec<String>,
    in_battle: bool,
}

/// Orchestrates the session store, the action resolver and observers.
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    resolver: ActionResolver,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn SessionObserver>>,
    runtime: Mutex<HashMap<String, SessionRuntime>>,
}

impl SessionService {
    /// Creates a service over `store` that narrates with `oracle`.
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        oracle: Arc<dyn NarrativeOracle>,
        config: ResolverConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            resolver: ActionResolver::new(oracle, config),
            clock,
            observers: Vec::new(),
            runtime: Mutex::new(HashMap::new()),
        }
    }

    /// Registers an observer for lifecycle notifications.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// The keyed store behind this service.
    #[must_use]
    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.store)
    }

    /// Loads the session for `username`, creating an empty record on first
    /// contact. A returning user's living character is announced to the
    /// observers again.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an unusable username, or the
    /// store's error.
    #[instrument(skip(self))]
    pub async fn open_session(&self, username: &str) -> Result<SessionView, DomainError> {
        validate_username(username)?;
        let user = if let Some(user) = self.store.get(username).await? {
            self.notify_updated(&user).await;
            user
        } else {
            let user = User::new(username, self.clock.now());
            self.store.put(&user).await?;
            info!(username, "session created");
            user
        };
        Ok(self.view(&user))
    }

    /// The current snapshot of an existing session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` if the session was never opened.
    pub async fn session(&self, username: &str) -> Result<SessionView, DomainError> {
        let user = self.load(username).await?;
        Ok(self.view(&user))
    }

    /// Starts a new cycle with a freshly created character.
    ///
    /// Allowed before the first character and after a death. The transcript
    /// of any previous cycle is discarded.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` while a character is alive,
    /// `DomainError::Validation` for a broken sheet, or a store error.
    #[instrument(skip(self, character), fields(name = %character.name))]
    pub async fn on_character_ready(
        &self,
        username: &str,
        character: Character,
    ) -> Result<SessionView, DomainError> {
        let mut user = self.load(username).await?;
        user.begin_cycle(character)?;
        self.store.put(&user).await?;
        self.with_runtime(username, |runtime| *runtime = SessionRuntime::default());

        if let Some(character) = user.character() {
            for observer in &self.observers {
                observer.character_ready(username, character).await;
            }
        }
        info!(username, "new cycle started");
        Ok(self.view(&user))
    }

    /// Replaces the living character's sheet after an outside change such as
    /// a level-up or an inventory edit.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if no character is alive,
    /// `DomainError::Validation` for a broken sheet, or a store error.
    #[instrument(skip(self, character))]
    pub async fn on_character_updated(
        &self,
        username: &str,
        character: Character,
    ) -> Result<SessionView, DomainError> {
        let mut user = self.load(username).await?;
        user.replace_character(character)?;
        self.store.put(&user).await?;
        self.notify_updated(&user).await;
        Ok(self.view(&user))
    }

    /// Kills the living character. Calling it again changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if no character was ever created, or
    /// a store error.
    #[instrument(skip(self))]
    pub async fn on_permadeath(&self, username: &str) -> Result<SessionView, DomainError> {
        let mut user = self.load(username).await?;
        self.bury(&mut user).await?;
        Ok(self.view(&user))
    }

    /// Resolves one player action.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if a turn is already in flight for
    /// this session, the character is in a PvP match or no character is
    /// alive; `DomainError::NotFound` for an unknown session; or a store
    /// error. Oracle failures are not errors: they come back as a fallback
    /// report with nothing changed.
    #[instrument(skip(self, action))]
    pub async fn take_action(&self, username: &str, action: &str) -> Result<TurnReport, DomainError> {
        let permit = self.resolver.begin(username)?;
        if self.with_runtime(username, |runtime| runtime.in_battle) {
            return Err(DomainError::Conflict(format!(
                "{username} is in a PvP match"
            )));
        }

        let mut user = self.load(username).await?;
        let Lifecycle::Active {
            character,
            world_state,
        } = &user.lifecycle
        else {
            return Err(DomainError::Conflict(format!(
                "{username} has no living character"
            )));
        };
        let tail_len = self.resolver.config().transcript_tail;
        let tail = self.with_runtime(username, |runtime| {
            runtime.transcript.tail(tail_len).to_vec()
        });

        let resolution = self
            .resolver
            .resolve(&permit, character, world_state, &tail, action)
            .await;

        let fallback = resolution.failure.is_some();
        if !fallback {
            user.replace_character(resolution.character.clone())?;
            user.replace_world(resolution.world_state.clone())?;
            if resolution.terminal {
                self.bury(&mut user).await?;
            } else {
                self.store.put(&user).await?;
                self.notify_updated(&user).await;
            }
        }

        let suggestions = self.with_runtime(username, |runtime| {
            runtime.transcript.extend(resolution.messages.iter().cloned());
            if resolution.terminal {
                runtime.suggestions.clear();
            } else if !fallback {
                runtime.suggestions.clone_from(&resolution.suggestions);
            }
            runtime.suggestions.clone()
        });

        let scene_prompt = resolution
            .scene_prompt
            .filter(|_| user.settings.image_generation);

        Ok(TurnReport {
            messages: resolution.messages,
            suggestions,
            scene_prompt,
            terminal: resolution.terminal,
            fallback,
            character: user.character().cloned(),
            world_state: user.world_state().cloned(),
        })
    }

    /// Narrates the opening scene of a cycle without echoing a player
    /// message.
    ///
    /// # Errors
    ///
    /// Same as [`SessionService::take_action`].
    pub async fn open_scene(&self, username: &str) -> Result<TurnReport, DomainError> {
        let user = self.load(username).await?;
        let location = user
            .world_state()
            .map(|world| world.current_location.clone())
            .unwrap_or_default();
        let action = format!("{SYSTEM_ACTION_PREFIX}: begin the story at {location}");
        self.take_action(username, &action).await
    }

    /// The transcript of the current cycle, oldest first.
    #[must_use]
    pub fn transcript(&self, username: &str) -> Vec<GameMessage> {
        self.with_runtime(username, |runtime| runtime.transcript.messages().to_vec())
    }

    /// Turns scene-image prompts on or off for the user.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for an unknown session, or a store
    /// error.
    pub async fn set_image_generation(
        &self,
        username: &str,
        enabled: bool,
    ) -> Result<Settings, DomainError> {
        let mut user = self.load(username).await?;
        user.settings.image_generation = enabled;
        self.store.put(&user).await?;
        Ok(user.settings)
    }

    /// Moves the living character's world into another known arc.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an unknown arc,
    /// `DomainError::Conflict` if no character is alive, or a store error.
    pub async fn enter_arc(&self, username: &str, arc_id: &str) -> Result<WorldState, DomainError> {
        let mut user = self.load(username).await?;
        let mut world = user
            .world_state()
            .cloned()
            .ok_or_else(|| DomainError::Conflict(format!("{username} has no living character")))?;
        world.enter_arc(arc_id)?;
        user.replace_world(world.clone())?;
        self.store.put(&user).await?;
        info!(username, arc_id, "arc entered");
        Ok(world)
    }

    /// Marks the session as fighting a PvP match.
    ///
    /// Holds the session's turn permit while switching, so a match cannot
    /// start under a PvE turn that is still waiting on the oracle.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if it already is, or if a PvE turn is
    /// in flight.
    pub fn enter_battle(&self, username: &str) -> Result<(), DomainError> {
        let _permit = self.resolver.begin(username)?;
        self.with_runtime(username, |runtime| {
            if runtime.in_battle {
                return Err(DomainError::Conflict(format!(
                    "{username} is already in a PvP match"
                )));
            }
            runtime.in_battle = true;
            Ok(())
        })
    }

    /// Whether the session is currently marked as fighting a PvP match.
    #[must_use]
    pub fn is_in_battle(&self, username: &str) -> bool {
        self.with_runtime(username, |runtime| runtime.in_battle)
    }

    /// Returns the session to exploration after a PvP match, however it
    /// ended.
    pub fn on_exit_battle(&self, username: &str) {
        self.with_runtime(username, |runtime| runtime.in_battle = false);
    }

    /// Persists the outcome of a finished match: the local character as it
    /// left the arena and the win or loss.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if no character is alive, or a store
    /// error.
    #[instrument(skip(self, survivor))]
    pub async fn record_battle(
        &self,
        username: &str,
        survivor: Character,
        won: bool,
    ) -> Result<SessionView, DomainError> {
        let mut user = self.load(username).await?;
        user.replace_character(survivor)?;
        user.record_match(won);
        self.store.put(&user).await?;
        self.notify_updated(&user).await;
        info!(username, won, wins = user.pvp.wins, losses = user.pvp.losses, "match recorded");
        Ok(self.view(&user))
    }

    async fn load(&self, username: &str) -> Result<User, DomainError> {
        self.store
            .get(username)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("session {username}")))
    }

    async fn bury(&self, user: &mut User) -> Result<(), DomainError> {
        let Some(epitaph) = user.die(self.clock.now())? else {
            return Ok(());
        };
        self.store.put(user).await?;
        self.with_runtime(&user.username, |runtime| {
            runtime.suggestions.clear();
            runtime.in_battle = false;
        });
        for observer in &self.observers {
            observer.permadeath(&user.username, &epitaph).await;
        }
        info!(username = %user.username, character = %epitaph.name, "permadeath");
        Ok(())
    }

    async fn notify_updated(&self, user: &User) {
        if let Some(character) = user.character() {
            for observer in &self.observers {
                observer.character_updated(&user.username, character).await;
            }
        }
    }

    fn view(&self, user: &User) -> SessionView {
        let (in_battle, suggestions) = self.with_runtime(&user.username, |runtime| {
            (runtime.in_battle, runtime.suggestions.clone())
        });
        let stage = match user.lifecycle {
            Lifecycle::Unborn => GameStage::AwaitingCharacter,
            Lifecycle::Active { .. } if in_battle => GameStage::PvpBattle,
            Lifecycle::Active { .. } => GameStage::Playing,
            Lifecycle::Deceased { .. } => GameStage::GameOver,
        };
        SessionView {
            username: user.username.clone(),
            stage,
            character: user.character().cloned(),
            world_state: user.world_state().cloned(),
            epitaph: user.epitaph().cloned(),
            settings: user.settings,
            pvp: user.pvp,
            suggestions,
        }
    }

    fn with_runtime<R>(&self, username: &str, f: impl FnOnce(&mut SessionRuntime) -> R) -> R {
        let mut runtime = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        f(runtime.entry(username.to_owned()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::store::InMemorySessionStore;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use destiny_character::Origin;
    use destiny_narrative::application::oracle::OracleError;
    use destiny_narrative::domain::context::{ArbitrationRequest, TurnContext};
    use destiny_narrative::domain::directive::{ArbitrationResult, Directive};
    use destiny_narrative::domain::message::Role;
    use destiny_test_support::{
        FailingOracle, FixedClock, ScriptedOracle, curse_character, sorcerer_character,
    };

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SessionObserver for RecordingObserver {
        async fn character_ready(&self, username: &str, character: &Character) {
            self.events
                .lock()
                .unwrap()
                .push(format!("ready {username} {}", character.name));
        }

        async fn permadeath(&self, username: &str, epitaph: &Epitaph) {
            self.events
                .lock()
                .unwrap()
                .push(format!("dead {username} {}", epitaph.name));
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()))
    }

    fn service(oracle: Arc<dyn NarrativeOracle>) -> (SessionService, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let service = SessionService::new(
            store.clone(),
            oracle,
            ResolverConfig::default(),
            clock(),
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_open_session_creates_unborn_record_once() {
        let (service, store) = service(Arc::new(FailingOracle));

        let first = service.open_session("gojo").await.unwrap();
        let second = service.open_session("gojo").await.unwrap();

        assert_eq!(first.stage, GameStage::AwaitingCharacter);
        assert_eq!(first, second);
        assert!(store.get("gojo").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_character_ready_starts_cycle_and_notifies() {
        // Arrange
        let observer = Arc::new(RecordingObserver::default());
        let (service, _) = service(Arc::new(FailingOracle));
        let service = service.with_observer(observer.clone());
        service.open_session("gojo").await.unwrap();

        // Act
        let view = service
            .on_character_ready("gojo", sorcerer_character("Satoru"))
            .await
            .unwrap();

        // Assert
        assert_eq!(view.stage, GameStage::Playing);
        assert_eq!(
            view.world_state,
            Some(WorldState::starting_for(Origin::Sorcerer))
        );
        assert_eq!(*observer.events.lock().unwrap(), vec!["ready gojo Satoru"]);
    }

    #[tokio::test]
    async fn test_successful_turn_persists_and_appends_transcript() {
        let oracle = ScriptedOracle::new().with_turn(Ok(Directive {
            hp_change: -20,
            suggestions: vec!["Dodge".to_owned()],
            image_prompt: Some("rain over Shibuya".to_owned()),
            ..Directive::narration_only("A curse lunges from the dark.")
        }));
        let (service, store) = service(Arc::new(oracle));
        service.open_session("gojo").await.unwrap();
        service
            .on_character_ready("gojo", sorcerer_character("Satoru"))
            .await
            .unwrap();

        let report = service.take_action("gojo", "Step forward").await.unwrap();

        assert!(!report.fallback);
        assert_eq!(report.suggestions, vec!["Dodge"]);
        assert_eq!(report.scene_prompt.as_deref(), Some("rain over Shibuya"));
        let stored = store.get("gojo").await.unwrap().unwrap();
        assert_eq!(stored.character().unwrap().current_hp, 180);
        let transcript = service.transcript("gojo");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::Player);
    }

    #[tokio::test]
    async fn test_oracle_failure_does_not_touch_stored_record() {
        let (service, store) = service(Arc::new(FailingOracle));
        service.open_session("gojo").await.unwrap();
        service
            .on_character_ready("gojo", sorcerer_character("Satoru"))
            .await
            .unwrap();
        let before = store.get("gojo").await.unwrap();

        let report = service.take_action("gojo", "Hollow Purple").await.unwrap();

        assert!(report.fallback);
        assert!(!report.terminal);
        assert_eq!(store.get("gojo").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_terminal_turn_moves_session_to_game_over() {
        // Arrange
        let observer = Arc::new(RecordingObserver::default());
        let oracle = ScriptedOracle::new().with_turn(Ok(Directive {
            hp_change: -400,
            ..Directive::narration_only("Sukuna's cleave splits the street.")
        }));
        let (service, store) = service(Arc::new(oracle));
        let service = service.with_observer(observer.clone());
        service.open_session("mahito").await.unwrap();
        service
            .on_character_ready("mahito", curse_character("Mahito"))
            .await
            .unwrap();

        // Act
        let report = service.take_action("mahito", "Charge Sukuna").await.unwrap();
        let view = service.session("mahito").await.unwrap();

        // Assert
        assert!(report.terminal);
        assert!(report.character.is_none());
        assert_eq!(view.stage, GameStage::GameOver);
        assert!(store.get("mahito").await.unwrap().unwrap().character().is_none());
        assert_eq!(
            observer.events.lock().unwrap().last().unwrap(),
            "dead mahito Mahito"
        );
    }

    #[tokio::test]
    async fn test_deceased_session_refuses_actions_and_updates() {
        let (service, _) = service(Arc::new(FailingOracle));
        service.open_session("gojo").await.unwrap();
        service
            .on_character_ready("gojo", sorcerer_character("Satoru"))
            .await
            .unwrap();
        service.on_permadeath("gojo").await.unwrap();

        let action = service.take_action("gojo", "Get up").await;
        let update = service
            .on_character_updated("gojo", sorcerer_character("Satoru"))
            .await;
        let again = service.on_permadeath("gojo").await.unwrap();

        assert!(matches!(action, Err(DomainError::Conflict(_))));
        assert!(matches!(update, Err(DomainError::Conflict(_))));
        assert_eq!(again.stage, GameStage::GameOver);
        assert!(again.character.is_none());
    }

    #[tokio::test]
    async fn test_actions_are_refused_during_battle() {
        let (service, _) = service(Arc::new(FailingOracle));
        service.open_session("gojo").await.unwrap();
        service
            .on_character_ready("gojo", sorcerer_character("Satoru"))
            .await
            .unwrap();
        service.enter_battle("gojo").unwrap();

        let during = service.take_action("gojo", "Look around").await;
        service.on_exit_battle("gojo");
        let after = service.take_action("gojo", "Look around").await;

        assert!(matches!(during, Err(DomainError::Conflict(_))));
        assert!(after.is_ok());
    }

    /// Never answers.
    struct StalledOracle;

    #[async_trait]
    impl NarrativeOracle for StalledOracle {
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

    #[tokio::test]
    async fn test_battle_cannot_start_under_a_pending_turn() {
        // Arrange
        let (service, _) = service(Arc::new(StalledOracle));
        let service = Arc::new(service);
        service.open_session("gojo").await.unwrap();
        service
            .on_character_ready("gojo", sorcerer_character("Satoru"))
            .await
            .unwrap();
        let pending = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.take_action("gojo", "Walk").await })
        };
        tokio::task::yield_now().await;

        // Act
        let during = service.enter_battle("gojo");
        pending.abort();
        let _ = pending.await;
        let after = service.enter_battle("gojo");

        // Assert
        assert!(matches!(during, Err(DomainError::Conflict(_))));
        assert!(after.is_ok());
        assert!(service.is_in_battle("gojo"));
    }

    #[tokio::test]
    async fn test_opening_scene_has_no_player_message() {
        let oracle = ScriptedOracle::new().with_turn(Ok(Directive::narration_only(
            "The gates of Jujutsu High loom over you.",
        )));
        let oracle = Arc::new(oracle);
        let (service, _) = service(oracle.clone());
        service.open_session("gojo").await.unwrap();
        service
            .on_character_ready("gojo", sorcerer_character("Satoru"))
            .await
            .unwrap();

        let report = service.open_scene("gojo").await.unwrap();

        assert_eq!(report.messages.len(), 1);
        assert_eq!(report.messages[0].role, Role::Narrator);
        assert!(oracle.seen_turns()[0].action.starts_with("SYSTEM"));
    }

    #[tokio::test]
    async fn test_disabled_image_generation_drops_scene_prompt() {
        let oracle = ScriptedOracle::new().with_turn(Ok(Directive {
            image_prompt: Some("a torii at dusk".to_owned()),
            ..Directive::narration_only("Quiet.")
        }));
        let (service, _) = service(Arc::new(oracle));
        service.open_session("gojo").await.unwrap();
        service
            .on_character_ready("gojo", sorcerer_character("Satoru"))
            .await
            .unwrap();
        service.set_image_generation("gojo", false).await.unwrap();

        let report = service.take_action("gojo", "Wait").await.unwrap();

        assert!(report.scene_prompt.is_none());
    }

    #[tokio::test]
    async fn test_record_battle_persists_damage_and_result() {
        let (service, store) = service(Arc::new(FailingOracle));
        service.open_session("gojo").await.unwrap();
        service
            .on_character_ready("gojo", sorcerer_character("Satoru"))
            .await
            .unwrap();
        let mut bruised = sorcerer_character("Satoru");
        bruised.take_damage(120);

        let view = service.record_battle("gojo", bruised, false).await.unwrap();

        assert_eq!(view.pvp.losses, 1);
        let stored = store.get("gojo").await.unwrap().unwrap();
        assert_eq!(stored.character().unwrap().current_hp, 80);
    }

    #[tokio::test]
    async fn test_enter_arc_rejects_unknown_arc() {
        let (service, _) = service(Arc::new(FailingOracle));
        service.open_session("gojo").await.unwrap();
        service
            .on_character_ready("gojo", sorcerer_character("Satoru"))
            .await
            .unwrap();

        let unknown = service.enter_arc("gojo", "culling_game").await;
        let shibuya = service.enter_arc("gojo", "shibuya").await.unwrap();

        assert!(matches!(unknown, Err(DomainError::Validation(_))));
        assert_eq!(shibuya.arc.arc_id, "shibuya");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let (service, _) = service(Arc::new(FailingOracle));

        let result = service.take_action("ghost", "Boo").await;

        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
