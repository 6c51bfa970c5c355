//! The per-turn action resolver.
//!
//! A turn is: acquire the session's permit, build the sanitized context,
//! ask the oracle, then fold the directive into copies of the character
//! and world. Oracle failures of any kind produce a fallback narration and
//! leave both untouched.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use destiny_character::Character;
use destiny_core::error::DomainError;
use destiny_world_state::WorldState;
use tracing::{info, instrument, warn};

use super::oracle::{NarrativeOracle, OracleError};
use crate::domain::context::TurnContext;
use crate::domain::directive::Directive;
use crate::domain::fold::fold_directive;
use crate::domain::message::{GameMessage, is_system_action};

/// Narration shown when the oracle cannot be reached in time.
pub const UNAVAILABLE_NARRATIVE: &str = "The flow of cursed energy faltered. Nothing has changed.";

/// Narration shown when the oracle's answer could not be trusted.
pub const MALFORMED_NARRATIVE: &str = "Fate hesitates, and the moment passes without consequence.";

/// Tunables for turn resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// How many trailing transcript entries are sent to the oracle.
    pub transcript_tail: usize,
    /// Mastery gained by every action not judged a miss.
    pub mastery_increment: f64,
    /// Hard deadline on a single oracle call.
    pub oracle_deadline: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            transcript_tail: 4,
            mastery_increment: 0.5,
            oracle_deadline: Duration::from_secs(90),
        }
    }
}

/// Proof that the holder is the only resolution in flight for a session.
/// Dropping it re-arms the session.
#[derive(Debug)]
pub struct TurnPermit {
    session_key: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl TurnPermit {
    /// The session this permit was issued for.
    #[must_use]
    pub fn session_key(&self) -> &str {
        &self.session_key
    }
}

impl Drop for TurnPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_key);
    }
}

/// The result of resolving one action.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub character: Character,
    pub world_state: WorldState,
    /// Messages to append to the transcript, in order.
    pub messages: Vec<GameMessage>,
    /// Permanent death was triggered by this turn.
    pub terminal: bool,
    /// Next-action hints. Empty when the oracle offered none.
    pub suggestions: Vec<String>,
    /// Scene description for the image collaborator.
    pub scene_prompt: Option<String>,
    /// Set when the turn fell back because the oracle failed.
    pub failure: Option<OracleError>,
}

/// Resolves player actions against the narrative oracle.
pub struct ActionResolver {
    oracle: Arc<dyn NarrativeOracle>,
    config: ResolverConfig,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ActionResolver {
    /// Creates a resolver over `oracle`.
    #[must_use]
    pub fn new(oracle: Arc<dyn NarrativeOracle>, config: ResolverConfig) -> Self {
        Self {
            oracle,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// The resolver's configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Claims the single in-flight slot for `session_key`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if a resolution for the same session
    /// is already in flight. The request is rejected, not queued.
    pub fn begin(&self, session_key: &str) -> Result<TurnPermit, DomainError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(session_key.to_owned()) {
            return Err(DomainError::Conflict(format!(
                "a turn is already being resolved for {session_key}"
            )));
        }
        Ok(TurnPermit {
            session_key: session_key.to_owned(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Resolves `action` for the session holding `permit`.
    #[instrument(skip_all, fields(session = %permit.session_key()))]
    pub async fn resolve(
        &self,
        permit: &TurnPermit,
        character: &Character,
        world: &WorldState,
        transcript_tail: &[GameMessage],
        action: &str,
    ) -> Resolution {
        let mut messages = Vec::with_capacity(2);
        if !action.is_empty() && !is_system_action(action) {
            messages.push(GameMessage::player(action));
        }

        let tail_start = transcript_tail
            .len()
            .saturating_sub(self.config.transcript_tail);
        let context = TurnContext::build(character, world, &transcript_tail[tail_start..], action);

        let directive = match tokio::time::timeout(
            self.config.oracle_deadline,
            self.oracle.generate_turn(&context),
        )
        .await
        {
            Ok(Ok(directive)) => directive,
            Ok(Err(error)) => return fallback(character, world, messages, error),
            Err(_) => return fallback(character, world, messages, OracleError::DeadlineExceeded),
        };

        let folded = fold_directive(character, world, &directive, self.config.mastery_increment);
        info!(
            hp = folded.character.current_hp,
            qi = folded.character.current_qi,
            mastery = folded.character.mastery,
            arc_progress = folded.world_state.arc.progress,
            terminal = folded.terminal,
            "turn resolved"
        );

        let scene_prompt = directive.image_prompt.clone();
        let suggestions = directive.suggestions.clone();
        messages.push(narration(directive));

        Resolution {
            character: folded.character,
            world_state: folded.world_state,
            messages,
            terminal: folded.terminal,
            suggestions,
            scene_prompt,
            failure: None,
        }
    }
}

fn narration(directive: Directive) -> GameMessage {
    let mut message = GameMessage::narrator(directive.narrative);
    message.evaluation = directive.evaluation;
    message.kokusen = directive.kokusen;
    message.xp_gain = (directive.xp_gain != 0).then_some(directive.xp_gain);
    message.consequence = directive.consequence;
    message.npc_intervention = directive.intervention;
    message.sources = directive.sources;
    message
}

fn fallback(
    character: &Character,
    world: &WorldState,
    mut messages: Vec<GameMessage>,
    error: OracleError,
) -> Resolution {
    warn!(error = %error, "oracle failed, turn falls back without state change");
    let narrative = match error {
        OracleError::MalformedDirective(_) => MALFORMED_NARRATIVE,
        OracleError::Unavailable(_) | OracleError::DeadlineExceeded => UNAVAILABLE_NARRATIVE,
    };
    messages.push(GameMessage::narrator(narrative));
    Resolution {
        character: character.clone(),
        world_state: world.clone(),
        messages,
        terminal: false,
        suggestions: Vec::new(),
        scene_prompt: None,
        failure: Some(error),
    }
}
