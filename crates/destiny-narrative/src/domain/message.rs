//! Transcript messages.

use serde::{Deserialize, Serialize};

use super::directive::ActionEvaluation;

/// Prefix marking an action issued by the engine rather than the player.
pub const SYSTEM_ACTION_PREFIX: &str = "SYSTEM";

/// Whether `action` is an internal system action that should not be echoed
/// into the transcript as a player message.
#[must_use]
pub fn is_system_action(action: &str) -> bool {
    action.starts_with(SYSTEM_ACTION_PREFIX)
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Narrator,
    Player,
    Opponent,
}

/// A grounding citation returned by the oracle, passed through for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

/// One immutable turn record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMessage {
    pub role: Role,
    pub content: String,
    /// Scene image reference attached by the image collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<ActionEvaluation>,
    #[serde(default)]
    pub kokusen: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_gain: Option<i64>,
    /// Butterfly-effect consequence of the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<String>,
    /// Name of an NPC who intervened during the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc_intervention: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Citation>,
}

impl GameMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            image: None,
            evaluation: None,
            kokusen: false,
            xp_gain: None,
            consequence: None,
            npc_intervention: None,
            sources: Vec::new(),
        }
    }

    /// A narrator message with no metadata.
    #[must_use]
    pub fn narrator(content: impl Into<String>) -> Self {
        Self::plain(Role::Narrator, content)
    }

    /// A player action record.
    #[must_use]
    pub fn player(content: impl Into<String>) -> Self {
        Self::plain(Role::Player, content)
    }

    /// An opponent action record.
    #[must_use]
    pub fn opponent(content: impl Into<String>) -> Self {
        Self::plain(Role::Opponent, content)
    }
}

/// Append-only, arrival-ordered message log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<GameMessage>);

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one message.
    pub fn push(&mut self, message: GameMessage) {
        self.0.push(message);
    }

    /// Appends messages in order.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = GameMessage>) {
        self.0.extend(messages);
    }

    /// The last `n` messages, oldest first.
    #[must_use]
    pub fn tail(&self, n: usize) -> &[GameMessage] {
        let start = self.0.len().saturating_sub(n);
        &self.0[start..]
    }

    /// All messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[GameMessage] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
