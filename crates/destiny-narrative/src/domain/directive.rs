//! Oracle output schemas.
//!
//! The oracle answers with loosely shaped JSON. Payloads are first read
//! into all-optional `Raw*` structs and then validated into [`Directive`]
//! or [`ArbitrationResult`], where every optional field has an explicit
//! default. A payload that fails validation is rejected as a whole.

use destiny_world_state::NpcUpdate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::message::Citation;

/// Largest magnitude accepted for any numeric oracle field.
const NUMERIC_LIMIT: f64 = 1_000_000_000.0;

/// A payload that does not satisfy the oracle schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema violation: {0}")]
pub struct SchemaViolation(pub String);

/// Outcome tier of a player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationTier {
    #[serde(alias = "HIT", alias = "ACERTO")]
    Hit,
    /// The error tier: the action failed.
    #[serde(alias = "MISS", alias = "ERRO")]
    Miss,
    #[serde(alias = "CRITICAL", alias = "CRÍTICO", alias = "CRITICO")]
    Critical,
}

/// The oracle's judgement of a player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEvaluation {
    pub tier: EvaluationTier,
    pub damage_dealt: i64,
    pub qi_cost: i64,
}

/// A validated PvE turn directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub narrative: String,
    pub image_prompt: Option<String>,
    pub evaluation: Option<ActionEvaluation>,
    /// Black Flash: a critical physical break, surfaced for emphasis.
    pub kokusen: bool,
    pub npc_update: Option<NpcUpdate>,
    pub intervention: Option<String>,
    pub consequence: Option<String>,
    pub arc_progress_gain: Option<f64>,
    pub xp_gain: i64,
    pub hp_change: i64,
    pub fatal: bool,
    pub suggestions: Vec<String>,
    pub sources: Vec<Citation>,
}

impl Directive {
    /// A directive that changes nothing and only narrates.
    #[must_use]
    pub fn narration_only(narrative: impl Into<String>) -> Self {
        Self {
            narrative: narrative.into(),
            image_prompt: None,
            evaluation: None,
            kokusen: false,
            npc_update: None,
            intervention: None,
            consequence: None,
            arc_progress_gain: None,
            xp_gain: 0,
            hp_change: 0,
            fatal: false,
            suggestions: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Parses and validates a JSON directive.
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` if the text is not JSON of the expected
    /// shape or fails validation.
    pub fn from_json(text: &str) -> Result<Self, SchemaViolation> {
        let raw: RawDirective = serde_json::from_str(text)
            .map_err(|e| SchemaViolation(format!("directive is not valid JSON: {e}")))?;
        raw.validate()
    }
}

/// Which side an arbitration declared the winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    P1,
    P2,
}

/// A validated PvP turn arbitration.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrationResult {
    pub narrative: String,
    pub p1_damage: i64,
    pub p1_qi_cost: i64,
    pub p2_damage: i64,
    pub p2_qi_cost: i64,
    pub kokusen: bool,
    pub winner: Option<Winner>,
}

impl ArbitrationResult {
    /// Parses and validates a JSON arbitration.
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` if the text is not JSON of the expected
    /// shape or fails validation.
    pub fn from_json(text: &str) -> Result<Self, SchemaViolation> {
        let raw: RawArbitration = serde_json::from_str(text)
            .map_err(|e| SchemaViolation(format!("arbitration is not valid JSON: {e}")))?;
        raw.validate()
    }
}

/// Wire shape of a PvE directive.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDirective {
    pub narrative: Option<String>,
    pub image_prompt: Option<String>,
    pub action_evaluation: Option<RawEvaluation>,
    pub kokusen: Option<bool>,
    pub npc_update: Option<RawNpcUpdate>,
    pub intervention_occurred: Option<String>,
    pub butterfly_consequence: Option<String>,
    pub arc_progress_gain: Option<f64>,
    pub xp_gain: Option<f64>,
    pub hp_change: Option<f64>,
    pub is_fatal_blow: Option<bool>,
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub sources: Vec<Citation>,
}

/// Wire shape of an action evaluation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvaluation {
    pub status: Option<EvaluationTier>,
    pub damage_dealt: Option<f64>,
    pub qi_cost: Option<f64>,
}

/// Wire shape of an NPC update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNpcUpdate {
    pub name: Option<String>,
    pub affinity_delta: Option<f64>,
    pub new_status: Option<String>,
    pub is_alive: Option<bool>,
    pub location: Option<String>,
    pub summary: Option<String>,
}

/// Wire shape of a PvP arbitration.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArbitration {
    pub narrative: Option<String>,
    pub p1_damage: Option<f64>,
    pub p1_qi_cost: Option<f64>,
    pub p2_damage: Option<f64>,
    pub p2_qi_cost: Option<f64>,
    pub kokusen: Option<bool>,
    pub winner: Option<Winner>,
}

impl RawDirective {
    /// Validates the payload and fills explicit defaults.
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` if the narrative is missing, a number is
    /// not finite or out of range, or an NPC update has no name.
    pub fn validate(self) -> Result<Directive, SchemaViolation> {
        let narrative = required_text(self.narrative, "narrative")?;

        let evaluation = self
            .action_evaluation
            .map(|raw| {
                let tier = raw.status.ok_or_else(|| {
                    SchemaViolation("actionEvaluation.status is required".to_owned())
                })?;
                Ok::<_, SchemaViolation>(ActionEvaluation {
                    tier,
                    damage_dealt: integer(raw.damage_dealt, "actionEvaluation.damageDealt")?,
                    qi_cost: integer(raw.qi_cost, "actionEvaluation.qiCost")?,
                })
            })
            .transpose()?;

        let npc_update = self
            .npc_update
            .map(|raw| {
                let name = required_text(raw.name, "npcUpdate.name")?;
                let delta = integer(raw.affinity_delta, "npcUpdate.affinityDelta")?;
                Ok::<_, SchemaViolation>(NpcUpdate {
                    name,
                    affinity_delta: i32::try_from(delta).map_err(|_| {
                        SchemaViolation("npcUpdate.affinityDelta is out of range".to_owned())
                    })?,
                    new_status: optional_text(raw.new_status),
                    alive: raw.is_alive,
                    location: optional_text(raw.location),
                    summary: optional_text(raw.summary),
                })
            })
            .transpose()?;

        let arc_progress_gain = match self.arc_progress_gain {
            Some(gain) => Some(bounded(gain, "arcProgressGain")?),
            None => None,
        };

        Ok(Directive {
            narrative,
            image_prompt: optional_text(self.image_prompt),
            evaluation,
            kokusen: self.kokusen.unwrap_or(false),
            npc_update,
            intervention: optional_text(self.intervention_occurred),
            consequence: optional_text(self.butterfly_consequence),
            arc_progress_gain,
            xp_gain: integer(self.xp_gain, "xpGain")?,
            hp_change: integer(self.hp_change, "hpChange")?,
            fatal: self.is_fatal_blow.unwrap_or(false),
            suggestions: self
                .suggestions
                .unwrap_or_default()
                .into_iter()
                .filter_map(|s| optional_text(Some(s)))
                .collect(),
            sources: self
                .sources
                .into_iter()
                .filter(|c| !c.uri.trim().is_empty())
                .collect(),
        })
    }
}

impl RawArbitration {
    /// Validates the payload and fills explicit defaults.
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` if the narrative is missing or a damage or
    /// cost figure is negative, not finite or out of range.
    pub fn validate(self) -> Result<ArbitrationResult, SchemaViolation> {
        Ok(ArbitrationResult {
            narrative: required_text(self.narrative, "narrative")?,
            p1_damage: non_negative(self.p1_damage, "p1Damage")?,
            p1_qi_cost: non_negative(self.p1_qi_cost, "p1QiCost")?,
            p2_damage: non_negative(self.p2_damage, "p2Damage")?,
            p2_qi_cost: non_negative(self.p2_qi_cost, "p2QiCost")?,
            kokusen: self.kokusen.unwrap_or(false),
            winner: self.winner,
        })
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn required_text(value: Option<String>, field: &str) -> Result<String, SchemaViolation> {
    optional_text(value).ok_or_else(|| SchemaViolation(format!("{field} is required")))
}

fn bounded(value: f64, field: &str) -> Result<f64, SchemaViolation> {
    if value.is_finite() && value.abs() <= NUMERIC_LIMIT {
        Ok(value)
    } else {
        Err(SchemaViolation(format!("{field} is not a usable number")))
    }
}

/// Reads an optional number as an integer, rounding fractional values.
/// Absent numbers default to zero.
#[allow(clippy::cast_possible_truncation)]
fn integer(value: Option<f64>, field: &str) -> Result<i64, SchemaViolation> {
    match value {
        None => Ok(0),
        // Bounded to 1e9, so the cast cannot truncate.
        Some(v) => bounded(v, field).map(|v| v.round() as i64),
    }
}

fn non_negative(value: Option<f64>, field: &str) -> Result<i64, SchemaViolation> {
    let n = integer(value, field)?;
    if n < 0 {
        return Err(SchemaViolation(format!("{field} must not be negative")));
    }
    Ok(n)
}
