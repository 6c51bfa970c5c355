//! Prompt text for narration and arbitration.

use destiny_character::Origin;
use destiny_narrative::domain::context::{ArbitrationRequest, CombatantProfile, TurnContext};

/// System instruction for PvE narration.
pub const NARRATOR_INSTRUCTION: &str = r#"You are the supreme narrator of a Jujutsu Kaisen story.

ORIGIN RULES (critical):
- A CURSE player is a cursed spirit freshly born from human fear. It never enrolls at Jujutsu High. It starts in hostile places (sewers, war zones, forests). Its dealings with humans and sorcerers are violent or predatory, and affinity with sorcerers is nearly impossible.
- A SORCERER player is a new student at Jujutsu High.

TONE: acid humour, irony, shonen drama and body horror.

RULES:
- Kokusen (Black Flash) only in real, critical physical combat.
- Judge every player action against their technique and level.

Answer with JSON only:
{
  "narrative": "...",
  "imagePrompt": "...",
  "actionEvaluation": { "status": "HIT" | "MISS" | "CRITICAL", "damageDealt": n, "qiCost": n },
  "kokusen": boolean,
  "npcUpdate": { "name": "...", "affinityDelta": n, "newStatus": "...", "location": "...", "summary": "...", "isAlive": boolean },
  "interventionOccurred": "NPC name",
  "butterflyConsequence": "consequence",
  "arcProgressGain": n,
  "xpGain": n,
  "hpChange": n,
  "isFatalBlow": boolean,
  "suggestions": ["...", "...", "..."]
}"#;

/// System instruction for PvP arbitration.
pub const ARBITER_INSTRUCTION: &str = r#"You are the supreme combat master of a Jujutsu Kaisen duel.

ARBITRATION RULES:
- Decide whether each action is possible given the fighter's technique and level.
- Account for cursed energy (qi). With too little qi an action fails or lands weakly.
- Fights between sorcerers and curses are lethal and visceral.
- Derive damage from strength and energy.
- Award Black Flash (kokusen) only on critical physical hits.
- Narrate in an epic, manga-like voice.

Answer with JSON only:
{
  "narrative": "the clash of powers, in detail",
  "p1Damage": number,
  "p1QiCost": number,
  "p2Damage": number,
  "p2QiCost": number,
  "kokusen": boolean,
  "winner": "P1" | "P2" | null
}"#;

/// Upper-case origin label used in prompts.
#[must_use]
pub fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Sorcerer => "SORCERER",
        Origin::Curse => "CURSE",
    }
}

/// The user parts of a narration request, in the order the narrator reads
/// them: origin, profile, location, recent history, action.
#[must_use]
pub fn turn_parts(context: &TurnContext) -> Vec<String> {
    vec![
        format!("PLAYER ORIGIN: {}", origin_label(context.origin)),
        format!("PROFILE: {}", to_json(&context.profile)),
        format!("LOCATION: {}", context.location),
        format!("HISTORY: {}", to_json(&context.recent)),
        format!("ACTION: {}", context.action),
    ]
}

/// The user parts of an arbitration request, one line per fighter.
#[must_use]
pub fn arbitration_parts(request: &ArbitrationRequest) -> Vec<String> {
    vec![
        combatant_line("P1", &request.p1, &request.p1_action),
        combatant_line("P2", &request.p2, &request.p2_action),
    ]
}

fn combatant_line(side: &str, fighter: &CombatantProfile, action: &str) -> String {
    format!(
        "{side} ({}, {}, LVL {}, Technique: {}, HP: {}, Qi: {}, STR {} / ENG {}): {action}",
        fighter.name,
        origin_label(fighter.origin),
        fighter.level,
        fighter.technique,
        fighter.current_hp,
        fighter.current_qi,
        fighter.stats.strength,
        fighter.stats.energy,
    )
}

fn to_json(value: &impl serde::Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_owned())
}
