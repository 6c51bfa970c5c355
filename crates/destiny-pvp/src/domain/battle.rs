//! A duel between the local character and an opponent snapshot.

use destiny_character::{Character, Origin};
use destiny_core::rng::{DeterministicRng, pick_index};
use destiny_narrative::domain::directive::ArbitrationResult;
use destiny_narrative::domain::message::{GameMessage, Transcript};
use serde::Serialize;

use super::pairing::{Pairing, PairingSource};

/// How a finished duel ended for the local participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Victory,
    Defeat,
}

/// Synthesizes the opponent's move for a turn, picked uniformly from a
/// small pool of combat templates.
pub fn opponent_action(opponent: &Character, rng: &mut dyn DeterministicRng) -> String {
    let templates = [
        format!("Unleashes {} aggressively", opponent.technique.name),
        "Looks for an opening to counter-attack".to_owned(),
        "Gathers cursed energy for a massive blow".to_owned(),
        "Tries to dodge and recover their stance".to_owned(),
    ];
    let index = pick_index(rng, templates.len()).unwrap_or(0);
    templates.into_iter().nth(index).unwrap_or_default()
}

fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::Sorcerer => "Sorcerer",
        Origin::Curse => "Curse",
    }
}

/// State of one duel. The remote side is a snapshot and is never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Battle {
    pub local: Character,
    pub opponent_username: String,
    pub remote: Character,
    pub transcript: Transcript,
    pub result: Option<MatchResult>,
}

impl Battle {
    /// Opens a duel against `pairing`'s opponent, seeding the transcript
    /// with the arrival narration.
    #[must_use]
    pub fn begin(local: Character, pairing: &Pairing) -> Self {
        let opponent = &pairing.opponent;
        let arrival = match pairing.source {
            PairingSource::JoinedRoom => {
                format!("Invasion confirmed. You challenged {}!", opponent.name)
            }
            PairingSource::HostedRoom | PairingSource::Queue | PairingSource::Discovery => {
                format!(
                    "Fate has crossed paths. {} ({}) rises for the duel!",
                    opponent.name,
                    origin_label(opponent.origin)
                )
            }
        };
        let mut transcript = Transcript::new();
        transcript.push(GameMessage::narrator(arrival));
        Self {
            local,
            opponent_username: pairing.opponent_username.clone(),
            remote: opponent.clone(),
            transcript,
            result: None,
        }
    }

    /// Whether the duel has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// Applies an arbitrated exchange to both sides at once and appends
    /// the player, opponent and narrator records, in that order.
    ///
    /// The local result is decided by local vitality first: if both sides
    /// drop to zero in the same exchange, the local participant loses.
    /// Returns the appended messages.
    pub fn apply(
        &mut self,
        local_action: &str,
        remote_action: &str,
        arbitration: &ArbitrationResult,
    ) -> Vec<GameMessage> {
        self.local.take_damage(arbitration.p1_damage);
        self.local.spend_qi(arbitration.p1_qi_cost);
        self.remote.take_damage(arbitration.p2_damage);
        self.remote.spend_qi(arbitration.p2_qi_cost);

        let mut narration = GameMessage::narrator(arbitration.narrative.clone());
        narration.kokusen = arbitration.kokusen;
        let messages = vec![
            GameMessage::player(local_action),
            GameMessage::opponent(remote_action),
            narration,
        ];
        self.transcript.extend(messages.iter().cloned());

        if self.local.is_down() {
            self.result = Some(MatchResult::Defeat);
        } else if self.remote.is_down() {
            self.result = Some(MatchResult::Victory);
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use destiny_character::Technique;
    use destiny_narrative::domain::message::Role;

    struct FixedIndexRng(u32);

    impl DeterministicRng for FixedIndexRng {
        fn next_u32_range(&mut self, _min: u32, _max: u32) -> u32 {
            self.0
        }

        fn next_f64(&mut self) -> f64 {
            0.0
        }
    }

    fn fighter(name: &str, origin: Origin) -> Character {
        Character::new(
            name,
            origin,
            Technique {
                name: "Ten Shadows".to_owned(),
                description: "Shikigami summoning.".to_owned(),
            },
        )
    }

    fn queue_pairing() -> Pairing {
        Pairing {
            opponent_username: "megumi".to_owned(),
            opponent: fighter("Megumi", Origin::Sorcerer),
            source: PairingSource::Queue,
        }
    }

    fn exchange(p1_damage: i64, p2_damage: i64) -> ArbitrationResult {
        ArbitrationResult {
            narrative: "Fists and shadows collide.".to_owned(),
            p1_damage,
            p1_qi_cost: 10,
            p2_damage,
            p2_qi_cost: 20,
            kokusen: false,
            winner: None,
        }
    }

    #[test]
    fn test_opponent_action_uses_technique_in_first_template() {
        let opponent = fighter("Megumi", Origin::Sorcerer);

        let action = opponent_action(&opponent, &mut FixedIndexRng(0));

        assert_eq!(action, "Unleashes Ten Shadows aggressively");
    }

    #[test]
    fn test_opponent_action_clamps_out_of_range_draws() {
        let opponent = fighter("Megumi", Origin::Sorcerer);

        let action = opponent_action(&opponent, &mut FixedIndexRng(99));

        assert_eq!(action, "Tries to dodge and recover their stance");
    }

    #[test]
    fn test_begin_seeds_arrival_narration() {
        let battle = Battle::begin(fighter("Yuji", Origin::Sorcerer), &queue_pairing());

        assert_eq!(battle.transcript.len(), 1);
        assert_eq!(
            battle.transcript.messages()[0].content,
            "Fate has crossed paths. Megumi (Sorcerer) rises for the duel!"
        );
    }

    #[test]
    fn test_overkill_clamps_local_hp_and_reports_defeat() {
        // Arrange
        let mut local = fighter("Yuji", Origin::Sorcerer);
        local.current_hp = 40;
        let mut battle = Battle::begin(local, &queue_pairing());

        // Act
        let messages = battle.apply("Punch", "Summon Nue", &exchange(50, 0));

        // Assert
        assert_eq!(battle.local.current_hp, 0);
        assert_eq!(battle.result, Some(MatchResult::Defeat));
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Player, Role::Opponent, Role::Narrator]);
        assert_eq!(battle.transcript.len(), 4);
    }

    #[test]
    fn test_damage_lands_on_both_sides_simultaneously() {
        let mut battle = Battle::begin(fighter("Yuji", Origin::Sorcerer), &queue_pairing());

        battle.apply("Punch", "Divine Dogs", &exchange(30, 45));

        assert_eq!(battle.local.current_hp, 170);
        assert_eq!(battle.local.current_qi, 140);
        assert_eq!(battle.remote.current_hp, 155);
        assert_eq!(battle.remote.current_qi, 130);
        assert!(!battle.is_over());
    }

    #[test]
    fn test_double_knockout_is_a_local_defeat() {
        let mut battle = Battle::begin(fighter("Yuji", Origin::Sorcerer), &queue_pairing());

        battle.apply("Black Flash", "Max Elephant", &exchange(500, 500));

        assert_eq!(battle.remote.current_hp, 0);
        assert_eq!(battle.result, Some(MatchResult::Defeat));
    }

    #[test]
    fn test_remote_knockout_is_a_victory() {
        let mut battle = Battle::begin(fighter("Yuji", Origin::Sorcerer), &queue_pairing());

        battle.apply("Black Flash", "Max Elephant", &exchange(0, 999));

        assert_eq!(battle.result, Some(MatchResult::Victory));
    }
}
