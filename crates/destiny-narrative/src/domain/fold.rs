//! Folding a directive into character and world state.

use destiny_character::Character;
use destiny_world_state::WorldState;

use super::directive::{Directive, EvaluationTier};

/// Character and world after one directive, plus the terminal verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldedTurn {
    pub character: Character,
    pub world_state: WorldState,
    /// Permanent death: vitality reached zero or the blow was fatal.
    pub terminal: bool,
}

/// Applies `directive` to copies of `character` and `world`.
///
/// Order is fixed: vitality delta, qi cost, experience, mastery, NPC
/// update, arc progress, consequence log, terminal check. The inputs are
/// never touched, so a caller that discards the result has mutated nothing.
#[must_use]
pub fn fold_directive(
    character: &Character,
    world: &WorldState,
    directive: &Directive,
    mastery_increment: f64,
) -> FoldedTurn {
    let mut character = character.clone();
    let mut world_state = world.clone();

    character.apply_hp_delta(directive.hp_change);
    if let Some(evaluation) = &directive.evaluation {
        character.spend_qi(evaluation.qi_cost);
    }
    character.gain_xp(directive.xp_gain);
    if directive
        .evaluation
        .is_some_and(|evaluation| evaluation.tier != EvaluationTier::Miss)
    {
        character.raise_mastery(mastery_increment);
    }

    if let Some(update) = &directive.npc_update {
        world_state.apply_npc_update(update);
    }
    if let Some(gain) = directive.arc_progress_gain {
        world_state.advance_arc(gain);
    }
    if let Some(consequence) = &directive.consequence {
        world_state.record_consequence(consequence);
    }

    let terminal = character.is_down() || directive.fatal;

    FoldedTurn {
        character,
        world_state,
        terminal,
    }
}
