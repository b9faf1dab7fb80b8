use crate::card::Trigger;
use crate::game::agenda::{self, Agenda, Step};
use crate::game::player::PlayerId;
use crate::game::state::{GameState, LossReason};

/// Move `owner`'s dead creatures to the graveyard in board order and
/// queue their on_death abilities, then the life check.
pub(crate) fn collect_deaths(state: &mut GameState, owner: PlayerId) -> Vec<Step> {
    let dead = state.player_mut(owner).board.remove_dead();
    let mut steps = Vec::with_capacity(dead.len() + 1);
    for creature in dead {
        state.log(format!("[Death] {} dies", creature.name()));
        let card = creature.card;
        state.player_mut(owner).graveyard.add_card(card.clone());
        steps.push(Step::Trigger {
            card,
            trigger: Trigger::OnDeath,
            owner,
        });
    }
    steps.push(Step::CheckLife(owner));
    steps
}

pub(crate) fn check_life(state: &mut GameState, owner: PlayerId) {
    if state.player(owner).hp <= 0 {
        state.declare_loss(owner, LossReason::HealthDepleted);
    }
}

/// Remove dead creatures (with their on_death abilities) and end the game
/// for a player at or below 0 HP. P1 is evaluated first. Running it again
/// without intervening changes does nothing.
pub fn evaluate_deaths(state: &mut GameState) {
    if state.is_over() || state.pending.is_some() {
        return;
    }
    agenda::run(state, Agenda::of([Step::EvaluateDeaths]));
}

/// True when a creature is dead or a player is out of life
pub fn needs_evaluation(state: &GameState) -> bool {
    PlayerId::BOTH.iter().any(|&p| {
        let player = state.player(p);
        player.hp <= 0 || player.board.creatures().iter().any(|c| c.is_dead())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Ability, CardDefinition, Effect};
    use crate::game::state::Phase;
    use crate::game::testing::{board_creature, test_game};
    use crate::game::zones::{CardInstance, Creature, InstanceId};
    use std::sync::Arc;

    #[test]
    fn test_dead_creatures_move_to_graveyard() {
        let mut state = test_game();
        board_creature(&mut state, PlayerId::P1, 10, 1, 2);
        board_creature(&mut state, PlayerId::P1, 11, 1, 2);
        state.p1.board.creatures_mut()[0].health_current = 0;

        evaluate_deaths(&mut state);
        assert_eq!(state.p1.board.ids(), vec![InstanceId(11)]);
        assert_eq!(state.p1.graveyard.size(), 1);
        assert!(!needs_evaluation(&state));
    }

    #[test]
    fn test_on_death_drain_can_end_the_game() {
        let mut state = test_game();
        let def = CardDefinition::creature("wisp", "Grave Wisp", 2, 2, 1, 0)
            .with_ability(Ability::new(Trigger::OnDeath, Effect::DrainLife { amount: 2 }));
        let mut wisp = Creature::summon(CardInstance::new(InstanceId(10), Arc::new(def)));
        wisp.health_current = 0;
        state.p1.board.add_creature(wisp);
        state.p2.hp = 1;

        evaluate_deaths(&mut state);
        assert_eq!(state.phase, Phase::GameOver);
        assert_eq!(state.winner(), Some(PlayerId::P1));
        assert_eq!(state.p2.hp, 0);
    }

    #[test]
    fn test_p1_checked_first_when_both_depleted() {
        let mut state = test_game();
        state.p1.hp = 0;
        state.p2.hp = -2;
        evaluate_deaths(&mut state);
        assert_eq!(state.winner(), Some(PlayerId::P2));
        assert_eq!(state.p2.hp, 0);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let mut state = test_game();
        board_creature(&mut state, PlayerId::P2, 50, 1, 2);
        state.p2.board.creatures_mut()[0].health_current = -1;
        evaluate_deaths(&mut state);
        let graveyard = state.p2.graveyard.size();
        let log_len = state.log.len();

        evaluate_deaths(&mut state);
        assert_eq!(state.p2.graveyard.size(), graveyard);
        assert_eq!(state.log.len(), log_len);
    }
}
