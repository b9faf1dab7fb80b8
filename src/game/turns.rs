use crate::card::{CardKind, Trigger};
use crate::game::agenda::{self, Agenda, Step};
use crate::game::commands::{expect_phase, pay_for_card, CommandError};
use crate::game::player::PlayerId;
use crate::game::state::{GameState, Phase};
use crate::game::zones::{Creature, InstanceId};

/// Deal opening hands (alternating, P1 first) and run P1's first maintenance
pub fn start_game(state: &mut GameState) {
    state.announce("[Game] new game".to_string());
    for _ in 0..state.rules.starting_hand_size {
        for player in PlayerId::BOTH {
            if !state.draw_card(player, true) {
                return;
            }
        }
    }
    state.active = PlayerId::P1;
    enter_maintenance(state);
}

/// Start the active player's turn: draw, untap, mana, then Play phase.
///
/// P1 skips the draw on their very first turn. An empty deck ends the game
/// before anything else changes.
pub fn enter_maintenance(state: &mut GameState) {
    if state.is_over() {
        return;
    }
    state.phase = Phase::Maintenance;
    state.turn += 1;
    let active = state.active;
    state.player_mut(active).turn_count += 1;

    let first_turn = state.player(active).turn_count == 1;
    if !(active == PlayerId::P1 && first_turn) && !state.draw_card(active, false) {
        return;
    }

    let mana_per_turn = state.rules.mana_per_turn;
    let max_mana = state.rules.max_mana;
    let player = state.player_mut(active);
    for creature in player.board.creatures_mut() {
        creature.tapped = false;
        creature.summoned_this_turn = false;
    }
    if !first_turn {
        player.mana_available = (player.mana_available + mana_per_turn).min(max_mana);
    }
    player.mana_current = player.mana_available;
    let mana = player.mana_current;

    let turn = state.turn;
    state.announce(format!("━━ Turn {} · {} · Mana {} ━━", turn, active, mana));
    state.phase = Phase::PlayCreatures;
}

/// Summon a creature from hand and resolve its on_play ability
pub fn play_creature(state: &mut GameState, card_id: InstanceId) -> Result<Phase, CommandError> {
    expect_phase(state, "play_creature", &[Phase::PlayCreatures])?;
    let active = state.active;
    let max_board = state.rules.max_board;
    if state.player(active).board.size() >= max_board {
        return Err(CommandError::BoardFull(max_board));
    }
    let card = pay_for_card(state, active, card_id, CardKind::Creature)?;

    state.log(format!("[Summon] {} plays {} (summoning sickness)", active, card.name()));
    state.player_mut(active).board.add_creature(Creature::summon(card.clone()));
    agenda::run(
        state,
        Agenda::of([Step::Trigger {
            card,
            trigger: Trigger::OnPlay,
            owner: active,
        }]),
    );
    Ok(state.phase)
}

pub fn enter_combat(state: &mut GameState) -> Result<Phase, CommandError> {
    expect_phase(state, "enter_combat", &[Phase::PlayCreatures])?;
    state.phase = if state.rules.pre_combat_actions {
        Phase::CombatPreActions
    } else {
        Phase::CombatSelectAttacker
    };
    Ok(state.phase)
}

/// Finish the turn: drop shields, discard down to the hand limit, pass to
/// the opponent's maintenance.
pub fn end_turn(state: &mut GameState) -> Result<Phase, CommandError> {
    expect_phase(
        state,
        "end_turn",
        &[Phase::PlayCreatures, Phase::CombatPreActions, Phase::CombatSelectAttacker],
    )?;
    state.phase = Phase::EndTurn;
    state.combat.reset();
    let active = state.active;
    let heal_all = state.rules.heal_creatures_at_end_of_turn;
    let max_hand = state.rules.max_hand;

    for creature in state.player_mut(active).board.creatures_mut() {
        creature.damage_prevention = 0;
    }
    if heal_all {
        for player in PlayerId::BOTH {
            for creature in state.player_mut(player).board.creatures_mut() {
                creature.health_current = creature.health_max;
            }
        }
    }

    while state.player(active).hand.size() > max_hand {
        let player = state.player_mut(active);
        let Some(card) = player.hand.pop_last() else {
            break;
        };
        let name = card.name().to_string();
        player.graveyard.add_card(card);
        state.log(format!("[Discard] {} discards {}", active, name));
    }

    state.log(format!("[Turn] {} ends turn", active));
    state.active = active.opponent();
    enter_maintenance(state);
    Ok(state.phase)
}
