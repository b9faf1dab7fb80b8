use crate::card::CardKind;
use crate::game::agenda;
use crate::game::combat;
use crate::game::player::{PlayerId, PlayerState};
use crate::game::state::{AttackTarget, GameState, Phase};
use crate::game::turns;
use crate::game::zones::{CardInstance, InstanceId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a command was rejected. A rejected command leaves the state untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{command} is not legal during {phase}")]
    PhaseMismatch { command: &'static str, phase: Phase },
    #[error("The game is over")]
    GameOver,
    #[error("Waiting for a tap target")]
    AwaitingInput,
    #[error("Need {need} mana, have {have}")]
    InsufficientMana { need: u32, have: u32 },
    #[error("Board full (max {0})")]
    BoardFull(usize),
    #[error("Card {0} is not in hand")]
    CardNotInHand(InstanceId),
    #[error("Creature {0} is not on the board")]
    CreatureNotOnBoard(InstanceId),
    #[error("{0} is not a creature")]
    NotACreature(String),
    #[error("{0} is not an action")]
    NotAnAction(String),
    #[error("{0} has no block value")]
    NoBlockValue(String),
    #[error("{0} has summoning sickness and cannot attack the turn it was played")]
    SummoningSick(String),
    #[error("{0} is tapped")]
    AlreadyTapped(String),
    #[error("Must attack an untapped creature first ({0} untapped)")]
    DefendersUntapped(usize),
    #[error("{0} is not a valid tap target")]
    InvalidTapTarget(InstanceId),
}

impl CommandError {
    /// Commands issued at the wrong time, as opposed to illegal choices
    pub fn is_phase_violation(&self) -> bool {
        matches!(
            self,
            CommandError::PhaseMismatch { .. } | CommandError::GameOver | CommandError::AwaitingInput
        )
    }
}

/// Every input the engine accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum Command {
    PlayCreature { card: InstanceId },
    EnterCombat,
    PlayPreAction { card: InstanceId },
    SkipPreActions,
    SelectAttacker { creature: InstanceId },
    PlayAction { card: InstanceId },
    SkipActions,
    ProceedApplyActions,
    SelectTarget { target: AttackTarget },
    PlayBlock { card: InstanceId },
    SkipBlock,
    SelectTapTarget { creature: InstanceId },
    EndTurn,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PlayCreature { card } => write!(f, "play_creature {}", card),
            Command::EnterCombat => f.write_str("enter_combat"),
            Command::PlayPreAction { card } => write!(f, "play_pre_action {}", card),
            Command::SkipPreActions => f.write_str("skip_pre_actions"),
            Command::SelectAttacker { creature } => write!(f, "select_attacker {}", creature),
            Command::PlayAction { card } => write!(f, "play_action {}", card),
            Command::SkipActions => f.write_str("skip_actions"),
            Command::ProceedApplyActions => f.write_str("proceed_apply_actions"),
            Command::SelectTarget { target: AttackTarget::Player } => f.write_str("select_target player"),
            Command::SelectTarget {
                target: AttackTarget::Creature(id),
            } => write!(f, "select_target {}", id),
            Command::PlayBlock { card } => write!(f, "play_block {}", card),
            Command::SkipBlock => f.write_str("skip_block"),
            Command::SelectTapTarget { creature } => write!(f, "select_tap_target {}", creature),
            Command::EndTurn => f.write_str("end_turn"),
        }
    }
}

/// Dispatch one command. On success returns the phase the game is now in.
pub fn apply(state: &mut GameState, command: Command) -> Result<Phase, CommandError> {
    match command {
        Command::PlayCreature { card } => turns::play_creature(state, card),
        Command::EnterCombat => turns::enter_combat(state),
        Command::PlayPreAction { card } => combat::play_pre_action(state, card),
        Command::SkipPreActions => combat::skip_pre_actions(state),
        Command::SelectAttacker { creature } => combat::select_attacker(state, creature),
        Command::PlayAction { card } => combat::play_action(state, card),
        Command::SkipActions => combat::skip_actions(state),
        Command::ProceedApplyActions => combat::proceed_apply_actions(state),
        Command::SelectTarget { target } => combat::select_target(state, target),
        Command::PlayBlock { card } => combat::play_block(state, card),
        Command::SkipBlock => combat::skip_block(state),
        Command::SelectTapTarget { creature } => agenda::select_tap_target(state, creature),
        Command::EndTurn => turns::end_turn(state),
    }
}

/// Commands that would be accepted right now
pub fn legal_commands(state: &GameState) -> Vec<Command> {
    let mut commands = Vec::new();
    if state.is_over() {
        return commands;
    }
    if let Some(pending) = &state.pending {
        let enemy = state.player(pending.owner.opponent());
        for &id in &pending.candidates {
            if enemy.board.get(id).is_some_and(|c| !c.tapped) {
                commands.push(Command::SelectTapTarget { creature: id });
            }
        }
        return commands;
    }

    let active = state.active_player();

    match state.phase {
        Phase::PlayCreatures => {
            if active.board.size() < state.rules.max_board {
                commands.extend(affordable(active, CardKind::Creature).map(|card| Command::PlayCreature { card }));
            }
            commands.push(Command::EnterCombat);
            commands.push(Command::EndTurn);
        }
        Phase::CombatPreActions => {
            commands.extend(affordable(active, CardKind::Action).map(|card| Command::PlayPreAction { card }));
            commands.push(Command::SkipPreActions);
            commands.push(Command::EndTurn);
        }
        Phase::CombatSelectAttacker => {
            for creature in active.board.creatures().iter().filter(|c| c.can_attack()) {
                commands.push(Command::SelectAttacker { creature: creature.id() });
            }
            commands.push(Command::EndTurn);
        }
        Phase::CombatAttackActions => {
            commands.extend(affordable(active, CardKind::Action).map(|card| Command::PlayAction { card }));
            commands.push(Command::ProceedApplyActions);
            commands.push(Command::SkipActions);
        }
        Phase::CombatSelectTarget => {
            let defender = state.defender();
            for id in defender.board.ids() {
                commands.push(Command::SelectTarget {
                    target: AttackTarget::Creature(id),
                });
            }
            if defender.untapped_count() == 0 {
                commands.push(Command::SelectTarget {
                    target: AttackTarget::Player,
                });
            }
        }
        Phase::CombatBlock => {
            for card in state.defender().hand.cards().iter().filter(|c| c.block() > 0) {
                commands.push(Command::PlayBlock { card: card.id });
            }
            commands.push(Command::SkipBlock);
        }
        Phase::Maintenance
        | Phase::CombatApplyActions
        | Phase::CombatResolve
        | Phase::CombatSelectTapTarget
        | Phase::EndTurn
        | Phase::GameOver => {}
    }
    commands
}

fn affordable(player: &PlayerState, kind: CardKind) -> impl Iterator<Item = InstanceId> + '_ {
    player
        .hand
        .cards()
        .iter()
        .filter(move |c| c.definition.kind == kind && player.can_afford(c.cost()))
        .map(|c| c.id)
}

/// Shared precondition: game running, no pending input, phase allowed
pub(crate) fn expect_phase(
    state: &GameState,
    command: &'static str,
    phases: &[Phase],
) -> Result<(), CommandError> {
    if state.is_over() {
        return Err(CommandError::GameOver);
    }
    if state.pending.is_some() {
        return Err(CommandError::AwaitingInput);
    }
    if !phases.contains(&state.phase) {
        return Err(CommandError::PhaseMismatch {
            command,
            phase: state.phase,
        });
    }
    Ok(())
}

/// Take a card of `kind` from `owner`'s hand and pay its cost.
/// Nothing changes unless every check passes.
pub(crate) fn pay_for_card(
    state: &mut GameState,
    owner: PlayerId,
    card_id: InstanceId,
    kind: CardKind,
) -> Result<CardInstance, CommandError> {
    let player = state.player_mut(owner);
    let card = player
        .hand
        .find(card_id)
        .ok_or(CommandError::CardNotInHand(card_id))?;
    if card.definition.kind != kind {
        let name = card.name().to_string();
        return Err(match kind {
            CardKind::Creature => CommandError::NotACreature(name),
            CardKind::Action => CommandError::NotAnAction(name),
        });
    }
    if !player.can_afford(card.cost()) {
        return Err(CommandError::InsufficientMana {
            need: card.cost(),
            have: player.mana_current,
        });
    }
    let card = player
        .hand
        .remove_card(card_id)
        .ok_or(CommandError::CardNotInHand(card_id))?;
    player.mana_current -= card.cost();
    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{board_creature, hand_card, test_game};

    #[test]
    fn test_rejected_command_changes_nothing() {
        let mut state = test_game();
        let before = state.log.len();
        let result = apply(&mut state, Command::SkipBlock);
        assert_eq!(
            result,
            Err(CommandError::PhaseMismatch {
                command: "skip_block",
                phase: Phase::PlayCreatures
            })
        );
        assert!(result.unwrap_err().is_phase_violation());
        assert_eq!(state.phase, Phase::PlayCreatures);
        assert_eq!(state.log.len(), before);
    }

    #[test]
    fn test_insufficient_mana_keeps_card_in_hand() {
        let mut state = test_game();
        hand_card(&mut state, PlayerId::P1, 70, 1);
        state.p1.mana_current = 0;
        state.phase = Phase::CombatPreActions;
        let result = apply(&mut state, Command::PlayPreAction { card: InstanceId(70) });
        assert_eq!(result, Err(CommandError::InsufficientMana { need: 1, have: 0 }));
        assert!(!result.unwrap_err().is_phase_violation());
        assert!(state.p1.hand.find(InstanceId(70)).is_some());
    }

    #[test]
    fn test_game_over_rejects_everything() {
        let mut state = test_game();
        state.declare_loss(PlayerId::P2, crate::game::state::LossReason::HealthDepleted);
        assert_eq!(apply(&mut state, Command::EndTurn), Err(CommandError::GameOver));
        assert!(legal_commands(&state).is_empty());
    }

    #[test]
    fn test_legal_commands_in_select_attacker() {
        let mut state = test_game();
        state.phase = Phase::CombatSelectAttacker;
        board_creature(&mut state, PlayerId::P1, 10, 1, 1);
        board_creature(&mut state, PlayerId::P1, 11, 1, 1);
        state.p1.board.creatures_mut()[1].summoned_this_turn = true;
        assert_eq!(
            legal_commands(&state),
            vec![Command::SelectAttacker { creature: InstanceId(10) }, Command::EndTurn]
        );
    }

    #[test]
    fn test_every_legal_command_is_accepted() {
        let mut state = test_game();
        hand_card(&mut state, PlayerId::P1, 70, 1);
        state.phase = Phase::CombatPreActions;
        for command in legal_commands(&state) {
            let mut copy = state.clone();
            assert!(apply(&mut copy, command).is_ok(), "{} rejected", command);
        }
    }

    #[test]
    fn test_command_display() {
        let cmd = Command::SelectTarget {
            target: AttackTarget::Creature(InstanceId(4)),
        };
        assert_eq!(cmd.to_string(), "select_target #4");
    }
}
