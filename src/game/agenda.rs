//! Ordered work queue driving ability resolution, death processing and
//! combat wrap-up.
//!
//! Everything that can trigger an ability runs through [`run`]. When a
//! `tap_enemy` ability needs a choice the remaining queue is parked in
//! [`PendingInput`] and picked up again by [`select_tap_target`], so the
//! interrupted operation finishes exactly where it stopped.

use crate::card::Trigger;
use crate::game::resolver::{self, Resolution};
use crate::game::combat;
use crate::game::commands::CommandError;
use crate::game::death;
use crate::game::player::PlayerId;
use crate::game::state::{GameState, PendingInput, Phase};
use crate::game::zones::{CardInstance, InstanceId};
use log::trace;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Resolve `card`'s ability for `trigger`
    Trigger {
        card: CardInstance,
        trigger: Trigger,
        owner: PlayerId,
    },
    /// Fire on_attack for whatever creature is the current attacker
    AttackerOnAttack,
    /// Ask for a tap_enemy target among the living untapped enemies
    TapChoice { card: CardInstance, owner: PlayerId },
    /// Resolve a paid action card, then discard it
    ApplyAction(CardInstance),
    ToGraveyard { owner: PlayerId, card: CardInstance },
    /// Full death pass: P1 first, then P2
    EvaluateDeaths,
    Deaths(PlayerId),
    CheckLife(PlayerId),
    /// Untapped defender strikes back at the attacker
    Counterattack { from: String, power: i32 },
    FinishCombat,
    EndCombat,
    EnterPhase(Phase),
}

impl Step {
    fn label(&self) -> String {
        match self {
            Step::Trigger { card, trigger, owner } => {
                format!("trigger {} {} ({})", card.name(), trigger, owner)
            }
            Step::AttackerOnAttack => "attacker on_attack".to_string(),
            Step::TapChoice { card, .. } => format!("tap choice {}", card.name()),
            Step::ApplyAction(card) => format!("apply {}", card.name()),
            Step::ToGraveyard { card, .. } => format!("discard {}", card.name()),
            Step::EvaluateDeaths => "evaluate deaths".to_string(),
            Step::Deaths(p) => format!("deaths {}", p),
            Step::CheckLife(p) => format!("life check {}", p),
            Step::Counterattack { from, power } => format!("counterattack {} ({})", from, power),
            Step::FinishCombat => "finish combat".to_string(),
            Step::EndCombat => "end combat".to_string(),
            Step::EnterPhase(phase) => format!("enter {}", phase),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Agenda {
    steps: VecDeque<Step>,
}

impl Agenda {
    pub(crate) fn new() -> Self {
        Agenda::default()
    }

    pub(crate) fn of(steps: impl IntoIterator<Item = Step>) -> Self {
        Agenda {
            steps: steps.into_iter().collect(),
        }
    }

    pub(crate) fn push_back(&mut self, step: Step) {
        self.steps.push_back(step);
    }

    pub(crate) fn push_front(&mut self, step: Step) {
        self.steps.push_front(step);
    }

    /// Insert `steps` ahead of everything queued, keeping their order
    pub(crate) fn push_front_all(&mut self, steps: Vec<Step>) {
        for step in steps.into_iter().rev() {
            self.steps.push_front(step);
        }
    }

    fn pop(&mut self) -> Option<Step> {
        self.steps.pop_front()
    }

    /// Action cards owned by queued steps and not yet in any zone
    pub fn held_cards(&self) -> Vec<&CardInstance> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::ApplyAction(card) => Some(card),
                Step::ToGraveyard { card, .. } => Some(card),
                _ => None,
            })
            .collect()
    }
}

/// Execute queued steps until the queue drains, the game ends, or an
/// ability suspends for input.
pub(crate) fn run(state: &mut GameState, mut agenda: Agenda) {
    while let Some(step) = agenda.pop() {
        if state.is_over() {
            agenda.push_front(step);
            discard_held_cards(state, agenda);
            return;
        }
        trace!("agenda: {}", step.label());

        match step {
            Step::Trigger {
                card,
                trigger,
                owner,
            } => match resolver::resolve(state, &card, trigger, owner) {
                Resolution::NoOp => {}
                Resolution::Applied => agenda.push_front(Step::EvaluateDeaths),
                // Settle deaths first so no corpse is offered as a target
                Resolution::AwaitingTapTarget { .. } => {
                    agenda.push_front_all(vec![Step::EvaluateDeaths, Step::TapChoice { card, owner }]);
                }
            },
            Step::TapChoice { card, owner } => {
                let candidates = state.player(owner.opponent()).board.tap_candidates();
                if candidates.len() > 1 {
                    suspend(state, &card, owner, candidates, agenda);
                    return;
                }
                resolver::tap_single_candidate(state, &card, owner, &candidates);
            }
            Step::AttackerOnAttack => {
                let active = state.active;
                let attacker = state
                    .combat
                    .attacker
                    .and_then(|id| state.player(active).board.get(id))
                    .map(|c| c.card.clone());
                if let Some(card) = attacker {
                    agenda.push_front(Step::Trigger {
                        card,
                        trigger: Trigger::OnAttack,
                        owner: active,
                    });
                }
            }
            Step::ApplyAction(card) => {
                let owner = state.active;
                state.combat.resolved_actions.push(card.name().to_string());
                agenda.push_front_all(vec![
                    Step::Trigger {
                        card: card.clone(),
                        trigger: Trigger::OnResolve,
                        owner,
                    },
                    Step::ToGraveyard { owner, card },
                ]);
            }
            Step::ToGraveyard { owner, card } => {
                state.player_mut(owner).graveyard.add_card(card);
            }
            Step::EvaluateDeaths => {
                agenda.push_front_all(vec![
                    Step::Deaths(PlayerId::P1),
                    Step::Deaths(PlayerId::P2),
                ]);
            }
            Step::Deaths(owner) => {
                let steps = death::collect_deaths(state, owner);
                agenda.push_front_all(steps);
            }
            Step::CheckLife(owner) => death::check_life(state, owner),
            Step::Counterattack { from, power } => {
                if let Some(step) = combat::counterattack(state, &from, power) {
                    agenda.push_front(step);
                }
            }
            Step::FinishCombat => {
                combat::tap_attacker(state);
                agenda.push_front_all(vec![Step::EvaluateDeaths, Step::EndCombat]);
            }
            Step::EndCombat => combat::end_combat(state),
            Step::EnterPhase(phase) => state.phase = phase,
        }
    }
}

/// Game ended mid-queue: action cards still in flight go to their
/// owner's graveyard so no card leaves the game.
fn discard_held_cards(state: &mut GameState, agenda: Agenda) {
    for step in agenda.steps {
        match step {
            Step::ApplyAction(card) => {
                let owner = state.active;
                state.player_mut(owner).graveyard.add_card(card);
            }
            Step::ToGraveyard { owner, card } => state.player_mut(owner).graveyard.add_card(card),
            _ => {}
        }
    }
}

fn suspend(
    state: &mut GameState,
    card: &CardInstance,
    owner: PlayerId,
    candidates: Vec<InstanceId>,
    continuation: Agenda,
) {
    state.log(format!(
        "[Ability] {}: choose an enemy creature to tap ({} options)",
        card.name(),
        candidates.len()
    ));
    state.pending = Some(PendingInput {
        card_name: card.name().to_string(),
        owner,
        candidates,
        resume_phase: state.phase,
        continuation,
    });
    state.phase = Phase::CombatSelectTapTarget;
}

/// Answer a suspended tap_enemy choice and finish the interrupted operation.
///
/// An id that is not an untapped creature of the owner's opponent is
/// rejected and the game stays suspended.
pub fn select_tap_target(state: &mut GameState, id: InstanceId) -> Result<Phase, CommandError> {
    if state.is_over() {
        return Err(CommandError::GameOver);
    }
    let Some(pending) = state.pending.as_ref() else {
        return Err(CommandError::PhaseMismatch {
            command: "select_tap_target",
            phase: state.phase,
        });
    };
    let enemy = pending.owner.opponent();
    let valid = pending.candidates.contains(&id)
        && state.player(enemy).board.get(id).is_some_and(|c| !c.tapped && !c.is_dead());
    if !valid {
        return Err(CommandError::InvalidTapTarget(id));
    }

    let Some(pending) = state.pending.take() else {
        return Err(CommandError::InvalidTapTarget(id));
    };
    let name = match state.player_mut(enemy).board.get_mut(id) {
        Some(creature) => {
            creature.tapped = true;
            creature.name().to_string()
        }
        None => return Err(CommandError::InvalidTapTarget(id)),
    };
    state.log(format!("[Ability] {} taps {}", pending.card_name, name));
    state.phase = pending.resume_phase;
    run(state, pending.continuation);
    Ok(state.phase)
}

/// Public entry for resolving one ability outside of a command, with the
/// follow-up death pass. A tap choice suspends the game as usual.
pub fn resolve_ability(state: &mut GameState, card: &CardInstance, trigger: Trigger, owner: PlayerId) {
    if state.is_over() || state.pending.is_some() {
        return;
    }
    run(
        state,
        Agenda::of([Step::Trigger {
            card: card.clone(),
            trigger,
            owner,
        }]),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Ability, CardDefinition, Effect};
    use crate::game::testing::{board_creature, test_game};
    use std::sync::Arc;

    fn tapper(id: u32) -> CardInstance {
        let def = CardDefinition::action("vines", "Binding Vines", 2, 1)
            .with_ability(Ability::new(Trigger::OnResolve, Effect::TapEnemy));
        CardInstance::new(InstanceId(id), Arc::new(def))
    }

    #[test]
    fn test_push_front_all_keeps_order() {
        let mut agenda = Agenda::of([Step::EndCombat]);
        agenda.push_front_all(vec![Step::Deaths(PlayerId::P1), Step::Deaths(PlayerId::P2)]);
        let labels: Vec<String> = agenda.steps.iter().map(Step::label).collect();
        assert_eq!(labels, vec!["deaths Player 1", "deaths Player 2", "end combat"]);
    }

    #[test]
    fn test_single_candidate_taps_without_suspending() {
        let mut state = test_game();
        board_creature(&mut state, PlayerId::P2, 50, 2, 2);
        resolve_ability(&mut state, &tapper(90), Trigger::OnResolve, PlayerId::P1);

        assert!(state.pending.is_none());
        assert!(state.p2.board.get(InstanceId(50)).is_some_and(|c| c.tapped));
    }

    #[test]
    fn test_suspend_and_resume() {
        let mut state = test_game();
        state.phase = Phase::CombatApplyActions;
        for id in 50..53 {
            board_creature(&mut state, PlayerId::P2, id, 2, 2);
        }
        resolve_ability(&mut state, &tapper(90), Trigger::OnResolve, PlayerId::P1);

        assert_eq!(state.phase, Phase::CombatSelectTapTarget);
        let pending = state.pending.as_ref().expect("pending input");
        assert_eq!(pending.candidates.len(), 3);
        assert_eq!(pending.resume_phase, Phase::CombatApplyActions);

        let phase = select_tap_target(&mut state, InstanceId(51)).expect("valid target");
        assert_eq!(phase, Phase::CombatApplyActions);
        assert!(state.pending.is_none());
        let tapped: Vec<bool> = state.p2.board.creatures().iter().map(|c| c.tapped).collect();
        assert_eq!(tapped, vec![false, true, false]);
    }

    #[test]
    fn test_invalid_tap_target_leaves_state_suspended() {
        let mut state = test_game();
        for id in 50..52 {
            board_creature(&mut state, PlayerId::P2, id, 2, 2);
        }
        board_creature(&mut state, PlayerId::P1, 60, 2, 2);
        resolve_ability(&mut state, &tapper(90), Trigger::OnResolve, PlayerId::P1);

        let own = select_tap_target(&mut state, InstanceId(60));
        assert!(matches!(own, Err(CommandError::InvalidTapTarget(_))));
        let missing = select_tap_target(&mut state, InstanceId(999));
        assert!(matches!(missing, Err(CommandError::InvalidTapTarget(_))));

        assert_eq!(state.phase, Phase::CombatSelectTapTarget);
        assert!(state.pending.is_some());
        assert!(state.p2.board.creatures().iter().all(|c| !c.tapped));
    }

    #[test]
    fn test_held_cards_track_resolving_actions() {
        let card = tapper(90);
        let agenda = Agenda::of([
            Step::EvaluateDeaths,
            Step::ToGraveyard {
                owner: PlayerId::P1,
                card,
            },
        ]);
        let held: Vec<InstanceId> = agenda.held_cards().iter().map(|c| c.id).collect();
        assert_eq!(held, vec![InstanceId(90)]);
    }

    #[test]
    fn test_select_without_pending_is_rejected() {
        let mut state = test_game();
        board_creature(&mut state, PlayerId::P2, 1, 2, 2);
        assert!(matches!(
            select_tap_target(&mut state, InstanceId(1)),
            Err(CommandError::PhaseMismatch { .. })
        ));
    }
}
