use crate::card::{CardKind, Trigger};
use crate::game::agenda::{self, Agenda, Step};
use crate::game::commands::{expect_phase, pay_for_card, CommandError};
use crate::game::state::{AttackTarget, GameState, Phase};
use crate::game::zones::InstanceId;

/// 3.0: resolve an action card immediately, before any attacker is chosen
pub fn play_pre_action(state: &mut GameState, card_id: InstanceId) -> Result<Phase, CommandError> {
    expect_phase(state, "play_pre_action", &[Phase::CombatPreActions])?;
    let owner = state.active;
    let card = pay_for_card(state, owner, card_id, CardKind::Action)?;
    state.log(format!("[Action] {} plays {}", owner, card.name()));
    agenda::run(
        state,
        Agenda::of([
            Step::Trigger {
                card: card.clone(),
                trigger: Trigger::OnResolve,
                owner,
            },
            Step::ToGraveyard { owner, card },
        ]),
    );
    Ok(state.phase)
}

pub fn skip_pre_actions(state: &mut GameState) -> Result<Phase, CommandError> {
    expect_phase(state, "skip_pre_actions", &[Phase::CombatPreActions])?;
    state.phase = Phase::CombatSelectAttacker;
    Ok(state.phase)
}

/// 3.1: declare an attacker. It must be untapped and not summoning sick.
pub fn select_attacker(state: &mut GameState, creature_id: InstanceId) -> Result<Phase, CommandError> {
    expect_phase(state, "select_attacker", &[Phase::CombatSelectAttacker])?;
    let creature = state
        .active_player()
        .board
        .get(creature_id)
        .ok_or(CommandError::CreatureNotOnBoard(creature_id))?;
    if creature.tapped {
        return Err(CommandError::AlreadyTapped(creature.name().to_string()));
    }
    if creature.summoned_this_turn {
        return Err(CommandError::SummoningSick(creature.name().to_string()));
    }
    let name = creature.name().to_string();

    state.combat.reset();
    state.combat.attacker = Some(creature_id);
    state.phase = Phase::CombatAttackActions;
    state.log(format!("[Combat] {} declares {} as attacker", state.active, name));
    Ok(state.phase)
}

/// 3.2: pay for an action card and queue it for the apply step
pub fn play_action(state: &mut GameState, card_id: InstanceId) -> Result<Phase, CommandError> {
    expect_phase(state, "play_action", &[Phase::CombatAttackActions])?;
    let owner = state.active;
    let card = pay_for_card(state, owner, card_id, CardKind::Action)?;
    state.log(format!("[Action] {} queues {}", owner, card.name()));
    state.combat.pending_actions.push(card);
    Ok(state.phase)
}

/// 3.2 → 3.4 without applying anything. Queued cards return to hand and
/// their mana is refunded. The attacker's on_attack still fires.
pub fn skip_actions(state: &mut GameState) -> Result<Phase, CommandError> {
    expect_phase(state, "skip_actions", &[Phase::CombatAttackActions])?;
    let queued = std::mem::take(&mut state.combat.pending_actions);
    let player = state.player_mut(state.active);
    for card in queued {
        player.mana_current += card.cost();
        player.hand.add_card(card);
    }
    apply_queued_actions(state);
    Ok(state.phase)
}

/// 3.2 → 3.4: resolve queued actions in play order, then on_attack
pub fn proceed_apply_actions(state: &mut GameState) -> Result<Phase, CommandError> {
    expect_phase(state, "proceed_apply_actions", &[Phase::CombatAttackActions])?;
    apply_queued_actions(state);
    Ok(state.phase)
}

fn apply_queued_actions(state: &mut GameState) {
    state.phase = Phase::CombatApplyActions;
    let mut agenda = Agenda::new();
    for card in std::mem::take(&mut state.combat.pending_actions) {
        agenda.push_back(Step::ApplyAction(card));
    }
    agenda.push_back(Step::AttackerOnAttack);
    agenda.push_back(Step::EnterPhase(Phase::CombatSelectTarget));
    agenda::run(state, agenda);
}

/// 3.5: the defending player may only be attacked when none of their
/// creatures is untapped. Any enemy creature may be attacked.
pub fn select_target(state: &mut GameState, target: AttackTarget) -> Result<Phase, CommandError> {
    expect_phase(state, "select_target", &[Phase::CombatSelectTarget])?;
    let defender = state.defender();
    match target {
        AttackTarget::Player => {
            let untapped = defender.untapped_count();
            if untapped > 0 {
                return Err(CommandError::DefendersUntapped(untapped));
            }
        }
        AttackTarget::Creature(id) => {
            if !defender.board.contains(id) {
                return Err(CommandError::CreatureNotOnBoard(id));
            }
        }
    }
    state.combat.target = Some(target);
    state.phase = Phase::CombatBlock;
    state.log(format!("[Combat] {} may block", state.defender_id()));
    Ok(state.phase)
}

/// 3.6: defender discards a card with a block value, then combat resolves
pub fn play_block(state: &mut GameState, card_id: InstanceId) -> Result<Phase, CommandError> {
    expect_phase(state, "play_block", &[Phase::CombatBlock])?;
    let defender_id = state.defender_id();
    let defender = state.player_mut(defender_id);
    let card = defender
        .hand
        .find(card_id)
        .ok_or(CommandError::CardNotInHand(card_id))?;
    if card.block() == 0 {
        return Err(CommandError::NoBlockValue(card.name().to_string()));
    }
    let Some(card) = defender.hand.remove_card(card_id) else {
        return Err(CommandError::CardNotInHand(card_id));
    };
    defender.graveyard.add_card(card.clone());
    state.log(format!("[Block] {} blocks with {} (block {})", defender_id, card.name(), card.block()));
    state.combat.block_card = Some(card);
    resolve_combat(state);
    Ok(state.phase)
}

pub fn skip_block(state: &mut GameState) -> Result<Phase, CommandError> {
    expect_phase(state, "skip_block", &[Phase::CombatBlock])?;
    state.combat.block_card = None;
    state.log(format!("[Block] {} does not block", state.defender_id()));
    resolve_combat(state);
    Ok(state.phase)
}

/// 3.7: attack minus block goes through. An untapped target creature
/// strikes back with its full attack.
fn resolve_combat(state: &mut GameState) {
    state.phase = Phase::CombatResolve;
    let active = state.active;
    let defender_id = state.defender_id();
    let Some(attacker_id) = state.combat.attacker.filter(|id| state.player(active).board.contains(*id)) else {
        end_combat(state);
        return;
    };
    let block = state.combat.block_card.as_ref().map_or(0, |c| c.block() as i32);

    let (attacker_name, attack) = {
        let lethal = state.rules.lethal_block_destroys_attacker;
        let Some(attacker) = state.player_mut(active).board.get_mut(attacker_id) else {
            end_combat(state);
            return;
        };
        if lethal && block > attacker.attack {
            attacker.health_current = 0;
        }
        (attacker.name().to_string(), attacker.attack)
    };
    if state.rules.lethal_block_destroys_attacker && block > attack {
        state.log(format!("[Block] block {} overwhelms {}", block, attacker_name));
    }

    let damage = (attack - block).max(0);
    if block > 0 {
        state.log(format!(
            "[Block] absorbs {} of {} → {} gets through",
            block.min(attack),
            attack,
            damage
        ));
    }

    let mut agenda = Agenda::new();
    match state.combat.target {
        Some(AttackTarget::Creature(target_id)) => {
            if let Some(target) = state.player_mut(defender_id).board.get_mut(target_id) {
                let counter = (!target.tapped).then_some(target.attack);
                let dealt = target.take_damage(damage);
                let target_name = target.name().to_string();
                let target_card = target.card.clone();
                let msg = format!(
                    "[Combat] {} deals {} to {} → HP {}/{}",
                    attacker_name, dealt, target_name, target.health_current, target.health_max
                );
                state.log(msg);
                if dealt > 0 {
                    agenda.push_back(Step::Trigger {
                        card: target_card,
                        trigger: Trigger::OnDamage,
                        owner: defender_id,
                    });
                }
                match counter {
                    Some(power) => agenda.push_back(Step::Counterattack {
                        from: target_name,
                        power,
                    }),
                    None => state.log(format!("[Combat] {} is tapped, no counterattack", target_name)),
                }
            }
        }
        _ => {
            let defender = state.player_mut(defender_id);
            defender.hp -= damage;
            let hp = defender.hp;
            state.log(format!("[Combat] {} damage to {} → HP {}", damage, defender_id, hp));
        }
    }
    agenda.push_back(Step::FinishCombat);
    agenda::run(state, agenda);
}

/// Counterattack against the current attacker. Returns its on_damage
/// trigger when damage got through.
pub(crate) fn counterattack(state: &mut GameState, from: &str, power: i32) -> Option<Step> {
    let active = state.active;
    let attacker_id = state.combat.attacker?;
    let attacker = state.player_mut(active).board.get_mut(attacker_id)?;
    let dealt = attacker.take_damage(power);
    let card = attacker.card.clone();
    let msg = format!(
        "[Combat] {} counterattacks for {} → {} HP {}/{}",
        from,
        dealt,
        attacker.name(),
        attacker.health_current,
        attacker.health_max
    );
    state.log(msg);
    (dealt > 0).then_some(Step::Trigger {
        card,
        trigger: Trigger::OnDamage,
        owner: active,
    })
}

pub(crate) fn tap_attacker(state: &mut GameState) {
    let active = state.active;
    if let Some(id) = state.combat.attacker {
        if let Some(attacker) = state.player_mut(active).board.get_mut(id) {
            attacker.tapped = true;
        }
    }
}

/// Back to attacker selection for the next attack
pub(crate) fn end_combat(state: &mut GameState) {
    state.combat.reset();
    state.phase = Phase::CombatSelectAttacker;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::commands::CommandError;
    use crate::game::player::PlayerId;
    use crate::game::testing::{board_creature, hand_card, test_game};

    fn ready_to_attack() -> GameState {
        let mut state = test_game();
        state.phase = Phase::CombatSelectAttacker;
        board_creature(&mut state, PlayerId::P1, 10, 3, 4);
        state
    }

    #[test]
    fn test_select_attacker_rejects_sick_creature() {
        let mut state = ready_to_attack();
        state.p1.board.creatures_mut()[0].summoned_this_turn = true;
        let result = select_attacker(&mut state, InstanceId(10));
        assert!(matches!(result, Err(CommandError::SummoningSick(_))));
        assert_eq!(state.phase, Phase::CombatSelectAttacker);
    }

    #[test]
    fn test_select_attacker_rejects_tapped_creature() {
        let mut state = ready_to_attack();
        state.p1.board.creatures_mut()[0].tapped = true;
        assert!(matches!(
            select_attacker(&mut state, InstanceId(10)),
            Err(CommandError::AlreadyTapped(_))
        ));
    }

    #[test]
    fn test_player_target_requires_all_defenders_tapped() {
        let mut state = ready_to_attack();
        board_creature(&mut state, PlayerId::P2, 50, 1, 1);
        select_attacker(&mut state, InstanceId(10)).unwrap();
        proceed_apply_actions(&mut state).unwrap();
        assert!(matches!(
            select_target(&mut state, AttackTarget::Player),
            Err(CommandError::DefendersUntapped(1))
        ));

        state.p2.board.creatures_mut()[0].tapped = true;
        assert_eq!(select_target(&mut state, AttackTarget::Player), Ok(Phase::CombatBlock));
    }

    #[test]
    fn test_unblocked_attack_on_player() {
        let mut state = ready_to_attack();
        select_attacker(&mut state, InstanceId(10)).unwrap();
        proceed_apply_actions(&mut state).unwrap();
        select_target(&mut state, AttackTarget::Player).unwrap();
        let phase = skip_block(&mut state).unwrap();

        assert_eq!(phase, Phase::CombatSelectAttacker);
        assert_eq!(state.p2.hp, 27);
        assert!(state.p1.board.creatures()[0].tapped);
        assert!(state.combat.attacker.is_none());
    }

    #[test]
    fn test_tapped_target_does_not_counterattack() {
        let mut state = ready_to_attack();
        board_creature(&mut state, PlayerId::P2, 50, 5, 6);
        state.p2.board.creatures_mut()[0].tapped = true;
        select_attacker(&mut state, InstanceId(10)).unwrap();
        proceed_apply_actions(&mut state).unwrap();
        select_target(&mut state, AttackTarget::Creature(InstanceId(50))).unwrap();
        skip_block(&mut state).unwrap();

        assert_eq!(state.p2.board.creatures()[0].health_current, 3);
        assert_eq!(state.p1.board.creatures()[0].health_current, 4);
    }

    #[test]
    fn test_block_reduces_damage_and_goes_to_graveyard() {
        let mut state = ready_to_attack();
        board_creature(&mut state, PlayerId::P2, 50, 1, 6);
        hand_card(&mut state, PlayerId::P2, 60, 2);
        select_attacker(&mut state, InstanceId(10)).unwrap();
        proceed_apply_actions(&mut state).unwrap();
        select_target(&mut state, AttackTarget::Creature(InstanceId(50))).unwrap();
        play_block(&mut state, InstanceId(60)).unwrap();

        assert_eq!(state.p2.board.creatures()[0].health_current, 5);
        assert_eq!(state.p1.board.creatures()[0].health_current, 3);
        assert_eq!(state.p2.graveyard.size(), 1);
        assert_eq!(state.p2.hand.size(), 0);
    }

    #[test]
    fn test_block_card_without_value_rejected() {
        let mut state = ready_to_attack();
        hand_card(&mut state, PlayerId::P2, 60, 0);
        select_attacker(&mut state, InstanceId(10)).unwrap();
        proceed_apply_actions(&mut state).unwrap();
        select_target(&mut state, AttackTarget::Player).unwrap();
        assert!(matches!(
            play_block(&mut state, InstanceId(60)),
            Err(CommandError::NoBlockValue(_))
        ));
        assert_eq!(state.phase, Phase::CombatBlock);
    }

    #[test]
    fn test_lethal_block_variant_destroys_attacker() {
        let mut state = ready_to_attack();
        state.rules.lethal_block_destroys_attacker = true;
        hand_card(&mut state, PlayerId::P2, 60, 5);
        select_attacker(&mut state, InstanceId(10)).unwrap();
        proceed_apply_actions(&mut state).unwrap();
        select_target(&mut state, AttackTarget::Player).unwrap();
        play_block(&mut state, InstanceId(60)).unwrap();

        assert!(state.p1.board.is_empty());
        assert_eq!(state.p1.graveyard.size(), 1);
        assert_eq!(state.p2.hp, 30);
    }

    #[test]
    fn test_skip_actions_refunds_queued_cards() {
        let mut state = ready_to_attack();
        hand_card(&mut state, PlayerId::P1, 70, 1);
        let mana = state.p1.mana_current;
        select_attacker(&mut state, InstanceId(10)).unwrap();
        play_action(&mut state, InstanceId(70)).unwrap();
        assert_eq!(state.p1.mana_current, mana - 1);

        skip_actions(&mut state).unwrap();
        assert_eq!(state.p1.mana_current, mana);
        assert!(state.p1.hand.find(InstanceId(70)).is_some());
        assert_eq!(state.phase, Phase::CombatSelectTarget);
    }
}
