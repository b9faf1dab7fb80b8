use crate::card::{AllyTarget, CreatureTarget, DamageTarget, Effect, HealTarget, RushTarget, Trigger};
use crate::game::player::PlayerId;
use crate::game::state::{AttackTarget, GameState};
use crate::game::zones::{CardInstance, InstanceId};

/// Result of resolving one ability
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The card has no ability for this trigger
    NoOp,
    Applied,
    /// tap_enemy with several living untapped candidates: the caller must
    /// settle deaths and then ask for a choice
    AwaitingTapTarget { candidates: Vec<InstanceId> },
}

/// Apply `card`'s ability for `trigger` on behalf of `owner`.
///
/// Only the effect itself happens here. Death processing and suspension
/// are the agenda's job.
pub(crate) fn resolve(
    state: &mut GameState,
    card: &CardInstance,
    trigger: Trigger,
    owner: PlayerId,
) -> Resolution {
    let Some(ability) = card.definition.ability_for(trigger).copied() else {
        return Resolution::NoOp;
    };
    state.log(format!("[Ability] {}: {}", card.name(), ability));

    match ability.effect {
        Effect::DealDamage { amount, target } => deal_damage(state, card, owner, amount as i32, target),
        Effect::Heal { amount, target } => heal(state, card, owner, amount as i32, target),
        Effect::Draw { count } => {
            for _ in 0..count {
                if !state.draw_card(owner, false) {
                    break;
                }
            }
        }
        Effect::BuffAttack { amount, target } => {
            if let Some(id) = pick_ally(state, card, owner, target) {
                if let Some(c) = state.player_mut(owner).board.get_mut(id) {
                    c.attack += amount as i32;
                    let msg = format!("[Buff] {} ATK +{} → {}", c.name(), amount, c.attack);
                    state.log(msg);
                }
            }
        }
        Effect::BuffHealth { amount, target } => {
            if let Some(id) = pick_ally(state, card, owner, target) {
                if let Some(c) = state.player_mut(owner).board.get_mut(id) {
                    c.buff_health(amount as i32);
                    let msg = format!("[Buff] {} HP +{} → {}/{}", c.name(), amount, c.health_current, c.health_max);
                    state.log(msg);
                }
            }
        }
        Effect::BuffAttackAll { amount } => {
            let board = &mut state.player_mut(owner).board;
            if board.is_empty() {
                state.log(format!("[Buff] {}: no allies to buff", card.name()));
            } else {
                let mut names = Vec::new();
                for c in board.creatures_mut() {
                    c.attack += amount as i32;
                    names.push(c.name().to_string());
                }
                state.log(format!("[Buff] {}: all allies +{} ATK ({})", card.name(), amount, names.join(", ")));
            }
        }
        Effect::BuffHealthAll { amount } => {
            let mut names = Vec::new();
            for c in state.player_mut(owner).board.creatures_mut() {
                if c.id() != card.id {
                    c.buff_health(amount as i32);
                    names.push(c.name().to_string());
                }
            }
            if names.is_empty() {
                state.log(format!("[Buff] {}: no other allies to buff", card.name()));
            } else {
                state.log(format!("[Buff] {}: all allies +{} HP ({})", card.name(), amount, names.join(", ")));
            }
        }
        Effect::PreventDamage { amount } => prevent_damage(state, card, owner, amount as i32),
        Effect::Rush { target } => rush(state, card, owner, target),
        Effect::TapEnemy => {
            let candidates = state.player(owner.opponent()).board.tap_candidates();
            if candidates.len() > 1 {
                return Resolution::AwaitingTapTarget { candidates };
            }
            tap_single_candidate(state, card, owner, &candidates);
        }
        Effect::DamageAndTap { amount, target } => {
            let enemy = owner.opponent();
            if let Some(id) = pick_enemy_creature(state, enemy, target) {
                if let Some(c) = state.player_mut(enemy).board.get_mut(id) {
                    let dealt = c.take_damage(amount as i32);
                    c.tapped = true;
                    let msg = format!(
                        "[Ability] {}: {} takes {} and is tapped → HP {}",
                        card.name(),
                        c.name(),
                        dealt,
                        c.health_current
                    );
                    state.log(msg);
                }
            }
        }
        Effect::DrainLife { amount } => {
            let cap = state.rules.starting_hp;
            let (me, them) = state.player_and_opponent_mut(owner);
            them.hp -= amount as i32;
            me.hp = (me.hp + amount as i32).min(cap);
            let msg = format!(
                "[Ability] {}: drains {} from {} (HP {}), {} HP {}",
                card.name(),
                amount,
                them.id,
                them.hp,
                me.id,
                me.hp
            );
            state.log(msg);
        }
        Effect::GainMana { amount } => {
            let cap = state.rules.max_mana;
            let player = state.player_mut(owner);
            player.mana_current = (player.mana_current + amount).min(cap);
            let msg = format!(
                "[Mana] {} gains {} → {}/{}",
                owner, amount, player.mana_current, player.mana_available
            );
            state.log(msg);
        }
    }
    Resolution::Applied
}

fn deal_damage(state: &mut GameState, card: &CardInstance, owner: PlayerId, amount: i32, target: DamageTarget) {
    let enemy = owner.opponent();
    match target {
        DamageTarget::EnemyPlayer => {
            let player = state.player_mut(enemy);
            player.hp -= amount;
            let hp = player.hp;
            state.log(format!("[Damage] {} takes {} → HP {}", enemy, amount, hp));
        }
        DamageTarget::EnemyCreature(target) => {
            let Some(id) = pick_enemy_creature(state, enemy, target) else {
                state.log(format!("[Ability] {}: no enemy creature to hit", card.name()));
                return;
            };
            if let Some(c) = state.player_mut(enemy).board.get_mut(id) {
                let dealt = c.take_damage(amount);
                let msg = format!("[Damage] {} takes {} → HP {}", c.name(), dealt, c.health_current);
                state.log(msg);
            }
        }
    }
}

fn heal(state: &mut GameState, card: &CardInstance, owner: PlayerId, amount: i32, target: HealTarget) {
    match target {
        HealTarget::Owner => {
            let cap = state.rules.starting_hp;
            let player = state.player_mut(owner);
            player.hp = (player.hp + amount).min(cap);
            let hp = player.hp;
            state.log(format!("[Heal] {} heals {} → HP {}", owner, amount, hp));
        }
        HealTarget::AllyCreature => {
            let board = &mut state.player_mut(owner).board;
            // A creature heals itself; an action heals the most damaged ally
            let id = if board.contains(card.id) {
                Some(card.id)
            } else {
                board
                    .creatures()
                    .iter()
                    .max_by_key(|c| c.damage_deficit())
                    .map(|c| c.id())
            };
            match id.and_then(|id| board.get_mut(id)) {
                Some(c) => {
                    c.heal(amount);
                    let msg = format!("[Heal] {} heals {} → HP {}", c.name(), amount, c.health_current);
                    state.log(msg);
                }
                None => state.log(format!("[Heal] {}: no ally to heal", card.name())),
            }
        }
    }
}

fn prevent_damage(state: &mut GameState, card: &CardInstance, owner: PlayerId, amount: i32) {
    let attacker = if state.active == owner { state.combat.attacker } else { None };
    let board = &mut state.player_mut(owner).board;
    let id = if board.contains(card.id) {
        Some(card.id)
    } else {
        attacker
            .filter(|id| board.contains(*id))
            .or_else(|| board.creatures().first().map(|c| c.id()))
    };
    match id.and_then(|id| board.get_mut(id)) {
        Some(c) => {
            c.damage_prevention += amount;
            let msg = format!("[Shield] {} will prevent {} damage", c.name(), c.damage_prevention);
            state.log(msg);
        }
        None => state.log(format!("[Shield] {}: no creature to shield", card.name())),
    }
}

fn rush(state: &mut GameState, card: &CardInstance, owner: PlayerId, target: RushTarget) {
    let id = match target {
        RushTarget::Source => Some(card.id).filter(|id| state.player(owner).board.contains(*id)),
        RushTarget::SickAlly => {
            let board = &state.player(owner).board;
            let last_sick = board.creatures().iter().rev().find(|c| c.summoned_this_turn).map(|c| c.id());
            match last_sick {
                Some(id) => Some(id),
                None => {
                    let untapped = board.untapped_ids();
                    state.rng.choose(&untapped).copied()
                }
            }
        }
    };
    match id.and_then(|id| state.player_mut(owner).board.get_mut(id)) {
        Some(c) => {
            c.summoned_this_turn = false;
            let msg = format!("[Rush] {} can attack immediately", c.name());
            state.log(msg);
        }
        None => state.log(format!("[Rush] {}: no creature to rush", card.name())),
    }
}

/// Tap the only candidate without asking; log when there is none
pub(crate) fn tap_single_candidate(
    state: &mut GameState,
    card: &CardInstance,
    owner: PlayerId,
    candidates: &[InstanceId],
) {
    match candidates {
        [] => state.log(format!("[Ability] {}: no untapped enemy to tap", card.name())),
        [id, ..] => tap_enemy(state, card, owner, *id),
    }
}

fn tap_enemy(state: &mut GameState, card: &CardInstance, owner: PlayerId, id: InstanceId) {
    if let Some(c) = state.player_mut(owner.opponent()).board.get_mut(id) {
        c.tapped = true;
        let msg = format!("[Ability] {} taps {}", card.name(), c.name());
        state.log(msg);
    }
}

/// Source creature or a random other ally
fn pick_ally(state: &mut GameState, card: &CardInstance, owner: PlayerId, target: AllyTarget) -> Option<InstanceId> {
    let board = &state.player(owner).board;
    match target {
        AllyTarget::Source => Some(card.id).filter(|id| board.contains(*id)),
        AllyTarget::OtherAlly => {
            let others: Vec<InstanceId> = board.ids().into_iter().filter(|id| *id != card.id).collect();
            state.rng.choose(&others).copied()
        }
    }
}

/// The creature being attacked when it is on the enemy board, else a random enemy creature
fn pick_enemy_creature(state: &mut GameState, enemy: PlayerId, target: CreatureTarget) -> Option<InstanceId> {
    let board = &state.player(enemy).board;
    if target == CreatureTarget::CombatTargetOrRandom {
        if let Some(AttackTarget::Creature(id)) = state.combat.target {
            if board.contains(id) {
                return Some(id);
            }
        }
    }
    let ids = board.ids();
    state.rng.choose(&ids).copied()
}
