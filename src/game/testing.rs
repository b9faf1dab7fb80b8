//! Fixtures for unit tests

use crate::card::CardDefinition;
use crate::config::RulesConfig;
use crate::game::player::PlayerId;
use crate::game::state::{GameState, Phase};
use crate::game::zones::{CardInstance, Creature, Deck, InstanceId};
use crate::rng::GameRng;
use std::sync::Arc;

pub fn creature_card(id: u32, name: &str, cost: u32, attack: i32, health: i32) -> CardInstance {
    let def = CardDefinition::creature(&name.to_lowercase(), name, cost, attack, health, 1);
    CardInstance::new(InstanceId(id), Arc::new(def))
}

fn filler_deck(first_id: u32) -> Deck {
    let def = Arc::new(CardDefinition::creature("filler", "Filler", 1, 1, 1, 1));
    Deck::from_cards(
        (first_id..first_id + 10)
            .map(|id| CardInstance::new(InstanceId(id), Arc::clone(&def)))
            .collect(),
    )
}

/// P1's first turn in the Play phase: empty hands and boards, 10 mana each,
/// ten filler cards per deck
pub fn test_game() -> GameState {
    let mut state = GameState::new(
        RulesConfig::default(),
        filler_deck(1000),
        filler_deck(2000),
        GameRng::new(Some(42)),
    );
    state.phase = Phase::PlayCreatures;
    state.turn = 1;
    state.p1.turn_count = 1;
    for player in [&mut state.p1, &mut state.p2] {
        player.mana_available = 10;
        player.mana_current = 10;
    }
    state
}

/// Put a ready (untapped, not sick) vanilla creature on `owner`'s board
pub fn board_creature(state: &mut GameState, owner: PlayerId, id: u32, attack: i32, health: i32) {
    let mut creature = Creature::summon(creature_card(id, &format!("Creature {}", id), 1, attack, health));
    creature.summoned_this_turn = false;
    state.player_mut(owner).board.add_creature(creature);
}

/// Put an ability-less action card costing 1 with `block` into `owner`'s hand
pub fn hand_card(state: &mut GameState, owner: PlayerId, id: u32, block: u32) {
    let def = CardDefinition::action("plain_action", &format!("Action {}", id), 1, block);
    state
        .player_mut(owner)
        .hand
        .add_card(CardInstance::new(InstanceId(id), Arc::new(def)));
}
