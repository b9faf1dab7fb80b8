use crate::card::CardDefinition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Unique identifier of a card instance within one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out instance ids; one allocator per game
#[derive(Debug, Clone, Default)]
pub struct InstanceIds {
    next: u32,
}

impl InstanceIds {
    pub fn new() -> Self {
        InstanceIds { next: 1 }
    }

    pub fn next_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next.max(1));
        self.next = id.0 + 1;
        id
    }
}

/// A card with identity. Identity persists from deck to graveyard.
#[derive(Debug, Clone)]
pub struct CardInstance {
    pub id: InstanceId,
    pub definition: Arc<CardDefinition>,
}

impl CardInstance {
    pub fn new(id: InstanceId, definition: Arc<CardDefinition>) -> Self {
        CardInstance { id, definition }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn cost(&self) -> u32 {
        self.definition.cost
    }

    pub fn block(&self) -> u32 {
        self.definition.block
    }
}

/// A creature on the board. Battlefield fields live only here.
#[derive(Debug, Clone)]
pub struct Creature {
    pub card: CardInstance,
    pub attack: i32,
    pub health_current: i32,
    pub health_max: i32,
    pub tapped: bool,
    pub summoned_this_turn: bool,
    pub damage_prevention: i32,
}

impl Creature {
    /// Summon a creature: full health, untapped, summoning sick
    pub fn summon(card: CardInstance) -> Self {
        let attack = card.definition.base_attack();
        let health = card.definition.base_health();
        Creature {
            card,
            attack,
            health_current: health,
            health_max: health,
            tapped: false,
            summoned_this_turn: true,
            damage_prevention: 0,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.card.id
    }

    pub fn name(&self) -> &str {
        self.card.name()
    }

    pub fn is_dead(&self) -> bool {
        self.health_current <= 0
    }

    pub fn can_attack(&self) -> bool {
        !self.tapped && !self.summoned_this_turn
    }

    pub fn damage_deficit(&self) -> i32 {
        self.health_max - self.health_current
    }

    /// Apply one damage instance. The prevention pool absorbs what it can
    /// and is then reset. Returns the damage actually dealt.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let actual = (amount - self.damage_prevention).max(0);
        self.damage_prevention = 0;
        self.health_current -= actual;
        actual
    }

    /// Heal up to max health
    pub fn heal(&mut self, amount: i32) {
        self.health_current = (self.health_current + amount).min(self.health_max);
    }

    pub fn buff_health(&mut self, amount: i32) {
        self.health_max += amount;
        self.health_current += amount;
    }
}

/// Draw pile; front is the next draw
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<CardInstance>,
}

impl Deck {
    pub fn new() -> Self {
        Deck { cards: Vec::new() }
    }

    pub fn from_cards(cards: Vec<CardInstance>) -> Self {
        Deck { cards }
    }

    pub fn add_card(&mut self, card: CardInstance) {
        self.cards.push(card);
    }

    pub fn draw(&mut self) -> Option<CardInstance> {
        if self.cards.is_empty() {
            None
        } else {
            Some(self.cards.remove(0))
        }
    }

    pub fn size(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[CardInstance] {
        &self.cards
    }
}

/// Cards in hand, in draw order
#[derive(Debug, Clone, Default)]
pub struct Hand {
    cards: Vec<CardInstance>,
}

impl Hand {
    pub fn new() -> Self {
        Hand { cards: Vec::new() }
    }

    pub fn add_card(&mut self, card: CardInstance) {
        self.cards.push(card);
    }

    pub fn find(&self, id: InstanceId) -> Option<&CardInstance> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn remove_card(&mut self, id: InstanceId) -> Option<CardInstance> {
        let index = self.cards.iter().position(|c| c.id == id)?;
        Some(self.cards.remove(index))
    }

    /// Remove the most recently drawn card
    pub fn pop_last(&mut self) -> Option<CardInstance> {
        self.cards.pop()
    }

    pub fn size(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[CardInstance] {
        &self.cards
    }
}

/// Creatures in play, in summoning order
#[derive(Debug, Clone, Default)]
pub struct Board {
    creatures: Vec<Creature>,
}

impl Board {
    pub fn new() -> Self {
        Board { creatures: Vec::new() }
    }

    pub fn add_creature(&mut self, creature: Creature) {
        self.creatures.push(creature);
    }

    pub fn get(&self, id: InstanceId) -> Option<&Creature> {
        self.creatures.iter().find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Creature> {
        self.creatures.iter_mut().find(|c| c.id() == id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    /// Take every creature at or below zero health, keeping board order
    pub fn remove_dead(&mut self) -> Vec<Creature> {
        let (dead, alive): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.creatures).into_iter().partition(Creature::is_dead);
        self.creatures = alive;
        dead
    }

    pub fn untapped_ids(&self) -> Vec<InstanceId> {
        self.creatures.iter().filter(|c| !c.tapped).map(Creature::id).collect()
    }

    /// Untapped creatures still alive, in board order
    pub fn tap_candidates(&self) -> Vec<InstanceId> {
        self.creatures
            .iter()
            .filter(|c| !c.tapped && !c.is_dead())
            .map(Creature::id)
            .collect()
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        self.creatures.iter().map(Creature::id).collect()
    }

    pub fn size(&self) -> usize {
        self.creatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty()
    }

    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    pub fn creatures_mut(&mut self) -> &mut [Creature] {
        &mut self.creatures
    }
}

/// Discard pile (ordered stack)
#[derive(Debug, Clone, Default)]
pub struct Graveyard {
    cards: Vec<CardInstance>,
}

impl Graveyard {
    pub fn new() -> Self {
        Graveyard { cards: Vec::new() }
    }

    pub fn add_card(&mut self, card: CardInstance) {
        self.cards.push(card);
    }

    pub fn size(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[CardInstance] {
        &self.cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creature(id: u32, attack: i32, health: i32) -> Creature {
        let def = CardDefinition::creature("c", "Test Creature", 1, attack, health, 0);
        Creature::summon(CardInstance::new(InstanceId(id), Arc::new(def)))
    }

    #[test]
    fn test_summon_initializes_battlefield_fields() {
        let c = creature(1, 3, 4);
        assert_eq!(c.attack, 3);
        assert_eq!(c.health_current, 4);
        assert_eq!(c.health_max, 4);
        assert!(!c.tapped);
        assert!(c.summoned_this_turn);
        assert!(!c.can_attack());
    }

    #[test]
    fn test_take_damage_consumes_prevention() {
        let mut c = creature(1, 1, 5);
        c.damage_prevention = 2;
        assert_eq!(c.take_damage(3), 1);
        assert_eq!(c.health_current, 4);
        assert_eq!(c.damage_prevention, 0);
        assert_eq!(c.take_damage(3), 3);
        assert_eq!(c.health_current, 1);
    }

    #[test]
    fn test_prevention_larger_than_damage() {
        let mut c = creature(1, 1, 5);
        c.damage_prevention = 4;
        assert_eq!(c.take_damage(2), 0);
        assert_eq!(c.health_current, 5);
        assert_eq!(c.damage_prevention, 0);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut c = creature(1, 1, 5);
        c.take_damage(3);
        c.heal(10);
        assert_eq!(c.health_current, 5);
    }

    #[test]
    fn test_deck_draws_from_front() {
        let def = Arc::new(CardDefinition::action("a", "Spark", 1, 1));
        let mut deck = Deck::from_cards(vec![
            CardInstance::new(InstanceId(1), Arc::clone(&def)),
            CardInstance::new(InstanceId(2), def),
        ]);
        assert_eq!(deck.draw().map(|c| c.id), Some(InstanceId(1)));
        assert_eq!(deck.draw().map(|c| c.id), Some(InstanceId(2)));
        assert!(deck.draw().is_none());
    }

    #[test]
    fn test_remove_dead_keeps_board_order() {
        let mut board = Board::new();
        for id in 1..=4 {
            board.add_creature(creature(id, 1, 2));
        }
        board.get_mut(InstanceId(2)).unwrap().health_current = 0;
        board.get_mut(InstanceId(4)).unwrap().health_current = -1;

        let dead: Vec<_> = board.remove_dead().iter().map(Creature::id).collect();
        assert_eq!(dead, vec![InstanceId(2), InstanceId(4)]);
        assert_eq!(board.ids(), vec![InstanceId(1), InstanceId(3)]);
    }

    #[test]
    fn test_instance_ids_are_unique() {
        let mut ids = InstanceIds::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
    }
}
