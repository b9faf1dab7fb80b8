use crate::game::zones::{Board, CardInstance, Deck, Graveyard, Hand};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerId {
    P1,
    P2,
}

impl PlayerId {
    pub const BOTH: [PlayerId; 2] = [PlayerId::P1, PlayerId::P2];

    pub fn opponent(self) -> PlayerId {
        match self {
            PlayerId::P1 => PlayerId::P2,
            PlayerId::P2 => PlayerId::P1,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::P1 => f.write_str("Player 1"),
            PlayerId::P2 => f.write_str("Player 2"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub hp: i32,
    pub mana_available: u32,
    pub mana_current: u32,
    pub deck: Deck,
    pub hand: Hand,
    pub board: Board,
    pub graveyard: Graveyard,
    pub turn_count: u32,
}

impl PlayerState {
    pub fn new(id: PlayerId, hp: i32, mana: u32, deck: Deck) -> Self {
        PlayerState {
            id,
            hp,
            mana_available: mana,
            mana_current: mana,
            deck,
            hand: Hand::new(),
            board: Board::new(),
            graveyard: Graveyard::new(),
            turn_count: 0,
        }
    }

    /// Move the top card of the deck into hand. None when the deck is empty.
    pub fn draw_card(&mut self) -> Option<&CardInstance> {
        let card = self.deck.draw()?;
        self.hand.add_card(card);
        self.hand.cards().last()
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        cost <= self.mana_current
    }

    /// Number of untapped creatures able to defend
    pub fn untapped_count(&self) -> usize {
        self.board.creatures().iter().filter(|c| !c.tapped).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardDefinition;
    use crate::game::zones::{CardInstance, Creature, InstanceId};
    use std::sync::Arc;

    #[test]
    fn test_opponent() {
        assert_eq!(PlayerId::P1.opponent(), PlayerId::P2);
        assert_eq!(PlayerId::P2.opponent(), PlayerId::P1);
        assert_eq!(PlayerId::P1.to_string(), "Player 1");
    }

    #[test]
    fn test_draw_card_moves_to_hand() {
        let def = Arc::new(CardDefinition::action("a", "Spark", 1, 1));
        let deck = Deck::from_cards(vec![CardInstance::new(InstanceId(7), def)]);
        let mut player = PlayerState::new(PlayerId::P1, 30, 1, deck);

        let drawn = player.draw_card().map(|c| c.id);
        assert_eq!(drawn, Some(InstanceId(7)));
        assert_eq!(player.hand.size(), 1);
        assert!(player.draw_card().is_none());
    }

    #[test]
    fn test_untapped_count() {
        let def = Arc::new(CardDefinition::creature("c", "Bear", 2, 2, 2, 0));
        let mut player = PlayerState::new(PlayerId::P2, 30, 2, Deck::new());
        for id in 1..=3 {
            player
                .board
                .add_creature(Creature::summon(CardInstance::new(InstanceId(id), Arc::clone(&def))));
        }
        player.board.creatures_mut()[1].tapped = true;
        assert_eq!(player.untapped_count(), 2);
    }
}
