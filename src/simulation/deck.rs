use crate::card::{CardCatalog, CardDefinition, CatalogError};
use crate::config::{DeckRules, RulesConfig};
use crate::game::state::GameState;
use crate::game::turns::start_game;
use crate::game::zones::{CardInstance, Deck, InstanceIds};
use crate::rng::GameRng;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid deck format at line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },
    #[error("Card catalog error: {0}")]
    CatalogError(#[from] CatalogError),
    #[error("Deck list is empty")]
    Empty,
}

/// Build one player's deck from the whole catalog.
///
/// Cheap creatures get more copies than expensive ones, every action gets
/// a fixed number, and random cheap creatures pad the pool up to the
/// target size. The pool is shuffled and then cut to the target size.
pub fn build_deck(
    catalog: &CardCatalog,
    rules: &DeckRules,
    rng: &mut GameRng,
    ids: &mut InstanceIds,
) -> Deck {
    let mut pool: Vec<Arc<CardDefinition>> = Vec::new();
    for card in catalog.creatures() {
        let copies = if card.cost <= rules.cheap_cost_threshold {
            rules.copies_per_cheap_card
        } else {
            rules.copies_per_other_card
        };
        pool.extend(std::iter::repeat(card).take(copies).cloned());
    }
    for card in catalog.actions() {
        pool.extend(std::iter::repeat(card).take(rules.copies_per_action_card).cloned());
    }

    let cheap: Vec<Arc<CardDefinition>> = catalog
        .creatures()
        .filter(|c| c.cost <= rules.cheap_cost_threshold)
        .cloned()
        .collect();
    let filler: Vec<Arc<CardDefinition>> = if cheap.is_empty() {
        catalog.cards().to_vec()
    } else {
        cheap
    };
    while pool.len() < rules.target_size {
        match rng.choose(&filler) {
            Some(card) => pool.push(Arc::clone(card)),
            None => break,
        }
    }

    rng.shuffle(&mut pool);
    pool.truncate(rules.target_size);
    Deck::from_cards(
        pool.into_iter()
            .map(|definition| CardInstance::new(ids.next_id(), definition))
            .collect(),
    )
}

/// Shuffle an explicit card list into a deck
pub fn deck_from_list(cards: &[Arc<CardDefinition>], rng: &mut GameRng, ids: &mut InstanceIds) -> Deck {
    let mut cards = cards.to_vec();
    rng.shuffle(&mut cards);
    Deck::from_cards(
        cards
            .into_iter()
            .map(|definition| CardInstance::new(ids.next_id(), definition))
            .collect(),
    )
}

/// Parse a deck file and return expanded list of cards
/// Format: "4 Card Name" per line, supports comments with # or //
pub fn parse_deck_file(path: &str, catalog: &CardCatalog) -> Result<Vec<Arc<CardDefinition>>, DeckError> {
    let content = std::fs::read_to_string(path)?;
    parse_deck_list(&content, catalog)
}

pub fn parse_deck_list(content: &str, catalog: &CardCatalog) -> Result<Vec<Arc<CardDefinition>>, DeckError> {
    let mut deck = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }

        let Some((count_str, card_name)) = trimmed.split_once(' ') else {
            return Err(DeckError::InvalidFormat {
                line: line_num + 1,
                reason: "Expected format: 'COUNT CARD_NAME'".to_string(),
            });
        };

        let count: usize = count_str.parse().map_err(|_| DeckError::InvalidFormat {
            line: line_num + 1,
            reason: format!("'{}' is not a valid number", count_str),
        })?;

        let card = catalog.get_card(card_name.trim())?;
        deck.extend(std::iter::repeat(card).take(count));
    }

    if deck.is_empty() {
        return Err(DeckError::Empty);
    }
    Ok(deck)
}

/// Build both decks from the catalog and deal the opening hands
pub fn new_game(catalog: &CardCatalog, rules: &RulesConfig, seed: Option<u64>) -> GameState {
    let mut rng = GameRng::new(seed);
    let mut ids = InstanceIds::new();
    let p1_deck = build_deck(catalog, &rules.deck, &mut rng, &mut ids);
    let p2_deck = build_deck(catalog, &rules.deck, &mut rng, &mut ids);
    let mut state = GameState::new(rules.clone(), p1_deck, p2_deck, rng);
    start_game(&mut state);
    state
}

/// Like [`new_game`] but with fixed deck lists for each player
pub fn new_game_with_lists(
    p1_cards: &[Arc<CardDefinition>],
    p2_cards: &[Arc<CardDefinition>],
    rules: &RulesConfig,
    seed: Option<u64>,
) -> GameState {
    let mut rng = GameRng::new(seed);
    let mut ids = InstanceIds::new();
    let p1_deck = deck_from_list(p1_cards, &mut rng, &mut ids);
    let p2_deck = deck_from_list(p2_cards, &mut rng, &mut ids);
    let mut state = GameState::new(rules.clone(), p1_deck, p2_deck, rng);
    start_game(&mut state);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Phase;
    use std::collections::HashSet;

    fn catalog() -> CardCatalog {
        CardCatalog::from_file("cards.json").expect("Failed to load cards")
    }

    #[test]
    fn test_build_deck_hits_target_size() {
        let catalog = catalog();
        let mut rng = GameRng::new(Some(7));
        let mut ids = InstanceIds::new();
        let deck = build_deck(&catalog, &DeckRules::default(), &mut rng, &mut ids);
        assert_eq!(deck.size(), 40);

        let unique: HashSet<_> = deck.cards().iter().map(|c| c.id).collect();
        assert_eq!(unique.len(), 40, "instance ids are unique");
    }

    #[test]
    fn test_small_catalog_is_padded_with_cheap_creatures() {
        let catalog = CardCatalog::from_definitions(vec![
            CardDefinition::creature("imp", "Imp", 1, 1, 1, 0),
            CardDefinition::creature("giant", "Giant", 7, 7, 7, 0),
        ])
        .unwrap();
        let mut rng = GameRng::new(Some(7));
        let mut ids = InstanceIds::new();
        let deck = build_deck(&catalog, &DeckRules::default(), &mut rng, &mut ids);

        assert_eq!(deck.size(), 40);
        let giants = deck.cards().iter().filter(|c| c.name() == "Giant").count();
        assert_eq!(giants, 1);
    }

    #[test]
    fn test_same_seed_same_deck() {
        let catalog = catalog();
        let order = |seed| {
            let mut rng = GameRng::new(Some(seed));
            let deck = build_deck(&catalog, &DeckRules::default(), &mut rng, &mut InstanceIds::new());
            deck.cards().iter().map(|c| c.name().to_string()).collect::<Vec<_>>()
        };
        assert_eq!(order(3), order(3));
    }

    #[test]
    fn test_parse_deck_list() {
        let catalog = catalog();
        let list = "# aggro\n4 Ember Imp\n\n2 Fireball\n// done\n";
        let deck = parse_deck_list(list, &catalog).expect("Failed to parse deck");
        assert_eq!(deck.len(), 6);
        assert_eq!(deck.iter().filter(|c| c.name == "Fireball").count(), 2);
    }

    #[test]
    fn test_parse_deck_list_errors() {
        let catalog = catalog();
        assert!(matches!(
            parse_deck_list("four Ember Imp", &catalog),
            Err(DeckError::InvalidFormat { line: 1, .. })
        ));
        assert!(matches!(
            parse_deck_list("2 Unknown Card", &catalog),
            Err(DeckError::CatalogError(_))
        ));
        assert!(matches!(parse_deck_list("# nothing", &catalog), Err(DeckError::Empty)));
    }

    #[test]
    fn test_new_game_deals_opening_hands() {
        let state = new_game(&catalog(), &RulesConfig::default(), Some(11));
        assert_eq!(state.phase, Phase::PlayCreatures);
        assert_eq!(state.p1.hand.size(), 3);
        assert_eq!(state.p2.hand.size(), 3);
        assert_eq!(state.p1.deck.size(), 37);
        assert_eq!(state.p1.mana_current, 1);
    }
}
