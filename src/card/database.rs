use crate::card::types::{CardDefinition, CardKind};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Card not found: {0}")]
    CardNotFound(String),
    #[error("Invalid card data: {0}")]
    InvalidCard(String),
}

/// Flat, ordered card catalog loaded from JSON. The engine never mutates it.
#[derive(Debug, Clone)]
pub struct CardCatalog {
    cards: Vec<Arc<CardDefinition>>,
    by_name: HashMap<String, usize>,
}

impl CardCatalog {
    /// Load cards from a JSON file
    pub fn from_file(path: &str) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let cards: Vec<CardDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(cards)
    }

    /// Build a catalog from definitions, filling in missing ids and validating each card
    pub fn from_definitions(definitions: Vec<CardDefinition>) -> Result<Self, CatalogError> {
        let mut cards = Vec::with_capacity(definitions.len());
        let mut by_name = HashMap::new();
        let mut seen_ids = HashMap::new();

        for (index, mut card) in definitions.into_iter().enumerate() {
            if card.id.is_empty() {
                card.id = slug(&card.name);
            }
            validate_card(&card)?;
            if seen_ids.insert(card.id.clone(), index).is_some() {
                return Err(CatalogError::InvalidCard(format!("duplicate card id '{}'", card.id)));
            }
            by_name.insert(card.name.clone(), index);
            cards.push(Arc::new(card));
        }

        if cards.is_empty() {
            return Err(CatalogError::InvalidCard("No cards loaded".to_string()));
        }

        Ok(CardCatalog { cards, by_name })
    }

    /// Get a card by name
    pub fn get_card(&self, name: &str) -> Result<Arc<CardDefinition>, CatalogError> {
        self.by_name
            .get(name)
            .map(|&i| Arc::clone(&self.cards[i]))
            .ok_or_else(|| CatalogError::CardNotFound(name.to_string()))
    }

    /// All cards in catalog order
    pub fn cards(&self) -> &[Arc<CardDefinition>] {
        &self.cards
    }

    pub fn creatures(&self) -> impl Iterator<Item = &Arc<CardDefinition>> {
        self.cards.iter().filter(|c| c.kind == CardKind::Creature)
    }

    pub fn actions(&self) -> impl Iterator<Item = &Arc<CardDefinition>> {
        self.cards.iter().filter(|c| c.kind == CardKind::Action)
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

fn validate_card(card: &CardDefinition) -> Result<(), CatalogError> {
    if card.name.trim().is_empty() {
        return Err(CatalogError::InvalidCard(format!("card '{}' has no name", card.id)));
    }
    if card.kind == CardKind::Creature {
        match (card.attack, card.health_max) {
            (Some(attack), Some(health)) if attack >= 0 && health > 0 => {}
            _ => {
                return Err(CatalogError::InvalidCard(format!(
                    "creature '{}' needs attack >= 0 and healthMax > 0",
                    card.name
                )))
            }
        }
    }
    if card.kind == CardKind::Action && card.ability.is_none() && card.block == 0 {
        return Err(CatalogError::InvalidCard(format!(
            "action '{}' has neither an ability nor a block value",
            card.name
        )));
    }
    Ok(())
}
