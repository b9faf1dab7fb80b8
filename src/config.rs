use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const STARTING_HP: i32 = 30;
pub const MAX_HAND: usize = 4;
pub const MAX_BOARD: usize = 5;
pub const MAX_MANA: u32 = 10;
pub const LOG_CAPACITY: usize = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid rules: {0}")]
    Invalid(String),
}

/// Deck construction parameters, consumed once per player at game start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckRules {
    pub target_size: usize,
    pub cheap_cost_threshold: u32,
    pub copies_per_cheap_card: usize,
    pub copies_per_other_card: usize,
    pub copies_per_action_card: usize,
}

impl Default for DeckRules {
    fn default() -> Self {
        DeckRules {
            target_size: 40,
            cheap_cost_threshold: 3,
            copies_per_cheap_card: 2,
            copies_per_other_card: 1,
            copies_per_action_card: 2,
        }
    }
}

/// Rule constants and the documented rule variants.
///
/// The defaults are the "richer" rules: creature damage persists across
/// turns, a big block never destroys the attacker, and there is a
/// pre-combat action window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub starting_hp: i32,
    pub max_hand: usize,
    pub max_board: usize,
    pub max_mana: u32,
    pub mana_per_turn: u32,
    pub starting_hand_size: usize,
    pub p1_starting_mana: u32,
    pub p2_starting_mana: u32,
    pub log_capacity: usize,
    /// When false, `enter_combat` skips straight to attacker selection
    pub pre_combat_actions: bool,
    /// Simplified variant: every creature is restored to full health at end of turn
    pub heal_creatures_at_end_of_turn: bool,
    /// A block value above the attacker's attack destroys the attacker
    pub lethal_block_destroys_attacker: bool,
    pub deck: DeckRules,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            starting_hp: STARTING_HP,
            max_hand: MAX_HAND,
            max_board: MAX_BOARD,
            max_mana: MAX_MANA,
            mana_per_turn: 2,
            starting_hand_size: 3,
            p1_starting_mana: 1,
            p2_starting_mana: 2,
            log_capacity: LOG_CAPACITY,
            pre_combat_actions: true,
            heal_creatures_at_end_of_turn: false,
            lethal_block_destroys_attacker: false,
            deck: DeckRules::default(),
        }
    }
}

impl RulesConfig {
    /// Load rules from a JSON file; missing fields take their defaults
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let rules: RulesConfig = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_hp <= 0 {
            return Err(ConfigError::Invalid("starting_hp must be positive".to_string()));
        }
        if self.max_board == 0 {
            return Err(ConfigError::Invalid("max_board must be at least 1".to_string()));
        }
        if self.p1_starting_mana > self.max_mana || self.p2_starting_mana > self.max_mana {
            return Err(ConfigError::Invalid(format!(
                "starting mana cannot exceed max_mana ({})",
                self.max_mana
            )));
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::Invalid("log_capacity must be at least 1".to_string()));
        }
        if self.deck.target_size < self.starting_hand_size {
            return Err(ConfigError::Invalid(format!(
                "deck target size {} is smaller than the starting hand ({})",
                self.deck.target_size, self.starting_hand_size
            )));
        }
        Ok(())
    }
}
