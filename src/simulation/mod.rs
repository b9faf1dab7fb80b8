pub mod deck;
pub mod script;
pub mod soak;

pub use deck::{build_deck, new_game, parse_deck_file, DeckError};
pub use script::{run_script, ScriptError};
pub use soak::{run_batch, run_game, GameResult, SoakReport};
