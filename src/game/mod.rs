pub mod agenda;
pub mod combat;
pub mod commands;
pub mod death;
pub mod player;
pub mod resolver;
pub mod snapshot;
pub mod state;
pub mod turns;
pub mod zones;

#[cfg(test)]
pub(crate) mod testing;

pub use agenda::{resolve_ability, select_tap_target};
pub use commands::{apply, legal_commands, Command, CommandError};
pub use death::evaluate_deaths;
pub use player::{PlayerId, PlayerState};
pub use resolver::Resolution;
pub use snapshot::GameSnapshot;
pub use state::{AttackTarget, CombatContext, GameState, LossReason, Outcome, PendingInput, Phase};
pub use turns::start_game;
pub use zones::{Board, CardInstance, Creature, Deck, Graveyard, Hand, InstanceId, InstanceIds};
