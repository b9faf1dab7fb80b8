pub mod abilities;
pub mod database;
pub mod types;

pub use abilities::{
    Ability, AbilityError, AllyTarget, CreatureTarget, DamageTarget, Effect, HealTarget,
    RawAbility, RushTarget, TargetClass, Trigger,
};
pub use database::{CardCatalog, CatalogError};
pub use types::{CardDefinition, CardKind};
