use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while turning a catalog ability descriptor into a typed ability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbilityError {
    #[error("Unknown effect: {0}")]
    UnknownEffect(String),
    #[error("Effect '{effect}' cannot target '{target}'")]
    UnsupportedTarget { effect: String, target: TargetClass },
    #[error("Effect '{effect}' value {value} is out of range")]
    ValueOutOfRange { effect: String, value: u32 },
}

/// Largest `value` an ability descriptor may carry
pub const MAX_VALUE: u32 = 9_999;

/// Event class that activates an ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    OnPlay,
    OnAttack,
    OnDamage,
    OnDeath,
    OnResolve,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trigger::OnPlay => "on_play",
            Trigger::OnAttack => "on_attack",
            Trigger::OnDamage => "on_damage",
            Trigger::OnDeath => "on_death",
            Trigger::OnResolve => "on_resolve",
        };
        f.write_str(name)
    }
}

/// Target class as written in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetClass {
    #[serde(rename = "self")]
    SelfCard,
    AllyCreature,
    AllAllies,
    EnemyPlayer,
    EnemyCreature,
    RandomEnemyCreature,
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetClass::SelfCard => "self",
            TargetClass::AllyCreature => "ally_creature",
            TargetClass::AllAllies => "all_allies",
            TargetClass::EnemyPlayer => "enemy_player",
            TargetClass::EnemyCreature => "enemy_creature",
            TargetClass::RandomEnemyCreature => "random_enemy_creature",
        };
        f.write_str(name)
    }
}

/// Which enemy creature a creature-damaging effect hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureTarget {
    /// The creature targeted by the running combat, else a random enemy creature
    CombatTargetOrRandom,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageTarget {
    EnemyPlayer,
    EnemyCreature(CreatureTarget),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealTarget {
    Owner,
    /// The source creature if on board, else the most damaged ally
    AllyCreature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllyTarget {
    Source,
    /// A random ally other than the source
    OtherAlly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RushTarget {
    Source,
    /// Most recently summoned sick ally, else a random untapped ally
    SickAlly,
}

/// Closed set of effect kinds, each with its own payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    DealDamage { amount: u32, target: DamageTarget },
    Heal { amount: u32, target: HealTarget },
    Draw { count: u32 },
    BuffAttack { amount: u32, target: AllyTarget },
    BuffHealth { amount: u32, target: AllyTarget },
    BuffAttackAll { amount: u32 },
    BuffHealthAll { amount: u32 },
    PreventDamage { amount: u32 },
    Rush { target: RushTarget },
    TapEnemy,
    DamageAndTap { amount: u32, target: CreatureTarget },
    DrainLife { amount: u32 },
    GainMana { amount: u32 },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::DealDamage { .. } => "deal_damage",
            Effect::Heal { .. } => "heal",
            Effect::Draw { .. } => "draw",
            Effect::BuffAttack { .. } => "buff_attack",
            Effect::BuffHealth { .. } => "buff_health",
            Effect::BuffAttackAll { .. } => "buff_attack_all",
            Effect::BuffHealthAll { .. } => "buff_health_all",
            Effect::PreventDamage { .. } => "prevent_damage",
            Effect::Rush { .. } => "rush",
            Effect::TapEnemy => "tap_enemy",
            Effect::DamageAndTap { .. } => "damage_and_tap",
            Effect::DrainLife { .. } => "drain_life",
            Effect::GainMana { .. } => "gain_mana",
        }
    }

    /// Numeric payload (amount or card count), 0 for effects without one
    pub fn value(&self) -> u32 {
        match *self {
            Effect::DealDamage { amount, .. }
            | Effect::Heal { amount, .. }
            | Effect::BuffAttack { amount, .. }
            | Effect::BuffHealth { amount, .. }
            | Effect::BuffAttackAll { amount }
            | Effect::BuffHealthAll { amount }
            | Effect::PreventDamage { amount }
            | Effect::DamageAndTap { amount, .. }
            | Effect::DrainLife { amount }
            | Effect::GainMana { amount } => amount,
            Effect::Draw { count } => count,
            Effect::Rush { .. } | Effect::TapEnemy => 0,
        }
    }

    /// Canonical catalog target class for this effect, if it has one
    pub fn target_class(&self) -> Option<TargetClass> {
        match self {
            Effect::DealDamage { target, .. } => Some(match target {
                DamageTarget::EnemyPlayer => TargetClass::EnemyPlayer,
                DamageTarget::EnemyCreature(CreatureTarget::CombatTargetOrRandom) => {
                    TargetClass::EnemyCreature
                }
                DamageTarget::EnemyCreature(CreatureTarget::Random) => {
                    TargetClass::RandomEnemyCreature
                }
            }),
            Effect::DamageAndTap { target, .. } => Some(match target {
                CreatureTarget::CombatTargetOrRandom => TargetClass::EnemyCreature,
                CreatureTarget::Random => TargetClass::RandomEnemyCreature,
            }),
            Effect::Heal { target, .. } => Some(match target {
                HealTarget::Owner => TargetClass::SelfCard,
                HealTarget::AllyCreature => TargetClass::AllyCreature,
            }),
            Effect::BuffAttack { target, .. } | Effect::BuffHealth { target, .. } => {
                Some(match target {
                    AllyTarget::Source => TargetClass::SelfCard,
                    AllyTarget::OtherAlly => TargetClass::AllyCreature,
                })
            }
            Effect::Rush { target } => Some(match target {
                RushTarget::Source => TargetClass::SelfCard,
                RushTarget::SickAlly => TargetClass::AllyCreature,
            }),
            Effect::BuffAttackAll { .. } | Effect::BuffHealthAll { .. } => {
                Some(TargetClass::AllAllies)
            }
            Effect::TapEnemy => Some(TargetClass::EnemyCreature),
            Effect::DrainLife { .. } => Some(TargetClass::EnemyPlayer),
            Effect::Draw { .. } | Effect::PreventDamage { .. } | Effect::GainMana { .. } => {
                Some(TargetClass::SelfCard)
            }
        }
    }
}

/// Flat ability descriptor as it appears in the card catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAbility {
    pub trigger: Trigger,
    pub effect: String,
    #[serde(default)]
    pub value: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetClass>,
}

/// A card's typed ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAbility", into = "RawAbility")]
pub struct Ability {
    pub trigger: Trigger,
    pub effect: Effect,
}

impl Ability {
    pub fn new(trigger: Trigger, effect: Effect) -> Self {
        Ability { trigger, effect }
    }

    pub fn fires_on(&self, trigger: Trigger) -> bool {
        self.trigger == trigger
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.trigger, self.effect.name(), self.effect.value())?;
        if let Some(target) = self.effect.target_class() {
            write!(f, " → {}", target)?;
        }
        Ok(())
    }
}

fn creature_target(effect: &str, target: Option<TargetClass>) -> Result<CreatureTarget, AbilityError> {
    match target {
        None | Some(TargetClass::EnemyCreature) => Ok(CreatureTarget::CombatTargetOrRandom),
        Some(TargetClass::RandomEnemyCreature) => Ok(CreatureTarget::Random),
        Some(other) => Err(AbilityError::UnsupportedTarget {
            effect: effect.to_string(),
            target: other,
        }),
    }
}

fn ally_target(effect: &str, target: Option<TargetClass>) -> Result<AllyTarget, AbilityError> {
    match target {
        Some(TargetClass::SelfCard) => Ok(AllyTarget::Source),
        None | Some(TargetClass::AllyCreature) | Some(TargetClass::AllAllies) => {
            Ok(AllyTarget::OtherAlly)
        }
        Some(other) => Err(AbilityError::UnsupportedTarget {
            effect: effect.to_string(),
            target: other,
        }),
    }
}

impl TryFrom<RawAbility> for Ability {
    type Error = AbilityError;

    fn try_from(raw: RawAbility) -> Result<Self, Self::Error> {
        if raw.value > MAX_VALUE {
            return Err(AbilityError::ValueOutOfRange {
                effect: raw.effect,
                value: raw.value,
            });
        }
        let amount = raw.value;
        let unsupported = |target: TargetClass| AbilityError::UnsupportedTarget {
            effect: raw.effect.clone(),
            target,
        };

        let effect = match raw.effect.as_str() {
            "deal_damage" => {
                let target = match raw.target {
                    None | Some(TargetClass::EnemyPlayer) => DamageTarget::EnemyPlayer,
                    Some(TargetClass::EnemyCreature) => {
                        DamageTarget::EnemyCreature(CreatureTarget::CombatTargetOrRandom)
                    }
                    Some(TargetClass::RandomEnemyCreature) => {
                        DamageTarget::EnemyCreature(CreatureTarget::Random)
                    }
                    Some(other) => return Err(unsupported(other)),
                };
                Effect::DealDamage { amount, target }
            }
            "heal" => {
                let target = match raw.target {
                    None | Some(TargetClass::SelfCard) => HealTarget::Owner,
                    Some(TargetClass::AllyCreature) => HealTarget::AllyCreature,
                    Some(other) => return Err(unsupported(other)),
                };
                Effect::Heal { amount, target }
            }
            "draw" => Effect::Draw { count: amount },
            "buff_attack" => Effect::BuffAttack {
                amount,
                target: ally_target(&raw.effect, raw.target)?,
            },
            "buff_health" => Effect::BuffHealth {
                amount,
                target: ally_target(&raw.effect, raw.target)?,
            },
            "buff_attack_all" => Effect::BuffAttackAll { amount },
            "buff_health_all" => Effect::BuffHealthAll { amount },
            "prevent_damage" => Effect::PreventDamage { amount },
            "rush" => {
                let target = match raw.target {
                    Some(TargetClass::SelfCard) => RushTarget::Source,
                    None | Some(TargetClass::AllyCreature) => RushTarget::SickAlly,
                    Some(other) => return Err(unsupported(other)),
                };
                Effect::Rush { target }
            }
            "tap_enemy" => Effect::TapEnemy,
            "damage_and_tap" => Effect::DamageAndTap {
                amount,
                target: creature_target(&raw.effect, raw.target)?,
            },
            "drain_life" => Effect::DrainLife { amount },
            "gain_mana" => Effect::GainMana { amount },
            other => return Err(AbilityError::UnknownEffect(other.to_string())),
        };

        Ok(Ability {
            trigger: raw.trigger,
            effect,
        })
    }
}

impl From<Ability> for RawAbility {
    fn from(ability: Ability) -> Self {
        RawAbility {
            trigger: ability.trigger,
            effect: ability.effect.name().to_string(),
            value: ability.effect.value(),
            target: ability.effect.target_class(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Ability, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_parse_deal_damage_targets() {
        let ability = parse(
            r#"{"trigger":"on_play","effect":"deal_damage","value":2,"target":"enemy_player"}"#,
        )
        .expect("valid ability");
        assert_eq!(ability.trigger, Trigger::OnPlay);
        assert_eq!(
            ability.effect,
            Effect::DealDamage { amount: 2, target: DamageTarget::EnemyPlayer }
        );

        let ability = parse(
            r#"{"trigger":"on_attack","effect":"deal_damage","value":1,"target":"enemy_creature"}"#,
        )
        .expect("valid ability");
        assert_eq!(
            ability.effect,
            Effect::DealDamage {
                amount: 1,
                target: DamageTarget::EnemyCreature(CreatureTarget::CombatTargetOrRandom),
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_effect() {
        let result = parse(r#"{"trigger":"on_play","effect":"summon_dragon","value":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_trigger() {
        let result = parse(r#"{"trigger":"on_sunrise","effect":"draw","value":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_oversized_value() {
        let result = parse(r#"{"trigger":"on_play","effect":"deal_damage","value":4294967295}"#);
        assert!(result.is_err());

        let huge = RawAbility {
            trigger: Trigger::OnPlay,
            effect: "deal_damage".to_string(),
            value: MAX_VALUE + 1,
            target: None,
        };
        assert!(matches!(
            Ability::try_from(huge),
            Err(AbilityError::ValueOutOfRange { value, .. }) if value == MAX_VALUE + 1
        ));

        let largest = parse(r#"{"trigger":"on_play","effect":"deal_damage","value":9999}"#)
            .expect("largest value is accepted");
        assert_eq!(largest.effect.value(), MAX_VALUE);
    }

    #[test]
    fn test_parse_rejects_nonsense_target() {
        let result = parse(
            r#"{"trigger":"on_play","effect":"heal","value":2,"target":"enemy_player"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rush_and_buff_targets() {
        let rush = parse(r#"{"trigger":"on_play","effect":"rush","target":"self"}"#).unwrap();
        assert_eq!(rush.effect, Effect::Rush { target: RushTarget::Source });

        let rush = parse(r#"{"trigger":"on_resolve","effect":"rush","target":"ally_creature"}"#)
            .unwrap();
        assert_eq!(rush.effect, Effect::Rush { target: RushTarget::SickAlly });

        let buff = parse(r#"{"trigger":"on_resolve","effect":"buff_attack","value":2}"#).unwrap();
        assert_eq!(buff.effect, Effect::BuffAttack { amount: 2, target: AllyTarget::OtherAlly });
    }

    #[test]
    fn test_serializes_back_to_flat_descriptor() {
        let ability = Ability::new(Trigger::OnDeath, Effect::DrainLife { amount: 3 });
        let json = serde_json::to_value(ability).expect("serializable");
        assert_eq!(json["trigger"], "on_death");
        assert_eq!(json["effect"], "drain_life");
        assert_eq!(json["value"], 3);
    }

    #[test]
    fn test_display() {
        let ability = Ability::new(
            Trigger::OnAttack,
            Effect::DealDamage { amount: 2, target: DamageTarget::EnemyPlayer },
        );
        assert_eq!(ability.to_string(), "on_attack: deal_damage 2 → enemy_player");
    }
}
