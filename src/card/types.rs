use crate::card::abilities::{Ability, Trigger};
use serde::{Deserialize, Serialize};

/// Card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Creature,
    Action,
}

/// Immutable card definition, as loaded from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDefinition {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub cost: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_max: Option<i32>,
    #[serde(default)]
    pub block: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability: Option<Ability>,
}

impl CardDefinition {
    pub fn creature(id: &str, name: &str, cost: u32, attack: i32, health: i32, block: u32) -> Self {
        CardDefinition {
            id: id.to_string(),
            name: name.to_string(),
            kind: CardKind::Creature,
            cost,
            attack: Some(attack),
            health_max: Some(health),
            block,
            ability: None,
        }
    }

    pub fn action(id: &str, name: &str, cost: u32, block: u32) -> Self {
        CardDefinition {
            id: id.to_string(),
            name: name.to_string(),
            kind: CardKind::Action,
            cost,
            attack: None,
            health_max: None,
            block,
            ability: None,
        }
    }

    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.ability = Some(ability);
        self
    }

    pub fn is_creature(&self) -> bool {
        self.kind == CardKind::Creature
    }

    pub fn is_action(&self) -> bool {
        self.kind == CardKind::Action
    }

    /// Base attack (0 for actions)
    pub fn base_attack(&self) -> i32 {
        self.attack.unwrap_or(0)
    }

    /// Base max health (0 for actions)
    pub fn base_health(&self) -> i32 {
        self.health_max.unwrap_or(0)
    }

    /// The ability, if it fires on the given trigger
    pub fn ability_for(&self, trigger: Trigger) -> Option<&Ability> {
        self.ability.as_ref().filter(|a| a.fires_on(trigger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::abilities::Effect;

    #[test]
    fn test_deserialize_creature() {
        let json = r#"{
            "id": "ember_imp",
            "name": "Ember Imp",
            "type": "creature",
            "cost": 2,
            "attack": 2,
            "healthMax": 2,
            "block": 1,
            "art": "img/imp.png",
            "ability": { "trigger": "on_play", "effect": "deal_damage", "value": 1, "target": "enemy_player" }
        }"#;
        let card: CardDefinition = serde_json::from_str(json).expect("valid card");
        assert!(card.is_creature());
        assert_eq!(card.base_attack(), 2);
        assert_eq!(card.base_health(), 2);
        assert_eq!(card.block, 1);
        assert!(card.ability_for(Trigger::OnPlay).is_some());
        assert!(card.ability_for(Trigger::OnDeath).is_none());
    }

    #[test]
    fn test_deserialize_action_without_block() {
        let json = r#"{
            "id": "quick_study",
            "name": "Quick Study",
            "type": "action",
            "cost": 1,
            "ability": { "trigger": "on_resolve", "effect": "draw", "value": 2 }
        }"#;
        let card: CardDefinition = serde_json::from_str(json).expect("valid card");
        assert!(card.is_action());
        assert_eq!(card.block, 0);
        assert_eq!(card.base_attack(), 0);
        assert_eq!(
            card.ability.map(|a| a.effect),
            Some(Effect::Draw { count: 2 })
        );
    }
}
