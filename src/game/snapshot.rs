use crate::card::CardKind;
use crate::game::player::{PlayerId, PlayerState};
use crate::game::state::{AttackTarget, GameState, Outcome, Phase};
use crate::game::zones::{CardInstance, Creature, InstanceId};
use serde::Serialize;

/// Read-only view of a game for rendering or JSON output
#[derive(Serialize, Debug, Clone)]
pub struct GameSnapshot {
    pub turn: u32,
    pub phase: Phase,
    pub phase_label: String,
    pub active: PlayerId,
    pub p1: PlayerView,
    pub p2: PlayerView,
    pub combat: CombatView,
    pub pending: Option<PendingView>,
    pub outcome: Option<Outcome>,
    /// Most recent first
    pub log: Vec<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct PlayerView {
    pub id: PlayerId,
    pub hp: i32,
    pub mana_current: u32,
    pub mana_available: u32,
    pub deck_size: usize,
    pub graveyard_size: usize,
    pub graveyard: Vec<String>,
    pub hand: Vec<CardView>,
    pub board: Vec<CreatureView>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CardView {
    pub id: InstanceId,
    pub name: String,
    pub kind: CardKind,
    pub cost: u32,
    pub block: u32,
    pub ability: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreatureView {
    pub id: InstanceId,
    pub name: String,
    pub attack: i32,
    pub base_attack: i32,
    pub health_current: i32,
    pub health_max: i32,
    pub base_health: i32,
    pub tapped: bool,
    pub summoning_sick: bool,
    pub damage_prevention: i32,
    pub ability: Option<String>,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct CombatView {
    pub attacker: Option<InstanceId>,
    pub target: Option<AttackTarget>,
    pub block_card: Option<String>,
    pub pending_actions: Vec<String>,
    pub resolved_actions: Vec<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct PendingView {
    pub card_name: String,
    pub owner: PlayerId,
    pub candidates: Vec<InstanceId>,
}

impl GameSnapshot {
    pub fn capture(state: &GameState, log_entries: usize) -> Self {
        GameSnapshot {
            turn: state.turn,
            phase: state.phase,
            phase_label: state.phase.label().to_string(),
            active: state.active,
            p1: PlayerView::from(&state.p1),
            p2: PlayerView::from(&state.p2),
            combat: CombatView {
                attacker: state.combat.attacker,
                target: state.combat.target,
                block_card: state.combat.block_card.as_ref().map(|c| c.name().to_string()),
                pending_actions: state
                    .combat
                    .pending_actions
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect(),
                resolved_actions: state.combat.resolved_actions.clone(),
            },
            pending: state.pending.as_ref().map(|p| PendingView {
                card_name: p.card_name.clone(),
                owner: p.owner,
                candidates: p.candidates.clone(),
            }),
            outcome: state.outcome,
            log: state.log.entries().take(log_entries).map(str::to_string).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&PlayerState> for PlayerView {
    fn from(player: &PlayerState) -> Self {
        PlayerView {
            id: player.id,
            hp: player.hp,
            mana_current: player.mana_current,
            mana_available: player.mana_available,
            deck_size: player.deck.size(),
            graveyard_size: player.graveyard.size(),
            graveyard: player.graveyard.cards().iter().map(|c| c.name().to_string()).collect(),
            hand: player.hand.cards().iter().map(CardView::from).collect(),
            board: player.board.creatures().iter().map(CreatureView::from).collect(),
        }
    }
}

impl From<&CardInstance> for CardView {
    fn from(card: &CardInstance) -> Self {
        CardView {
            id: card.id,
            name: card.name().to_string(),
            kind: card.definition.kind,
            cost: card.cost(),
            block: card.block(),
            ability: card.definition.ability.map(|a| a.to_string()),
        }
    }
}

impl From<&Creature> for CreatureView {
    fn from(creature: &Creature) -> Self {
        CreatureView {
            id: creature.id(),
            name: creature.name().to_string(),
            attack: creature.attack,
            base_attack: creature.card.definition.base_attack(),
            health_current: creature.health_current,
            health_max: creature.health_max,
            base_health: creature.card.definition.base_health(),
            tapped: creature.tapped,
            summoning_sick: creature.summoned_this_turn,
            damage_prevention: creature.damage_prevention,
            ability: creature.card.definition.ability.map(|a| a.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::testing::{board_creature, hand_card, test_game};

    #[test]
    fn test_capture_reflects_state() {
        let mut state = test_game();
        board_creature(&mut state, PlayerId::P1, 10, 2, 3);
        hand_card(&mut state, PlayerId::P2, 60, 2);
        state.log("hello");

        let snapshot = GameSnapshot::capture(&state, 10);
        assert_eq!(snapshot.phase, Phase::PlayCreatures);
        assert_eq!(snapshot.p1.board.len(), 1);
        assert_eq!(snapshot.p1.board[0].attack, 2);
        assert_eq!(snapshot.p2.hand[0].block, 2);
        assert_eq!(snapshot.log.first().map(String::as_str), Some("hello"));
    }

    #[test]
    fn test_snapshot_json_uses_wire_names() {
        let state = test_game();
        let json = GameSnapshot::capture(&state, 0).to_json().unwrap();
        assert!(json.contains("\"phase\": \"PLAY_CREATURES\""));
        assert!(json.contains("\"active\": \"p1\""));
    }
}
