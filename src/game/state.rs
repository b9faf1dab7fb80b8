use crate::config::RulesConfig;
use crate::game::agenda::Agenda;
use crate::game::player::{PlayerId, PlayerState};
use crate::game::zones::{CardInstance, Deck, InstanceId};
use crate::rng::GameRng;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Turn phases and combat sub-phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Maintenance,
    PlayCreatures,
    CombatPreActions,
    CombatSelectAttacker,
    CombatAttackActions,
    CombatApplyActions,
    CombatSelectTarget,
    CombatBlock,
    CombatResolve,
    CombatSelectTapTarget,
    EndTurn,
    GameOver,
}

impl Phase {
    /// Label for a phase bar
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Maintenance => "1 · Maintenance",
            Phase::PlayCreatures => "2 · Play / Summon",
            Phase::CombatPreActions => "3.0 · Pre-Combat Actions",
            Phase::CombatSelectAttacker => "3.1 · Select Attacker",
            Phase::CombatAttackActions => "3.2 · Attack Actions",
            Phase::CombatApplyActions => "3.4 · Apply Actions",
            Phase::CombatSelectTarget => "3.5 · Select Target",
            Phase::CombatBlock => "3.6 · Block",
            Phase::CombatResolve => "3.7 · Resolve",
            Phase::CombatSelectTapTarget => "· Select Tap Target",
            Phase::EndTurn => "4 · End Turn",
            Phase::GameOver => "Game Over",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Maintenance => "MAINTENANCE",
            Phase::PlayCreatures => "PLAY_CREATURES",
            Phase::CombatPreActions => "COMBAT_PRE_ACTIONS",
            Phase::CombatSelectAttacker => "COMBAT_SELECT_ATTACKER",
            Phase::CombatAttackActions => "COMBAT_ATTACK_ACTIONS",
            Phase::CombatApplyActions => "COMBAT_APPLY_ACTIONS",
            Phase::CombatSelectTarget => "COMBAT_SELECT_TARGET",
            Phase::CombatBlock => "COMBAT_BLOCK",
            Phase::CombatResolve => "COMBAT_RESOLVE",
            Phase::CombatSelectTapTarget => "COMBAT_SELECT_TAP_TARGET",
            Phase::EndTurn => "END_TURN",
            Phase::GameOver => "GAME_OVER",
        };
        f.write_str(name)
    }
}

/// What the current attacker is swinging at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum AttackTarget {
    Player,
    Creature(InstanceId),
}

/// Transient state of one attacker's combat sub-cycle
#[derive(Debug, Clone, Default)]
pub struct CombatContext {
    pub attacker: Option<InstanceId>,
    pub target: Option<AttackTarget>,
    /// Block card committed by the defender (the card itself is already in their graveyard)
    pub block_card: Option<CardInstance>,
    /// Paid action cards waiting for the apply step
    pub pending_actions: Vec<CardInstance>,
    /// Names of the action cards applied to this attack
    pub resolved_actions: Vec<String>,
}

impl CombatContext {
    pub fn reset(&mut self) {
        *self = CombatContext::default();
    }
}

/// A suspended operation waiting for the caller to pick a tap target
#[derive(Debug, Clone)]
pub struct PendingInput {
    pub card_name: String,
    pub owner: PlayerId,
    /// Untapped enemy creatures that may be chosen
    pub candidates: Vec<InstanceId>,
    /// Phase restored when the choice arrives
    pub resume_phase: Phase,
    pub(crate) continuation: Agenda,
}

impl PendingInput {
    /// Cards held by the suspended operation (resolving action cards)
    pub fn held_cards(&self) -> Vec<&CardInstance> {
        self.continuation.held_cards()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    DeckOut,
    HealthDepleted,
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossReason::DeckOut => f.write_str("deck empty"),
            LossReason::HealthDepleted => f.write_str("HP ≤ 0"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: PlayerId,
    pub loser: PlayerId,
    pub reason: LossReason,
}

/// Bounded event log, most recent entry first
#[derive(Debug, Clone)]
pub struct GameLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl GameLog {
    pub fn new(capacity: usize) -> Self {
        GameLog {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, message: String) {
        self.entries.push_front(message);
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Complete game state. Owned by one caller and mutated only through commands.
#[derive(Debug, Clone)]
pub struct GameState {
    pub p1: PlayerState,
    pub p2: PlayerState,
    pub active: PlayerId,
    pub phase: Phase,
    /// Global turn counter, incremented at every maintenance
    pub turn: u32,
    pub combat: CombatContext,
    pub pending: Option<PendingInput>,
    pub log: GameLog,
    pub outcome: Option<Outcome>,
    pub rules: RulesConfig,
    pub rng: GameRng,
}

impl GameState {
    /// A game that has not started yet: decks in place, empty hands, P1 active
    pub fn new(rules: RulesConfig, p1_deck: Deck, p2_deck: Deck, rng: GameRng) -> Self {
        let p1 = PlayerState::new(PlayerId::P1, rules.starting_hp, rules.p1_starting_mana, p1_deck);
        let p2 = PlayerState::new(PlayerId::P2, rules.starting_hp, rules.p2_starting_mana, p2_deck);
        GameState {
            p1,
            p2,
            active: PlayerId::P1,
            phase: Phase::Maintenance,
            turn: 0,
            combat: CombatContext::default(),
            pending: None,
            log: GameLog::new(rules.log_capacity),
            outcome: None,
            rules,
            rng,
        }
    }

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        match id {
            PlayerId::P1 => &self.p1,
            PlayerId::P2 => &self.p2,
        }
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        match id {
            PlayerId::P1 => &mut self.p1,
            PlayerId::P2 => &mut self.p2,
        }
    }

    /// Borrow `id` and its opponent mutably at the same time
    pub fn player_and_opponent_mut(&mut self, id: PlayerId) -> (&mut PlayerState, &mut PlayerState) {
        match id {
            PlayerId::P1 => (&mut self.p1, &mut self.p2),
            PlayerId::P2 => (&mut self.p2, &mut self.p1),
        }
    }

    pub fn defender_id(&self) -> PlayerId {
        self.active.opponent()
    }

    pub fn active_player(&self) -> &PlayerState {
        self.player(self.active)
    }

    pub fn defender(&self) -> &PlayerState {
        self.player(self.defender_id())
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.outcome.map(|o| o.winner)
    }

    pub fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("{}", message);
        self.log.push(message);
    }

    /// Log at info level: turn banners and game end
    pub fn announce(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.log.push(message);
    }

    /// Draw one card for `id`. An empty deck ends the game with `id` as loser.
    pub fn draw_card(&mut self, id: PlayerId, silent: bool) -> bool {
        let drawn = self.player_mut(id).draw_card().map(|c| c.name().to_string());
        match drawn {
            Some(name) => {
                if !silent {
                    self.log(format!("[Draw] {} draws {}", id, name));
                }
                true
            }
            None => {
                self.declare_loss(id, LossReason::DeckOut);
                false
            }
        }
    }

    /// Terminal transition. Later calls are ignored.
    pub fn declare_loss(&mut self, loser: PlayerId, reason: LossReason) {
        if self.is_over() {
            return;
        }
        self.phase = Phase::GameOver;
        self.pending = None;
        self.outcome = Some(Outcome {
            winner: loser.opponent(),
            loser,
            reason,
        });
        self.p1.hp = self.p1.hp.max(0);
        self.p2.hp = self.p2.hp.max(0);
        self.announce(format!("[Game Over] {} loses! ({})", loser, reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardDefinition;
    use std::sync::Arc;

    fn empty_game() -> GameState {
        GameState::new(RulesConfig::default(), Deck::new(), Deck::new(), GameRng::new(Some(1)))
    }

    #[test]
    fn test_game_state_creation() {
        let state = empty_game();
        assert_eq!(state.p1.hp, 30);
        assert_eq!(state.p1.mana_available, 1);
        assert_eq!(state.p2.mana_available, 2);
        assert_eq!(state.turn, 0);
        assert_eq!(state.phase, Phase::Maintenance);
        assert!(state.outcome.is_none());
    }

    #[test]
    fn test_log_is_bounded_and_most_recent_first() {
        let mut log = GameLog::new(100);
        for i in 0..150 {
            log.push(format!("entry {}", i));
        }
        assert_eq!(log.len(), 100);
        assert_eq!(log.latest(), Some("entry 149"));
        assert_eq!(log.entries().last(), Some("entry 50"));
    }

    #[test]
    fn test_draw_from_empty_deck_loses() {
        let mut state = empty_game();
        assert!(!state.draw_card(PlayerId::P2, false));
        assert_eq!(state.phase, Phase::GameOver);
        assert_eq!(state.winner(), Some(PlayerId::P1));
        assert_eq!(state.outcome.map(|o| o.reason), Some(LossReason::DeckOut));
    }

    #[test]
    fn test_declare_loss_clamps_hp_and_is_final() {
        let mut state = empty_game();
        state.p1.hp = -3;
        state.declare_loss(PlayerId::P1, LossReason::HealthDepleted);
        assert_eq!(state.p1.hp, 0);
        assert_eq!(state.winner(), Some(PlayerId::P2));

        state.declare_loss(PlayerId::P2, LossReason::HealthDepleted);
        assert_eq!(state.winner(), Some(PlayerId::P2), "first loss sticks");
    }

    #[test]
    fn test_draw_logs_card_name() {
        let def = Arc::new(CardDefinition::action("a", "Spark", 1, 1));
        let deck = Deck::from_cards(vec![CardInstance::new(InstanceId(1), def)]);
        let mut state =
            GameState::new(RulesConfig::default(), deck, Deck::new(), GameRng::new(Some(1)));
        assert!(state.draw_card(PlayerId::P1, false));
        assert_eq!(state.log.latest(), Some("[Draw] Player 1 draws Spark"));
    }

    #[test]
    fn test_phase_display_and_labels() {
        assert_eq!(Phase::CombatSelectTapTarget.to_string(), "COMBAT_SELECT_TAP_TARGET");
        assert_eq!(Phase::PlayCreatures.label(), "2 · Play / Summon");
    }
}
