use crate::card::CardCatalog;
use crate::config::RulesConfig;
use crate::game::commands::{apply, legal_commands, Command};
use crate::game::death::needs_evaluation;
use crate::game::player::PlayerId;
use crate::game::state::{GameState, LossReason, Phase};
use crate::rng::GameRng;
use crate::simulation::deck::new_game;
use chrono::{DateTime, Utc};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;

/// Result of a single randomized game
#[derive(Debug, Clone, Serialize)]
pub struct GameResult {
    pub seed: u64,
    pub winner: Option<PlayerId>,
    pub reason: Option<LossReason>,
    pub turns: u32,
    pub commands: usize,
    /// Broken invariants, with the command that preceded them
    pub violations: Vec<String>,
}

impl GameResult {
    pub fn finished(&self) -> bool {
        self.winner.is_some()
    }
}

/// Rule invariants that must hold whenever a command returns
pub fn check_invariants(state: &GameState, total_cards: usize) -> Vec<String> {
    let mut problems = Vec::new();
    let rules = &state.rules;

    for id in PlayerId::BOTH {
        let p = state.player(id);
        if p.hp < 0 || (p.hp == 0 && !state.is_over()) {
            problems.push(format!("{} has {} HP while the game runs", id, p.hp));
        }
        if p.board.size() > rules.max_board {
            problems.push(format!("{} has {} creatures on board", id, p.board.size()));
        }
        if p.mana_available > rules.max_mana || p.mana_current > rules.max_mana {
            problems.push(format!(
                "{} mana {}/{} exceeds {}",
                id, p.mana_current, p.mana_available, rules.max_mana
            ));
        }
    }
    // Deaths are settled before any tap choice is offered
    if !state.is_over() && needs_evaluation(state) {
        problems.push("death pass left a dead creature or a beaten player".to_string());
    }

    if state.is_over() != state.outcome.is_some() {
        problems.push(format!("phase {} disagrees with outcome {:?}", state.phase, state.outcome));
    }
    if state.pending.is_some() != (state.phase == Phase::CombatSelectTapTarget) {
        problems.push(format!("pending input present in phase {}", state.phase));
    }

    let mut seen = HashSet::new();
    let mut count = 0;
    let mut note = |id| {
        count += 1;
        seen.insert(id)
    };
    let mut duplicates = 0;
    for p in [&state.p1, &state.p2] {
        let zones = p
            .deck
            .cards()
            .iter()
            .chain(p.hand.cards())
            .chain(p.board.creatures().iter().map(|c| &c.card))
            .chain(p.graveyard.cards());
        for card in zones {
            if !note(card.id) {
                duplicates += 1;
            }
        }
    }
    for card in &state.combat.pending_actions {
        if !note(card.id) {
            duplicates += 1;
        }
    }
    if let Some(pending) = &state.pending {
        for card in pending.held_cards() {
            if !note(card.id) {
                duplicates += 1;
            }
        }
    }
    if duplicates > 0 {
        problems.push(format!("{} card instances appear twice", duplicates));
    }
    if count != total_cards {
        problems.push(format!("{} cards in play, expected {}", count, total_cards));
    }
    problems
}

fn total_cards(state: &GameState) -> usize {
    [&state.p1, &state.p2]
        .iter()
        .map(|p| p.deck.size() + p.hand.size() + p.board.size() + p.graveyard.size())
        .sum()
}

/// Pick one legal command. Turns end only sometimes while other moves exist
/// so games make progress.
fn choose_command(commands: &[Command], rng: &mut GameRng) -> Option<Command> {
    let others: Vec<Command> = commands.iter().copied().filter(|c| *c != Command::EndTurn).collect();
    if others.is_empty() || rng.random_range(5) == 0 {
        return rng.choose(commands).copied();
    }
    rng.choose(&others).copied()
}

/// Play one game with random legal commands, checking invariants after each
pub fn run_game(
    catalog: &CardCatalog,
    rules: &RulesConfig,
    seed: u64,
    max_commands: usize,
    verbose: bool,
) -> GameResult {
    let mut state = new_game(catalog, rules, Some(seed));
    // Command picks come from a separate stream of the same seed
    let mut driver = GameRng::with_stream(seed, 1);
    let total = total_cards(&state);
    let mut violations = check_invariants(&state, total);
    let mut commands = 0;

    if verbose {
        println!("=== Game Start (seed: {}) ===", seed);
    }

    while !state.is_over() && commands < max_commands {
        let legal = legal_commands(&state);
        let Some(command) = choose_command(&legal, &mut driver) else {
            violations.push(format!("no legal command in phase {}", state.phase));
            break;
        };
        commands += 1;
        match apply(&mut state, command) {
            Ok(phase) => {
                if verbose {
                    println!("{:>5} {:<32} → {}", commands, command.to_string(), phase);
                }
            }
            Err(e) => violations.push(format!("legal command {} rejected: {}", command, e)),
        }
        for problem in check_invariants(&state, total) {
            violations.push(format!("after {}: {}", command, problem));
        }
        if violations.len() > 20 {
            break;
        }
    }

    if !violations.is_empty() {
        warn!("seed {}: {} invariant violations", seed, violations.len());
    }
    debug!("seed {} finished after {} commands, outcome {:?}", seed, commands, state.outcome);

    GameResult {
        seed,
        winner: state.winner(),
        reason: state.outcome.map(|o| o.reason),
        turns: state.turn,
        commands,
        violations,
    }
}

/// Aggregate over a batch of games
#[derive(Debug, Clone, Serialize)]
pub struct SoakReport {
    pub generated_at: DateTime<Utc>,
    pub base_seed: u64,
    pub games: usize,
    pub p1_wins: usize,
    pub p2_wins: usize,
    pub unfinished: usize,
    pub deck_outs: usize,
    pub average_turns: f64,
    pub failing_seeds: Vec<u64>,
    pub violations: Vec<String>,
}

impl SoakReport {
    pub fn from_results(base_seed: u64, results: &[GameResult]) -> Self {
        let count_winner = |p| results.iter().filter(|r| r.winner == Some(p)).count();
        let finished: Vec<&GameResult> = results.iter().filter(|r| r.finished()).collect();
        let average_turns = if finished.is_empty() {
            0.0
        } else {
            finished.iter().map(|r| r.turns as f64).sum::<f64>() / finished.len() as f64
        };
        let failing: Vec<&GameResult> = results.iter().filter(|r| !r.violations.is_empty()).collect();
        SoakReport {
            generated_at: Utc::now(),
            base_seed,
            games: results.len(),
            p1_wins: count_winner(PlayerId::P1),
            p2_wins: count_winner(PlayerId::P2),
            unfinished: results.len() - finished.len(),
            deck_outs: results.iter().filter(|r| r.reason == Some(LossReason::DeckOut)).count(),
            average_turns,
            failing_seeds: failing.iter().map(|r| r.seed).collect(),
            violations: failing
                .iter()
                .flat_map(|r| r.violations.iter().map(move |v| format!("seed {}: {}", r.seed, v)))
                .take(50)
                .collect(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failing_seeds.is_empty()
    }

    pub fn print(&self) {
        println!("\n=== Soak Results ===");
        println!("Games: {} (seeds {}..{})", self.games, self.base_seed, self.base_seed + self.games as u64);
        println!("Player 1 wins: {}", self.p1_wins);
        println!("Player 2 wins: {}", self.p2_wins);
        println!("Unfinished:    {}", self.unfinished);
        println!("Deck-outs:     {}", self.deck_outs);
        println!("Average turns: {:.1}", self.average_turns);
        if self.is_clean() {
            println!("No invariant violations");
        } else {
            println!("{} games broke invariants:", self.failing_seeds.len());
            for v in &self.violations {
                println!("  {}", v);
            }
        }
    }
}

/// Run `games` games in parallel on consecutive seeds
pub fn run_batch(
    catalog: &CardCatalog,
    rules: &RulesConfig,
    base_seed: u64,
    games: usize,
    max_commands: usize,
    show_progress: bool,
) -> SoakReport {
    let progress = if show_progress {
        ProgressBar::new(games as u64)
    } else {
        ProgressBar::hidden()
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed}] {wide_bar:.cyan/blue} {pos:>7}/{len:7} {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let results: Vec<GameResult> = (0..games)
        .into_par_iter()
        .progress_with(progress)
        .map(|i| run_game(catalog, rules, base_seed.wrapping_add(i as u64), max_commands, false))
        .collect();

    SoakReport::from_results(base_seed, &results)
}
