use clap::{Parser, Subcommand};
use duel_engine::card::CardCatalog;
use duel_engine::config::RulesConfig;
use duel_engine::game::{legal_commands, GameSnapshot, GameState, InstanceIds};
use duel_engine::rng::GameRng;
use duel_engine::simulation::deck::{build_deck, new_game, new_game_with_lists, parse_deck_file};
use duel_engine::simulation::{run_batch, run_game, run_script};
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "duel-engine")]
#[command(about = "Two-player creature duel rules engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Card catalog
    #[arg(short, long, default_value = "cards.json", global = true)]
    cards: String,

    /// Rules file (JSON); defaults apply to anything missing
    #[arg(short, long, global = true)]
    rules: Option<String>,

    /// Seed for random number generator (for reproducibility)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command script against a fresh game and print the final state
    Play {
        /// Script file, one command per line
        #[arg(long)]
        script: String,

        /// Fixed deck list for player 1 ("COUNT NAME" per line)
        #[arg(long)]
        p1_deck: Option<String>,

        /// Fixed deck list for player 2
        #[arg(long)]
        p2_deck: Option<String>,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play random legal games and check rule invariants
    Soak {
        /// Number of games to simulate
        #[arg(short = 'n', long = "games", default_value = "1000")]
        num_games: usize,

        /// Command cap per game
        #[arg(short, long, default_value = "5000")]
        max_commands: usize,

        /// Write the report as JSON to this file
        #[arg(long)]
        report: Option<String>,
    },

    /// Build a deck from the catalog and print it
    Deck,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let catalog = match CardCatalog::from_file(&cli.cards) {
        Ok(catalog) => {
            eprintln!("✓ Loaded {} cards from {}", catalog.card_count(), cli.cards);
            catalog
        }
        Err(e) => {
            eprintln!("✗ Failed to load cards: {}", e);
            std::process::exit(1);
        }
    };

    let rules = match &cli.rules {
        Some(path) => match RulesConfig::from_file(path) {
            Ok(rules) => rules,
            Err(e) => {
                eprintln!("✗ Failed to load rules '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => RulesConfig::default(),
    };

    match cli.command {
        Some(Commands::Play {
            script,
            p1_deck,
            p2_deck,
            json,
        }) => {
            play_script(&catalog, &rules, &script, p1_deck, p2_deck, cli.seed, json, cli.verbose);
        }
        Some(Commands::Soak {
            num_games,
            max_commands,
            report,
        }) => {
            soak(&catalog, &rules, num_games, max_commands, cli.seed, report, cli.verbose);
        }
        Some(Commands::Deck) => print_deck(&catalog, &rules, cli.seed),
        None => {
            // Default: soak with CLI args
            let num_games = if cli.verbose { 1 } else { 1000 };
            soak(&catalog, &rules, num_games, 5000, cli.seed, None, cli.verbose);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn play_script(
    catalog: &CardCatalog,
    rules: &RulesConfig,
    script_file: &str,
    p1_deck: Option<String>,
    p2_deck: Option<String>,
    seed: Option<u64>,
    json: bool,
    verbose: bool,
) {
    let mut state = match (p1_deck, p2_deck) {
        (None, None) => new_game(catalog, rules, seed),
        (p1, p2) => {
            let load = |file: Option<String>| {
                let file = file.unwrap_or_else(|| "deck.txt".to_string());
                match parse_deck_file(&file, catalog) {
                    Ok(deck) => deck,
                    Err(e) => {
                        eprintln!("✗ Failed to parse deck file '{}': {}", file, e);
                        std::process::exit(1);
                    }
                }
            };
            let (p1, p2) = (load(p1), load(p2));
            new_game_with_lists(&p1, &p2, rules, seed)
        }
    };

    let content = match std::fs::read_to_string(script_file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("✗ Failed to read script '{}': {}", script_file, e);
            std::process::exit(1);
        }
    };

    println!("\n=== Duel Engine: {} (seed: {}) ===\n", script_file, state.rng.seed());
    let result = run_script(&mut state, &content, verbose);

    if json {
        match GameSnapshot::capture(&state, 20).to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("✗ Failed to serialize snapshot: {}", e),
        }
    } else {
        print_state(&state);
    }

    match result {
        Ok(report) => {
            println!(
                "\n✓ {} commands executed, {} rejected as expected",
                report.executed, report.rejected_as_expected
            );
        }
        Err(e) => {
            eprintln!("\n✗ {}", e);
            std::process::exit(1);
        }
    }
}

fn print_state(state: &GameState) {
    println!("Turn {} · {} · {}", state.turn, state.active, state.phase.label());
    for player in [&state.p2, &state.p1] {
        println!(
            "\n{}: HP {} · Mana {}/{} · Deck {} · Graveyard {}",
            player.id,
            player.hp,
            player.mana_current,
            player.mana_available,
            player.deck.size(),
            player.graveyard.size()
        );
        let hand: Vec<String> = player
            .hand
            .cards()
            .iter()
            .map(|c| format!("{} {}", c.id, c.name()))
            .collect();
        println!("  Hand:  {}", hand.join(", "));
        for c in player.board.creatures() {
            println!(
                "  {} {:<16} {}/{}{}{}{}",
                c.id(),
                c.name(),
                c.attack,
                c.health_current,
                if c.health_current < c.health_max { format!(" (max {})", c.health_max) } else { String::new() },
                if c.tapped { " tapped" } else { "" },
                if c.summoned_this_turn { " sick" } else { "" }
            );
        }
    }
    if let Some(outcome) = state.outcome {
        println!("\n{} wins ({} loses: {})", outcome.winner, outcome.loser, outcome.reason);
    } else {
        let legal: Vec<String> = legal_commands(state).iter().map(|c| c.to_string()).collect();
        println!("\nLegal: {}", legal.join(" | "));
    }
    println!("\nRecent log:");
    for entry in state.log.entries().take(10) {
        println!("  {}", entry);
    }
}

fn soak(
    catalog: &CardCatalog,
    rules: &RulesConfig,
    num_games: usize,
    max_commands: usize,
    seed: Option<u64>,
    report_file: Option<String>,
    verbose: bool,
) {
    let base_seed = seed.unwrap_or_else(|| GameRng::new(None).seed());

    if verbose && num_games == 1 {
        let result = run_game(catalog, rules, base_seed, max_commands, true);
        match result.winner {
            Some(winner) => println!("\n{} wins on turn {} ({:?})", winner, result.turns, result.reason),
            None => println!("\nNo winner after {} commands", result.commands),
        }
        for v in &result.violations {
            println!("  ✗ {}", v);
        }
        if !result.violations.is_empty() {
            std::process::exit(1);
        }
        return;
    }

    println!("\n=== Duel Engine Soak ===\n");
    println!("Games: {}", num_games);
    println!("Seed: {}", base_seed);
    println!();

    let start = std::time::Instant::now();
    let report = run_batch(catalog, rules, base_seed, num_games, max_commands, true);
    let elapsed = start.elapsed();
    report.print();
    println!(
        "\nSoak completed in {:.2?} ({:.0} games/sec)",
        elapsed,
        num_games as f64 / elapsed.as_secs_f64()
    );

    if let Some(path) = report_file {
        let written = serde_json::to_string_pretty(&report)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("Report written to {}", path),
            Err(e) => eprintln!("✗ Failed to write report '{}': {}", path, e),
        }
    }

    if !report.is_clean() {
        std::process::exit(1);
    }
}

fn print_deck(catalog: &CardCatalog, rules: &RulesConfig, seed: Option<u64>) {
    let mut rng = GameRng::new(seed);
    let deck = build_deck(catalog, &rules.deck, &mut rng, &mut InstanceIds::new());

    let mut counts: BTreeMap<(u32, String), usize> = BTreeMap::new();
    for card in deck.cards() {
        *counts.entry((card.cost(), card.name().to_string())).or_insert(0) += 1;
    }

    println!("\n=== Deck ({} cards, seed {}) ===\n", deck.size(), rng.seed());
    for ((cost, name), count) in &counts {
        println!("{} {:<20} (cost {})", count, name, cost);
    }
}
