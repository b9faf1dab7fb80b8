//! Plain-text command scripts.
//!
//! One command per line, cards referenced by name or `#id`:
//!
//! ```text
//! # comment
//! play_creature Ember Imp
//! enter_combat
//! skip_pre_actions
//! select_attacker #3
//! proceed_apply_actions
//! select_target player
//! skip_block
//! !select_target player      # a leading ! expects the command to be rejected
//! end_turn
//! ```

use crate::game::commands::{apply, Command, CommandError};
use crate::game::state::{AttackTarget, GameState, Phase};
use crate::game::zones::{CardInstance, InstanceId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid script at line {line}: {reason}")]
    InvalidFormat { line: usize, reason: String },
    #[error("Line {line}: no card '{name}' in {zone}")]
    UnknownCard {
        line: usize,
        name: String,
        zone: &'static str,
    },
    #[error("Line {line}: {command} rejected: {source}")]
    Rejected {
        line: usize,
        command: String,
        source: CommandError,
    },
    #[error("Line {line}: {command} was expected to be rejected")]
    UnexpectedSuccess { line: usize, command: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    PlayCreature,
    EnterCombat,
    PlayPreAction,
    SkipPreActions,
    SelectAttacker,
    PlayAction,
    SkipActions,
    ProceedApplyActions,
    SelectTarget,
    PlayBlock,
    SkipBlock,
    SelectTapTarget,
    EndTurn,
}

impl Verb {
    fn parse(word: &str) -> Option<Verb> {
        let verb = match word {
            "play_creature" => Verb::PlayCreature,
            "enter_combat" => Verb::EnterCombat,
            "play_pre_action" => Verb::PlayPreAction,
            "skip_pre_actions" => Verb::SkipPreActions,
            "select_attacker" => Verb::SelectAttacker,
            "play_action" => Verb::PlayAction,
            "skip_actions" => Verb::SkipActions,
            "proceed_apply_actions" => Verb::ProceedApplyActions,
            "select_target" => Verb::SelectTarget,
            "play_block" => Verb::PlayBlock,
            "skip_block" => Verb::SkipBlock,
            "select_tap_target" => Verb::SelectTapTarget,
            "end_turn" => Verb::EndTurn,
            _ => return None,
        };
        Some(verb)
    }

    fn takes_argument(self) -> bool {
        !matches!(
            self,
            Verb::EnterCombat
                | Verb::SkipPreActions
                | Verb::SkipActions
                | Verb::ProceedApplyActions
                | Verb::SkipBlock
                | Verb::EndTurn
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CardRef {
    Id(InstanceId),
    Name(String),
}

impl CardRef {
    fn parse(text: &str) -> CardRef {
        match text.strip_prefix('#').and_then(|n| n.parse().ok()) {
            Some(n) => CardRef::Id(InstanceId(n)),
            None => CardRef::Name(text.to_string()),
        }
    }

    fn matches(&self, id: InstanceId, name: &str) -> bool {
        match self {
            CardRef::Id(want) => *want == id,
            CardRef::Name(want) => want.eq_ignore_ascii_case(name),
        }
    }
}

/// One parsed script line
#[derive(Debug, Clone)]
pub struct ScriptLine {
    pub line: usize,
    pub text: String,
    verb: Verb,
    argument: Option<CardRef>,
    expect_rejection: bool,
}

/// Parse a whole script. Blank lines and `#`/`//` comments are skipped.
pub fn parse_script(content: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    let mut lines = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let text = strip_comment(raw).trim();
        if text.is_empty() {
            continue;
        }
        let (expect_rejection, text) = match text.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, text),
        };
        let (word, rest) = text.split_once(' ').unwrap_or((text, ""));
        let verb = Verb::parse(word).ok_or_else(|| ScriptError::InvalidFormat {
            line,
            reason: format!("unknown command '{}'", word),
        })?;
        let rest = rest.trim();
        let argument = match (verb.takes_argument(), rest.is_empty()) {
            (true, false) => Some(CardRef::parse(rest)),
            (false, true) => None,
            (true, true) => {
                return Err(ScriptError::InvalidFormat {
                    line,
                    reason: format!("{} needs a card", word),
                })
            }
            (false, false) => {
                return Err(ScriptError::InvalidFormat {
                    line,
                    reason: format!("{} takes no argument", word),
                })
            }
        };
        lines.push(ScriptLine {
            line,
            text: text.to_string(),
            verb,
            argument,
            expect_rejection,
        });
    }
    Ok(lines)
}

fn strip_comment(line: &str) -> &str {
    let line = line.trim_start();
    if line.starts_with('#') {
        return "";
    }
    let cut = [line.find(" # "), line.find("//")].into_iter().flatten().min();
    match cut {
        Some(i) => &line[..i],
        None => line,
    }
}

fn find_card<'a>(
    cards: impl IntoIterator<Item = &'a CardInstance>,
    wanted: &CardRef,
    line: usize,
    zone: &'static str,
) -> Result<InstanceId, ScriptError> {
    cards
        .into_iter()
        .find(|c| wanted.matches(c.id, c.name()))
        .map(|c| c.id)
        .ok_or_else(|| ScriptError::UnknownCard {
            line,
            name: match wanted {
                CardRef::Id(id) => id.to_string(),
                CardRef::Name(name) => name.clone(),
            },
            zone,
        })
}

/// Turn a parsed line into a concrete command against the current state
pub fn resolve_line(state: &GameState, line: &ScriptLine) -> Result<Command, ScriptError> {
    let active = state.active_player();
    let defender = state.defender();
    let arg = match &line.argument {
        Some(arg) => arg,
        None => {
            return Ok(match line.verb {
                Verb::EnterCombat => Command::EnterCombat,
                Verb::SkipPreActions => Command::SkipPreActions,
                Verb::SkipActions => Command::SkipActions,
                Verb::ProceedApplyActions => Command::ProceedApplyActions,
                Verb::SkipBlock => Command::SkipBlock,
                _ => Command::EndTurn,
            })
        }
    };
    let n = line.line;
    let command = match line.verb {
        Verb::PlayCreature => Command::PlayCreature {
            card: find_card(active.hand.cards(), arg, n, "hand")?,
        },
        Verb::PlayPreAction => Command::PlayPreAction {
            card: find_card(active.hand.cards(), arg, n, "hand")?,
        },
        Verb::PlayAction => Command::PlayAction {
            card: find_card(active.hand.cards(), arg, n, "hand")?,
        },
        Verb::PlayBlock => Command::PlayBlock {
            card: find_card(defender.hand.cards(), arg, n, "the defender's hand")?,
        },
        Verb::SelectAttacker => Command::SelectAttacker {
            creature: find_card(active.board.creatures().iter().map(|c| &c.card), arg, n, "play")?,
        },
        Verb::SelectTarget => {
            if *arg == CardRef::Name("player".to_string()) {
                Command::SelectTarget {
                    target: AttackTarget::Player,
                }
            } else {
                let id = find_card(defender.board.creatures().iter().map(|c| &c.card), arg, n, "the defender's board")?;
                Command::SelectTarget {
                    target: AttackTarget::Creature(id),
                }
            }
        }
        Verb::SelectTapTarget => {
            let owner = state.pending.as_ref().map_or(state.active, |p| p.owner);
            let enemy = state.player(owner.opponent());
            // Prefer an untapped creature when several share a name
            let untapped = enemy.board.creatures().iter().filter(|c| !c.tapped).map(|c| &c.card);
            let id = find_card(untapped, arg, n, "the enemy board")
                .or_else(|_| find_card(enemy.board.creatures().iter().map(|c| &c.card), arg, n, "the enemy board"))?;
            Command::SelectTapTarget { creature: id }
        }
        _ => {
            return Err(ScriptError::InvalidFormat {
                line: n,
                reason: format!("{} takes no argument", line.text),
            })
        }
    };
    Ok(command)
}

/// Outcome of running a script
#[derive(Debug, Clone, Default)]
pub struct ScriptReport {
    pub executed: usize,
    pub rejected_as_expected: usize,
}

/// Run every line in order. Stops at the first unexpected result.
pub fn run_script(state: &mut GameState, content: &str, verbose: bool) -> Result<ScriptReport, ScriptError> {
    let lines = parse_script(content)?;
    let mut report = ScriptReport::default();
    for line in &lines {
        let command = match resolve_line(state, line) {
            Ok(command) => command,
            Err(ScriptError::UnknownCard { .. }) if line.expect_rejection => {
                report.rejected_as_expected += 1;
                continue;
            }
            Err(e) => return Err(e),
        };
        let result = apply(state, command);
        if verbose {
            match &result {
                Ok(phase) => println!("[{:>3}] {:<40} → {}", line.line, line.text, phase),
                Err(e) => println!("[{:>3}] {:<40} ✗ {}", line.line, line.text, e),
            }
        }
        match (result, line.expect_rejection) {
            (Ok(_), false) => report.executed += 1,
            (Err(_), true) => report.rejected_as_expected += 1,
            (Ok(_), true) => {
                return Err(ScriptError::UnexpectedSuccess {
                    line: line.line,
                    command: command.to_string(),
                })
            }
            (Err(source), false) => {
                return Err(ScriptError::Rejected {
                    line: line.line,
                    command: command.to_string(),
                    source,
                })
            }
        }
        if state.phase == Phase::GameOver {
            break;
        }
    }
    Ok(report)
}
