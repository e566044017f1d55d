// AI side of the file-based hand-off
//
// Usage:
//   cargo run --release --bin relay -- [options]
//
// Waits for the human front end to write a "HUMAN MOVE:" snapshot, loads it,
// searches, applies the AI move and writes the board back as "AI MOVE:".
// The snapshot carries no turn counter, so the relay keeps its own: a board
// holding a single orb is the first move of a new game.

use log::{error, info, warn};
use std::env;
use std::process;
use std::time::Duration;

use chain_reaction::board::Board;
use chain_reaction::config::Config;
use chain_reaction::debug_logger::{DebugLogger, MoveLogEntry};
use chain_reaction::engine::GameState;
use chain_reaction::error::EngineError;
use chain_reaction::relay::{RelayOutcome, SnapshotRelay};
use chain_reaction::search::SearchEngine;
use chain_reaction::snapshot::{Mover, Snapshot};
use chain_reaction::types::{Color, Difficulty, PlayerKind};

fn print_usage() {
    eprintln!("Chain Reaction Relay (AI side)");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  relay [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --difficulty <easy|normal|hard>  AI strength (default from config)");
    eprintln!("  --file <path>                    Snapshot file (default from config)");
    eprintln!("  --max-idle <N>                   Exit after N timeouts in a row (default: never)");
    eprintln!("  --config <path>                  Path to Chain.toml (default: Chain.toml)");
    eprintln!("  --help                           Show this help message");
}

struct Options {
    difficulty: Option<Difficulty>,
    file: Option<String>,
    max_idle: Option<u32>,
    config_path: String,
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().collect();
    let mut options = Options {
        difficulty: None,
        file: None,
        max_idle: None,
        config_path: "Chain.toml".to_string(),
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "--help" {
            print_usage();
            process::exit(0);
        }

        let Some(value) = args.get(i + 1) else {
            eprintln!("Error: {} requires an argument", flag);
            print_usage();
            process::exit(1);
        };

        match flag {
            "--difficulty" => match value.parse() {
                Ok(d) => options.difficulty = Some(d),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            },
            "--file" => options.file = Some(value.clone()),
            "--max-idle" => match value.parse() {
                Ok(n) => options.max_idle = Some(n),
                Err(e) => {
                    eprintln!("Error: invalid --max-idle '{}': {}", value, e);
                    process::exit(1);
                }
            },
            "--config" => options.config_path = value.clone(),
            _ => {
                eprintln!("Error: Unknown option '{}'", flag);
                print_usage();
                process::exit(1);
            }
        }
        i += 2;
    }

    options
}

/// Rebuilds the game from the human's snapshot. `last_turn` is the turn
/// counter after the AI's previous move in this game, if any.
fn resume_from(snapshot: &Snapshot, last_turn: Option<u32>, config: &Config) -> Result<GameState, String> {
    let board = Board::from_snapshot(snapshot).map_err(|e| e.to_string())?;
    let turn = match last_turn {
        Some(turn) if board.total_orbs() > 1 => turn + 1,
        _ => 1,
    };
    Ok(GameState::resume(board, Color::Blue, turn, &config.rules))
}

#[tokio::main]
async fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let options = parse_args();
    let mut config = Config::from_file(&options.config_path).unwrap_or_else(|e| {
        warn!("Could not load config from '{}' ({}), using defaults", options.config_path, e);
        Config::default_hardcoded()
    });
    if let Some(file) = options.file {
        config.relay.snapshot_path = file;
    }

    let difficulty = options.difficulty.unwrap_or(config.ai.default_difficulty);
    let engine = SearchEngine::from_config(
        Color::Blue,
        config.ai.depth_for(difficulty),
        &config.ai,
        &config.scores,
    );
    let relay = SnapshotRelay::from_config(&config.relay);
    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;

    info!(
        "Relay watching {} as Blue ({:?}, depth {})",
        relay.path().display(),
        difficulty,
        engine.depth()
    );

    let poll_interval = Duration::from_millis(config.relay.poll_interval_ms);
    let mut last_turn: Option<u32> = None;
    let mut last_seen: Option<Snapshot> = None;
    let mut idle = 0;

    loop {
        let snapshot = match relay.wait_for(Mover::Human).await {
            // A human snapshot we already handled stays in the file until the
            // human moves again
            Ok(RelayOutcome::Received(snapshot)) if last_seen.as_ref() == Some(&snapshot) => {
                tokio::time::sleep(poll_interval).await;
                continue;
            }
            Ok(RelayOutcome::Received(snapshot)) => snapshot,
            Ok(RelayOutcome::NoResponse) => {
                idle += 1;
                if options.max_idle.is_some_and(|max| idle >= max) {
                    info!("No human move after {} timeouts, exiting", idle);
                    return;
                }
                continue;
            }
            Err(e) => {
                error!("Relay failed: {}", e);
                process::exit(1);
            }
        };
        idle = 0;
        last_seen = Some(snapshot.clone());

        let mut game = match resume_from(&snapshot, last_turn, &config) {
            Ok(game) => game,
            Err(e) => {
                warn!("Rejected human snapshot: {}", e);
                continue;
            }
        };

        if let Some(winner) = game.winner() {
            info!("Game over on turn {}: {} wins", game.turn(), winner);
            last_turn = None;
            continue;
        }

        match engine.make_move(&mut game) {
            Ok((result, outcome)) => {
                last_turn = if outcome.game_over { None } else { Some(outcome.turn) };
                logger
                    .log_move_now(MoveLogEntry::new(
                        &outcome,
                        PlayerKind::Ai,
                        Some(result.depth),
                        game.board(),
                    ))
                    .await;
            }
            Err(EngineError::NoLegalMove(color)) => {
                error!("{} has no legal move", color);
                process::exit(1);
            }
            Err(e) => {
                error!("AI move failed: {}", e);
                process::exit(1);
            }
        }

        if let Err(e) = relay.publish(&Snapshot::capture(game.board(), Mover::Ai)).await {
            error!("Could not publish AI move: {}", e);
            process::exit(1);
        }
    }
}
