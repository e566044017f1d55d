// AI vs AI console game
//
// Usage:
//   cargo run --release --bin selfplay -- [options]
//
// Prints the board after every move and the result at the end. Set
// CHAIN_REACTION_PROFILE=1 for a timing breakdown.

use log::info;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::env;
use std::process;
use std::time::Instant;

use chain_reaction::config::Config;
use chain_reaction::debug_logger::{DebugLogger, MoveLogEntry};
use chain_reaction::engine::GameState;
use chain_reaction::search::SearchEngine;
use chain_reaction::simple_profiler;
use chain_reaction::snapshot::{Mover, Snapshot};
use chain_reaction::types::{BoardPreset, Color, PlayerKind};

fn print_usage() {
    eprintln!("Chain Reaction Self-Play");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  selfplay [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --board <RxC>           Board size (default from config, presets 5x6, 6x6, 9x6)");
    eprintln!("  --red-depth <N>         Search depth for Red (default: hard depth)");
    eprintln!("  --blue-depth <N>        Search depth for Blue (default: hard depth)");
    eprintln!("  --random-openings <N>   Play the first N moves at random (default: 0)");
    eprintln!("  --seed <N>              Seed for the random openings");
    eprintln!("  --max-turns <N>         Stop unfinished games after N turns (default: 500)");
    eprintln!("  --log                   Append moves to the configured JSONL log");
    eprintln!("  --quiet                 Only print the result");
    eprintln!("  --config <path>         Path to Chain.toml (default: Chain.toml)");
    eprintln!("  --help                  Show this help message");
}

struct Options {
    board: Option<BoardPreset>,
    red_depth: Option<u8>,
    blue_depth: Option<u8>,
    random_openings: u32,
    seed: Option<u64>,
    max_turns: u32,
    log: bool,
    quiet: bool,
    config_path: String,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T
where
    T::Err: std::fmt::Display,
{
    let Some(raw) = args.get(i + 1) else {
        eprintln!("Error: {} requires an argument", flag);
        process::exit(1);
    };
    raw.parse().unwrap_or_else(|e| {
        eprintln!("Error: invalid value '{}' for {}: {}", raw, flag, e);
        process::exit(1);
    })
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().collect();
    let mut options = Options {
        board: None,
        red_depth: None,
        blue_depth: None,
        random_openings: 0,
        seed: None,
        max_turns: 500,
        log: false,
        quiet: false,
        config_path: "Chain.toml".to_string(),
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--board" => {
                options.board = Some(parse_value(&args, i, "--board"));
                i += 1;
            }
            "--red-depth" => {
                options.red_depth = Some(parse_value(&args, i, "--red-depth"));
                i += 1;
            }
            "--blue-depth" => {
                options.blue_depth = Some(parse_value(&args, i, "--blue-depth"));
                i += 1;
            }
            "--random-openings" => {
                options.random_openings = parse_value(&args, i, "--random-openings");
                i += 1;
            }
            "--seed" => {
                options.seed = Some(parse_value(&args, i, "--seed"));
                i += 1;
            }
            "--max-turns" => {
                options.max_turns = parse_value(&args, i, "--max-turns");
                i += 1;
            }
            "--config" => {
                options.config_path = parse_value(&args, i, "--config");
                i += 1;
            }
            "--log" => options.log = true,
            "--quiet" => options.quiet = true,
            "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Error: Unknown option '{}'", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    options
}

#[tokio::main]
async fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    let options = parse_args();
    let config = Config::from_file(&options.config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", options.config_path, e);
        Config::default_hardcoded()
    });

    let preset = options.board.unwrap_or(BoardPreset {
        rows: config.game.rows,
        cols: config.game.cols,
    });
    let mut game = match GameState::with_rules(preset.rows, preset.cols, &config.rules) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let hard = config.ai.hard_depth;
    let red = SearchEngine::from_config(
        Color::Red,
        options.red_depth.unwrap_or(hard),
        &config.ai,
        &config.scores,
    );
    let blue = SearchEngine::from_config(
        Color::Blue,
        options.blue_depth.unwrap_or(hard),
        &config.ai,
        &config.scores,
    );

    let seed = options.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let logger = DebugLogger::new(options.log, &config.debug.log_file_path).await;

    println!(
        "{} board, Red depth {} vs Blue depth {}, {} random opening move(s), seed {}",
        preset,
        red.depth(),
        blue.depth(),
        options.random_openings,
        seed
    );

    let start = Instant::now();
    while !game.is_over() && game.turn() < options.max_turns {
        let engine = match game.current_color() {
            Color::Red => &red,
            Color::Blue => &blue,
        };

        let (position, depth) = if game.turn() < options.random_openings {
            match game.legal_moves().choose(&mut rng) {
                Some(&position) => (position, None),
                None => break,
            }
        } else {
            match engine.search(&game) {
                Ok(result) => (result.best_move, Some(result.depth)),
                Err(e) => {
                    eprintln!("Turn {}: {} cannot move: {}", game.turn() + 1, engine.color(), e);
                    process::exit(1);
                }
            }
        };

        let outcome = match game.play(position) {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("Turn {}: engine rejected {}: {}", game.turn() + 1, position, e);
                process::exit(1);
            }
        };

        logger
            .log_move_now(MoveLogEntry::new(&outcome, PlayerKind::Ai, depth, game.board()))
            .await;

        if !options.quiet {
            println!(
                "Turn {}: {} -> {} ({} explosions)",
                outcome.turn, outcome.color, outcome.position, outcome.explosions
            );
            print!("{}", Snapshot::capture(game.board(), Mover::Ai));
            println!();
        }
    }

    let elapsed = start.elapsed().as_millis() as u64;
    match game.winner() {
        Some(winner) => println!("{} wins after {} turns ({}ms)", winner, game.turn(), elapsed),
        None => println!("No winner after {} turns ({}ms)", game.turn(), elapsed),
    }
    println!(
        "Final orbs: Red {}, Blue {}",
        game.board().score(Color::Red),
        game.board().score(Color::Blue)
    );
    info!("Self-play finished in {}ms", elapsed);

    simple_profiler::print_report(elapsed);
}
