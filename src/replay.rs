// Replay module for checking logged games
//
// This module provides functionality to:
// 1. Parse JSONL move logs
// 2. Re-apply every logged move and check the resulting board is identical
// 3. Re-run the search for AI moves at the logged depth and compare choices
// 4. Generate a summary report

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::board::Board;
use crate::config::Config;
use crate::debug_logger::MoveLogEntry;
use crate::engine::GameState;
use crate::error::ReplayError;
use crate::search::SearchEngine;
use crate::snapshot::Snapshot;
use crate::types::{Color, PlayerKind, Position};

/// Result of replaying a single logged move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayResult {
    pub turn: u32,
    pub color: Color,
    pub logged_move: Position,
    /// Move the search picks today, for AI moves
    pub replayed_move: Option<Position>,
    pub replayed_score: Option<i32>,
    pub search_depth: Option<u8>,
    /// Board after re-applying the logged move equals the logged board
    pub board_matches: bool,
    pub computation_time_ms: u128,
}

impl ReplayResult {
    /// Human moves only have to reproduce the board
    pub fn move_matches(&self) -> bool {
        self.replayed_move.map_or(true, |m| m == self.logged_move)
    }

    pub fn matches(&self) -> bool {
        self.board_matches && self.move_matches()
    }
}

/// Statistics for a complete replay session
#[derive(Debug, Default, PartialEq)]
pub struct ReplayStats {
    pub total_turns: usize,
    pub ai_turns: usize,
    pub move_mismatches: usize,
    pub board_mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing move logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<MoveLogEntry>, ReplayError> {
        let io_error = |source| ReplayError::Io {
            path: log_path.as_ref().to_path_buf(),
            source,
        };

        let file = File::open(log_path.as_ref()).map_err(io_error)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(io_error)?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: MoveLogEntry =
                serde_json::from_str(&line).map_err(|source| ReplayError::Parse {
                    line: line_num + 1,
                    source,
                })?;
            entries.push(entry);
        }

        if entries.is_empty() {
            return Err(ReplayError::Empty);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Game state right before `entries[index]` was played. Turn 1 starts
    /// from an empty board; later turns start from the previous entry's board.
    fn state_before(&self, entries: &[MoveLogEntry], index: usize) -> Result<GameState, ReplayError> {
        let entry = &entries[index];
        let rules = &self.config.rules;

        if entry.turn <= 1 {
            return GameState::with_rules(entry.rows, entry.cols, rules).map_err(|source| {
                ReplayError::Engine {
                    turn: entry.turn,
                    source,
                }
            });
        }

        let previous = index
            .checked_sub(1)
            .map(|i| &entries[i])
            .filter(|p| p.turn + 1 == entry.turn)
            .ok_or(ReplayError::MissingTurn(entry.turn - 1))?;

        let snapshot = Snapshot::parse(&previous.snapshot).map_err(|source| ReplayError::Snapshot {
            turn: previous.turn,
            source,
        })?;
        let board = Board::from_snapshot(&snapshot).map_err(|source| ReplayError::Snapshot {
            turn: previous.turn,
            source,
        })?;

        Ok(GameState::resume(board, entry.color, previous.turn, rules))
    }

    /// Replays `entries[index]` and compares it with what was logged
    pub fn replay_entry(&self, entries: &[MoveLogEntry], index: usize) -> Result<ReplayResult, ReplayError> {
        let entry = &entries[index];
        let turn = entry.turn;
        let logged_move = Position::new(entry.row, entry.col);
        let start_time = Instant::now();

        if self.verbose {
            info!("Replaying turn {}...", turn);
        }

        let mut state = self.state_before(entries, index)?;

        let search = match (entry.controller, entry.depth) {
            (PlayerKind::Ai, Some(depth)) => {
                let engine = SearchEngine::from_config(entry.color, depth, &self.config.ai, &self.config.scores);
                Some(
                    engine
                        .search(&state)
                        .map_err(|source| ReplayError::Engine { turn, source })?,
                )
            }
            _ => None,
        };

        state
            .apply_move(logged_move.row, logged_move.col)
            .map_err(|source| ReplayError::Engine { turn, source })?;

        let logged = Snapshot::parse(&entry.snapshot)
            .map_err(|source| ReplayError::Snapshot { turn, source })?;
        let board_matches = Snapshot::capture(state.board(), logged.mover) == logged;

        let result = ReplayResult {
            turn,
            color: entry.color,
            logged_move,
            replayed_move: search.map(|s| s.best_move),
            replayed_score: search.map(|s| s.score),
            search_depth: search.map(|s| s.depth),
            board_matches,
            computation_time_ms: start_time.elapsed().as_millis(),
        };

        if self.verbose {
            if result.matches() {
                info!("Turn {}: ✓ MATCH - {} at {}", turn, result.color, logged_move);
            } else {
                warn!(
                    "Turn {}: ✗ MISMATCH - logged {}, replayed {:?}, board {}",
                    turn,
                    logged_move,
                    result.replayed_move,
                    if board_matches { "same" } else { "differs" }
                );
            }
        }

        Ok(result)
    }

    /// Replays every entry; entries that cannot be replayed are skipped with a warning
    pub fn replay_all(&self, entries: &[MoveLogEntry]) -> Vec<ReplayResult> {
        let mut results = Vec::new();

        for index in 0..entries.len() {
            match self.replay_entry(entries, index) {
                Ok(result) => results.push(result),
                Err(e) => warn!("Failed to replay entry {}: {}", index + 1, e),
            }
        }

        results
    }

    /// Replays specific turns. When a log holds several games, the first
    /// entry with a given turn is used.
    pub fn replay_turns(
        &self,
        entries: &[MoveLogEntry],
        turn_numbers: &[u32],
    ) -> Result<Vec<ReplayResult>, ReplayError> {
        let mut results = Vec::new();

        for &turn in turn_numbers {
            let index = entries
                .iter()
                .position(|e| e.turn == turn)
                .ok_or(ReplayError::MissingTurn(turn))?;

            match self.replay_entry(entries, index) {
                Ok(result) => results.push(result),
                Err(e) => warn!("Failed to replay turn {}: {}", turn, e),
            }
        }

        Ok(results)
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_turns = results.len();
        let ai_turns = results.iter().filter(|r| r.replayed_move.is_some()).count();
        let move_mismatches = results.iter().filter(|r| !r.move_matches()).count();
        let board_mismatches = results.iter().filter(|r| !r.board_matches).count();
        let matches = results.iter().filter(|r| r.matches()).count();
        let match_rate = if total_turns > 0 {
            (matches as f64 / total_turns as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_turns,
            ai_turns,
            move_mismatches,
            board_mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Turns:       {}", stats.total_turns);
        println!("AI Turns:          {}", stats.ai_turns);
        println!("Match Rate:        {:.1}%", stats.match_rate);
        println!("Move Mismatches:   {}", stats.move_mismatches);
        println!("Board Mismatches:  {}", stats.board_mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if stats.ai_turns > 0 {
            let avg_time: f64 = results
                .iter()
                .filter(|r| r.replayed_move.is_some())
                .map(|r| r.computation_time_ms as f64)
                .sum::<f64>()
                / stats.ai_turns as f64;
            println!("Average Search Time:   {:.1}ms\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches()).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                let replayed = result
                    .replayed_move
                    .map_or_else(|| "-".to_string(), |m| m.to_string());
                println!(
                    "Turn {} ({}): {} → {} (depth: {:?}, board {})",
                    result.turn,
                    result.color,
                    result.logged_move,
                    replayed,
                    result.search_depth,
                    if result.board_matches { "ok" } else { "DIFFERS" }
                );
            }
            println!();
        }
    }
}
