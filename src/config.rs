// Configuration module for reading Chain.toml
// Every tunable of the engine, the AI and the front ends lives here

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::board::{DEFAULT_CASCADE_STEPS_PER_CELL, MAX_DIMENSION, MIN_DIMENSION};
use crate::engine::DEFAULT_MIN_TURNS_BEFORE_WIN;
use crate::error::ConfigError;
use crate::search::SearchAlgorithm;
use crate::types::{Difficulty, PlayerKind};

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub rules: RulesConfig,
    pub game: GameConfig,
    pub ai: AiConfig,
    pub timing: TimingConfig,
    pub scores: ScoresConfig,
    pub relay: RelayConfig,
    pub debug: DebugConfig,
}

/// Game rules
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RulesConfig {
    /// Elimination only ends the game once the turn counter exceeds this
    pub min_turns_before_win: u32,
    /// Explosion budget per board cell before a cascade counts as runaway
    pub cascade_steps_per_cell: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            min_turns_before_win: DEFAULT_MIN_TURNS_BEFORE_WIN,
            cascade_steps_per_cell: DEFAULT_CASCADE_STEPS_PER_CELL,
        }
    }
}

/// Defaults for new games
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub red: PlayerKind,
    pub blue: PlayerKind,
}

/// Search settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AiConfig {
    pub easy_depth: u8,
    pub normal_depth: u8,
    pub hard_depth: u8,
    pub default_difficulty: Difficulty,
    pub immediate_win_check: bool,
    pub parallel_root: bool,
    pub algorithm: SearchAlgorithm,
}

impl AiConfig {
    /// Search depth (plies, root move included) for a difficulty
    pub fn depth_for(&self, difficulty: Difficulty) -> u8 {
        match difficulty {
            Difficulty::Easy => self.easy_depth,
            Difficulty::Normal => self.normal_depth,
            Difficulty::Hard => self.hard_depth,
        }
    }
}

/// Timing constants for the asynchronous AI driver
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub polling_interval_ms: u64,
}

/// Evaluator weights
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ScoresConfig {
    /// Per orb of difference between the two colors
    pub weight_orb: i32,
    /// Per owned corner cell (critical mass 2)
    pub weight_corner: i32,
    /// Per owned edge cell (critical mass 3)
    pub weight_edge: i32,
    /// Per owned interior cell (critical mass 4)
    pub weight_interior: i32,
    /// Per owned cell one orb short of exploding
    pub weight_loaded: i32,
    /// Magnitude of a decided game; must dwarf any heuristic score
    pub score_win: i32,
}

impl Default for ScoresConfig {
    fn default() -> Self {
        ScoresConfig {
            weight_orb: 10,
            weight_corner: 6,
            weight_edge: 3,
            weight_interior: 1,
            weight_loaded: 4,
            score_win: 1_000_000,
        }
    }
}

/// File hand-off between two front ends
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelayConfig {
    pub snapshot_path: String,
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
}

/// Debug configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

/// Lowest `score_win` accepted; keeps decided games above heuristic noise
pub const MIN_SCORE_WIN: i32 = 100_000;

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Chain.toml configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::FileRead {
            path: path.as_ref().to_path_buf(),
            source,
        })?;

        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Chain.toml in the project root
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_file("Chain.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Chain.toml
    pub fn default_hardcoded() -> Self {
        Config {
            rules: RulesConfig::default(),
            game: GameConfig {
                rows: 5,
                cols: 6,
                red: PlayerKind::Human,
                blue: PlayerKind::Ai,
            },
            ai: AiConfig {
                easy_depth: 1,
                normal_depth: 2,
                hard_depth: 4,
                default_difficulty: Difficulty::Normal,
                immediate_win_check: true,
                parallel_root: true,
                algorithm: SearchAlgorithm::AlphaBeta,
            },
            timing: TimingConfig {
                response_time_budget_ms: 10_000,
                polling_interval_ms: 20,
            },
            scores: ScoresConfig::default(),
            relay: RelayConfig {
                snapshot_path: "gamestate.txt".to_string(),
                poll_interval_ms: 100,
                timeout_ms: 10_000,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "chain_reaction_moves.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Chain.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }

    /// Rejects settings the engine cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.rules.cascade_steps_per_cell == 0 {
            return invalid("cascade_steps_per_cell must be >= 1");
        }
        let dims = MIN_DIMENSION..=MAX_DIMENSION;
        if !dims.contains(&self.game.rows) || !dims.contains(&self.game.cols) {
            return invalid("game rows and cols must be between 2 and 32");
        }
        if self.ai.easy_depth == 0 || self.ai.normal_depth == 0 || self.ai.hard_depth == 0 {
            return invalid("search depths must be >= 1");
        }
        let s = &self.scores;
        if [s.weight_orb, s.weight_corner, s.weight_edge, s.weight_interior, s.weight_loaded]
            .iter()
            .any(|w| *w < 0)
        {
            return invalid("evaluation weights must be non-negative");
        }
        if s.score_win < MIN_SCORE_WIN {
            return invalid("score_win must be >= 100000");
        }
        if self.timing.response_time_budget_ms == 0 || self.timing.polling_interval_ms == 0 {
            return invalid("timing values must be positive");
        }
        if self.relay.poll_interval_ms == 0 || self.relay.timeout_ms == 0 {
            return invalid("relay timing values must be positive");
        }
        Ok(())
    }
}
