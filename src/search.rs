// Adversarial move search
//
// Depth-bounded minimax with alpha-beta pruning over copies of the game
// state. The engine is bound to one color; nodes where that color is to move
// maximise, the others minimise. Moves are tried in row-major order and ties
// keep the earliest move, so a search is reproducible for a given input.

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::config::{AiConfig, ScoresConfig};
use crate::engine::{GameState, MoveOutcome};
use crate::error::EngineError;
use crate::eval::Evaluator;
use crate::simple_profiler::{self, ProfileGuard};
use crate::types::{Color, Position};

const INF: i32 = i32::MAX;

/// Tree search flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchAlgorithm {
    #[default]
    AlphaBeta,
    /// Plain minimax, no pruning. Slow; kept as a reference for alpha-beta.
    Minimax,
}

/// Search result containing the chosen move and associated statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub best_move: Position,
    /// Score of `best_move` from the engine's point of view
    pub score: i32,
    /// Depth the root was searched to
    pub depth: u8,
    /// Total nodes visited
    pub nodes: u64,
    /// Alpha-beta cutoffs taken
    pub cutoffs: u64,
    /// Chosen by the one-move elimination check, without tree search
    pub immediate_win: bool,
    /// False when cancellation stopped the root before every move was scored
    pub complete: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    nodes: u64,
    cutoffs: u64,
}

impl Counters {
    fn merge(&mut self, other: Counters) {
        self.nodes += other.nodes;
        self.cutoffs += other.cutoffs;
    }
}

/// Best root move found so far: (move index, position, score)
type RootBest = Option<(usize, Position, i32)>;

#[derive(Debug, Clone)]
pub struct SearchEngine {
    color: Color,
    depth: u8,
    algorithm: SearchAlgorithm,
    immediate_win_check: bool,
    parallel: bool,
    evaluator: Evaluator,
}

impl SearchEngine {
    /// Sequential alpha-beta engine with the immediate-win check and default weights.
    /// `depth` counts plies including the root move and is raised to at least 1.
    pub fn new(color: Color, depth: u8) -> Self {
        SearchEngine {
            color,
            depth: depth.max(1),
            algorithm: SearchAlgorithm::AlphaBeta,
            immediate_win_check: true,
            parallel: false,
            evaluator: Evaluator::default(),
        }
    }

    pub fn from_config(color: Color, depth: u8, ai: &AiConfig, scores: &ScoresConfig) -> Self {
        SearchEngine::new(color, depth)
            .with_algorithm(ai.algorithm)
            .with_immediate_win_check(ai.immediate_win_check)
            .with_parallel(ai.parallel_root)
            .with_evaluator(Evaluator::new(scores.clone()))
    }

    pub fn with_algorithm(mut self, algorithm: SearchAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_immediate_win_check(mut self, enabled: bool) -> Self {
        self.immediate_win_check = enabled;
        self
    }

    /// Scores root moves on the rayon pool, each branch on its own copy
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn algorithm(&self) -> SearchAlgorithm {
        self.algorithm
    }

    /// Chooses a move for the engine's color without touching `state`
    pub fn search(&self, state: &GameState) -> Result<SearchResult, EngineError> {
        self.search_with_cancel(state, &AtomicBool::new(false))
    }

    /// Like `search`, abandoning the root between branches once `cancel` is set.
    /// A cancelled search still returns the best fully scored root move, or
    /// `SearchCancelled` if none was scored yet.
    pub fn search_with_cancel(
        &self,
        state: &GameState,
        cancel: &AtomicBool,
    ) -> Result<SearchResult, EngineError> {
        let _guard = ProfileGuard::new("search");
        let start = Instant::now();

        if state.is_over() {
            return Err(EngineError::GameOver);
        }
        if state.current_color() != self.color {
            return Err(EngineError::WrongTurn {
                expected: self.color,
                actual: state.current_color(),
            });
        }

        let moves = state.legal_moves();
        if moves.is_empty() {
            return Err(EngineError::NoLegalMove(self.color));
        }

        if self.immediate_win_check {
            if let Some((best_move, checked)) = self.find_immediate_win(state, &moves)? {
                info!("{} wins immediately at {}", self.color, best_move);
                return Ok(SearchResult {
                    best_move,
                    score: self.evaluator.win_score() - 1,
                    depth: 1,
                    nodes: checked,
                    cutoffs: 0,
                    immediate_win: true,
                    complete: true,
                });
            }
        }

        let mut counters = Counters::default();
        let (best, complete) = if self.parallel {
            self.score_root_parallel(state, &moves, cancel, &mut counters)?
        } else {
            self.score_root_sequential(state, &moves, cancel, &mut counters)?
        };

        let (_, best_move, score) = best.ok_or(EngineError::SearchCancelled)?;
        simple_profiler::merge_thread_local();

        debug!(
            "{} searched {} root moves at depth {}: best {} score {} ({} nodes, {} cutoffs, {}ms{})",
            self.color,
            moves.len(),
            self.depth,
            best_move,
            score,
            counters.nodes,
            counters.cutoffs,
            start.elapsed().as_millis(),
            if complete { "" } else { ", cancelled" }
        );

        Ok(SearchResult {
            best_move,
            score,
            depth: self.depth,
            nodes: counters.nodes,
            cutoffs: counters.cutoffs,
            immediate_win: false,
            complete,
        })
    }

    /// Searches and applies the chosen move to `state`, exactly like a human move
    pub fn make_move(&self, state: &mut GameState) -> Result<(SearchResult, MoveOutcome), EngineError> {
        let result = self.search(state)?;
        let outcome = state.play(result.best_move)?;
        Ok((result, outcome))
    }

    /// First move (row-major) after which the opponent is eliminated and the game is over
    fn find_immediate_win(
        &self,
        state: &GameState,
        moves: &[Position],
    ) -> Result<Option<(Position, u64)>, EngineError> {
        for (i, &pos) in moves.iter().enumerate() {
            let mut child = state.clone();
            child.apply_move(pos.row, pos.col)?;
            if child.winner() == Some(self.color) {
                return Ok(Some((pos, i as u64 + 1)));
            }
        }
        Ok(None)
    }

    fn score_root_sequential(
        &self,
        state: &GameState,
        moves: &[Position],
        cancel: &AtomicBool,
        counters: &mut Counters,
    ) -> Result<(RootBest, bool), EngineError> {
        let mut best: RootBest = None;
        let mut alpha = -INF;

        for (i, &pos) in moves.iter().enumerate() {
            if cancel.load(Ordering::Acquire) {
                return Ok((best, false));
            }

            let mut child = state.clone();
            child.apply_move(pos.row, pos.col)?;
            let score = self.minimax(&child, self.depth - 1, 1, alpha, INF, counters)?;

            if best.map_or(true, |(_, _, b)| score > b) {
                best = Some((i, pos, score));
            }
            if self.algorithm == SearchAlgorithm::AlphaBeta {
                alpha = alpha.max(score);
            }
        }

        Ok((best, true))
    }

    /// Every root branch gets a full window on its own copy of the state;
    /// results are reduced in move order so ties resolve as in the sequential path.
    fn score_root_parallel(
        &self,
        state: &GameState,
        moves: &[Position],
        cancel: &AtomicBool,
        counters: &mut Counters,
    ) -> Result<(RootBest, bool), EngineError> {
        let results: Vec<Option<Result<(i32, Counters), EngineError>>> = moves
            .par_iter()
            .map(|&pos| {
                if cancel.load(Ordering::Acquire) {
                    return None;
                }
                let mut branch = Counters::default();
                let mut child = state.clone();
                let scored = child
                    .apply_move(pos.row, pos.col)
                    .and_then(|_| self.minimax(&child, self.depth - 1, 1, -INF, INF, &mut branch))
                    .map(|score| (score, branch));
                simple_profiler::merge_thread_local();
                Some(scored)
            })
            .collect();

        let mut best: RootBest = None;
        let mut complete = true;
        for (i, result) in results.into_iter().enumerate() {
            let (score, branch) = match result {
                Some(scored) => scored?,
                None => {
                    complete = false;
                    continue;
                }
            };
            counters.merge(branch);
            if best.map_or(true, |(_, _, b)| score > b) {
                best = Some((i, moves[i], score));
            }
        }

        Ok((best, complete))
    }

    fn minimax(
        &self,
        node: &GameState,
        depth: u8,
        ply: u32,
        mut alpha: i32,
        mut beta: i32,
        counters: &mut Counters,
    ) -> Result<i32, EngineError> {
        counters.nodes += 1;

        if depth == 0 || node.is_over() {
            return Ok(self.evaluator.score_state(node, self.color, ply));
        }

        let moves = node.legal_moves();
        if moves.is_empty() {
            return Ok(self.evaluator.score_state(node, self.color, ply));
        }

        let maximizing = node.current_color() == self.color;
        let prune = self.algorithm == SearchAlgorithm::AlphaBeta;
        let mut best = if maximizing { -INF } else { INF };

        for pos in moves {
            let mut child = node.clone();
            child.apply_move(pos.row, pos.col)?;
            let score = self.minimax(&child, depth - 1, ply + 1, alpha, beta, counters)?;

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }

            if prune && alpha >= beta {
                counters.cutoffs += 1;
                simple_profiler::record_alpha_beta_cutoff();
                break;
            }
        }

        Ok(best)
    }
}
