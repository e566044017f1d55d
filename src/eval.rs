// Static evaluation of a board from one color's point of view
//
// Score = orb difference + positional value of every owned cell, where
// corners are worth more than edges and edges more than interior cells, plus
// a bonus for cells one orb short of exploding. Own cells add, opponent cells
// subtract. Decided games are scored outside the heuristic range.

use crate::board::Board;
use crate::config::ScoresConfig;
use crate::engine::GameState;
use crate::simple_profiler::ProfileGuard;
use crate::types::Color;

/// Gap kept between the largest heuristic score and a decided game
const HEURISTIC_MARGIN: i32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluator {
    weights: ScoresConfig,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new(ScoresConfig::default())
    }
}

impl Evaluator {
    pub fn new(weights: ScoresConfig) -> Self {
        Evaluator { weights }
    }

    pub fn weights(&self) -> &ScoresConfig {
        &self.weights
    }

    /// Score of a won game at the root; wins found deeper score slightly less
    pub fn win_score(&self) -> i32 {
        self.weights.score_win
    }

    /// Heuristic scores are clamped to `[-limit, limit]`
    pub fn heuristic_limit(&self) -> i32 {
        self.weights.score_win - HEURISTIC_MARGIN
    }

    /// Heuristic score of `board` for `color`, ignoring whether the game is decided
    pub fn evaluate(&self, board: &Board, color: Color) -> i32 {
        let _guard = ProfileGuard::new("eval");
        let w = &self.weights;

        let mut score: i64 = 0;
        for (pos, cell) in board.cells() {
            let owner = match cell.owner() {
                Some(owner) => owner,
                None => continue,
            };

            let mass = board.critical_mass(pos.row, pos.col);
            let positional = match mass {
                0..=2 => w.weight_corner,
                3 => w.weight_edge,
                _ => w.weight_interior,
            };
            let mut value = i64::from(cell.orbs()) * i64::from(w.weight_orb) + i64::from(positional);
            if cell.orbs().saturating_add(1) >= mass {
                value += i64::from(w.weight_loaded);
            }

            if owner == color {
                score += value;
            } else {
                score -= value;
            }
        }

        let limit = i64::from(self.heuristic_limit());
        score.clamp(-limit, limit) as i32
    }

    /// Terminal-aware score used by the search. `ply` is the distance from
    /// the search root, so quicker wins and slower losses score better.
    pub fn score_state(&self, state: &GameState, color: Color, ply: u32) -> i32 {
        let ply = ply.min(HEURISTIC_MARGIN as u32 - 1) as i32;
        match state.winner() {
            Some(winner) if winner == color => self.win_score() - ply,
            Some(_) => -(self.win_score() - ply),
            None => self.evaluate(state.board(), color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;

    #[test]
    fn test_empty_board_is_neutral() {
        let board = Board::new(5, 6).unwrap();
        let eval = Evaluator::default();
        assert_eq!(eval.evaluate(&board, Color::Red), 0);
        assert_eq!(eval.evaluate(&board, Color::Blue), 0);
    }

    #[test]
    fn test_score_is_antisymmetric() {
        let mut board = Board::new(5, 6).unwrap();
        board.place_orb(0, 0, Color::Red).unwrap();
        board.place_orb(2, 2, Color::Blue).unwrap();
        board.place_orb(2, 2, Color::Blue).unwrap();
        let eval = Evaluator::default();
        assert_eq!(
            eval.evaluate(&board, Color::Red),
            -eval.evaluate(&board, Color::Blue)
        );
    }

    #[test]
    fn test_corner_outweighs_interior() {
        let eval = Evaluator::default();

        let mut corner = Board::new(5, 6).unwrap();
        corner.place_orb(0, 0, Color::Red).unwrap();
        let mut interior = Board::new(5, 6).unwrap();
        interior.place_orb(2, 2, Color::Red).unwrap();

        assert!(eval.evaluate(&corner, Color::Red) > eval.evaluate(&interior, Color::Red));
    }

    #[test]
    fn test_more_orbs_never_lowers_score() {
        let eval = Evaluator::default();
        let mut board = Board::new(5, 6).unwrap();
        board.place_orb(4, 5, Color::Blue).unwrap();

        let mut last = eval.evaluate(&board, Color::Red);
        for _ in 0..3 {
            board.place_orb(2, 3, Color::Red).unwrap();
            let now = eval.evaluate(&board, Color::Red);
            assert!(now >= last, "score dropped from {} to {}", last, now);
            last = now;
        }
    }

    #[test]
    fn test_decided_game_outranks_heuristic() {
        let eval = Evaluator::default();
        let mut board = Board::new(5, 6).unwrap();
        board.force_set_cell(2, 2, Some(Color::Red), 3).unwrap();
        let state = GameState::resume(board, Color::Blue, 7, &RulesConfig::default());

        let win = eval.score_state(&state, Color::Red, 1);
        let loss = eval.score_state(&state, Color::Blue, 1);
        assert!(win > eval.heuristic_limit());
        assert!(loss < -eval.heuristic_limit());
        assert!(eval.score_state(&state, Color::Red, 1) > eval.score_state(&state, Color::Red, 3));
    }

    #[test]
    fn test_heuristic_is_clamped() {
        let eval = Evaluator::new(ScoresConfig {
            weight_orb: 1_000_000,
            ..ScoresConfig::default()
        });
        let mut board = Board::new(5, 6).unwrap();
        board.force_set_cell(2, 2, Some(Color::Red), 3).unwrap();
        assert_eq!(eval.evaluate(&board, Color::Red), eval.heuristic_limit());
    }
}
