// Move engine: the only path through which a game changes
//
// `GameState` owns the authoritative board together with whose turn it is,
// the turn counter and the outcome. `apply_move` validates a placement,
// resolves its cascade, advances the turn and checks for elimination.

use log::{error, info, warn};
use serde::Serialize;

use crate::board::Board;
use crate::config::RulesConfig;
use crate::error::EngineError;
use crate::types::{Color, Position};

/// Turns that must be completed before elimination ends the game
pub const DEFAULT_MIN_TURNS_BEFORE_WIN: u32 = 4;

/// Result of a successfully applied move
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub position: Position,
    pub color: Color,
    pub explosions: usize,
    /// Turn counter after the move
    pub turn: u32,
    pub game_over: bool,
    pub winner: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    current: Color,
    turn: u32,
    winner: Option<Color>,
    rules: RulesConfig,
}

impl GameState {
    /// Starts a game on an empty board with default rules. Red moves first.
    pub fn new(rows: usize, cols: usize) -> Result<Self, EngineError> {
        Self::with_rules(rows, cols, &RulesConfig::default())
    }

    pub fn with_rules(rows: usize, cols: usize, rules: &RulesConfig) -> Result<Self, EngineError> {
        let mut board = Board::new(rows, cols)?;
        board.set_cascade_steps_per_cell(rules.cascade_steps_per_cell);

        Ok(GameState {
            board,
            current: Color::Red,
            turn: 0,
            winner: None,
            rules: rules.clone(),
        })
    }

    /// Rebuilds a game around an existing board, e.g. one loaded from a
    /// snapshot. The outcome is recomputed from the board and turn counter.
    pub fn resume(board: Board, current: Color, turn: u32, rules: &RulesConfig) -> Self {
        let mut board = board;
        board.set_cascade_steps_per_cell(rules.cascade_steps_per_cell);
        let winner = decide_winner(&board, turn, rules.min_turns_before_win);

        GameState {
            board,
            current,
            turn,
            winner,
            rules: rules.clone(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_color(&self) -> Color {
        self.current
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Legal placements for the side to move, row-major; empty once the game is over
    pub fn legal_moves(&self) -> Vec<Position> {
        if self.is_over() {
            return Vec::new();
        }
        self.board.legal_moves(self.current)
    }

    /// Applies a placement for the side to move.
    ///
    /// Rejected moves leave the state untouched. On success the turn counter
    /// advances, the side to move flips and elimination is checked.
    pub fn apply_move(&mut self, row: usize, col: usize) -> Result<MoveOutcome, EngineError> {
        if self.is_over() {
            return Err(EngineError::GameOver);
        }

        let color = self.current;
        let placement = self.board.place_orb(row, col, color)?;

        self.turn += 1;
        self.current = color.opponent();
        self.winner = decide_winner(&self.board, self.turn, self.rules.min_turns_before_win);

        Ok(MoveOutcome {
            position: Position::new(row, col),
            color,
            explosions: placement.explosions,
            turn: self.turn,
            game_over: self.winner.is_some(),
            winner: self.winner,
        })
    }

    /// Same as `apply_move`, with logging suited to the authoritative game
    pub fn play(&mut self, position: Position) -> Result<MoveOutcome, EngineError> {
        match self.apply_move(position.row, position.col) {
            Ok(outcome) => {
                info!(
                    "Turn {}: {} placed at {} ({} explosions)",
                    outcome.turn, outcome.color, outcome.position, outcome.explosions
                );
                if let Some(winner) = outcome.winner {
                    info!("Game over after turn {}: {} wins", outcome.turn, winner);
                }
                Ok(outcome)
            }
            Err(e) if e.is_illegal_move() => {
                warn!("Rejected move by {}: {}", self.current, e);
                Err(e)
            }
            Err(e) => {
                if e.is_fault() {
                    error!("Engine fault on turn {}: {}", self.turn + 1, e);
                }
                Err(e)
            }
        }
    }

    /// Empties the board and returns to turn 0 with Red to move
    pub fn reset(&mut self) {
        self.board.clear();
        self.current = Color::Red;
        self.turn = 0;
        self.winner = None;
    }

    /// Replaces the board contents while keeping turn and side to move.
    /// Used by boundary adapters after a bulk load.
    pub(crate) fn replace_board(&mut self, board: Board) {
        self.board = board;
        self.board
            .set_cascade_steps_per_cell(self.rules.cascade_steps_per_cell);
        self.winner = decide_winner(&self.board, self.turn, self.rules.min_turns_before_win);
    }
}

/// Elimination rule: once more than `min_turns` moves have been made, a
/// color with no orbs left has lost.
pub fn decide_winner(board: &Board, turn: u32, min_turns: u32) -> Option<Color> {
    if turn <= min_turns {
        return None;
    }

    let red = board.score(Color::Red);
    let blue = board.score(Color::Blue);
    if red == 0 && blue > 0 {
        Some(Color::Blue)
    } else if blue == 0 && red > 0 {
        Some(Color::Red)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IllegalMoveReason;

    #[test]
    fn test_turns_alternate() {
        let mut game = GameState::new(5, 6).unwrap();
        assert_eq!(game.current_color(), Color::Red);
        game.apply_move(0, 0).unwrap();
        assert_eq!(game.current_color(), Color::Blue);
        assert_eq!(game.turn(), 1);
        game.apply_move(4, 5).unwrap();
        assert_eq!(game.current_color(), Color::Red);
        assert_eq!(game.turn(), 2);
    }

    #[test]
    fn test_illegal_move_leaves_state_unchanged() {
        let mut game = GameState::new(5, 6).unwrap();
        game.apply_move(2, 2).unwrap();
        let before = game.clone();

        let err = game.apply_move(2, 2).unwrap_err();
        assert_eq!(
            err,
            EngineError::IllegalMove {
                position: Position::new(2, 2),
                reason: IllegalMoveReason::OpponentOwned,
            }
        );
        assert_eq!(game, before);

        assert!(game.apply_move(9, 9).unwrap_err().is_illegal_move());
        assert_eq!(game, before);
    }

    #[test]
    fn test_no_win_before_threshold() {
        // Red wipes out Blue on turn 3, which is too early to end the game
        let mut game = GameState::new(5, 6).unwrap();
        game.apply_move(0, 0).unwrap();
        game.apply_move(0, 1).unwrap();
        let outcome = game.apply_move(0, 0).unwrap();
        assert_eq!(game.board().score(Color::Blue), 0);
        assert!(!outcome.game_over);
        assert!(!game.is_over());
        assert_eq!(game.current_color(), Color::Blue);
    }

    #[test]
    fn test_moves_rejected_after_game_over() {
        let mut board = Board::new(5, 6).unwrap();
        board.force_set_cell(2, 2, Some(Color::Red), 3).unwrap();
        let mut game = GameState::resume(board, Color::Blue, 6, &RulesConfig::default());
        assert_eq!(game.winner(), Some(Color::Red));

        let before = game.clone();
        assert_eq!(game.apply_move(3, 3).unwrap_err(), EngineError::GameOver);
        assert_eq!(game, before);
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn test_decide_winner_respects_threshold() {
        let mut board = Board::new(3, 3).unwrap();
        board.force_set_cell(1, 1, Some(Color::Red), 2).unwrap();
        assert_eq!(decide_winner(&board, 4, 4), None);
        assert_eq!(decide_winner(&board, 5, 4), Some(Color::Red));

        let empty = Board::new(3, 3).unwrap();
        assert_eq!(decide_winner(&empty, 10, 4), None);
    }

    #[test]
    fn test_reset_clears_board() {
        let mut game = GameState::new(6, 6).unwrap();
        game.apply_move(1, 1).unwrap();
        game.reset();
        assert_eq!(game.turn(), 0);
        assert_eq!(game.current_color(), Color::Red);
        assert_eq!(game.board().total_orbs(), 0);
        assert_eq!(game.board().rows(), 6);
    }
}
