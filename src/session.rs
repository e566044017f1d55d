// Game session: one authoritative game plus who controls each color
//
// Front ends never hold board state. They send commands (human move, AI move,
// reset, snapshot load) and read back a `GameView`.

use log::info;

use crate::config::{Config, RulesConfig};
use crate::engine::{GameState, MoveOutcome};
use crate::error::{EngineError, SessionError, SnapshotError};
use crate::snapshot::{Mover, Snapshot};
use crate::types::{Color, Difficulty, GameView, NewGameRequest, PlayerKind, Position};

/// Position handed to the AI together with the session version it was taken at
#[derive(Debug, Clone)]
pub struct AiTicket {
    pub state: GameState,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    state: GameState,
    red: PlayerKind,
    blue: PlayerKind,
    difficulty: Difficulty,
    /// Bumped by every move, reset, snapshot load and replacement
    generation: u64,
}

impl GameSession {
    pub fn new(
        rows: usize,
        cols: usize,
        red: PlayerKind,
        blue: PlayerKind,
        difficulty: Difficulty,
        rules: &RulesConfig,
    ) -> Result<Self, SessionError> {
        Ok(GameSession {
            state: GameState::with_rules(rows, cols, rules)?,
            red,
            blue,
            difficulty,
            generation: 0,
        })
    }

    /// Session with the configured default board and controllers
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        GameSession::new(
            config.game.rows,
            config.game.cols,
            config.game.red,
            config.game.blue,
            config.ai.default_difficulty,
            &config.rules,
        )
    }

    /// Session for a new-game request; omitted fields take configured defaults
    pub fn from_request(request: &NewGameRequest, config: &Config) -> Result<Self, SessionError> {
        GameSession::new(
            request.rows.unwrap_or(config.game.rows),
            request.cols.unwrap_or(config.game.cols),
            request.red.unwrap_or(config.game.red),
            request.blue.unwrap_or(config.game.blue),
            request.difficulty.unwrap_or(config.ai.default_difficulty),
            &config.rules,
        )
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Swaps in another session. The version keeps counting up so tickets
    /// handed out for the old game go stale.
    pub fn replace(&mut self, mut other: GameSession) {
        other.generation = self.generation + 1;
        *self = other;
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn controller(&self, color: Color) -> PlayerKind {
        match color {
            Color::Red => self.red,
            Color::Blue => self.blue,
        }
    }

    /// Controller of the side to move
    pub fn to_move(&self) -> PlayerKind {
        self.controller(self.state.current_color())
    }

    /// Applies a human placement for the side to move
    pub fn human_move(&mut self, position: Position) -> Result<MoveOutcome, SessionError> {
        let color = self.state.current_color();
        if self.controller(color) != PlayerKind::Human {
            return Err(SessionError::NotHumanTurn(color));
        }
        let outcome = self.state.play(position)?;
        self.generation += 1;
        Ok(outcome)
    }

    /// Copy of the game for the AI to search on. Fails unless the AI is to move.
    pub fn ai_position(&self) -> Result<AiTicket, SessionError> {
        let color = self.state.current_color();
        if self.controller(color) != PlayerKind::Ai {
            return Err(SessionError::NotAiTurn(color));
        }
        if self.state.is_over() {
            return Err(SessionError::Engine(EngineError::GameOver));
        }
        Ok(AiTicket {
            state: self.state.clone(),
            generation: self.generation,
        })
    }

    /// Applies a move the AI chose on the copy handed out at `generation`
    pub fn apply_ai_move(
        &mut self,
        generation: u64,
        position: Position,
    ) -> Result<MoveOutcome, SessionError> {
        if self.generation != generation {
            return Err(SessionError::Stale {
                expected: generation,
                actual: self.generation,
            });
        }
        let color = self.state.current_color();
        if self.controller(color) != PlayerKind::Ai {
            return Err(SessionError::NotAiTurn(color));
        }
        let outcome = self.state.play(position)?;
        self.generation += 1;
        Ok(outcome)
    }

    /// Empties the board, optionally resizing it
    pub fn reset(&mut self, size: Option<(usize, usize)>) -> Result<(), SessionError> {
        match size {
            Some((rows, cols))
                if rows != self.state.board().rows() || cols != self.state.board().cols() =>
            {
                self.state = GameState::with_rules(rows, cols, self.state.rules())?;
            }
            _ => self.state.reset(),
        }
        self.generation += 1;
        info!(
            "Game reset: {}x{} board",
            self.state.board().rows(),
            self.state.board().cols()
        );
        Ok(())
    }

    /// Board contents in snapshot notation, written as `mover`
    pub fn snapshot(&self, mover: Mover) -> Snapshot {
        Snapshot::capture(self.state.board(), mover)
    }

    /// Replaces the board contents from a snapshot. All-or-nothing.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        self.state.load_snapshot(snapshot)?;
        self.generation += 1;
        Ok(())
    }

    /// Read-only view for front ends
    pub fn view(&self) -> GameView {
        let board = self.state.board();
        let cells = (0..board.rows())
            .map(|row| {
                (0..board.cols())
                    .filter_map(|col| board.cell(row, col))
                    .collect()
            })
            .collect();

        GameView {
            rows: board.rows(),
            cols: board.cols(),
            cells,
            current: self.state.current_color(),
            turn: self.state.turn(),
            game_over: self.state.is_over(),
            winner: self.state.winner(),
            red_score: board.score(Color::Red),
            blue_score: board.score(Color::Blue),
            red: self.red,
            blue: self.blue,
            difficulty: self.difficulty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use pretty_assertions::assert_eq;

    fn human_vs_ai() -> GameSession {
        GameSession::new(
            5,
            6,
            PlayerKind::Human,
            PlayerKind::Ai,
            Difficulty::Easy,
            &RulesConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_controllers_gate_moves() {
        let mut session = human_vs_ai();
        assert!(matches!(
            session.ai_position(),
            Err(SessionError::NotAiTurn(Color::Red))
        ));

        session.human_move(Position::new(0, 0)).unwrap();
        assert!(matches!(
            session.human_move(Position::new(1, 1)),
            Err(SessionError::NotHumanTurn(Color::Blue))
        ));
        assert_eq!(session.to_move(), PlayerKind::Ai);
    }

    #[test]
    fn test_stale_ai_move_rejected() {
        let mut session = GameSession::new(
            5,
            6,
            PlayerKind::Ai,
            PlayerKind::Ai,
            Difficulty::Easy,
            &RulesConfig::default(),
        )
        .unwrap();

        let ticket = session.ai_position().unwrap();
        session.apply_ai_move(ticket.generation, Position::new(0, 0)).unwrap();
        assert!(matches!(
            session.apply_ai_move(ticket.generation, Position::new(4, 5)),
            Err(SessionError::Stale {
                expected: 0,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_board_swapped_during_search_is_stale() {
        let mut session = GameSession::new(
            5,
            6,
            PlayerKind::Ai,
            PlayerKind::Ai,
            Difficulty::Easy,
            &RulesConfig::default(),
        )
        .unwrap();
        session.apply_ai_move(0, Position::new(0, 0)).unwrap();
        session.apply_ai_move(1, Position::new(4, 5)).unwrap();

        // Same turn counter, different board
        let ticket = session.ai_position().unwrap();
        let mut board = Board::new(5, 6).unwrap();
        board.force_set_cell(2, 2, Some(Color::Blue), 1).unwrap();
        board.force_set_cell(0, 5, Some(Color::Red), 1).unwrap();
        session.load_snapshot(&Snapshot::capture(&board, Mover::Human)).unwrap();
        assert_eq!(session.state().turn(), ticket.state.turn());

        assert!(matches!(
            session.apply_ai_move(ticket.generation, Position::new(0, 0)),
            Err(SessionError::Stale { .. })
        ));
        assert_eq!(session.state().board(), &board);
    }

    #[test]
    fn test_reset_and_replace_invalidate_tickets() {
        let mut session = GameSession::new(
            5,
            6,
            PlayerKind::Ai,
            PlayerKind::Human,
            Difficulty::Easy,
            &RulesConfig::default(),
        )
        .unwrap();

        // Reset at turn 0 keeps the turn counter but not the version
        let ticket = session.ai_position().unwrap();
        session.reset(None).unwrap();
        assert_eq!(session.state().turn(), 0);
        assert!(matches!(
            session.apply_ai_move(ticket.generation, Position::new(0, 0)),
            Err(SessionError::Stale { .. })
        ));

        let ticket = session.ai_position().unwrap();
        let fresh = GameSession::new(
            5,
            6,
            PlayerKind::Ai,
            PlayerKind::Human,
            Difficulty::Easy,
            &RulesConfig::default(),
        )
        .unwrap();
        session.replace(fresh);
        assert!(session.generation() > ticket.generation);
        assert!(matches!(
            session.apply_ai_move(ticket.generation, Position::new(0, 0)),
            Err(SessionError::Stale { .. })
        ));
        assert_eq!(session.state().board().total_orbs(), 0);
    }

    #[test]
    fn test_reset_and_resize() {
        let mut session = human_vs_ai();
        session.human_move(Position::new(2, 2)).unwrap();

        session.reset(None).unwrap();
        assert_eq!(session.state().turn(), 0);
        assert_eq!(session.state().board().total_orbs(), 0);

        session.reset(Some((9, 6))).unwrap();
        assert_eq!(session.view().rows, 9);
        assert!(session.reset(Some((1, 6))).is_err());
        assert_eq!(session.view().rows, 9);
    }

    #[test]
    fn test_view_reflects_board() {
        let mut session = human_vs_ai();
        session.human_move(Position::new(1, 2)).unwrap();
        let view = session.view();

        assert_eq!(view.cells.len(), 5);
        assert_eq!(view.cells[0].len(), 6);
        assert_eq!(view.cells[1][2].owner(), Some(Color::Red));
        assert_eq!(view.red_score, 1);
        assert_eq!(view.blue_score, 0);
        assert_eq!(view.current, Color::Blue);
        assert!(!view.game_over);
    }

    #[test]
    fn test_snapshot_round_trip_through_session() {
        let mut session = human_vs_ai();
        session.human_move(Position::new(0, 0)).unwrap();
        let text = session.snapshot(Mover::Human).render();

        let mut other = human_vs_ai();
        other.load_snapshot(&text.parse().unwrap()).unwrap();
        assert_eq!(other.view().cells, session.view().cells);
    }
}
