// Board snapshot text format
//
// A snapshot is what two independently running front ends exchange:
//
//   HUMAN MOVE:
//   0 1R 0 0 0 0
//   0 0 2B 0 0 0
//   ...
//
// The header names who wrote the file last; each following line is a board
// row of space-separated tokens, `0` for an empty cell and `<orbs><R|B>` for
// an owned one.

use std::fmt;
use std::str::FromStr;

use crate::board::Board;
use crate::engine::GameState;
use crate::error::SnapshotError;
use crate::types::{Cell, Color, Position};

pub const HUMAN_HEADER: &str = "HUMAN MOVE:";
pub const AI_HEADER: &str = "AI MOVE:";

/// Which side wrote the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Human,
    Ai,
}

impl Mover {
    pub fn header(self) -> &'static str {
        match self {
            Mover::Human => HUMAN_HEADER,
            Mover::Ai => AI_HEADER,
        }
    }

    fn from_header(line: &str) -> Option<Mover> {
        match line.trim() {
            HUMAN_HEADER => Some(Mover::Human),
            AI_HEADER => Some(Mover::Ai),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub mover: Mover,
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Snapshot {
    /// Captures a board through its query accessors
    pub fn capture(board: &Board, mover: Mover) -> Self {
        Snapshot {
            mover,
            rows: board.rows(),
            cols: board.cols(),
            cells: board.cells().map(|(_, cell)| cell).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Parses the text format. Blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self, SnapshotError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (_, header) = lines.next().ok_or(SnapshotError::Empty)?;
        let mover =
            Mover::from_header(header).ok_or_else(|| SnapshotError::UnknownHeader(header.to_string()))?;

        let mut cols = 0;
        let mut rows = 0;
        let mut cells = Vec::new();

        for (line_num, line) in lines {
            let row: Vec<Cell> = line
                .split_whitespace()
                .map(|token| parse_token(token, line_num))
                .collect::<Result<_, _>>()?;

            if rows == 0 {
                cols = row.len();
            } else if row.len() != cols {
                return Err(SnapshotError::RaggedRow {
                    line: line_num,
                    expected: cols,
                    found: row.len(),
                });
            }

            cells.extend(row);
            rows += 1;
        }

        if rows == 0 {
            return Err(SnapshotError::NoRows);
        }

        Ok(Snapshot {
            mover,
            rows,
            cols,
            cells,
        })
    }

    /// Renders the text format, one trailing newline per line
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() * 3 + 16);
        out.push_str(self.mover.header());
        out.push('\n');
        for row in self.cells.chunks(self.cols) {
            let tokens: Vec<String> = row.iter().map(|cell| format_token(*cell)).collect();
            out.push_str(&tokens.join(" "));
            out.push('\n');
        }
        out
    }
}

fn parse_token(token: &str, line: usize) -> Result<Cell, SnapshotError> {
    let bad = || SnapshotError::BadToken {
        line,
        token: token.to_string(),
    };

    if token == "0" {
        return Ok(Cell::EMPTY);
    }

    let color_char = token.chars().last().ok_or_else(bad)?;
    let color = Color::from_char(color_char).ok_or_else(bad)?;
    let digits = &token[..token.len() - color_char.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad());
    }
    let orbs = digits.parse::<u32>().map_err(|_| bad())?;

    Cell::owned(color, orbs).ok_or_else(bad)
}

fn format_token(cell: Cell) -> String {
    match cell.owner() {
        Some(color) => format!("{}{}", cell.orbs(), color.as_char()),
        None => "0".to_string(),
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for Snapshot {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Snapshot::parse(s)
    }
}

impl Board {
    /// Builds a fresh board holding the snapshot's cells
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Board, SnapshotError> {
        let mut board = Board::new(snapshot.rows, snapshot.cols)?;
        board.load_snapshot(snapshot)?;
        Ok(board)
    }

    /// Replaces every cell with the snapshot's contents. All-or-nothing: on
    /// error the board is left exactly as it was.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        if snapshot.rows != self.rows() || snapshot.cols != self.cols() {
            return Err(SnapshotError::DimensionMismatch {
                rows: self.rows(),
                cols: self.cols(),
                found_rows: snapshot.rows,
                found_cols: snapshot.cols,
            });
        }

        let mut staged = self.clone();
        for (idx, cell) in snapshot.cells.iter().enumerate() {
            let pos = Position::new(idx / snapshot.cols, idx % snapshot.cols);
            staged.force_set_cell(pos.row, pos.col, cell.owner(), cell.orbs())?;
        }

        *self = staged;
        Ok(())
    }
}

impl GameState {
    /// Bulk-loads the board of a running game. Turn counter and side to move
    /// are kept; the outcome is re-evaluated against the new contents.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let mut board = self.board().clone();
        board.load_snapshot(snapshot)?;
        self.replace_board(board);
        Ok(())
    }
}
