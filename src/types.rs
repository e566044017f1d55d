// Chain Reaction domain and API types
//
// Core value types shared by the engine, the AI and the HTTP front end.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::MoveOutcome;

/// One of the two players
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    #[serde(rename = "R")]
    Red,
    #[serde(rename = "B")]
    Blue,
}

impl Color {
    /// Returns both colors in turn order (Red always opens)
    pub fn all() -> [Color; 2] {
        [Color::Red, Color::Blue]
    }

    /// Returns the other player
    pub fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Blue,
            Color::Blue => Color::Red,
        }
    }

    /// Single-letter code used in snapshots
    pub fn as_char(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Blue => 'B',
        }
    }

    pub fn from_char(c: char) -> Option<Color> {
        match c.to_ascii_uppercase() {
            'R' => Some(Color::Red),
            'B' => Some(Color::Blue),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Blue => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "Red"),
            Color::Blue => write!(f, "Blue"),
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "r" | "red" => Ok(Color::Red),
            "b" | "blue" => Ok(Color::Blue),
            _ => Err(format!("Invalid color: {}", s)),
        }
    }
}

/// Most orbs a single cell may hold. Legal play stays far below: a cell
/// explodes at 4 orbs at most, and a cascade cut short by elimination leaves
/// only a few extra behind.
pub const MAX_CELL_ORBS: u32 = 128;

/// Grid cell. An empty cell has no owner and no orbs; an owned cell holds at
/// least one orb.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "RawCell")]
pub struct Cell {
    owner: Option<Color>,
    orbs: u32,
}

#[derive(Deserialize)]
struct RawCell {
    owner: Option<Color>,
    orbs: u32,
}

impl TryFrom<RawCell> for Cell {
    type Error = String;

    fn try_from(raw: RawCell) -> Result<Self, Self::Error> {
        Cell::new(raw.owner, raw.orbs)
            .ok_or_else(|| format!("invalid cell: owner {:?} with {} orbs", raw.owner, raw.orbs))
    }
}

impl Cell {
    pub const EMPTY: Cell = Cell { owner: None, orbs: 0 };

    /// Builds a cell, rejecting combinations that break the owner/orb
    /// invariant and counts above `MAX_CELL_ORBS`
    pub fn new(owner: Option<Color>, orbs: u32) -> Option<Cell> {
        match (owner, orbs) {
            (None, 0) => Some(Cell::EMPTY),
            (Some(color), n) if (1..=MAX_CELL_ORBS).contains(&n) => {
                Some(Cell { owner: Some(color), orbs: n })
            }
            _ => None,
        }
    }

    pub fn owned(color: Color, orbs: u32) -> Option<Cell> {
        Cell::new(Some(color), orbs)
    }

    pub fn owner(&self) -> Option<Color> {
        self.owner
    }

    pub fn orbs(&self) -> u32 {
        self.orbs
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_none()
    }

    pub(crate) fn add_orb(&mut self, color: Color) {
        self.owner = Some(color);
        self.orbs = self.orbs.saturating_add(1);
    }

    pub(crate) fn clear(&mut self) {
        *self = Cell::EMPTY;
    }
}

/// Zero-based grid coordinate, row 0 at the top
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Who controls a color
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    #[default]
    Human,
    Ai,
}

impl FromStr for PlayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "human" => Ok(PlayerKind::Human),
            "ai" => Ok(PlayerKind::Ai),
            _ => Err(format!("Invalid player kind: {}", s)),
        }
    }
}

/// AI strength; mapped to a search depth through `AiConfig`
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("Invalid difficulty: {}", s)),
        }
    }
}

/// Standard board sizes offered by the front ends
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardPreset {
    pub rows: usize,
    pub cols: usize,
}

impl BoardPreset {
    pub const SMALL: BoardPreset = BoardPreset { rows: 5, cols: 6 };
    pub const SQUARE: BoardPreset = BoardPreset { rows: 6, cols: 6 };
    pub const TALL: BoardPreset = BoardPreset { rows: 9, cols: 6 };

    pub fn all() -> [BoardPreset; 3] {
        [BoardPreset::SMALL, BoardPreset::SQUARE, BoardPreset::TALL]
    }
}

impl Default for BoardPreset {
    fn default() -> Self {
        BoardPreset::SMALL
    }
}

impl fmt::Display for BoardPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl FromStr for BoardPreset {
    type Err = String;

    /// Parses `"RxC"`, e.g. `"9x6"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rows, cols) = s
            .trim()
            .to_lowercase()
            .split_once('x')
            .map(|(r, c)| (r.trim().to_string(), c.trim().to_string()))
            .ok_or_else(|| format!("Invalid board size '{}'. Expected 'RxC'", s))?;

        let rows = rows
            .parse::<usize>()
            .map_err(|e| format!("Invalid row count '{}': {}", rows, e))?;
        let cols = cols
            .parse::<usize>()
            .map_err(|e| format!("Invalid column count '{}': {}", cols, e))?;

        Ok(BoardPreset { rows, cols })
    }
}

// HTTP API payloads

/// Body of `POST /games`; every field falls back to the configured default
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct NewGameRequest {
    pub rows: Option<usize>,
    pub cols: Option<usize>,
    pub red: Option<PlayerKind>,
    pub blue: Option<PlayerKind>,
    pub difficulty: Option<Difficulty>,
}

/// Body of `POST /games/current/move`
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct MoveRequest {
    pub row: usize,
    pub col: usize,
}

/// Read-only view of a game handed to front ends
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GameView {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<Vec<Cell>>,
    pub current: Color,
    pub turn: u32,
    pub game_over: bool,
    pub winner: Option<Color>,
    pub red_score: u32,
    pub blue_score: u32,
    pub red: PlayerKind,
    pub blue: PlayerKind,
    pub difficulty: Difficulty,
}

/// Response to a move request
#[derive(Serialize, Debug, Clone)]
pub struct MoveResponse {
    pub outcome: MoveOutcome,
    pub game: GameView,
}
