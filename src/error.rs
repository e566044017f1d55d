use std::fmt;
use std::path::PathBuf;

use crate::types::{Color, Position};

/// Why a placement was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMoveReason {
    OutOfBounds,
    OpponentOwned,
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalMoveReason::OutOfBounds => write!(f, "position is outside the board"),
            IllegalMoveReason::OpponentOwned => write!(f, "cell is owned by the opponent"),
        }
    }
}

/// Errors raised by the board, the move engine and the search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("illegal move at {position}: {reason}")]
    IllegalMove {
        position: Position,
        reason: IllegalMoveReason,
    },

    #[error("game is already over")]
    GameOver,

    #[error("it is {actual}'s turn, not {expected}'s")]
    WrongTurn { expected: Color, actual: Color },

    #[error("cascade did not settle after {steps} explosions")]
    CascadeLimit { steps: usize },

    #[error("no legal move available for {0}")]
    NoLegalMove(Color),

    #[error("search cancelled before any move was scored")]
    SearchCancelled,

    #[error("invalid board dimensions {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },
}

impl EngineError {
    /// Illegal moves are expected during play; everything else is a fault or
    /// a caller error.
    pub fn is_illegal_move(&self) -> bool {
        matches!(self, EngineError::IllegalMove { .. })
    }

    /// True for failures that invalidate the engine state rather than the request
    pub fn is_fault(&self) -> bool {
        matches!(self, EngineError::CascadeLimit { .. })
    }
}

/// Errors raised while reading, writing or bulk-loading board snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot is empty")]
    Empty,

    #[error("unknown snapshot header '{0}'")]
    UnknownHeader(String),

    #[error("snapshot has no board rows")]
    NoRows,

    #[error("row on line {line} has {found} cells, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("bad cell token '{token}' on line {line}")]
    BadToken { line: usize, token: String },

    #[error("snapshot is {found_rows}x{found_cols}, board is {rows}x{cols}")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        found_rows: usize,
        found_cols: usize,
    },

    #[error("cell {position} cannot hold {orbs} orbs with owner {owner:?}")]
    InconsistentCell {
        position: Position,
        owner: Option<Color>,
        orbs: u32,
    },

    #[error("cell {0} is outside the board")]
    OutOfBounds(Position),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to access snapshot file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors raised by a game session when a request does not fit its controllers.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0} is controlled by the AI")]
    NotHumanTurn(Color),

    #[error("{0} is controlled by a human")]
    NotAiTurn(Color),

    #[error("game changed while the AI was thinking (version {expected}, now {actual})")]
    Stale { expected: u64, actual: u64 },

    #[error("AI did not answer within {0}ms")]
    NoResponse(u64),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl SessionError {
    /// True for requests the caller got wrong, as opposed to server-side failures
    pub fn is_client_error(&self) -> bool {
        match self {
            SessionError::NotHumanTurn(_)
            | SessionError::NotAiTurn(_)
            | SessionError::Stale { .. } => true,
            SessionError::Engine(e) => !e.is_fault(),
            SessionError::Snapshot(_) => true,
            SessionError::NoResponse(_) => false,
        }
    }
}

/// Errors raised while loading or re-playing a move log.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read log file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse JSON on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("log is empty")]
    Empty,

    #[error("turn {0} not found in log")]
    MissingTurn(u32),

    #[error("turn {turn}: {source}")]
    Engine { turn: u32, source: EngineError },

    #[error("turn {turn}: {source}")]
    Snapshot { turn: u32, source: SnapshotError },
}
