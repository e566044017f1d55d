// Debug logging module for asynchronous move logging
//
// Fire-and-forget writes so the request/response cycle never waits on disk.
// Every applied move becomes one line of a JSONL file that the replay tool
// can read back.

use log::error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::board::Board;
use crate::engine::MoveOutcome;
use crate::snapshot::{Mover, Snapshot};
use crate::types::{Color, PlayerKind};

/// One applied move
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MoveLogEntry {
    /// Turn counter after the move
    pub turn: u32,
    pub color: Color,
    pub row: usize,
    pub col: usize,
    pub controller: PlayerKind,
    /// Search depth, for AI moves
    pub depth: Option<u8>,
    pub rows: usize,
    pub cols: usize,
    /// Board after the move, in snapshot notation
    pub snapshot: String,
    pub timestamp: String,
}

impl MoveLogEntry {
    pub fn new(
        outcome: &MoveOutcome,
        controller: PlayerKind,
        depth: Option<u8>,
        board: &Board,
    ) -> Self {
        let mover = match controller {
            PlayerKind::Human => Mover::Human,
            PlayerKind::Ai => Mover::Ai,
        };

        MoveLogEntry {
            turn: outcome.turn,
            color: outcome.color,
            row: outcome.position.row,
            col: outcome.position.col,
            controller,
            depth,
            rows: board.rows(),
            cols: board.cols(),
            snapshot: Snapshot::capture(board, mover).render(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return DebugLogger::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Move logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create move log file '{}': {}", log_file_path, e);
                DebugLogger::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queues a move for writing (fire-and-forget)
    /// Must be called from inside a tokio runtime
    pub fn log_move(&self, entry: MoveLogEntry) {
        if !self.enabled {
            return;
        }

        let file_handle = self.file.clone();
        tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        });
    }

    /// Writes a move and waits for the write to finish
    pub async fn log_move_now(&self, entry: MoveLogEntry) {
        if !self.enabled {
            return;
        }
        Self::write_entry(self.file.clone(), entry).await;
    }

    async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: MoveLogEntry) {
        let mut file_guard = file_handle.lock().await;

        if let Some(file) = file_guard.as_mut() {
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    let line_with_newline = format!("{}\n", json_line);
                    if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                        error!("Failed to write move log entry: {}", e);
                    } else if let Err(e) = file.flush().await {
                        error!("Failed to flush move log: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize move log entry: {}", e);
                }
            }
        }
    }
}
