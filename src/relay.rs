// File-based snapshot hand-off between two front ends
//
// One process writes its move as a snapshot file, the other polls the file
// until it sees the header it is waiting for. Writes go through a temporary
// file and a rename so a reader never sees half a board.

use log::{debug, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::RelayConfig;
use crate::error::SnapshotError;
use crate::snapshot::{Mover, Snapshot};

/// Result of waiting for the other side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Received(Snapshot),
    /// Nothing arrived before the timeout
    NoResponse,
}

#[derive(Debug, Clone)]
pub struct SnapshotRelay {
    path: PathBuf,
    poll_interval: Duration,
    timeout: Duration,
}

impl SnapshotRelay {
    pub fn new<P: Into<PathBuf>>(path: P, poll_interval: Duration, timeout: Duration) -> Self {
        SnapshotRelay {
            path: path.into(),
            poll_interval,
            timeout,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        SnapshotRelay::new(
            &config.snapshot_path,
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Atomically replaces the shared file with `snapshot`
    pub async fn publish(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, snapshot.render())
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        debug!("Published {} to {}", snapshot.mover.header(), self.path.display());
        Ok(())
    }

    /// Current contents of the shared file; `None` if it does not exist yet
    pub async fn read(&self) -> Result<Option<Snapshot>, SnapshotError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Snapshot::parse(&text).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Polls until a snapshot written by `mover` shows up or the timeout
    /// passes. Unreadable contents count as "not yet".
    pub async fn wait_for(&self, mover: Mover) -> Result<RelayOutcome, SnapshotError> {
        let start = Instant::now();

        loop {
            match self.read().await {
                Ok(Some(snapshot)) if snapshot.mover == mover => {
                    return Ok(RelayOutcome::Received(snapshot));
                }
                Ok(_) => {}
                Err(SnapshotError::Io { path, source }) => {
                    return Err(SnapshotError::Io { path, source });
                }
                Err(e) => debug!("Ignoring unreadable snapshot: {}", e),
            }

            if start.elapsed() >= self.timeout {
                warn!(
                    "No {} snapshot within {}ms",
                    mover.header(),
                    self.timeout.as_millis()
                );
                return Ok(RelayOutcome::NoResponse);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Publishes our move and waits for the other side's reply
    pub async fn exchange(
        &self,
        snapshot: &Snapshot,
        reply_from: Mover,
    ) -> Result<RelayOutcome, SnapshotError> {
        self.publish(snapshot).await?;
        self.wait_for(reply_from).await
    }
}
