use std::fmt;

use thiserror::Error;

/// Stable identity of an item across runs (origin-row index).
pub type ItemKey = u64;

/// One unit of work: a single URL to push through the upload sequence.
///
/// Items without a key still run, but cannot be skipped or marked as
/// completed on later runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    pub key: Option<ItemKey>,
    pub url: String,
}

impl SourceItem {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            key: None,
            url: url.into(),
        }
    }

    pub fn keyed(key: ItemKey, url: impl Into<String>) -> Self {
        Self {
            key: Some(key),
            url: url.into(),
        }
    }
}

/// Terminal result of one item's pipeline run. Produced exactly once per
/// attempt; there is no partial state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Succeeded,
    Failed { message: String },
}

/// Progress or failure line meant for direct display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub text: String,
    pub is_error: bool,
}

/// Totals for one batch run, emitted exactly once on every exit path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Items excluded up front because a prior run already completed them.
    pub skipped: usize,
    pub total: usize,
    pub stopped_early: bool,
    /// Set when the run never started (no target surface).
    pub setup_error: Option<String>,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn is_error(&self) -> bool {
        self.failed > 0 || self.setup_error.is_some()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reason) = &self.setup_error {
            return write!(f, "Error: {reason}");
        }
        write!(
            f,
            "Finished. Success: {}, Failed: {}",
            self.succeeded, self.failed
        )?;
        if self.skipped > 0 {
            write!(f, ", Skipped: {}", self.skipped)?;
        }
        if self.stopped_early {
            write!(f, " (stopped early)")?;
        }
        Ok(())
    }
}

/// Fire-and-forget notifications published during a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Status(StatusUpdate),
    /// Emitted only for keyed items, after the completion marker is written.
    ItemSucceeded { key: ItemKey },
    RunCompleted { summary: RunSummary },
}

/// Fault raised by a probe or the surface resolver. Always folded into the
/// owning item's outcome; never escapes the batch loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("bridge protocol error: {0}")]
    Protocol(String),
}

/// Synchronous rejection of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("a batch is already running")]
    AlreadyRunning,
    #[error("engine worker is unavailable")]
    Unavailable,
}

/// Synchronous acknowledgment of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAck {
    /// A run is active; it will stop at the next item boundary.
    Stopping,
    NotRunning,
}
