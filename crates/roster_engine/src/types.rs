use std::fmt;

use crate::FeedRecord;

pub type RunId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// First bytes of the feed arrived.
    Opened { run_id: RunId },
    Record { run_id: RunId, record: FeedRecord },
    /// The run is over. `Ok` means the connection closed cleanly (or after `finish`).
    Completed {
        run_id: RunId,
        result: Result<FeedSummary, ImportError>,
    },
}

/// Counters for one pass over the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub lines: usize,
    pub records: usize,
    pub skipped: usize,
    pub saw_finish: bool,
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ImportError {
    pub kind: FailureKind,
    pub message: String,
}

impl ImportError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    /// Request body could not be built.
    Request,
    /// Connection failed or a read broke off mid-stream.
    Network,
    Runtime,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Request => write!(f, "request error"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Runtime => write!(f, "runtime error"),
        }
    }
}
