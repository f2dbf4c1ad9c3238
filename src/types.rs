use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Unique identifier for a submission.
///
/// Assigned in enqueue order by the gateway that accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// One document + signature pair waiting for emission.
///
/// The gateway treats the document as opaque: it only has to serialize
/// to a JSON object. A submission is owned by the queue while waiting,
/// then by the dispatcher while in flight, then discarded.
#[derive(Debug, Clone)]
pub struct Submission<D> {
    id: SubmissionId,
    document: D,
    signature: String,
    created_at: Instant,
}

impl<D> Submission<D> {
    pub fn new(id: SubmissionId, document: D, signature: impl Into<String>) -> Self {
        Self {
            id,
            document,
            signature: signature.into(),
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Opaque value forwarded in the `Signature` header.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Monotonic instant the submission was enqueued.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

/// Dispatcher lifecycle.
///
/// `Idle <-> Draining`, any state `-> ShuttingDown -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispatcherState {
    /// Queue empty, waiting for work.
    Idle,
    /// Queue non-empty, emitting as fast as the gate permits.
    Draining,
    /// Shutdown requested; finishing the in-flight emission.
    ShuttingDown,
    Stopped,
}

impl DispatcherState {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            DispatcherState::Idle => 0,
            DispatcherState::Draining => 1,
            DispatcherState::ShuttingDown => 2,
            DispatcherState::Stopped => 3,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => DispatcherState::Idle,
            1 => DispatcherState::Draining,
            2 => DispatcherState::ShuttingDown,
            _ => DispatcherState::Stopped,
        }
    }

    /// True once shutdown has been requested.
    pub fn is_terminating(self) -> bool {
        matches!(self, DispatcherState::ShuttingDown | DispatcherState::Stopped)
    }
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatcherState::Idle => "idle",
            DispatcherState::Draining => "draining",
            DispatcherState::ShuttingDown => "shutting_down",
            DispatcherState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
