use std::time::Duration;

use thiserror::Error;

/// Errors returned when building a gateway from its configuration.
///
/// No background task is started when construction fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The request limit must allow at least one request per window.
    #[error("request limit must be greater than zero")]
    ZeroLimit,

    #[error("rate window must be greater than zero")]
    ZeroWindow,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("telemetry interval must be greater than zero")]
    ZeroTelemetryInterval,

    /// A duration setting exceeds [`MAX_CONFIG_DURATION`](crate::MAX_CONFIG_DURATION).
    #[error("{field} of {value:?} exceeds the maximum of {max:?}")]
    DurationTooLong {
        field: &'static str,
        value: Duration,
        max: Duration,
    },

    /// Endpoint is not an absolute http(s) URL.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        endpoint: String,
        reason: String,
    },
}

/// Errors returned when enqueueing a submission fails.
///
/// A submission is never rejected because of the rate limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Gateway has been shut down.
    #[error("gateway is shut down")]
    Closed,

    /// Queue sanity bound reached.
    /// Caller must back off; the dispatcher is not keeping up.
    #[error("submission queue at capacity ({depth} pending)")]
    Overloaded {
        depth: usize,
    },
}

/// Coarse classification of an [`EmitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmitKind {
    Serialize,
    Transport,
    Timeout,
}

/// Reasons why an emission produced no HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    /// Document could not be encoded as a JSON object.
    #[error("failed to serialize document: {0}")]
    Serialize(String),

    /// Network, DNS or TLS failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl EmitError {
    pub fn kind(&self) -> EmitKind {
        match self {
            EmitError::Serialize(_) => EmitKind::Serialize,
            EmitError::Transport(_) => EmitKind::Transport,
            EmitError::Timeout(_) => EmitKind::Timeout,
        }
    }
}

/// Final outcome of a single emission.
///
/// Every outcome consumes its rate-limit slot; none of them is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitOutcome {
    /// Remote answered with a 2xx status.
    Accepted { status: u16 },
    /// Remote answered with any other status.
    Rejected { status: u16 },
    Failed(EmitError),
}

impl EmitOutcome {
    pub fn from_result(result: Result<u16, EmitError>) -> Self {
        match result {
            Ok(status) if (200..300).contains(&status) => EmitOutcome::Accepted { status },
            Ok(status) => EmitOutcome::Rejected { status },
            Err(err) => EmitOutcome::Failed(err),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            EmitOutcome::Accepted { status } | EmitOutcome::Rejected { status } => Some(*status),
            EmitOutcome::Failed(_) => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, EmitOutcome::Accepted { .. })
    }
}
