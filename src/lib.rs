//! A rate-limited submission gateway for a document-registration API.
//!
//! Producers hand documents to a [`Gateway`]; a single dispatcher task
//! posts them as JSON to the registration endpoint, never starting more
//! than `limit` requests in any rolling window of length `window`.
//!
//! ## Guarantees
//! - Sliding-window rate ceiling (no 2x burst across window boundaries)
//! - Producers never block on the rate limit or the network
//! - Each submission is emitted at most once
//! - Bounded, orderly shutdown
//!
//! ## Non-Guarantees
//! - Retries (failed emissions are logged and dropped)
//! - Response parsing
//! - Durability across restarts
//! - Coordination between processes
//!
//! The rate limit counts *attempts*: a timed-out or rejected request still
//! consumes its slot.

mod config;
mod dispatcher;
mod emitter;
mod error;
mod gate;
mod gateway;
mod queue;
mod signing;
mod telemetry;
mod types;

pub mod document;

pub use config::{GatewayConfig, DEFAULT_ENDPOINT, MAX_CONFIG_DURATION};
pub use emitter::{encode_document, Emitter, OutboundRequest, Transport};
pub use error::{ConfigError, EmitError, EmitKind, EmitOutcome, SubmitError};
pub use gate::{Admission, GateStats, RateGate};
pub use gateway::{Gateway, GatewayStats};
pub use queue::{submission_queue, QueueReceiver, QueueSender};
pub use signing::{
    build_signature_headers,
    is_valid_header_value,
    SignatureHeaders,
    CONTENT_TYPE_HEADER,
    JSON_CONTENT_TYPE,
    SIGNATURE_HEADER,
};
pub use telemetry::{
    EmissionCounters,
    EmissionTotals,
    StdoutSink,
    TelemetryReport,
    TelemetrySink,
    TracingSink,
};
pub use types::{DispatcherState, Submission, SubmissionId};

#[cfg(feature = "http")]
pub use emitter::HttpTransport;
