#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use document_gateway::{EmitError, OutboundRequest, TelemetryReport, TelemetrySink, Transport};
use tokio::time::{sleep, Instant};

pub const TEST_ENDPOINT: &str = "http://registry.test/api/v3/lk/documents/create";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub at: Instant,
    pub request: OutboundRequest,
}

/// Transport double that records every call and answers with a fixed status.
pub struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    status: u16,
    latency: Duration,
}

impl RecordingTransport {
    pub fn new(status: u16) -> Arc<Self> {
        Self::with_latency(status, Duration::ZERO)
    }

    pub fn with_latency(status: u16, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            status,
            latency,
        })
    }

    /// Never answers within any sane timeout.
    pub fn hanging() -> Arc<Self> {
        Self::with_latency(200, Duration::from_secs(3_600))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn starts(&self) -> Vec<Instant> {
        self.calls().into_iter().map(|call| call.at).collect()
    }

    /// `doc_id` of every emitted body, in emission order.
    pub fn doc_ids(&self) -> Vec<u64> {
        self.calls()
            .iter()
            .map(|call| {
                let body: serde_json::Value = serde_json::from_slice(&call.request.body).unwrap();
                body["doc_id"].as_u64().unwrap()
            })
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: OutboundRequest, _timeout: Duration) -> Result<u16, EmitError> {
        self.calls.lock().unwrap().push(RecordedCall {
            at: Instant::now(),
            request,
        });
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        Ok(self.status)
    }
}

/// Telemetry sink that keeps every report.
#[derive(Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<TelemetryReport>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reports(&self) -> Vec<TelemetryReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn total_sent(&self) -> u64 {
        self.reports().iter().map(|r| r.sent).sum()
    }
}

impl TelemetrySink for CollectingSink {
    fn report(&self, report: TelemetryReport) {
        self.reports.lock().unwrap().push(report);
    }
}

/// Largest number of start instants that fit in any half-open window of length `window`.
pub fn max_in_any_window(starts: &[Instant], window: Duration) -> usize {
    let mut sorted = starts.to_vec();
    sorted.sort();
    (0..sorted.len())
        .map(|i| {
            sorted[i..]
                .iter()
                .take_while(|t| t.duration_since(sorted[i]) < window)
                .count()
        })
        .max()
        .unwrap_or(0)
}

/// Number of starts in `[from, from + len)` relative to `origin`.
pub fn count_between(starts: &[Instant], origin: Instant, from: Duration, len: Duration) -> usize {
    starts
        .iter()
        .filter(|t| {
            let offset = t.duration_since(origin);
            offset >= from && offset < from + len
        })
        .count()
}
