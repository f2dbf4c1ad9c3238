use std::fmt;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::EmitOutcome;

/// Emission counters shared between the dispatcher and the telemetry tick.
///
/// `tick` counts attempts since the last report and is swapped with zero on
/// each tick, so the sum of all reports equals `attempted`.
#[derive(Debug, Default)]
pub struct EmissionCounters {
    tick: AtomicU64,
    attempted: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

/// Lifetime totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionTotals {
    /// Emissions started (the rate-limited quantity).
    pub attempted: u64,
    /// 2xx responses.
    pub accepted: u64,
    /// Non-2xx responses.
    pub rejected: u64,
    /// Serialize, transport or timeout errors.
    pub failed: u64,
}

impl EmissionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.tick.fetch_add(1, Ordering::AcqRel);
        self.attempted.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_outcome(&self, outcome: &EmitOutcome) {
        let counter = match outcome {
            EmitOutcome::Accepted { .. } => &self.accepted,
            EmitOutcome::Rejected { .. } => &self.rejected,
            EmitOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::AcqRel);
    }

    /// Read and clear the per-tick counter.
    pub fn take_tick(&self) -> u64 {
        self.tick.swap(0, Ordering::AcqRel)
    }

    pub fn totals(&self) -> EmissionTotals {
        EmissionTotals {
            attempted: self.attempted.load(Ordering::Acquire),
            accepted: self.accepted.load(Ordering::Acquire),
            rejected: self.rejected.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
        }
    }
}

/// One telemetry report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryReport {
    /// Emissions started during the interval.
    pub sent: u64,
    pub interval: Duration,
    /// Set on the partial interval flushed at shutdown.
    pub final_flush: bool,
}

impl fmt::Display for TelemetryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.interval == Duration::from_secs(1) && !self.final_flush {
            write!(f, "Sent {} requests in last second", self.sent)
        } else {
            write!(f, "Sent {} requests in last {:?}", self.sent, self.interval)
        }
    }
}

/// Destination for periodic telemetry reports.
pub trait TelemetrySink: Send + Sync {
    fn report(&self, report: TelemetryReport);
}

/// Prints each report on its own line to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl TelemetrySink for StdoutSink {
    fn report(&self, report: TelemetryReport) {
        println!("{report}");
    }
}

/// Emits each report as an `info` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn report(&self, report: TelemetryReport) {
        tracing::info!(
            sent = report.sent,
            interval_ms = report.interval.as_millis() as u64,
            final_flush = report.final_flush,
            "{report}"
        );
    }
}

/// Periodic reporter.
///
/// Runs independently of the dispatcher; on stop it flushes the partial
/// interval so no attempt goes unreported.
pub(crate) async fn telemetry_loop(
    counters: Arc<EmissionCounters>,
    sink: Arc<dyn TelemetrySink>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();

    loop {
        if *stop.borrow() {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {
                last_tick = Instant::now();
                sink.report(TelemetryReport {
                    sent: counters.take_tick(),
                    interval,
                    final_flush: false,
                });
            }
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    let sent = counters.take_tick();
    if sent > 0 {
        sink.report(TelemetryReport {
            sent,
            interval: last_tick.elapsed(),
            final_flush: true,
        });
    }
}
