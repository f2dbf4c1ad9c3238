use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{sleep, sleep_until, Instant};

use crate::emitter::Emitter;
use crate::error::EmitOutcome;
use crate::gate::{Admission, RateGate};
use crate::queue::QueueReceiver;
use crate::telemetry::EmissionCounters;
use crate::types::{DispatcherState, Submission};

#[cfg(feature = "metrics")]
pub(crate) fn metric_inc(name: &'static str) {
    metrics::increment_counter!(name);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn metric_inc(_name: &'static str) {}

/// Lock-free holder of the dispatcher lifecycle state.
///
/// Once shutdown begins only `Stopped` may replace it.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: DispatcherState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    pub(crate) fn get(&self) -> DispatcherState {
        DispatcherState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn transition(&self, to: DispatcherState) {
        let _ = self.0.fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
            let current = DispatcherState::from_u8(raw);
            match (current, to) {
                (DispatcherState::Stopped, _) => None,
                (DispatcherState::ShuttingDown, DispatcherState::Stopped) => Some(to.as_u8()),
                (DispatcherState::ShuttingDown, _) => None,
                _ => Some(to.as_u8()),
            }
        });
    }
}

/// Everything the dispatcher task owns.
pub(crate) struct DispatcherContext<D> {
    pub queue: QueueReceiver<D>,
    pub gate: RateGate,
    pub emitter: Emitter,
    pub counters: Arc<EmissionCounters>,
    pub state: Arc<StateCell>,
    pub poll_interval: Duration,
    pub stop: watch::Receiver<bool>,
}

impl<D> DispatcherContext<D> {
    fn stop_requested(&self) -> bool {
        let stopped = *self.stop.borrow();
        // A dropped sender means the gateway is gone.
        stopped || self.stop.has_changed().is_err()
    }
}

/// Main dispatcher loop.
///
/// The single consumer of the submission queue:
/// - Sleeps while the queue is empty (woken by pushes, or every poll interval)
/// - Asks the gate before every emission and drains as far as it allows
/// - Sleeps until the gate reopens when the window is full
/// - On stop, finishes the in-flight emission and discards the rest
pub(crate) async fn dispatcher_loop<D>(mut ctx: DispatcherContext<D>)
where
    D: Serialize + Send + 'static,
{
    tracing::debug!(
        limit = ctx.gate.limit(),
        window_ms = ctx.gate.window().as_millis() as u64,
        "dispatcher started"
    );

    loop {
        if ctx.stop_requested() {
            break;
        }

        if ctx.queue.peek().is_none() {
            ctx.state.transition(DispatcherState::Idle);
            tokio::select! {
                _ = ctx.queue.notified() => {}
                _ = sleep(ctx.poll_interval) => {}
                _ = ctx.stop.changed() => {}
            }
            continue;
        }

        ctx.state.transition(DispatcherState::Draining);

        match ctx.gate.admit(Instant::now()) {
            Admission::Go => {
                let Some(submission) = ctx.queue.try_pop() else { continue };
                ctx.counters.record_attempt();
                // Encode before awaiting so no borrow of the document lives across the send.
                let prepared = ctx.emitter.prepare(submission.document(), submission.signature());
                let outcome = EmitOutcome::from_result(match prepared {
                    Ok(request) => ctx.emitter.send(request).await,
                    Err(err) => Err(err),
                });
                ctx.counters.record_outcome(&outcome);
                report_outcome(&submission, &outcome);
            }
            Admission::WaitUntil(ready_at) => {
                metric_inc("gateway.gate.deferred");
                tracing::trace!(
                    wait_ms = ready_at.saturating_duration_since(Instant::now()).as_millis() as u64,
                    queued = ctx.queue.depth(),
                    "rate window full"
                );
                tokio::select! {
                    _ = sleep_until(ready_at) => {}
                    _ = ctx.stop.changed() => {}
                }
            }
        }
    }

    let discarded = ctx.queue.discard();
    ctx.state.transition(DispatcherState::Stopped);
    tracing::info!(discarded, "dispatcher stopped");
}

/// Log and count the outcome. Failed submissions are dropped, never retried.
fn report_outcome<D>(submission: &Submission<D>, outcome: &EmitOutcome) {
    let id = submission.id();
    let queued_ms = submission.created_at().elapsed().as_millis() as u64;

    match outcome {
        EmitOutcome::Accepted { status } => {
            metric_inc("gateway.emit.accepted");
            tracing::debug!(submission_id = %id, status, queued_ms, "document submitted");
        }
        EmitOutcome::Rejected { status } => {
            metric_inc("gateway.emit.rejected");
            tracing::warn!(submission_id = %id, status, queued_ms, "endpoint rejected document");
        }
        EmitOutcome::Failed(err) => {
            metric_inc("gateway.emit.failed");
            tracing::warn!(
                submission_id = %id,
                kind = ?err.kind(),
                error = %err,
                queued_ms,
                "emission failed, submission dropped"
            );
        }
    }
}
