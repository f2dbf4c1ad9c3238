use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config::GatewayConfig;
use crate::dispatcher::{dispatcher_loop, metric_inc, DispatcherContext, StateCell};
use crate::emitter::{Emitter, Transport};
use crate::error::{ConfigError, SubmitError};
use crate::gate::RateGate;
use crate::queue::{submission_queue, QueueSender};
use crate::telemetry::{telemetry_loop, EmissionCounters, EmissionTotals, StdoutSink, TelemetrySink};
use crate::types::{DispatcherState, SubmissionId};

/// Point-in-time view of a running gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayStats {
    pub state: DispatcherState,
    pub queue_depth: usize,
    pub totals: EmissionTotals,
}

/// Background tasks not yet joined. A handle is cleared only after its task
/// has been awaited to completion.
struct TaskHandles {
    dispatcher: Option<JoinHandle<()>>,
    telemetry: Option<JoinHandle<()>>,
}

/// Rate-limited submission gateway.
///
/// Producers call [`Gateway::submit`] from any task; a single dispatcher
/// task forwards submissions to the endpoint, never starting more than
/// `limit` emissions in any window. A telemetry task reports the number of
/// emissions started per interval.
///
/// Construct inside a Tokio runtime: both tasks are spawned immediately.
pub struct Gateway<D> {
    sender: QueueSender<D>,
    counters: Arc<EmissionCounters>,
    state: Arc<StateCell>,
    dispatcher_stop: watch::Sender<bool>,
    telemetry_stop: watch::Sender<bool>,
    handles: Mutex<TaskHandles>,
    shutdown_grace: Duration,
    config: GatewayConfig,
}

impl<D> Gateway<D>
where
    D: Serialize + Send + 'static,
{
    /// Start a gateway that posts over HTTP(S) and reports to stdout.
    #[cfg(feature = "http")]
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        Self::with_transport(config, Arc::new(crate::emitter::HttpTransport::new()))
    }

    /// Start a gateway on a custom transport, reporting to stdout.
    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        Self::with_parts(config, transport, Arc::new(StdoutSink))
    }

    /// Start a gateway on a custom transport and telemetry sink.
    pub fn with_parts(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let emission_timeout = config.effective_emission_timeout();
        let poll_interval = config.effective_poll_interval();

        let (sender, receiver) = submission_queue(config.max_queue_depth);
        let counters = Arc::new(EmissionCounters::new());
        let state = Arc::new(StateCell::new(DispatcherState::Idle));
        let (dispatcher_stop, dispatcher_stop_rx) = watch::channel(false);
        let (telemetry_stop, telemetry_stop_rx) = watch::channel(false);

        let ctx = DispatcherContext {
            queue: receiver,
            gate: RateGate::new(config.limit, config.window),
            emitter: Emitter::new(transport, config.endpoint.as_str(), emission_timeout),
            counters: counters.clone(),
            state: state.clone(),
            poll_interval,
            stop: dispatcher_stop_rx,
        };

        let dispatcher = tokio::spawn(dispatcher_loop(ctx));
        let telemetry = tokio::spawn(telemetry_loop(
            counters.clone(),
            sink,
            config.telemetry_interval,
            telemetry_stop_rx,
        ));

        tracing::info!(
            endpoint = %config.endpoint,
            limit = config.limit,
            window_ms = config.window.as_millis() as u64,
            "gateway started"
        );

        Ok(Self {
            sender,
            counters,
            state,
            dispatcher_stop,
            telemetry_stop,
            handles: Mutex::new(TaskHandles {
                dispatcher: Some(dispatcher),
                telemetry: Some(telemetry),
            }),
            shutdown_grace: emission_timeout + poll_interval,
            config,
        })
    }

    /// Enqueue a document for emission.
    ///
    /// Returns immediately; never waits on the rate limit or the network.
    pub fn submit(&self, document: D, signature: impl Into<String>) -> Result<SubmissionId, SubmitError> {
        match self.sender.push(document, signature) {
            Ok(id) => {
                metric_inc("gateway.submit.enqueued");
                tracing::trace!(submission_id = %id, "submission enqueued");
                Ok(id)
            }
            Err(err) => {
                metric_inc("gateway.submit.rejected");
                tracing::debug!(error = %err, "submission rejected");
                Err(err)
            }
        }
    }

    /// Stop accepting submissions, let the in-flight emission finish (bounded
    /// by the emission timeout), discard the rest of the queue and stop both
    /// tasks.
    ///
    /// Idempotent and cancel-safe: if a call is dropped before it completes,
    /// the next call resumes the remaining steps. Once a call returns, no
    /// further emission is started.
    pub async fn shutdown(&self) {
        self.sender.close();
        self.state.transition(DispatcherState::ShuttingDown);
        let _ = self.dispatcher_stop.send(true);

        let mut handles = self.handles.lock().await;

        if let Some(dispatcher) = handles.dispatcher.as_mut() {
            if timeout(self.shutdown_grace, &mut *dispatcher).await.is_err() {
                tracing::warn!(
                    grace_ms = self.shutdown_grace.as_millis() as u64,
                    "dispatcher did not stop in time, aborting"
                );
                dispatcher.abort();
                let _ = dispatcher.await;
            }
            handles.dispatcher = None;
        }
        self.state.transition(DispatcherState::Stopped);

        if let Some(telemetry) = handles.telemetry.as_mut() {
            let _ = self.telemetry_stop.send(true);
            let _ = telemetry.await;
            handles.telemetry = None;

            tracing::info!(totals = ?self.counters.totals(), "gateway shut down");
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state.get()
    }

    /// Submissions waiting for emission.
    pub fn queue_depth(&self) -> usize {
        self.sender.depth()
    }

    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            state: self.state(),
            queue_depth: self.queue_depth(),
            totals: self.counters.totals(),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}

impl<D> Drop for Gateway<D> {
    fn drop(&mut self) {
        self.sender.close();
        let _ = self.dispatcher_stop.send(true);
        let _ = self.telemetry_stop.send(true);
    }
}
