use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Default registration endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

/// Lower bound of the default per-request timeout.
const MIN_DEFAULT_EMISSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound for every duration setting (one year).
///
/// Deadlines are computed as `Instant + Duration`; the bound keeps those
/// sums representable.
pub const MAX_CONFIG_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Gateway configuration.
///
/// Constructed once and never mutated after the gateway starts.
/// The outbound rate never exceeds `limit` requests in any window of
/// length `window`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Length of the rolling rate window.
    pub window: Duration,

    /// Maximum emissions permitted within any window.
    pub limit: u32,

    /// Target URL for document registration.
    pub endpoint: String,

    /// Dispatcher wake cadence while idle. Clamped to `window / 10`
    /// (never below one nanosecond).
    pub poll_interval: Duration,

    /// Per-request timeout. `None` means `max(window, 5s)`.
    pub emission_timeout: Option<Duration>,

    /// How often the telemetry sink receives a report.
    pub telemetry_interval: Duration,

    /// Optional sanity bound on queued submissions.
    pub max_queue_depth: Option<usize>,
}

impl Default for GatewayConfig {
    /// Defaults:
    /// - window: 1 second
    /// - limit: 10
    /// - poll_interval: 50 ms
    /// - telemetry_interval: 1 second
    /// - max_queue_depth: 1,000,000
    fn default() -> Self {
        Self {
            window: Duration::from_secs(1),
            limit: 10,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval: Duration::from_millis(50),
            emission_timeout: None,
            telemetry_interval: Duration::from_secs(1),
            max_queue_depth: Some(1_000_000),
        }
    }
}

impl GatewayConfig {
    /// Create a configuration permitting `limit` requests per `window`.
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            window,
            limit,
            ..Self::default()
        }
    }

    /// Create a configuration from a time unit and a unit count,
    /// e.g. `(Duration::from_millis(1), 200, 2)` for 2 requests per 200 ms.
    pub fn for_time_unit(unit: Duration, count: u32, limit: u32) -> Self {
        Self::new(unit.saturating_mul(count), limit)
    }

    /// Set the registration endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set a custom timeout for each emission.
    pub fn with_emission_timeout(mut self, timeout: Duration) -> Self {
        self.emission_timeout = Some(timeout);
        self
    }

    pub fn with_telemetry_interval(mut self, interval: Duration) -> Self {
        self.telemetry_interval = interval;
        self
    }

    /// Set (or remove with `None`) the queue sanity bound.
    pub fn with_max_queue_depth(mut self, depth: Option<usize>) -> Self {
        self.max_queue_depth = depth;
        self
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if self.window.is_zero() {
            return Err(ConfigError::ZeroWindow);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.telemetry_interval.is_zero() {
            return Err(ConfigError::ZeroTelemetryInterval);
        }

        let bounded = [
            ("window", Some(self.window)),
            ("poll_interval", Some(self.poll_interval)),
            ("emission_timeout", self.emission_timeout),
            ("telemetry_interval", Some(self.telemetry_interval)),
        ];
        for (field, value) in bounded {
            if let Some(value) = value.filter(|v| *v > MAX_CONFIG_DURATION) {
                return Err(ConfigError::DurationTooLong {
                    field,
                    value,
                    max: MAX_CONFIG_DURATION,
                });
            }
        }

        self.endpoint_url().map(|_| ())
    }

    /// Parse the endpoint, accepting only absolute http(s) URLs.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };

        let url = Url::parse(&self.endpoint).map_err(|err| invalid(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(invalid(format!("unsupported scheme {other:?}"))),
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        Ok(url)
    }

    /// Per-request timeout actually applied by the emitter.
    pub fn effective_emission_timeout(&self) -> Duration {
        self.emission_timeout
            .unwrap_or_else(|| self.window.max(MIN_DEFAULT_EMISSION_TIMEOUT))
    }

    /// Poll interval actually used by the dispatcher (at most a tenth of the window).
    pub fn effective_poll_interval(&self) -> Duration {
        let ceiling = (self.window / 10).max(Duration::from_nanos(1));
        self.poll_interval.min(ceiling)
    }
}
