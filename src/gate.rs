use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::MAX_CONFIG_DURATION;

/// Answer of [`RateGate::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Admission recorded; the caller may emit now.
    Go,
    /// Window is full. Nothing was recorded; retry at the given instant.
    WaitUntil(Instant),
}

/// Sliding-window rate limiter.
///
/// At most `limit` admissions are recorded in any window `(now - window, now]`.
/// An admission recorded at `t` stops counting at exactly `t + window`, so a
/// `WaitUntil(t)` answer is always admissible when `t` arrives.
///
/// The gate is owned by the dispatcher and needs no locking. Wrap it in a
/// mutex when shared, so evict-check-append stays one critical section.
#[derive(Debug)]
pub struct RateGate {
    window: Duration,
    limit: usize,
    admissions: VecDeque<Instant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateStats {
    pub limit: usize,
    pub window: Duration,
    pub in_window: usize,
    pub oldest_age: Option<Duration>,
}

impl RateGate {
    /// `limit` is raised to at least one and `window` capped at
    /// [`MAX_CONFIG_DURATION`].
    pub fn new(limit: u32, window: Duration) -> Self {
        let limit = limit.max(1) as usize;
        Self {
            window: window.min(MAX_CONFIG_DURATION),
            limit,
            admissions: VecDeque::with_capacity(limit),
        }
    }

    /// Decide whether an emission may start at `now`.
    pub fn admit(&mut self, now: Instant) -> Admission {
        // Recorded instants stay non-decreasing even if a caller hands us an older `now`.
        let now = match self.admissions.back() {
            Some(&latest) if latest > now => latest,
            _ => now,
        };

        self.evict(now);

        if self.admissions.len() < self.limit {
            self.admissions.push_back(now);
            return Admission::Go;
        }

        let oldest = self.admissions.front().copied().unwrap_or(now);
        Admission::WaitUntil(oldest + self.window)
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&oldest) = self.admissions.front() {
            if now.saturating_duration_since(oldest) < self.window {
                break;
            }
            self.admissions.pop_front();
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn snapshot(&self, now: Instant) -> GateStats {
        let live: Vec<&Instant> = self
            .admissions
            .iter()
            .filter(|t| now.saturating_duration_since(**t) < self.window)
            .collect();

        GateStats {
            limit: self.limit,
            window: self.window,
            in_window: live.len(),
            oldest_age: live.first().map(|t| now.saturating_duration_since(**t)),
        }
    }
}
