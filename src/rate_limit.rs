//! Client-side request throttling for external oracles.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::OracleError;
use crate::model::{Coordinate, VehicleType};
use crate::traits::{OracleEstimate, RouteOracle};

/// Default window the burst limit applies to.
pub const BURST_WINDOW: Duration = Duration::from_secs(60);

/// Enforces a burst limit per window and a minimum spacing between requests.
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_minute: u32,
    burst_limit: usize,
    window: Duration,
    history: Mutex<VecDeque<Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(60, 10)
    }
}

impl RateLimiter {
    /// Zero values are raised to one. The burst window is one minute.
    pub fn new(requests_per_minute: u32, burst_limit: usize) -> Self {
        Self::with_window(requests_per_minute, burst_limit, BURST_WINDOW)
    }

    /// At most `burst_limit` requests within any `window`.
    pub fn with_window(requests_per_minute: u32, burst_limit: usize, window: Duration) -> Self {
        let requests_per_minute = requests_per_minute.max(1);
        let burst_limit = burst_limit.max(1);
        Self {
            requests_per_minute,
            burst_limit,
            window,
            history: Mutex::new(VecDeque::with_capacity(burst_limit)),
        }
    }

    /// Minimum spacing between consecutive requests.
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(60) / self.requests_per_minute
    }

    /// Block until another request is allowed, then record it.
    ///
    /// Returns how long the caller was held back. Callers are serialized
    /// while waiting so the recorded history stays ordered.
    pub fn wait_if_needed(&self) -> Duration {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let mut waited = Duration::ZERO;
        let mut now = Instant::now();

        while history.front().is_some_and(|&t| now.duration_since(t) > self.window) {
            history.pop_front();
        }

        if history.len() >= self.burst_limit {
            let oldest = history.front().copied().unwrap_or(now);
            let pause = self.window.saturating_sub(now.duration_since(oldest));
            if !pause.is_zero() {
                debug!(wait_ms = pause.as_millis() as u64, "burst limit reached, waiting");
                std::thread::sleep(pause);
                waited += pause;
                now = Instant::now();
            }
            history.pop_front();
        }

        if let Some(&last) = history.back() {
            let pause = self.min_interval().saturating_sub(now.duration_since(last));
            if !pause.is_zero() {
                debug!(wait_ms = pause.as_millis() as u64, "throttling requests");
                std::thread::sleep(pause);
                waited += pause;
                now = Instant::now();
            }
        }

        history.push_back(now);
        waited
    }
}

/// Oracle wrapper that throttles every call through a [`RateLimiter`].
#[derive(Debug)]
pub struct RateLimitedOracle<O> {
    inner: O,
    limiter: RateLimiter,
}

impl<O: RouteOracle> RateLimitedOracle<O> {
    pub fn new(inner: O, limiter: RateLimiter) -> Self {
        Self { inner, limiter }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl<O: RouteOracle> RouteOracle for RateLimitedOracle<O> {
    fn estimate(&self, stops: &[Coordinate], vehicle_type: VehicleType) -> Result<OracleEstimate, OracleError> {
        self.limiter.wait_if_needed();
        self.inner.estimate(stops, vehicle_type)
    }
}
