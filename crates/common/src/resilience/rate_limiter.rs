//! Client-side admission control for outbound requests
//!
//! [`SlidingWindowLimiter`] keeps the timestamps of recently admitted
//! requests and admits a new one only while fewer than `max_requests` fall
//! inside the trailing `window`. Stale timestamps are pruned lazily on every
//! check; there is no background timer.
//!
//! A burst that straddles a window boundary can momentarily admit up to twice
//! the nominal rate. That is accepted.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{CommonError, CommonResult};
use crate::testing::time::{Clock, SystemClock};

/// Configuration for the sliding-window limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindowConfig {
    /// Maximum admissions inside one window
    pub max_requests: usize,
    /// Length of the trailing window
    pub window: Duration,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self { max_requests: 2, window: Duration::from_millis(1_000) }
    }
}

impl SlidingWindowConfig {
    /// Validate the configuration
    pub fn validate(&self) -> CommonResult<()> {
        if self.max_requests == 0 {
            return Err(CommonError::config_field(
                "max_requests",
                "must be greater than 0",
            ));
        }
        if self.window.is_zero() {
            return Err(CommonError::config_field("window", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Sliding-window admission counter
///
/// ```rust
/// use std::time::Duration;
///
/// use stellar_common::resilience::{SlidingWindowConfig, SlidingWindowLimiter};
///
/// let limiter = SlidingWindowLimiter::new(SlidingWindowConfig {
///     max_requests: 2,
///     window: Duration::from_secs(1),
/// })
/// .unwrap();
///
/// assert!(limiter.admit());
/// assert!(limiter.admit());
/// assert!(!limiter.admit());
/// ```
pub struct SlidingWindowLimiter<C: Clock = SystemClock> {
    config: SlidingWindowConfig,
    recent: Arc<Mutex<VecDeque<Instant>>>,
    clock: Arc<C>,
}

impl SlidingWindowLimiter<SystemClock> {
    /// Create a limiter backed by the system clock
    pub fn new(config: SlidingWindowConfig) -> CommonResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> SlidingWindowLimiter<C> {
    /// Create a limiter with a custom clock
    pub fn with_clock(config: SlidingWindowConfig, clock: C) -> CommonResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(config.max_requests))),
            clock: Arc::new(clock),
        })
    }

    /// Decide whether a new request may proceed now.
    ///
    /// Admission records the current instant; a denial records nothing.
    pub fn admit(&self) -> bool {
        let now = self.clock.now();
        let mut recent = self.recent.lock();
        Self::prune(&mut recent, now, self.config.window);

        if recent.len() >= self.config.max_requests {
            debug!(
                in_window = recent.len(),
                max_requests = self.config.max_requests,
                "rate limiter denied admission"
            );
            return false;
        }

        recent.push_back(now);
        true
    }

    /// Number of admissions still inside the trailing window
    pub fn in_flight(&self) -> usize {
        let now = self.clock.now();
        let mut recent = self.recent.lock();
        Self::prune(&mut recent, now, self.config.window);
        recent.len()
    }

    /// Forget every recorded admission
    pub fn reset(&self) {
        self.recent.lock().clear();
    }

    /// Active configuration
    pub fn config(&self) -> SlidingWindowConfig {
        self.config
    }

    fn prune(recent: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(oldest) = recent.front() {
            if now.saturating_duration_since(*oldest) < window {
                break;
            }
            recent.pop_front();
        }
    }
}

impl<C: Clock> Clone for SlidingWindowLimiter<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            recent: Arc::clone(&self.recent),
            clock: Arc::clone(&self.clock),
        }
    }
}
