//! Injectable time source
//!
//! The rate limiter reads time through [`Clock`] so tests can step a
//! [`MockClock`] instead of sleeping.
//!
//! ```
//! use std::time::Duration;
//!
//! use stellar_common::testing::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now() - start, Duration::from_secs(5));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Monotonic and wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn system_time(&self) -> SystemTime;

    /// Wall-clock milliseconds since the UNIX epoch, saturating
    fn millis_since_epoch(&self) -> u64 {
        let since_epoch = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default();
        u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX)
    }
}

/// The real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to
///
/// Clones share one offset, so a copy handed to a limiter follows
/// `advance` calls made by the test.
#[derive(Debug, Clone)]
pub struct MockClock {
    origin: Instant,
    wall_origin: SystemTime,
    offset: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            wall_origin: SystemTime::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    /// Jump to an absolute offset from creation
    pub fn set_elapsed(&self, offset: Duration) {
        *self.offset.lock() = offset;
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        self.wall_origin + self.elapsed()
    }
}
