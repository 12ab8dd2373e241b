//! Testing utilities and helpers
//!
//! - **[`time`]**: a `Clock` abstraction with a manually advanced
//!   `MockClock`, so rate windows can be exercised without sleeping.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use stellar_common::testing::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_millis(1_500));
//! assert_eq!(clock.now().duration_since(start), Duration::from_millis(1_500));
//! ```

pub mod time;

pub use time::{Clock, MockClock, SystemClock};
