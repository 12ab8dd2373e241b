//! Resilience patterns for talking to an unreliable server
//!
//! - **Rate limiting**: [`SlidingWindowLimiter`] caps how many requests are
//!   admitted per trailing window, with an injectable clock.
//! - **Backoff**: [`BackoffPolicy`] computes the exponential delay schedule
//!   used when the server answers with "too many requests".
//!
//! Both are generic and carry no knowledge of the memory API; the sync
//! service in `stellar-core` wires them to concrete operations.

pub mod backoff;
pub mod rate_limiter;

pub use backoff::BackoffPolicy;
pub use rate_limiter::{SlidingWindowConfig, SlidingWindowLimiter};
