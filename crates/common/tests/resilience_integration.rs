//! Integration tests for the resilience module
//!
//! Exercises the sliding-window limiter under contention and checks that the
//! backoff schedule lines up with the limiter's window semantics.

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use stellar_common::resilience::{BackoffPolicy, SlidingWindowConfig, SlidingWindowLimiter};
use stellar_common::testing::MockClock;

/// With time frozen, concurrent callers must never be admitted more than the
/// configured number of times.
#[test]
fn test_limiter_never_over_admits_under_contention() {
    let clock = MockClock::new();
    let limiter = SlidingWindowLimiter::with_clock(
        SlidingWindowConfig { max_requests: 5, window: Duration::from_secs(1) },
        clock.clone(),
    )
    .expect("valid config");
    let admitted = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limiter = limiter.clone();
            let admitted = Arc::clone(&admitted);
            thread::spawn(move || {
                for _ in 0..20 {
                    if limiter.admit() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    assert_eq!(admitted.load(Ordering::SeqCst), 5);

    clock.advance(Duration::from_secs(1));
    assert_eq!(limiter.in_flight(), 0);
    assert!(limiter.admit());
}

/// A caller that backs off for the first scheduled delay always finds a free
/// slot again once the backoff is at least as long as the window.
#[test]
fn test_backoff_delay_clears_rate_window() {
    let clock = MockClock::new();
    let limiter =
        SlidingWindowLimiter::with_clock(SlidingWindowConfig::default(), clock.clone())
            .expect("valid config");
    let policy = BackoffPolicy::default();

    assert!(limiter.admit());
    assert!(limiter.admit());
    assert!(!limiter.admit());

    clock.advance(policy.delay_for(0));
    assert!(limiter.admit());
}

/// The total time a fully exhausted 429 loop spends sleeping is the sum of
/// the doubling schedule.
#[test]
fn test_backoff_total_wait() {
    let policy = BackoffPolicy::default();
    let total: Duration = policy.schedule().sum();
    assert_eq!(total, Duration::from_secs(15));
    assert_eq!(policy.max_attempts(), 4);
}
