//! Periodic task scheduling

mod error;
mod interval;

pub use error::{SchedulerError, SchedulerResult};
pub use interval::IntervalScheduler;
