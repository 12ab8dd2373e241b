//! # Stellar Domain
//!
//! Business domain types for the Stellar sync client.
//!
//! This crate contains:
//! - Memory API payloads and responses (store, recall, forget, stats)
//! - Offline queue records and connectivity state
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other Stellar crates
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
