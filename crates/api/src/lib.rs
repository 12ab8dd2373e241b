//! # Stellar App
//!
//! Composition root for the sync daemon.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - The JSON-lines command loop served on stdin/stdout
//! - Logging setup
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires adapters into the core sync service

pub mod context;
pub mod server;
pub mod utils;

pub use context::SyncContext;
pub use server::serve_lines;
