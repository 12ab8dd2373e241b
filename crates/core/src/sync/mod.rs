//! Resilient sync between the extension and the memory server

pub mod commands;
pub mod connectivity;
pub mod executor;
pub mod metrics;
pub mod ports;
pub mod queue;
pub mod replay;
pub mod request;
pub mod service;
