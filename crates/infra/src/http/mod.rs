//! HTTP transport for the memory server

mod transport;

pub use transport::{ReqwestTransport, ReqwestTransportBuilder};
