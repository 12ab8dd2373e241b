//! File-backed persistence for the offline queue and connectivity flag
//!
//! Each record is one JSON file under the configured data directory, named
//! after its storage key. Writes go to a temporary file that is renamed over
//! the record, and a `.sha256` sidecar is written alongside for integrity
//! checks on load.

mod connectivity_store;
mod json_file;
mod queue_store;

pub use connectivity_store::FileConnectivityStore;
pub use json_file::JsonFileStore;
pub use queue_store::FileQueueStore;
