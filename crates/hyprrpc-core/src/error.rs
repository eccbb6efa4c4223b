use thiserror::Error;

use crate::domain::Address;

#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("snapshot source i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("snapshot source failed: {0}")]
    Source(String),

    /// Stale identity: a refreshed app is gone from the fresh snapshot.
    #[error("address {address} (pid {process_id}) not found in snapshot")]
    NotFound { address: Address, process_id: i32 },

    #[error("no time recorded for {0}")]
    NotRecorded(Address),

    #[error("process probe task failed: {0}")]
    Probe(#[from] tokio::task::JoinError),

    #[error("manager loops are already running")]
    AlreadyRunning,
}
