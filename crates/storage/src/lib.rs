//! Storage Layer
//!
//! Durable membership records for alert fingerprints. A record means
//! "a firing notification went out for this fingerprint and no resolution
//! has been seen since". Backends:
//! - [`MemoryStore`]: process-local set, used by tests and single-node runs
//! - [`SqliteStore`]: SQLite table shared by every process that opens the file

mod memory;
mod sqlite;
mod store;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::MembershipStore;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend unreachable, timed out, or failed mid-operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// Backend could not be opened or its schema prepared
    #[error("Store setup failed: {0}")]
    Setup(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}
