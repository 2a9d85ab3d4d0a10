//! Storage Error Hierarchy
//!
//! Defines the error types surfaced by the log store, stable store and
//! the engine adapters, categorized by operational concern.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Storage subsystem failures (engine, serialization, lifecycle)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Store configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No log entry stored at the requested index
    #[error("log entry {0} not found")]
    EntryNotFound(u64),

    /// No stable value stored under the requested key
    #[error("key not found")]
    KeyNotFound,

    /// Stored bytes failed to decode: on-disk damage or version mismatch
    #[error("corrupt record at key {key:?}: {reason}")]
    Corrupt { key: Vec<u8>, reason: String },

    /// The engine's per-transaction staging ceiling was hit.
    /// Handled internally by ranged deletes; surfaced for oversized batches.
    #[error("transaction exceeds the engine staging limit")]
    TxnTooLarge,

    /// Write attempted against a handle opened read-only
    #[error("store is opened read-only")]
    ReadOnly,

    /// Operation attempted on a closed store handle
    #[error("store handle is closed")]
    Closed,

    /// Key/value conversion failures
    #[error("Value convert failed")]
    Convert(#[from] ConvertError),

    /// Disk I/O failures during engine operations
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Serialization failures for persisted records
    #[error(transparent)]
    BincodeError(#[from] bincode::Error),

    /// Embedded database errors
    #[error("Embedded database error: {0}")]
    DbError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("malformed key: expected {expected} bytes, found {found}")]
    MalformedKey { expected: usize, found: usize },

    #[error("malformed value: expected {expected} bytes, found {found}")]
    MalformedValue { expected: usize, found: usize },

    #[error("key carries namespace byte {found:#04x}, expected {expected:#04x}")]
    WrongNamespace { expected: u8, found: u8 },
}

impl From<sled::Error> for StorageError {
    fn from(e: sled::Error) -> Self {
        match e {
            sled::Error::Io(io) => StorageError::IoError(io),
            other => StorageError::DbError(other.to_string()),
        }
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Error::Storage(e.into())
    }
}

impl Error {
    /// True when the error is the expected absent-entry / absent-key kind.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Storage(StorageError::EntryNotFound(_)) | Error::Storage(StorageError::KeyNotFound)
        )
    }

    /// True when the error reports a write against a read-only handle.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Error::Storage(StorageError::ReadOnly))
    }

    /// True when the error reports use of a closed handle.
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Storage(StorageError::Closed))
    }
}
