//! Log entry record and its persisted codec.

use serde::Deserialize;
use serde::Serialize;

use crate::StorageError;

/// Protocol-level classification of a log entry.
///
/// The store never interprets these; they are round-tripped for the
/// consensus layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// A state-machine command carried in the payload
    Command,
    /// A no-op appended by a fresh leader to commit its term
    Noop,
    /// A cluster membership change
    Configuration,
    /// A barrier used to wait for all preceding entries to apply
    Barrier,
}

impl Default for EntryType {
    fn default() -> Self {
        EntryType::Command
    }
}

/// One unit of the replicated log.
///
/// `index` is assigned by the consensus layer and strictly orders the
/// sequence; it is not required to start at 1 after truncations. The
/// payload and extensions are opaque to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub index: u64,
    pub term: u64,
    pub entry_type: EntryType,
    pub payload: Vec<u8>,
    /// Opaque middleware bytes carried alongside the payload.
    pub extensions: Vec<u8>,
}

impl Entry {
    pub fn new(
        index: u64,
        term: u64,
        entry_type: EntryType,
        payload: Vec<u8>,
    ) -> Self {
        Entry {
            index,
            term,
            entry_type,
            payload,
            extensions: Vec::new(),
        }
    }

    /// Serializes the full record for storage. Deterministic, so a stored
    /// entry always decodes deep-equal to what was written.
    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        bincode::serialize(self).map_err(StorageError::BincodeError)
    }

    /// Deserializes a stored record.
    ///
    /// A failure here means the bytes under a log key are damaged or were
    /// written by an incompatible version; it is surfaced, never skipped.
    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        bincode::deserialize(bytes).map_err(|e| StorageError::Corrupt {
            key: Vec::new(),
            reason: e.to_string(),
        })
    }

    /// Like [`Entry::decode`] but records which key held the bytes.
    pub(crate) fn decode_at(
        key: &[u8],
        bytes: &[u8],
    ) -> Result<Self, StorageError> {
        bincode::deserialize(bytes).map_err(|e| StorageError::Corrupt {
            key: key.to_vec(),
            reason: e.to_string(),
        })
    }
}
