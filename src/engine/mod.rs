//! The transactional key-value engine contract the store runs on.
//!
//! The store requires from an engine: read-only and read-write
//! transactions, ordered keys-only range scans in both directions, a
//! transaction-too-large signal distinguishable from other failures, a
//! single-pass space-reclamation primitive, and an on-disk size metric.
//! Two adapters ship with the crate: [`sled_adapter::SledEngine`] for
//! durable storage and [`mem::MemEngine`] for tests and embedded use.

pub mod mem;
pub mod sled_adapter;

use std::ops::RangeInclusive;

use crate::StorageError;

/// Outcome of one space-reclamation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceReclaimed {
    /// The pass rewrote at least one region; run another pass.
    Reclaimed,
    /// Nothing left worth reclaiming at the requested ratio.
    Exhausted,
}

/// Keys-only scan over a committed snapshot, in key order.
pub type KeyScan<'a> = Box<dyn Iterator<Item = Result<Vec<u8>, StorageError>> + 'a>;

/// A read-only transaction. Dropped to release, nothing to commit.
pub trait ReadTxn {
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, StorageError>;

    /// Ordered scan over the keys in `range`, newest-committed view,
    /// values not fetched. `reverse` walks the range from its upper end.
    fn scan_keys(
        &self,
        range: RangeInclusive<Vec<u8>>,
        reverse: bool,
    ) -> KeyScan<'_>;
}

/// A read-write transaction staging operations until commit.
///
/// `put`/`delete` fail with [`StorageError::TxnTooLarge`] once the
/// engine's staging ceiling is reached; the overflowing operation is not
/// staged, so the caller may commit partial progress and retry it in a
/// fresh transaction. Dropping without commit aborts.
pub trait WriteTxn {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), StorageError>;

    fn delete(
        &mut self,
        key: &[u8],
    ) -> Result<(), StorageError>;

    /// Atomically applies every staged operation.
    fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

impl std::fmt::Debug for dyn WriteTxn + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WriteTxn")
    }
}

pub trait Engine: Send + Sync + 'static {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StorageError>;

    /// Fails with [`StorageError::ReadOnly`] on a read-only handle.
    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StorageError>;

    /// Runs one space-reclamation pass over the engine's value log,
    /// rewriting a region once its live-data ratio drops below
    /// `discard_ratio`.
    fn reclaim_pass(
        &self,
        discard_ratio: f64,
    ) -> Result<SpaceReclaimed, StorageError>;

    /// Current on-disk footprint in bytes.
    fn on_disk_size(&self) -> Result<u64, StorageError>;

    /// Flushes all buffered writes to durable storage.
    fn sync(&self) -> Result<(), StorageError>;
}
