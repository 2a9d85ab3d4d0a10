//! Core model: the ordered replicated-log contract the consensus layer
//! depends on.

use crate::entry::Entry;
use crate::Result;

#[cfg(test)]
use mockall::automock;

/// Durable storage for the ordered sequence of replicated log entries.
///
/// Indices are assigned by the consensus layer; the store persists and
/// returns them without interpretation. Re-storing an index silently
/// replaces the prior entry.
#[cfg_attr(test, automock)]
pub trait LogStore: Send + Sync + 'static {
    /// Lowest stored index, or `0` when the log is empty.
    fn first_index(&self) -> Result<u64>;

    /// Highest stored index, or `0` when the log is empty.
    fn last_index(&self) -> Result<u64>;

    /// Fetches the entry stored at `index`.
    ///
    /// Fails with `StorageError::EntryNotFound` when absent and
    /// `StorageError::Corrupt` when the stored bytes no longer decode.
    fn get_entry(
        &self,
        index: u64,
    ) -> Result<Entry>;

    /// Persists one entry in its own transaction.
    fn store_entry(
        &self,
        entry: &Entry,
    ) -> Result<()>;

    /// Persists a batch of entries in one transaction, all-or-nothing.
    fn store_entries(
        &self,
        entries: &[Entry],
    ) -> Result<()>;

    /// Deletes every entry with `min <= index <= max`.
    ///
    /// When the range exceeds the engine's per-transaction capacity the
    /// delete commits in chunks; a crash mid-way leaves the range
    /// partially deleted but touches nothing outside it, and re-issuing
    /// the same call completes the job (deleting absent keys is a no-op).
    fn delete_range(
        &self,
        min: u64,
        max: u64,
    ) -> Result<()>;
}
