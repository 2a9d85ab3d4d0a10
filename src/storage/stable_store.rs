//! Core model: the flat key/value facts the consensus layer must retain
//! across restarts (current term, vote, configuration).

use crate::Result;

#[cfg(test)]
use mockall::automock;

/// Durable storage for small auxiliary facts, outside the ordered log.
///
/// Keys are caller-supplied raw bytes; they live in their own namespace
/// and can never collide with log index keys.
#[cfg_attr(test, automock)]
pub trait StableStore: Send + Sync + 'static {
    fn set(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()>;

    /// Fails with `StorageError::KeyNotFound` when the key is absent.
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Vec<u8>>;

    /// Like [`StableStore::set`] with the value encoded as 8 big-endian
    /// bytes.
    fn set_u64(
        &self,
        key: &[u8],
        value: u64,
    ) -> Result<()>;

    /// Like [`StableStore::get`] for values written by
    /// [`StableStore::set_u64`].
    fn get_u64(
        &self,
        key: &[u8],
    ) -> Result<u64>;
}
