//! The store facade: one handle composing the log store, the stable
//! store and the compaction scheduler over a single engine connection.

use std::slice;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;
use tracing::error;
use tracing::trace;

use super::compaction;
use super::compaction::CompactionConfig;
use super::compaction::CompactionHandle;
use super::log_store::LogStore;
use super::stable_store::StableStore;
use crate::convert::bytes_to_u64;
use crate::convert::index_to_key;
use crate::convert::key_to_index;
use crate::convert::stable_key;
use crate::convert::u64_to_bytes;
use crate::engine::sled_adapter::SledEngine;
use crate::engine::Engine;
use crate::entry::Entry;
use crate::Result;
use crate::StorageError;
use crate::StoreOptions;

/// One handle over one storage directory.
///
/// Owns the engine connection and the background scheduler. Exactly one
/// writable handle may own a directory at a time; further handles must
/// open it read-only. Clone-free: share it behind an [`Arc`].
pub struct RaftStore<E: Engine> {
    engine: Arc<E>,
    compaction: Mutex<Option<CompactionHandle>>,
    closed: AtomicBool,
}

impl RaftStore<SledEngine> {
    /// Opens the sled-backed store described by `options`.
    ///
    /// Validates the options, opens the engine under `options.path` and,
    /// when `enable_compaction` is set, starts the background scheduler
    /// (which requires a tokio runtime).
    pub fn open(options: StoreOptions) -> Result<Self> {
        options.validate()?;
        let engine = Arc::new(SledEngine::open(&options)?);
        Ok(Self::assemble(engine, &options))
    }
}

impl<E: Engine> RaftStore<E> {
    /// Composes the store over an already-opened engine, e.g. the
    /// in-memory engine for tests or embedded use.
    pub fn with_engine(
        engine: Arc<E>,
        options: &StoreOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self::assemble(engine, options))
    }

    fn assemble(
        engine: Arc<E>,
        options: &StoreOptions,
    ) -> Self {
        let compaction = if options.enable_compaction {
            Some(compaction::start(
                engine.clone(),
                CompactionConfig::from(options),
            ))
        } else {
            None
        };

        debug!(
            compaction = options.enable_compaction,
            read_only = options.read_only,
            "store opened"
        );

        Self {
            engine,
            compaction: Mutex::new(compaction),
            closed: AtomicBool::new(false),
        }
    }

    /// Stops both compaction tickers, waits for the background task to
    /// exit, then flushes the engine.
    ///
    /// Closing an already-closed handle is an error; every later
    /// operation on this handle fails with `StorageError::Closed`.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StorageError::Closed.into());
        }

        let handle = self.compaction.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }

        self.engine.sync()?;
        debug!("store closed");
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::Closed.into());
        }
        Ok(())
    }

    /// Shared walk for first/last: position at one end of the log key
    /// namespace, values not fetched, and decode the boundary key.
    fn boundary_index(
        &self,
        reverse: bool,
    ) -> Result<u64> {
        self.ensure_open()?;
        let txn = self.engine.begin_read()?;
        let range = index_to_key(u64::MIN).to_vec()..=index_to_key(u64::MAX).to_vec();
        let mut scan = txn.scan_keys(range, reverse);
        match scan.next() {
            None => Ok(0),
            Some(key) => {
                let index = key_to_index(key?).map_err(StorageError::Convert)?;
                Ok(index)
            }
        }
    }

    /// Stages deletes for `[min, max]` into one transaction and commits.
    ///
    /// Returns the index to resume from when the engine's staging
    /// ceiling was hit before the range was exhausted; the partial
    /// transaction is committed as-is, so deletion is monotonic.
    fn delete_chunk(
        &self,
        min: u64,
        max: u64,
    ) -> Result<Option<u64>> {
        let snapshot = self.engine.begin_read()?;
        let mut txn = self.engine.begin_write()?;

        let range = index_to_key(min).to_vec()..=index_to_key(max).to_vec();
        let mut resume = None;
        let mut scan = snapshot.scan_keys(range, false);
        for key in &mut scan {
            let key = key?;
            let index = key_to_index(&key).map_err(StorageError::Convert)?;
            if index > max {
                break;
            }
            match txn.delete(&key) {
                Err(StorageError::TxnTooLarge) => {
                    // The overflowing key was not staged; it becomes the
                    // resume point after the partial commit.
                    resume = Some(index);
                    break;
                }
                other => other?,
            }
        }
        drop(scan);

        txn.commit()?;
        Ok(resume)
    }
}

impl<E: Engine> LogStore for RaftStore<E> {
    fn first_index(&self) -> Result<u64> {
        self.boundary_index(false)
    }

    fn last_index(&self) -> Result<u64> {
        self.boundary_index(true)
    }

    fn get_entry(
        &self,
        index: u64,
    ) -> Result<Entry> {
        self.ensure_open()?;
        let txn = self.engine.begin_read()?;
        let key = index_to_key(index);
        match txn.get(&key)? {
            None => Err(StorageError::EntryNotFound(index).into()),
            Some(bytes) => Ok(Entry::decode_at(&key, &bytes)?),
        }
    }

    fn store_entry(
        &self,
        entry: &Entry,
    ) -> Result<()> {
        self.store_entries(slice::from_ref(entry))
    }

    fn store_entries(
        &self,
        entries: &[Entry],
    ) -> Result<()> {
        self.ensure_open()?;
        if entries.is_empty() {
            return Ok(());
        }
        trace!("store_entries len = {:?}", entries.len());

        let mut txn = self.engine.begin_write()?;
        for entry in entries {
            let key = index_to_key(entry.index);
            let value = entry.encode()?;
            txn.put(&key, &value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn delete_range(
        &self,
        min: u64,
        max: u64,
    ) -> Result<()> {
        self.ensure_open()?;
        if min > max {
            return Ok(());
        }

        // Chunked commit: each pass strictly shrinks the remaining range
        // (the engine stages at least one delete per transaction), so
        // this terminates after ceil(range / capacity) commits.
        let mut next = min;
        loop {
            match self.delete_chunk(next, max)? {
                None => return Ok(()),
                Some(resume) => {
                    trace!(resume, max, "delete_range continuing after partial commit");
                    next = resume;
                }
            }
        }
    }
}

impl<E: Engine> StableStore for RaftStore<E> {
    fn set(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<()> {
        self.ensure_open()?;
        let mut txn = self.engine.begin_write()?;
        txn.put(&stable_key(key), value)?;
        txn.commit()?;
        Ok(())
    }

    fn get(
        &self,
        key: &[u8],
    ) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let txn = self.engine.begin_read()?;
        match txn.get(&stable_key(key))? {
            None => Err(StorageError::KeyNotFound.into()),
            Some(value) => Ok(value),
        }
    }

    fn set_u64(
        &self,
        key: &[u8],
        value: u64,
    ) -> Result<()> {
        self.set(key, &u64_to_bytes(value))
    }

    fn get_u64(
        &self,
        key: &[u8],
    ) -> Result<u64> {
        let value = self.get(key)?;
        let value = bytes_to_u64(value).map_err(StorageError::Convert)?;
        Ok(value)
    }
}

impl<E: Engine> std::fmt::Debug for RaftStore<E> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RaftStore")
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl<E: Engine> Drop for RaftStore<E> {
    fn drop(&mut self) {
        // A dropped-without-close handle must not leave the scheduler
        // ticking against the engine.
        if let Some(handle) = self.compaction.get_mut().take() {
            handle.cancel();
        }
        if !self.closed.load(Ordering::SeqCst) {
            match self.engine.sync() {
                Ok(_) => trace!("engine flushed on drop"),
                Err(e) => error!(?e, "Failed to flush engine on drop"),
            }
        }
    }
}
