//! In-memory engine adapter.
//!
//! Full-fidelity stand-in for a value-log engine: it enforces the
//! per-transaction staging ceiling and keeps live/dead byte accounting so
//! reclamation passes behave like a real value-log garbage collector.
//! Used by the crate's own tests and available for embedded/testing use
//! of the store.


use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use tracing::trace;

use super::Engine;
use super::KeyScan;
use super::ReadTxn;
use super::SpaceReclaimed;
use super::SpaceReclaimed::Exhausted;
use super::SpaceReclaimed::Reclaimed;
use super::WriteTxn;
use crate::StorageError;

/// Flat per-record cost covering key header and value pointer.
const RECORD_OVERHEAD: u64 = 16;

#[derive(Debug, Clone)]
pub struct MemEngineOptions {
    /// Staged-operation ceiling per write transaction.
    pub max_txn_ops: usize,
    /// Bytes one reclamation pass rewrites out of the dead region.
    pub reclaim_segment_size: u64,
    pub read_only: bool,
}

impl Default for MemEngineOptions {
    fn default() -> Self {
        Self {
            max_txn_ops: 100_000,
            reclaim_segment_size: 64 * 1024,
            read_only: false,
        }
    }
}

#[derive(Debug, Default)]
struct MemState {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Bytes held by current records.
    live_bytes: u64,
    /// Bytes held by overwritten or deleted records, reclaimable.
    dead_bytes: u64,
}

/// In-memory engine with simulated value-log accounting.
#[derive(Debug)]
pub struct MemEngine {
    state: Mutex<MemState>,
    max_txn_ops: usize,
    reclaim_segment_size: u64,
    read_only: AtomicBool,
    commits: AtomicU64,
    reclaim_attempts: AtomicU64,
    reclaim_passes: AtomicU64,
}

impl MemEngine {
    pub fn new(options: MemEngineOptions) -> Self {
        Self {
            state: Mutex::new(MemState::default()),
            max_txn_ops: options.max_txn_ops.max(1),
            reclaim_segment_size: options.reclaim_segment_size.max(1),
            read_only: AtomicBool::new(options.read_only),
            commits: AtomicU64::new(0),
            reclaim_attempts: AtomicU64::new(0),
            reclaim_passes: AtomicU64::new(0),
        }
    }

    /// Flips the handle between writable and read-only, e.g. to populate
    /// a fixture before exercising read-only behavior.
    pub fn set_read_only(
        &self,
        read_only: bool,
    ) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of committed write transactions since creation.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of reclamation passes attempted, successful or not.
    pub fn reclaim_attempt_count(&self) -> u64 {
        self.reclaim_attempts.load(Ordering::SeqCst)
    }

    /// Number of reclamation passes that reported progress.
    pub fn reclaim_pass_count(&self) -> u64 {
        self.reclaim_passes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.state.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemEngine {
    fn default() -> Self {
        Self::new(MemEngineOptions::default())
    }
}

fn record_cost(
    key: &[u8],
    value: &[u8],
) -> u64 {
    key.len() as u64 + value.len() as u64 + RECORD_OVERHEAD
}

impl Engine for MemEngine {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StorageError> {
        // A cloned map is a true snapshot; cheap enough for a test engine.
        let snapshot = self.state.lock().map.clone();
        Ok(Box::new(MemReadTxn { snapshot }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StorageError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StorageError::ReadOnly);
        }
        Ok(Box::new(MemWriteTxn {
            engine: self,
            ops: Vec::new(),
        }))
    }

    fn reclaim_pass(
        &self,
        discard_ratio: f64,
    ) -> Result<SpaceReclaimed, StorageError> {
        self.reclaim_attempts.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        let total = state.live_bytes + state.dead_bytes;
        if total == 0 || state.dead_bytes == 0 {
            return Ok(Exhausted);
        }
        let dead_ratio = state.dead_bytes as f64 / total as f64;
        if dead_ratio < discard_ratio {
            return Ok(Exhausted);
        }

        let rewritten = state.dead_bytes.min(self.reclaim_segment_size);
        state.dead_bytes -= rewritten;
        self.reclaim_passes.fetch_add(1, Ordering::SeqCst);
        trace!(rewritten, remaining_dead = state.dead_bytes, "reclaimed one segment");
        Ok(Reclaimed)
    }

    fn on_disk_size(&self) -> Result<u64, StorageError> {
        let state = self.state.lock();
        Ok(state.live_bytes + state.dead_bytes)
    }

    fn sync(&self) -> Result<(), StorageError> {
        trace!("MemEngine sync (no-op)");
        Ok(())
    }
}

struct MemReadTxn {
    snapshot: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl ReadTxn for MemReadTxn {
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.snapshot.get(key).cloned())
    }

    fn scan_keys(
        &self,
        range: RangeInclusive<Vec<u8>>,
        reverse: bool,
    ) -> KeyScan<'_> {
        let iter = self
            .snapshot
            .range(range)
            .map(|(key, _)| Ok::<_, StorageError>(key.clone()));
        if reverse {
            Box::new(iter.rev())
        } else {
            Box::new(iter)
        }
    }
}

enum MemOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

struct MemWriteTxn<'a> {
    engine: &'a MemEngine,
    ops: Vec<MemOp>,
}

impl MemWriteTxn<'_> {
    fn ensure_capacity(&self) -> Result<(), StorageError> {
        if self.ops.len() >= self.engine.max_txn_ops {
            return Err(StorageError::TxnTooLarge);
        }
        Ok(())
    }
}

impl WriteTxn for MemWriteTxn<'_> {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), StorageError> {
        self.ensure_capacity()?;
        self.ops.push(MemOp::Put(key.to_vec(), value.to_vec()));
        Ok(())
    }

    fn delete(
        &mut self,
        key: &[u8],
    ) -> Result<(), StorageError> {
        self.ensure_capacity()?;
        self.ops.push(MemOp::Delete(key.to_vec()));
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let mut state = self.engine.state.lock();
        for op in self.ops {
            match op {
                MemOp::Put(key, value) => {
                    let cost = record_cost(&key, &value);
                    if let Some(old) = state.map.insert(key.clone(), value) {
                        let old_cost = record_cost(&key, &old);
                        state.live_bytes -= old_cost;
                        state.dead_bytes += old_cost;
                    }
                    state.live_bytes += cost;
                }
                MemOp::Delete(key) => {
                    if let Some(old) = state.map.remove(&key) {
                        let old_cost = record_cost(&key, &old);
                        state.live_bytes -= old_cost;
                        state.dead_bytes += old_cost;
                    }
                }
            }
        }
        self.engine.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
