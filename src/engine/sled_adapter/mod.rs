//! sled-backed engine adapter: the durable production engine.
//!
//! Write transactions stage into a [`sled::Batch`] and apply atomically
//! at commit; the staging ceiling (`max_txn_ops`) bounds batch memory and
//! gives ranged deletes their multi-commit behavior. Reads run against
//! the latest committed state; sled makes each point read and scan step
//! atomic, which is all the store layer relies on.


use std::ops::RangeInclusive;

use sled::Batch;
use sled::Tree;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::Engine;
use super::KeyScan;
use super::ReadTxn;
use super::SpaceReclaimed;
use super::WriteTxn;
use crate::StorageError;
use crate::StoreOptions;

/// Durable engine over a sled database.
pub struct SledEngine {
    db: sled::Db,
    sync_on_commit: bool,
    read_only: bool,
    max_txn_ops: usize,
}

impl SledEngine {
    /// Opens (or creates) the database under `options.path`.
    ///
    /// Durability per commit follows `options.skip_sync`; with it set,
    /// writes reach disk only on sled's background flush cadence.
    pub fn open(options: &StoreOptions) -> Result<Self, StorageError> {
        debug!(path = %options.path.display(), "opening sled engine");

        let db = sled::Config::default()
            .path(&options.path)
            .cache_capacity(options.engine.cache_capacity)
            .use_compression(options.engine.use_compression)
            .compression_factor(1)
            .open()
            .map_err(|e| {
                warn!(
                    "Try to open DB at this location: {:?} and failed: {:?}",
                    options.path, e
                );
                StorageError::from(e)
            })?;

        Ok(Self {
            db,
            sync_on_commit: !options.skip_sync,
            read_only: options.read_only,
            max_txn_ops: options.engine.max_txn_ops.max(1),
        })
    }
}

impl std::fmt::Debug for SledEngine {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledEngine").finish()
    }
}

impl Engine for SledEngine {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StorageError> {
        Ok(Box::new(SledReadTxn { tree: &*self.db }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        Ok(Box::new(SledWriteTxn {
            tree: &*self.db,
            batch: Batch::default(),
            staged: 0,
            max_txn_ops: self.max_txn_ops,
            sync_on_commit: self.sync_on_commit,
        }))
    }

    fn reclaim_pass(
        &self,
        _discard_ratio: f64,
    ) -> Result<SpaceReclaimed, StorageError> {
        // sled rewrites its own segments as records are overwritten, so
        // there is never a pass left for the caller to run.
        trace!("sled reclaims segment space internally; nothing to do");
        Ok(SpaceReclaimed::Exhausted)
    }

    fn on_disk_size(&self) -> Result<u64, StorageError> {
        Ok(self.db.size_on_disk()?)
    }

    fn sync(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

struct SledReadTxn<'a> {
    tree: &'a Tree,
}

impl ReadTxn for SledReadTxn<'_> {
    fn get(
        &self,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.tree.get(key)?.map(|ivec| ivec.to_vec()))
    }

    fn scan_keys(
        &self,
        range: RangeInclusive<Vec<u8>>,
        reverse: bool,
    ) -> KeyScan<'_> {
        let iter = self.tree.range(range).map(|item| {
            item.map(|(key, _)| key.to_vec()).map_err(StorageError::from)
        });
        if reverse {
            Box::new(iter.rev())
        } else {
            Box::new(iter)
        }
    }
}

struct SledWriteTxn<'a> {
    tree: &'a Tree,
    batch: Batch,
    staged: usize,
    max_txn_ops: usize,
    sync_on_commit: bool,
}

impl SledWriteTxn<'_> {
    fn ensure_capacity(&self) -> Result<(), StorageError> {
        if self.staged >= self.max_txn_ops {
            return Err(StorageError::TxnTooLarge);
        }
        Ok(())
    }
}

impl WriteTxn for SledWriteTxn<'_> {
    fn put(
        &mut self,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), StorageError> {
        self.ensure_capacity()?;
        self.batch.insert(key, value);
        self.staged += 1;
        Ok(())
    }

    fn delete(
        &mut self,
        key: &[u8],
    ) -> Result<(), StorageError> {
        self.ensure_capacity()?;
        self.batch.remove(key);
        self.staged += 1;
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        trace!(staged = self.staged, "applying write batch");
        self.tree.apply_batch(self.batch)?;
        if self.sync_on_commit {
            self.tree.flush()?;
        }
        Ok(())
    }
}
