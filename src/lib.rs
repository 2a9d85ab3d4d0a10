//! # raft-logstore
//!
//! A durable storage backend for Raft-style consensus protocols: an
//! ordered log of replicated entries plus a flat store of small facts
//! (term, vote, configuration), both persisted through a pluggable
//! transactional key-value engine with background space reclamation.
//!
//! ```no_run
//! use raft_logstore::Entry;
//! use raft_logstore::EntryType;
//! use raft_logstore::LogStore;
//! use raft_logstore::RaftStore;
//! use raft_logstore::StableStore;
//! use raft_logstore::StoreOptions;
//!
//! # async fn demo() -> raft_logstore::Result<()> {
//! let store = RaftStore::open(StoreOptions::new("/var/lib/my-raft-node"))?;
//!
//! store.store_entry(&Entry::new(1, 1, EntryType::Command, b"set x=1".to_vec()))?;
//! store.set_u64(b"CurrentTerm", 1)?;
//!
//! assert_eq!(store.last_index()?, 1);
//! store.close().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod convert;
mod engine;
mod entry;
mod errors;
mod storage;

#[cfg(test)]
mod entry_test;

pub use config::*;
pub use convert::*;
pub use engine::*;
pub use entry::*;
pub use errors::*;
pub use storage::*;
