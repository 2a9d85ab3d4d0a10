use std::sync::Arc;

use super::*;
use crate::engine::mem::MemEngine;
use crate::engine::mem::MemEngineOptions;
use crate::entry::Entry;
use crate::entry::EntryType;
use crate::StoreOptions;

fn mem_store() -> RaftStore<MemEngine> {
    mem_store_with(MemEngineOptions::default())
}

fn mem_store_with(options: MemEngineOptions) -> RaftStore<MemEngine> {
    RaftStore::with_engine(
        Arc::new(MemEngine::new(options)),
        &StoreOptions::new("unused"),
    )
    .expect("should assemble store")
}

fn sample_entry(index: u64) -> Entry {
    Entry::new(
        index,
        1,
        EntryType::Command,
        format!("log-{index}").into_bytes(),
    )
}

#[test]
fn test_first_and_last_index_on_empty_log() {
    let store = mem_store();
    assert_eq!(store.first_index().expect("should not error"), 0);
    assert_eq!(store.last_index().expect("should not error"), 0);
}

#[test]
fn test_first_and_last_index() {
    let store = mem_store();
    let entries: Vec<Entry> = (1..=3).map(sample_entry).collect();
    store.store_entries(&entries).expect("should store");

    assert_eq!(store.first_index().expect("should read"), 1);
    assert_eq!(store.last_index().expect("should read"), 3);
}

#[test]
fn test_indices_do_not_need_to_start_at_one() {
    let store = mem_store();
    store.store_entry(&sample_entry(42)).expect("should store");
    store.store_entry(&sample_entry(99)).expect("should store");

    assert_eq!(store.first_index().expect("should read"), 42);
    assert_eq!(store.last_index().expect("should read"), 99);
}

#[test]
fn test_get_entry_round_trip() {
    let store = mem_store();
    let entry = Entry {
        index: 5,
        term: 3,
        entry_type: EntryType::Configuration,
        payload: b"voter:2@node-b".to_vec(),
        extensions: vec![1, 2, 3],
    };
    store.store_entry(&entry).expect("should store");

    assert_eq!(store.get_entry(5).expect("should fetch"), entry);
}

#[test]
fn test_get_entry_missing_is_not_found() {
    let store = mem_store();
    let err = store.get_entry(1).expect_err("nothing stored");
    assert!(err.is_not_found());
}

#[test]
fn test_get_entry_surfaces_corruption() {
    use crate::convert::index_to_key;
    use crate::engine::Engine;

    let engine = Arc::new(MemEngine::default());
    let store = RaftStore::with_engine(engine.clone(), &StoreOptions::new("unused"))
        .expect("should assemble store");

    // Damage the bytes under a log key behind the store's back.
    let mut txn = engine.begin_write().expect("should begin write");
    txn.put(&index_to_key(3), b"not an entry").expect("should stage");
    txn.commit().expect("should commit");

    let err = store.get_entry(3).expect_err("damaged bytes must not decode");
    assert!(matches!(
        err,
        crate::Error::Storage(crate::StorageError::Corrupt { .. })
    ));
}

#[test]
fn test_store_entry_overwrites_same_index() {
    let store = mem_store();
    store.store_entry(&sample_entry(1)).expect("should store");

    let replacement = Entry::new(1, 2, EntryType::Noop, Vec::new());
    store.store_entry(&replacement).expect("should overwrite");

    assert_eq!(store.get_entry(1).expect("should fetch"), replacement);
    assert_eq!(store.last_index().expect("should read"), 1);
}

#[test]
fn test_store_entries_batch_is_all_or_nothing() {
    let store = mem_store_with(MemEngineOptions {
        max_txn_ops: 2,
        ..Default::default()
    });

    let entries: Vec<Entry> = (1..=3).map(sample_entry).collect();
    let err = store.store_entries(&entries).expect_err("batch exceeds the txn ceiling");
    assert!(matches!(err, crate::Error::Storage(crate::StorageError::TxnTooLarge)));

    // The aborted transaction left nothing behind.
    assert_eq!(store.first_index().expect("should read"), 0);
}

#[test]
fn test_delete_range_keeps_entries_outside_the_range() {
    let store = mem_store();
    let entries: Vec<Entry> = (1..=3).map(sample_entry).collect();
    store.store_entries(&entries).expect("should store");

    store.delete_range(1, 2).expect("should delete");

    assert!(store.get_entry(1).expect_err("deleted").is_not_found());
    assert!(store.get_entry(2).expect_err("deleted").is_not_found());
    assert_eq!(store.get_entry(3).expect("kept"), sample_entry(3));
    assert_eq!(store.first_index().expect("should read"), 3);
    assert_eq!(store.last_index().expect("should read"), 3);
}

#[test]
fn test_delete_range_is_idempotent() {
    let store = mem_store();
    let entries: Vec<Entry> = (1..=3).map(sample_entry).collect();
    store.store_entries(&entries).expect("should store");

    store.delete_range(1, 2).expect("should delete");
    store.delete_range(1, 2).expect("re-issuing the same range is a no-op");

    assert_eq!(store.first_index().expect("should read"), 3);
}

#[test]
fn test_delete_range_on_empty_log() {
    let store = mem_store();
    store.delete_range(1, 100).expect("deleting absent keys is a no-op");
    store.delete_range(7, 3).expect("inverted bounds are a no-op");
}

#[test]
fn test_delete_range_splits_into_multiple_commits() {
    let engine = Arc::new(MemEngine::new(MemEngineOptions {
        max_txn_ops: 3,
        ..Default::default()
    }));
    let store = RaftStore::with_engine(engine.clone(), &StoreOptions::new("unused"))
        .expect("should assemble store");

    for index in 1..=10 {
        store.store_entry(&sample_entry(index)).expect("should store");
    }

    let commits_before = engine.commit_count();
    store.delete_range(1, 10).expect("should delete the whole range");
    let delete_commits = engine.commit_count() - commits_before;

    assert!(
        delete_commits > 1,
        "a range wider than the txn ceiling must commit more than once, got {delete_commits}"
    );
    assert_eq!(store.first_index().expect("should read"), 0);
    assert_eq!(store.last_index().expect("should read"), 0);
}

#[test]
fn test_stable_set_get_round_trip() {
    let store = mem_store();
    store.set(b"CurrentTerm", b"7").expect("should set");
    assert_eq!(store.get(b"CurrentTerm").expect("should get"), b"7".to_vec());

    store.set(b"CurrentTerm", b"8").expect("should overwrite");
    assert_eq!(store.get(b"CurrentTerm").expect("should get"), b"8".to_vec());
}

#[test]
fn test_stable_get_missing_is_not_found() {
    let store = mem_store();
    assert!(store.get(b"VotedFor").expect_err("never set").is_not_found());
    assert!(store.get_u64(b"CurrentTerm").expect_err("never set").is_not_found());
}

#[test]
fn test_stable_u64_round_trip() {
    let store = mem_store();
    for value in [0u64, 42, u64::MAX] {
        store.set_u64(b"CurrentTerm", value).expect("should set");
        assert_eq!(store.get_u64(b"CurrentTerm").expect("should get"), value);
    }
}

#[test]
fn test_log_and_stable_namespaces_are_disjoint() {
    let store = mem_store();
    store.store_entry(&sample_entry(5)).expect("should store");

    // A stable key equal to the 8-byte encoding of index 5 must not
    // shadow or clobber the log entry.
    let tricky_key = 5u64.to_be_bytes();
    store.set_u64(&tricky_key, 777).expect("should set");

    assert_eq!(store.get_entry(5).expect("should fetch"), sample_entry(5));
    assert_eq!(store.get_u64(&tricky_key).expect("should get"), 777);

    store.delete_range(5, 5).expect("should delete");
    assert!(store.get_entry(5).expect_err("deleted").is_not_found());
    assert_eq!(store.get_u64(&tricky_key).expect("fact survives log deletes"), 777);
}

#[tokio::test]
async fn test_operations_fail_after_close() {
    let store = mem_store();
    store.store_entry(&sample_entry(1)).expect("should store");
    store.close().await.expect("first close succeeds");

    assert!(store.get_entry(1).expect_err("closed").is_closed());
    assert!(store.store_entry(&sample_entry(2)).expect_err("closed").is_closed());
    assert!(store.first_index().expect_err("closed").is_closed());
    assert!(store.set(b"k", b"v").expect_err("closed").is_closed());
    assert!(store.get(b"k").expect_err("closed").is_closed());
    assert!(store.delete_range(1, 1).expect_err("closed").is_closed());
}

#[tokio::test]
async fn test_double_close_is_an_error() {
    let store = mem_store();
    store.close().await.expect("first close succeeds");
    assert!(store.close().await.expect_err("second close").is_closed());
}

#[test]
fn test_mock_log_store_substitutes_for_the_real_one() {
    let mut mock = MockLogStore::new();
    mock.expect_last_index().returning(|| Ok(7));

    fn newest_index(log: &dyn LogStore) -> u64 {
        log.last_index().unwrap_or(0)
    }
    assert_eq!(newest_index(&mock), 7);
}

//-----------------------------------------------------------
// sled-backed store

fn sled_options(dir: &tempfile::TempDir) -> StoreOptions {
    StoreOptions::new(dir.path())
}

#[test]
fn test_sled_store_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    {
        let store = RaftStore::open(sled_options(&dir)).expect("should open");
        let entries: Vec<Entry> = (1..=3).map(sample_entry).collect();
        store.store_entries(&entries).expect("should store");
        store.set_u64(b"CurrentTerm", 9).expect("should set");
    }

    let store = RaftStore::open(sled_options(&dir)).expect("should reopen");
    assert_eq!(store.first_index().expect("should read"), 1);
    assert_eq!(store.last_index().expect("should read"), 3);
    assert_eq!(store.get_entry(2).expect("should fetch"), sample_entry(2));
    assert_eq!(store.get_u64(b"CurrentTerm").expect("should get"), 9);
}

#[test]
fn test_sled_store_read_only_rejects_writes_serves_reads() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    {
        let store = RaftStore::open(sled_options(&dir)).expect("should open");
        store.store_entry(&sample_entry(1)).expect("should store");
    }

    let mut options = sled_options(&dir);
    options.read_only = true;
    let store = RaftStore::open(options).expect("should open read-only");

    assert!(store.store_entry(&sample_entry(2)).expect_err("read-only").is_read_only());
    assert!(store.set(b"k", b"v").expect_err("read-only").is_read_only());
    assert!(store.delete_range(1, 1).expect_err("read-only").is_read_only());

    assert_eq!(store.get_entry(1).expect("reads still work"), sample_entry(1));
    assert_eq!(store.last_index().expect("reads still work"), 1);
}

#[test]
fn test_sled_store_delete_range_chunked() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let mut options = sled_options(&dir);
    options.engine.max_txn_ops = 4;
    let store = RaftStore::open(options).expect("should open");

    let entries: Vec<Entry> = (1..=4).map(sample_entry).collect();
    store.store_entries(&entries).expect("batch of 4 fits exactly");
    for index in 5..=12 {
        store.store_entry(&sample_entry(index)).expect("should store");
    }

    store.delete_range(2, 11).expect("should delete across commits");
    assert_eq!(store.first_index().expect("should read"), 1);
    assert_eq!(store.last_index().expect("should read"), 12);
    assert!(store.get_entry(7).expect_err("deleted").is_not_found());
}
