use crate::entry::Entry;
use crate::entry::EntryType;
use crate::StorageError;

#[test]
fn test_entry_codec_round_trip() {
    let entry = Entry {
        index: 42,
        term: 7,
        entry_type: EntryType::Configuration,
        payload: b"voter:3@node-c".to_vec(),
        extensions: vec![0xde, 0xad],
    };

    let bytes = entry.encode().expect("should encode");
    let decoded = Entry::decode(&bytes).expect("should decode");
    assert_eq!(entry, decoded);
}

#[test]
fn test_entry_codec_round_trip_empty_payload() {
    let entry = Entry::new(1, 1, EntryType::Noop, Vec::new());
    let bytes = entry.encode().expect("should encode");
    assert_eq!(Entry::decode(&bytes).expect("should decode"), entry);
}

#[test]
fn test_entry_decode_rejects_garbage() {
    let err = Entry::decode(&[0xff; 3]).expect_err("garbage is not an entry");
    assert!(matches!(err, StorageError::Corrupt { .. }));
}

#[test]
fn test_entry_decode_at_records_key() {
    let key = vec![1u8, 0, 0, 0, 0, 0, 0, 0, 9];
    let err = Entry::decode_at(&key, &[0xff; 3]).expect_err("garbage is not an entry");
    match err {
        StorageError::Corrupt { key: reported, .. } => assert_eq!(reported, key),
        other => panic!("unexpected error: {other:?}"),
    }
}
