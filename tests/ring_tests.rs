//! Tests for active-file selection and prepare semantics
//!
//! These tests verify:
//! - Which ring slot is treated as authoritative for reads
//! - Deletion of the superseded slot once the current file validates
//! - Deletion of corrupt files (never partially trusted)
//! - Handle revalidation when the medium changes under an open handle

use nvstore::{Config, FileStore, ManualTicks, MemMedia, MotionFlag, StoreError};

const SLOT0: &str = "persist/persist0.bin";
const SLOT1: &str = "persist/persist1.bin";
const SLOT2: &str = "persist/persist2.bin";

// =============================================================================
// Helper Functions
// =============================================================================

fn store_over(media: &MemMedia) -> FileStore<MemMedia> {
    FileStore::new(
        media.clone(),
        Box::new(MotionFlag::new()),
        Box::new(ManualTicks::new()),
        Config::builder().min_commit_interval_ms(0).build(),
    )
}

/// A well-formed persistence file holding `values` at indices 0.., trailer
/// included.
fn valid_file_bytes(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4 + 4);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes);
    let crc = hasher.finalize();
    bytes.extend_from_slice(&crc.to_le_bytes());
    bytes
}

fn corrupt_file_bytes(values: &[f32]) -> Vec<u8> {
    let mut bytes = valid_file_bytes(values);
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    bytes
}

// =============================================================================
// Active-Slot Selection
// =============================================================================

#[test]
fn test_single_file_is_read() {
    let media = MemMedia::new();
    media.set_contents(SLOT0, valid_file_bytes(&[1.0, 2.0]));
    let mut store = store_over(&media);
    assert_eq!(store.read_value(1).unwrap(), 2.0);
}

#[test]
fn test_forward_neighbor_wins_and_superseded_slot_is_deleted() {
    let media = MemMedia::new();
    media.set_contents(SLOT0, valid_file_bytes(&[1.0]));
    media.set_contents(SLOT1, valid_file_bytes(&[9.0]));

    let mut store = store_over(&media);
    // slot 1 was written by a commit that started from slot 0: more recent
    assert_eq!(store.read_value(0).unwrap(), 9.0);
    // slot 0 validated-away: the rotation provably completed
    assert!(!media.file_names().contains(&SLOT0.to_string()));
}

#[test]
fn test_wrapped_pair_prefers_slot_zero() {
    let media = MemMedia::new();
    media.set_contents(SLOT2, valid_file_bytes(&[1.0]));
    media.set_contents(SLOT0, valid_file_bytes(&[9.0]));

    let mut store = store_over(&media);
    assert_eq!(store.read_value(0).unwrap(), 9.0);
    assert!(!media.file_names().contains(&SLOT2.to_string()));
}

// =============================================================================
// Integrity Handling
// =============================================================================

#[test]
fn test_corrupt_file_is_deleted_not_repaired() {
    let media = MemMedia::new();
    media.set_contents(SLOT0, corrupt_file_bytes(&[1.0, 2.0]));

    let mut store = store_over(&media);
    assert!(matches!(
        store.read_value(0),
        Err(StoreError::Integrity(_))
    ));
    assert!(media.file_names().is_empty());
    // nothing valid remains: subsequent reads report no data
    assert!(matches!(store.read_value(0), Err(StoreError::NoData)));
}

#[test]
fn test_corrupt_newer_file_falls_back_to_older() {
    let media = MemMedia::new();
    media.set_contents(SLOT1, valid_file_bytes(&[5.0]));
    media.set_contents(SLOT2, corrupt_file_bytes(&[6.0]));

    let mut store = store_over(&media);
    // first touch discards the torn newer file
    assert!(store.read_value(0).is_err());
    // the older copy is intact and becomes authoritative
    assert_eq!(store.read_value(0).unwrap(), 5.0);
    assert_eq!(media.file_names(), vec![SLOT1.to_string()]);
}

#[test]
fn test_open_handle_is_revalidated_on_every_use() {
    let media = MemMedia::new();
    media.set_contents(SLOT0, valid_file_bytes(&[5.0]));

    let mut store = store_over(&media);
    assert_eq!(store.read_value(0).unwrap(), 5.0);

    // the medium changes under the open handle (card swap, external writer)
    media.set_contents(SLOT0, corrupt_file_bytes(&[5.0]));
    assert!(matches!(
        store.read_value(0),
        Err(StoreError::Integrity(_))
    ));
    assert!(media.file_names().is_empty());
}

#[test]
fn test_truncated_file_counts_as_corrupt() {
    let media = MemMedia::new();
    media.set_contents(SLOT0, vec![0xAB; 3]); // shorter than the trailer
    let mut store = store_over(&media);
    assert!(matches!(
        store.read_value(0),
        Err(StoreError::Integrity(_))
    ));
    assert!(media.file_names().is_empty());
}
