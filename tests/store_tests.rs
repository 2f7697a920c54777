//! Tests for value-store read/write behavior
//!
//! These tests verify:
//! - Read-through visibility: a write is visible to an immediate read
//! - Bitwise change detection (no approximate float equality)
//! - NaN/Inf forced writes
//! - Motion-guard refusal with no side effects
//! - The disk-backed media end to end

use nvstore::{
    Config, FileStore, FlushOutcome, ManualTicks, MemMedia, MotionFlag, StoreError, WriteStatus,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct Rig {
    store: FileStore<MemMedia>,
    media: MemMedia,
    flag: MotionFlag,
    ticks: ManualTicks,
}

fn setup(min_interval_ms: u64) -> Rig {
    let media = MemMedia::new();
    let flag = MotionFlag::new();
    let ticks = ManualTicks::new();
    let store = FileStore::new(
        media.clone(),
        Box::new(flag.clone()),
        Box::new(ticks.clone()),
        Config::builder().min_commit_interval_ms(min_interval_ms).build(),
    );
    Rig {
        store,
        media,
        flag,
        ticks,
    }
}

/// Fresh store over the same media, as after a power cycle.
fn reboot(rig: &Rig) -> FileStore<MemMedia> {
    FileStore::new(
        rig.media.clone(),
        Box::new(MotionFlag::new()),
        Box::new(ManualTicks::new()),
        Config::builder().min_commit_interval_ms(0).build(),
    )
}

fn commit(rig: &mut Rig) {
    rig.ticks.advance(60_000);
    assert_eq!(rig.store.flush().unwrap(), FlushOutcome::Committed);
}

// =============================================================================
// Read/Write Basics
// =============================================================================

#[test]
fn test_read_with_no_persisted_data_fails() {
    let mut rig = setup(0);
    assert!(matches!(rig.store.read_value(0), Err(StoreError::NoData)));
}

#[test]
fn test_write_is_visible_to_immediate_read() {
    let mut rig = setup(0);
    assert_eq!(rig.store.write_value(5, 2.5).unwrap(), WriteStatus::Accepted);
    assert_eq!(rig.store.read_value(5).unwrap(), 2.5);
}

#[test]
fn test_repeated_write_of_same_value_is_unchanged() {
    let mut rig = setup(0);
    rig.store.write_value(5, 2.5).unwrap();
    // second request matches the pending entry bit-for-bit
    assert_eq!(rig.store.write_value(5, 2.5).unwrap(), WriteStatus::Unchanged);
    assert_eq!(rig.store.pending_writes(), 1);
}

#[test]
fn test_write_matching_durable_value_creates_no_cache_entry() {
    let mut rig = setup(0);
    rig.store.write_value(7, 12.0).unwrap();
    commit(&mut rig);
    assert_eq!(rig.store.pending_writes(), 0);

    assert_eq!(rig.store.write_value(7, 12.0).unwrap(), WriteStatus::Unchanged);
    assert_eq!(rig.store.pending_writes(), 0);
}

/// The worked scenario: 12.0 durable at index 7; 15.5 lands in the cache and
/// is what the caller reads, while media still holds 12.0 until the next
/// commit.
#[test]
fn test_pending_write_shadows_durable_value() {
    let mut rig = setup(0);
    rig.store.write_value(7, 12.0).unwrap();
    commit(&mut rig);

    assert_eq!(rig.store.write_value(7, 15.5).unwrap(), WriteStatus::Accepted);
    assert_eq!(rig.store.pending_writes(), 1);
    assert_eq!(rig.store.read_value(7).unwrap(), 15.5);

    // a power cycle before the next commit still sees 12.0
    let mut rebooted = reboot(&rig);
    assert_eq!(rebooted.read_value(7).unwrap(), 12.0);
}

#[test]
fn test_bitwise_comparison_distinguishes_nan_payloads() {
    let mut rig = setup(0);
    // two different bit patterns that are numerically "equal" would defeat
    // sentinel storage; -0.0 vs 0.0 is the classic case
    rig.store.write_value(3, 0.0).unwrap();
    commit(&mut rig);
    assert_eq!(rig.store.write_value(3, -0.0).unwrap(), WriteStatus::Accepted);
    assert_eq!(rig.store.pending_writes(), 1);
}

#[test]
fn test_nan_and_inf_are_always_forced_through() {
    let mut rig = setup(0);
    assert_eq!(
        rig.store.write_value(2, f32::NAN).unwrap(),
        WriteStatus::Accepted
    );
    assert!(rig.store.read_value(2).unwrap().is_nan());
    // forcing again is never Unchanged
    assert_eq!(
        rig.store.write_value(2, f32::NAN).unwrap(),
        WriteStatus::Accepted
    );
    assert_eq!(
        rig.store.write_value(2, f32::INFINITY).unwrap(),
        WriteStatus::Accepted
    );
}

// =============================================================================
// Motion Guard
// =============================================================================

#[test]
fn test_write_during_motion_is_refused_without_side_effects() {
    let mut rig = setup(0);
    rig.flag.set_moving(true);
    assert_eq!(rig.store.write_value(1, 9.0).unwrap(), WriteStatus::Busy);
    assert_eq!(rig.store.pending_writes(), 0);
    assert!(rig.media.file_names().is_empty());

    rig.flag.set_moving(false);
    assert_eq!(rig.store.write_value(1, 9.0).unwrap(), WriteStatus::Accepted);
}

#[test]
fn test_flush_during_motion_is_deferred_without_side_effects() {
    let mut rig = setup(1000);
    rig.store.write_value(1, 9.0).unwrap();
    rig.ticks.advance(60_000);

    rig.flag.set_moving(true);
    assert_eq!(rig.store.flush().unwrap(), FlushOutcome::Busy);
    assert_eq!(rig.store.pending_writes(), 1);
    assert!(rig.media.file_names().is_empty());

    // deferral does not stamp the clock: the commit runs as soon as motion
    // stops, without waiting out another interval
    rig.flag.set_moving(false);
    assert_eq!(rig.store.flush().unwrap(), FlushOutcome::Committed);
}

// =============================================================================
// Disk-Backed Media
// =============================================================================

#[test]
fn test_disk_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = Config::builder().min_commit_interval_ms(0).build();

    let mut store = FileStore::open_path(dir.path(), config.clone());
    store.write_value(0, 1.25).unwrap();
    store.write_value(9, -40.0).unwrap();
    assert_eq!(store.flush().unwrap(), FlushOutcome::Committed);
    drop(store);

    let mut store = FileStore::open_path(dir.path(), config);
    assert_eq!(store.read_value(0).unwrap(), 1.25);
    assert_eq!(store.read_value(9).unwrap(), -40.0);
    store.verify().unwrap();
}
