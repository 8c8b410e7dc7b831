//! Unit tests for rollback planning.
//!
//! Tests cover:
//! - Inclusive plan ranges in descending order
//! - Protection marks blocking plans (target included)
//! - Unknown targets
//! - Mark limits and unmarking
//! - Listing without mutation
//! - Applying a plan (file deletion + state pruning)

use chrono::Utc;
use sqlsync::error::Error;
use sqlsync::rollback;
use sqlsync::state::{enhanced, MigrationSnapshot, SqlSyncState};
use std::fs;
use tempfile::TempDir;

const M1: &str = "20240101000000_m1.sql";
const M2: &str = "20240201000000_m2.sql";
const M3: &str = "20240301000000_m3.sql";
const M4: &str = "20240401000000_m4.sql";

fn fixture(marked: &[&str]) -> (SqlSyncState, enhanced::EnhancedState) {
    let mut state = SqlSyncState::default();
    let mut enh = enhanced::EnhancedState::default();
    for name in [M1, M2, M3, M4] {
        state
            .snapshots
            .insert(name.to_string(), MigrationSnapshot::default());
        enh.record_migration(enhanced::MigrationInfo {
            name: name.to_string(),
            timestamp: Utc::now(),
            applied_changes: vec![],
            author: Some("dev".into()),
            marked: marked.contains(&name),
        });
    }
    (state, enh)
}

// =============================================================================
// Planning
// =============================================================================

#[test]
fn test_plan_is_inclusive_and_descending() {
    let (state, enh) = fixture(&[]);
    assert_eq!(rollback::plan(&state, &enh, M3).unwrap(), vec![M4, M3]);
    assert_eq!(rollback::plan(&state, &enh, M1).unwrap(), vec![M4, M3, M2, M1]);
    assert_eq!(rollback::plan(&state, &enh, M4).unwrap(), vec![M4]);
}

#[test]
fn test_unknown_target_fails() {
    let (state, enh) = fixture(&[]);
    let err = rollback::plan(&state, &enh, "20990101000000_nope.sql").unwrap_err();
    assert!(matches!(err, Error::RollbackUnknownTarget(_)));
}

#[test]
fn test_marked_migration_blocks_plan() {
    let (state, enh) = fixture(&[M3]);
    // M3 sits inside the inclusive range of a rollback to M2.
    let err = rollback::plan(&state, &enh, M2).unwrap_err();
    assert!(matches!(err, Error::RollbackProtected(name) if name == M3));
}

#[test]
fn test_marked_target_blocks_its_own_plan() {
    let (state, enh) = fixture(&[M3]);
    let err = rollback::plan(&state, &enh, M3).unwrap_err();
    assert!(matches!(err, Error::RollbackProtected(name) if name == M3));
}

#[test]
fn test_plan_below_marked_range_is_allowed() {
    let (state, enh) = fixture(&[M2]);
    assert_eq!(rollback::plan(&state, &enh, M3).unwrap(), vec![M4, M3]);
}

// =============================================================================
// Marks
// =============================================================================

#[test]
fn test_mark_and_unmark() {
    let (_, mut enh) = fixture(&[]);
    assert!(rollback::mark(&mut enh, M2, 3).unwrap());
    assert!(enh.migration(M2).unwrap().marked);
    assert!(rollback::unmark(&mut enh, M2).unwrap());
    assert!(!enh.migration(M2).unwrap().marked);
}

#[test]
fn test_mark_limit_is_enforced() {
    let (_, mut enh) = fixture(&[]);
    assert!(rollback::mark(&mut enh, M1, 2).unwrap());
    assert!(rollback::mark(&mut enh, M2, 2).unwrap());
    // Third mark exceeds the cap and is refused without mutating.
    assert!(!rollback::mark(&mut enh, M3, 2).unwrap());
    assert!(!enh.migration(M3).unwrap().marked);
}

#[test]
fn test_marking_marked_migration_is_idempotent() {
    let (_, mut enh) = fixture(&[M1]);
    assert!(rollback::mark(&mut enh, M1, 1).unwrap());
}

#[test]
fn test_mark_unknown_migration_fails() {
    let (_, mut enh) = fixture(&[]);
    let err = rollback::mark(&mut enh, "20990101000000_nope.sql", 3).unwrap_err();
    assert!(matches!(err, Error::RollbackUnknownTarget(_)));
}

// =============================================================================
// Listing
// =============================================================================

#[test]
fn test_list_reports_status_without_mutation() {
    let (state, enh) = fixture(&[M2]);
    let applied = vec![M1.to_string()];
    let listing = rollback::list(&state, &enh, &applied);
    assert_eq!(listing.len(), 4);
    assert_eq!(listing[0].name, M1);
    assert!(listing[0].applied_locally);
    assert!(!listing[0].marked);
    assert!(listing[1].marked);
    assert_eq!(listing[1].author.as_deref(), Some("dev"));
    assert!(listing[1].timestamp.is_some());
}

// =============================================================================
// Applying
// =============================================================================

#[test]
fn test_apply_deletes_files_and_prunes_state() {
    let dir = TempDir::new().unwrap();
    let (mut state, mut enh) = fixture(&[]);
    for name in [M1, M2, M3, M4] {
        fs::write(dir.path().join(name), "-- SQLSync Migration: x\n").unwrap();
    }

    let plan = rollback::plan(&state, &enh, M3).unwrap();
    rollback::apply(dir.path(), &mut state, &mut enh, &plan).unwrap();

    assert!(!dir.path().join(M4).exists());
    assert!(!dir.path().join(M3).exists());
    assert!(dir.path().join(M2).exists());
    let names: Vec<&str> = state.names().collect();
    assert_eq!(names, vec![M1, M2]);
    assert!(enh.migration(M3).is_none());
    assert!(enh.migration(M2).is_some());
}
