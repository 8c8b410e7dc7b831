//! Unit tests for the collaboration manager.
//!
//! Tests cover:
//! - new / removed migration classification
//! - Conflict detection via migration headers vs locally modified files
//! - Non-migration files in the directory are ignored
//! - The report never mutates state

use sqlsync::collab::{list_migration_files, report};
use sqlsync::state::{MigrationSnapshot, SqlSyncState};
use std::fs;
use tempfile::TempDir;

const M1: &str = "20240101000000_m1.sql";
const M2: &str = "20240201000000_m2.sql";

fn state_with(names: &[&str]) -> SqlSyncState {
    let mut state = SqlSyncState::default();
    for name in names {
        state
            .snapshots
            .insert(name.to_string(), MigrationSnapshot::default());
    }
    state
}

#[test]
fn test_missing_directory_is_empty() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("migrations");
    assert!(list_migration_files(&missing).unwrap().is_empty());
    let rep = report(&state_with(&[]), &missing, &[]).unwrap();
    assert!(rep.is_clean());
}

#[test]
fn test_non_migration_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("README.md"), "notes").unwrap();
    fs::write(dir.path().join("partial.sql"), "SELECT 1;").unwrap();
    fs::write(dir.path().join(M1), "-- SQLSync Migration: m1\n").unwrap();
    assert_eq!(list_migration_files(dir.path()).unwrap(), vec![M1]);
}

#[test]
fn test_new_and_removed_classification() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(M2), "-- SQLSync Migration: m2\n").unwrap();
    let rep = report(&state_with(&[M1]), dir.path(), &[]).unwrap();
    assert_eq!(rep.new_migrations, vec![M2]);
    assert_eq!(rep.removed_migrations, vec![M1]);
    assert!(!rep.has_conflicts());
}

#[test]
fn test_conflict_requires_overlap_with_local_edits() {
    let dir = TempDir::new().unwrap();
    let body = "-- SQLSync Migration: m2\n-- Generated: 2024-02-01T00:00:00Z\n\n\
                -- Modified File: schema/tables/users/table.sql\n\
                -- NOTE: File is declarative. Generated ALTER TABLE statements for incremental changes.\n";
    fs::write(dir.path().join(M2), body).unwrap();

    // No local edits: a new migration is a warning, not a conflict.
    let rep = report(&state_with(&[M1]), dir.path(), &[]).unwrap();
    assert!(!rep.has_conflicts());

    // Overlapping local edit: conflict.
    let local = vec!["schema/tables/users/table.sql".to_string()];
    let rep = report(&state_with(&[M1]), dir.path(), &local).unwrap();
    assert!(rep.has_conflicts());
    assert_eq!(rep.conflicts[0].migration, M2);
    assert_eq!(rep.conflicts[0].files, local);
    assert!(rep.conflict_summary().contains(M2));

    // Disjoint local edit: no conflict.
    let other = vec!["schema/functions/utils.sql".to_string()];
    let rep = report(&state_with(&[M1]), dir.path(), &other).unwrap();
    assert!(!rep.has_conflicts());
}

#[test]
fn test_known_migrations_are_not_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(M1), "-- SQLSync Migration: m1\n").unwrap();
    let rep = report(&state_with(&[M1]), dir.path(), &[]).unwrap();
    assert!(rep.is_clean());
    assert!(!rep.has_conflicts());
}
