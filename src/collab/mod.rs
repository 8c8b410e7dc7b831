//! Migrations-directory reconciliation.
//!
//! Other developers generate migrations too; after a pull the directory
//! and the local state disagree. This module classifies the disagreement:
//! migrations on disk the state has never seen, state entries whose files
//! vanished, and the dangerous overlap — a foreign migration touching files
//! the local tree has also modified. The report never mutates anything;
//! acting on it is the command layer's job.

use crate::error::Result;
use crate::naming::is_migration_filename;
use crate::renderer::touched_files;
use crate::state::SqlSyncState;
use ahash::AHashSet;
use log::debug;
use std::fs;
use std::path::Path;

/// A foreign migration overlapping local edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The new-on-disk migration filename.
    pub migration: String,
    /// Locally modified files it also touches.
    pub files: Vec<String>,
}

/// Outcome of comparing the migrations directory with the state.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// On disk, unknown to the state (pulled from elsewhere).
    pub new_migrations: Vec<String>,
    /// Known to the state, missing on disk.
    pub removed_migrations: Vec<String>,
    /// New migrations overlapping locally modified files.
    pub conflicts: Vec<Conflict>,
}

impl SyncReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Nothing to reconcile.
    pub fn is_clean(&self) -> bool {
        self.new_migrations.is_empty() && self.removed_migrations.is_empty()
    }

    /// One-line conflict summary for error messages.
    pub fn conflict_summary(&self) -> String {
        self.conflicts
            .iter()
            .map(|c| format!("{} overlaps [{}]", c.migration, c.files.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Well-formed migration filenames present in the directory, sorted.
/// A missing directory is an empty list.
pub fn list_migration_files(migrations_dir: &Path) -> Result<Vec<String>> {
    if !migrations_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(migrations_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_file() && is_migration_filename(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Build the reconciliation report.
///
/// `locally_modified` is the set of paths the current tree changed since
/// the last snapshot; a new migration conflicts when the file list scanned
/// from its headers intersects it.
pub fn report(
    state: &SqlSyncState,
    migrations_dir: &Path,
    locally_modified: &[String],
) -> Result<SyncReport> {
    let on_disk = list_migration_files(migrations_dir)?;
    let disk_set: AHashSet<&str> = on_disk.iter().map(String::as_str).collect();
    let modified_set: AHashSet<&str> = locally_modified.iter().map(String::as_str).collect();

    let new_migrations: Vec<String> = on_disk
        .iter()
        .filter(|name| !state.contains(name))
        .cloned()
        .collect();
    let removed_migrations: Vec<String> = state
        .names()
        .filter(|name| !disk_set.contains(name))
        .map(String::from)
        .collect();

    let mut conflicts = Vec::new();
    for name in &new_migrations {
        let content = fs::read_to_string(migrations_dir.join(name))?;
        let overlap: Vec<String> = touched_files(&content)
            .into_iter()
            .filter(|path| modified_set.contains(path.as_str()))
            .collect();
        if !overlap.is_empty() {
            conflicts.push(Conflict {
                migration: name.clone(),
                files: overlap,
            });
        }
    }

    debug!(
        "sync report: {} new, {} removed, {} conflicts",
        new_migrations.len(),
        removed_migrations.len(),
        conflicts.len()
    );

    Ok(SyncReport {
        new_migrations,
        removed_migrations,
        conflicts,
    })
}
