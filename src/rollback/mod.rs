//! Rollback planning.
//!
//! A rollback undoes every migration from the newest down to and including
//! the target. Planning is separate from applying: the plan is computed and
//! validated against protection marks without touching anything, and only
//! an explicit apply deletes migration files and prunes state.

use crate::error::{Error, Result};
use crate::state::enhanced::EnhancedState;
use crate::state::SqlSyncState;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Migrations to undo for `target`, newest first, target included.
///
/// Fails when the target is unknown or when any migration in the range is
/// marked; a failed plan mutates nothing.
pub fn plan(state: &SqlSyncState, enhanced: &EnhancedState, target: &str) -> Result<Vec<String>> {
    if !state.contains(target) {
        return Err(Error::RollbackUnknownTarget(target.to_string()));
    }
    let mut names: Vec<String> = state
        .names()
        .filter(|name| *name >= target)
        .map(String::from)
        .collect();
    names.reverse();

    for name in &names {
        if enhanced.migration(name).is_some_and(|m| m.marked) {
            return Err(Error::RollbackProtected(name.clone()));
        }
    }
    Ok(names)
}

/// Apply a validated plan: delete the migration files and prune both state
/// views. The caller saves the state afterwards.
pub fn apply(
    migrations_dir: &Path,
    state: &mut SqlSyncState,
    enhanced: &mut EnhancedState,
    plan: &[String],
) -> Result<()> {
    for name in plan {
        let path = migrations_dir.join(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        state.snapshots.remove(name);
        info!("rolled back {name}");
    }
    enhanced.retain_migrations(|name| state.contains(name));
    Ok(())
}

/// Mark a migration as protected from rollback.
///
/// Returns `false` (refusing, with a warning) when the mark would push the
/// number of simultaneously marked migrations past `max_rollbacks`.
pub fn mark(enhanced: &mut EnhancedState, name: &str, max_rollbacks: usize) -> Result<bool> {
    let already_marked = enhanced.marked().len();
    let Some(migration) = enhanced.migration_mut(name) else {
        return Err(Error::RollbackUnknownTarget(name.to_string()));
    };
    if migration.marked {
        return Ok(true);
    }
    if already_marked >= max_rollbacks {
        warn!("refusing to mark {name}: {already_marked} migrations already marked (max {max_rollbacks})");
        return Ok(false);
    }
    migration.marked = true;
    Ok(true)
}

/// Remove a protection mark. Returns `false` when it was not marked.
pub fn unmark(enhanced: &mut EnhancedState, name: &str) -> Result<bool> {
    let Some(migration) = enhanced.migration_mut(name) else {
        return Err(Error::RollbackUnknownTarget(name.to_string()));
    };
    let was_marked = migration.marked;
    migration.marked = false;
    Ok(was_marked)
}

/// One row of the `rollback --list` output.
#[derive(Debug, Clone)]
pub struct MigrationListing {
    pub name: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub marked: bool,
    pub applied_locally: bool,
}

/// Enumerate every known migration with its status. Never mutates.
pub fn list(
    state: &SqlSyncState,
    enhanced: &EnhancedState,
    ledger: &[String],
) -> Vec<MigrationListing> {
    state
        .names()
        .map(|name| {
            let info = enhanced.migration(name);
            MigrationListing {
                name: name.to_string(),
                timestamp: info.map(|m| m.timestamp),
                author: info.and_then(|m| m.author.clone()),
                marked: info.is_some_and(|m| m.marked),
                applied_locally: ledger.iter().any(|l| l == name),
            }
        })
        .collect()
}
