//! Snapshot state persistence.
//!
//! `sqlsync-state.json` holds one [`MigrationSnapshot`] per generated
//! migration, keyed by migration filename. Keys sort lexicographically,
//! which for timestamped filenames is chronological order; the greatest key
//! is the baseline the next diff runs against. Snapshots are immutable once
//! written and removed only by rollback.

pub mod enhanced;
pub mod ledger;

use crate::error::{Error, Result};
use crate::parser::{FileKind, ParsedFile};
use crate::schema::TableDefinition;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::Path;

/// State file name, resolved against the config directory.
pub const STATE_FILE: &str = "sqlsync-state.json";

/// Checksum record for a whole-content file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChecksum {
    pub checksum: String,
}

/// Everything needed to reproduce a diff against the tree as it looked when
/// one migration was generated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationSnapshot {
    /// Whole-file checksums for `fileContent` files.
    pub file_content_checksums: BTreeMap<String, FileChecksum>,
    /// Ordered statement checksums for `splitStatements` files.
    pub split_statements: BTreeMap<String, Vec<String>>,
    /// Structural snapshots for `declarativeTable` files.
    pub declarative_tables: BTreeMap<String, TableDefinition>,
}

impl MigrationSnapshot {
    /// Capture the current parse results.
    pub fn from_parsed(files: &[ParsedFile]) -> Self {
        let mut snapshot = Self::default();
        for file in files {
            match &file.kind {
                FileKind::FileContent { checksum } => {
                    snapshot.file_content_checksums.insert(
                        file.path.clone(),
                        FileChecksum {
                            checksum: checksum.clone(),
                        },
                    );
                }
                FileKind::SplitStatements(statements) => {
                    snapshot.split_statements.insert(
                        file.path.clone(),
                        statements.iter().map(|s| s.checksum.clone()).collect(),
                    );
                }
                FileKind::DeclarativeTable(table) => {
                    snapshot
                        .declarative_tables
                        .insert(file.path.clone(), table.clone());
                }
            }
        }
        snapshot
    }

    /// Union of tracked paths across the three sections.
    pub fn paths(&self) -> BTreeSet<&str> {
        self.file_content_checksums
            .keys()
            .chain(self.split_statements.keys())
            .chain(self.declarative_tables.keys())
            .map(String::as_str)
            .collect()
    }
}

/// The ordered snapshot mapping persisted as `sqlsync-state.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqlSyncState {
    pub snapshots: BTreeMap<String, MigrationSnapshot>,
}

impl SqlSyncState {
    /// The snapshot the next diff runs against: greatest migration name.
    pub fn latest(&self) -> Option<(&str, &MigrationSnapshot)> {
        self.snapshots
            .iter()
            .next_back()
            .map(|(name, snap)| (name.as_str(), snap))
    }

    pub fn contains(&self, migration: &str) -> bool {
        self.snapshots.contains_key(migration)
    }

    /// Migration filenames in chronological order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }
}

/// Load state from `<config_dir>/sqlsync-state.json`; a missing file is an
/// empty state, anything unreadable is `StateCorrupt`.
pub fn load(config_dir: &Path) -> Result<SqlSyncState> {
    let path = config_dir.join(STATE_FILE);
    if !path.exists() {
        debug!("no state file at {}, starting empty", path.display());
        return Ok(SqlSyncState::default());
    }
    let raw = fs::read_to_string(&path)?;
    serde_json::from_str(&raw).map_err(|e| Error::StateCorrupt {
        path,
        message: e.to_string(),
    })
}

/// Save state atomically (write-temp, rename).
pub fn save(config_dir: &Path, state: &SqlSyncState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).map_err(|e| Error::StateCorrupt {
        path: config_dir.join(STATE_FILE),
        message: e.to_string(),
    })?;
    write_atomic(&config_dir.join(STATE_FILE), &json)
}

/// Write-temp-then-rename in the destination directory, so readers never
/// observe a half-written file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
