//! Collaboration view of the state.
//!
//! Alongside the per-migration snapshots, `sqlsync-enhanced-state.json`
//! tracks file-level fingerprints (which migration last touched each file)
//! and a migration history with authorship and rollback-protection marks.
//! `MigrationInfo.marked` is the only field that ever mutates in place.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Enhanced state file name, resolved against the config directory.
pub const ENHANCED_STATE_FILE: &str = "sqlsync-enhanced-state.json";

/// Fingerprint of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Whole-file content checksum at the time of the last migration.
    pub checksum: String,
    /// Migration filename that last changed this file.
    pub last_modified_by: String,
}

/// One entry of the migration history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationInfo {
    /// Migration filename.
    pub name: String,
    /// When the migration was generated (or first observed).
    pub timestamp: DateTime<Utc>,
    /// Project-relative paths the migration touched.
    pub applied_changes: Vec<String>,
    /// Who generated it, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Protected from rollback.
    #[serde(default)]
    pub marked: bool,
}

/// Production deployment marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionMarker {
    pub last_applied: String,
    pub timestamp: DateTime<Utc>,
}

/// The collaboration layer of the state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancedState {
    /// Last time this file was written.
    pub last_updated: Option<DateTime<Utc>>,
    /// Per-file fingerprints.
    pub files: BTreeMap<String, FileRecord>,
    /// Migration history in generation order.
    pub migrations: Vec<MigrationInfo>,
    /// Production marker, when the operator records one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production: Option<ProductionMarker>,
}

impl EnhancedState {
    pub fn migration(&self, name: &str) -> Option<&MigrationInfo> {
        self.migrations.iter().find(|m| m.name == name)
    }

    pub fn migration_mut(&mut self, name: &str) -> Option<&mut MigrationInfo> {
        self.migrations.iter_mut().find(|m| m.name == name)
    }

    /// Append a migration record, keeping the history sorted by name.
    pub fn record_migration(&mut self, info: MigrationInfo) {
        self.migrations.retain(|m| m.name != info.name);
        self.migrations.push(info);
        self.migrations.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Refresh the fingerprints of the files a locally generated migration
    /// touched. Paths absent from `checksums` were deleted; their
    /// fingerprints go away with them.
    pub fn update_files(
        &mut self,
        migration: &str,
        touched: &[String],
        checksums: &BTreeMap<String, String>,
    ) {
        for path in touched {
            match checksums.get(path) {
                Some(checksum) => {
                    self.files.insert(
                        path.clone(),
                        FileRecord {
                            checksum: checksum.clone(),
                            last_modified_by: migration.to_string(),
                        },
                    );
                }
                None => {
                    self.files.remove(path);
                }
            }
        }
    }

    /// Drop history entries for migrations that no longer exist.
    pub fn retain_migrations(&mut self, keep: impl Fn(&str) -> bool) {
        self.migrations.retain(|m| keep(&m.name));
        self.files.retain(|_, rec| keep(&rec.last_modified_by));
    }

    /// Currently marked (rollback-protected) migration names.
    pub fn marked(&self) -> Vec<&str> {
        self.migrations
            .iter()
            .filter(|m| m.marked)
            .map(|m| m.name.as_str())
            .collect()
    }
}

/// Load the enhanced state; missing file is an empty state.
pub fn load(config_dir: &Path) -> Result<EnhancedState> {
    let path = config_dir.join(ENHANCED_STATE_FILE);
    if !path.exists() {
        return Ok(EnhancedState::default());
    }
    let raw = fs::read_to_string(&path)?;
    serde_json::from_str(&raw).map_err(|e| Error::StateCorrupt {
        path,
        message: e.to_string(),
    })
}

/// Save atomically, stamping `last_updated`.
pub fn save(config_dir: &Path, state: &mut EnhancedState) -> Result<()> {
    state.last_updated = Some(Utc::now());
    let path = config_dir.join(ENHANCED_STATE_FILE);
    let json = serde_json::to_string_pretty(state).map_err(|e| Error::StateCorrupt {
        path: path.clone(),
        message: e.to_string(),
    })?;
    super::write_atomic(&path, &json)
}
