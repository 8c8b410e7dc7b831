//! YAML configuration.
//!
//! `sqlsync.yaml` names the migrations output directory and mirrors the
//! `schema/` source tree as an ordering hint. The config directory anchors
//! every other path the tool touches: the schema tree, the migrations
//! directory, both state files, and the applied ledger.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of simultaneously marked (protected) migrations.
pub const DEFAULT_MAX_ROLLBACKS: usize = 3;

/// Top-level configuration file shape.
#[derive(Debug, Clone, Deserialize)]
pub struct SqlSyncConfig {
    pub config: ToolConfig,
    /// Traversal-order tree mirroring the `schema/` directory.
    pub schema: SchemaNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfig {
    pub migrations: MigrationsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationsConfig {
    /// Where migrations are written, relative to the config directory.
    pub output_dir: String,
    /// Cap on simultaneously marked migrations.
    pub max_rollbacks: Option<u32>,
}

/// One node of the schema ordering tree. A node may list children to visit
/// first; undeclared children are visited after, lexicographically.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaNode {
    #[serde(default)]
    pub order: Option<Vec<String>>,
    #[serde(flatten)]
    pub children: BTreeMap<String, Option<SchemaNode>>,
}

impl SchemaNode {
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children.get(name).and_then(|c| c.as_ref())
    }
}

impl SqlSyncConfig {
    pub fn max_rollbacks(&self) -> usize {
        self.config
            .migrations
            .max_rollbacks
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_ROLLBACKS)
    }
}

/// A loaded configuration with its resolved directories.
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory containing the config file; anchors all relative paths.
    pub config_dir: PathBuf,
    /// Root of the managed source tree: `<config_dir>/schema`.
    pub schema_dir: PathBuf,
    /// Migration output directory: `<config_dir>/<outputDir>`.
    pub migrations_dir: PathBuf,
    pub config: SqlSyncConfig,
}

/// Load and validate the configuration at `path`.
pub fn load_project(path: &Path) -> Result<Project> {
    let raw = fs::read_to_string(path).map_err(|e| {
        Error::ConfigInvalid(format!("cannot read {}: {e}", path.display()))
    })?;
    let config: SqlSyncConfig = serde_yaml_ng::from_str(&raw)
        .map_err(|e| Error::ConfigInvalid(format!("{}: {e}", path.display())))?;

    if config.config.migrations.output_dir.trim().is_empty() {
        return Err(Error::ConfigInvalid(
            "config.migrations.outputDir must be a non-empty string".into(),
        ));
    }
    if let Some(0) = config.config.migrations.max_rollbacks {
        return Err(Error::ConfigInvalid(
            "config.migrations.maxRollbacks must be positive".into(),
        ));
    }

    let config_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let schema_dir = config_dir.join("schema");
    let migrations_dir = config_dir.join(config.config.migrations.output_dir.trim());

    Ok(Project {
        config_dir,
        schema_dir,
        migrations_dir,
        config,
    })
}
