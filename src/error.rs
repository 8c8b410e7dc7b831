//! Error types for the sqlsync core.
//!
//! Every fallible core operation returns [`Result`]. The `cmd` layer wraps
//! these in `anyhow` for display; the discriminants stay available for
//! callers that need to branch on the failure class.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the sqlsync core.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed YAML, missing required fields, or fields of the wrong shape.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A type directive outside the leading comment block, or repeated.
    #[error("{path}: {message}")]
    DirectivePlacement { path: String, message: String },

    /// A splitStatements file with no startStatement/endStatement markers.
    #[error("{path}: splitStatements file contains no startStatement/endStatement markers")]
    SplitStatementsMissingMarkers { path: String },

    /// Unbalanced statement markers (unclosed block, stray or nested marker).
    #[error("{path}: {message}")]
    SplitStatementsUnclosed { path: String, message: String },

    /// Two statement blocks in one file hashed identically.
    #[error("{path}: duplicate statement checksum {checksum}")]
    ChecksumCollision { path: String, checksum: String },

    /// A declarativeTable file without a single parseable CREATE TABLE.
    #[error("{path}: {message}")]
    ParseCreateTable { path: String, message: String },

    /// The state file exists but is not valid JSON of the expected shape.
    #[error("state file {} is corrupt: {message}", .path.display())]
    StateCorrupt { path: PathBuf, message: String },

    /// The collaboration manager found migrations overlapping local edits.
    #[error("conflicting migrations detected: {0}")]
    ConflictDetected(String),

    /// A rollback plan would include a marked migration.
    #[error("rollback blocked: migration {0} is marked as protected")]
    RollbackProtected(String),

    /// The rollback target does not exist in the recorded state.
    #[error("unknown rollback target: {0}")]
    RollbackUnknownTarget(String),

    /// A name that should identify a known migration matches none.
    #[error("unknown migration: {0}")]
    UnknownMigration(String),

    /// Underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;
