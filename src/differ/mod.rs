//! File-level diffing against the last recorded snapshot.
//!
//! The differ is pure: given the same snapshot and the same ordered parse
//! results it produces the same changes in the same order. Additions come
//! first (path ascending), then modifications, then deletions.

pub mod columns;

use crate::parser::{FileKind, FileType, ParsedFile};
use crate::schema::TableDefinition;
use crate::state::MigrationSnapshot;
use ahash::AHashMap;
use log::debug;

/// What the snapshot knew about a file, reconstructed for diffing.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviousFile {
    FileContent { checksum: String },
    SplitStatements { checksums: Vec<String> },
    DeclarativeTable(TableDefinition),
}

impl PreviousFile {
    pub fn file_type(&self) -> FileType {
        match self {
            PreviousFile::FileContent { .. } => FileType::FileContent,
            PreviousFile::SplitStatements { .. } => FileType::SplitStatements,
            PreviousFile::DeclarativeTable(_) => FileType::DeclarativeTable,
        }
    }

    /// The stored table definition, when the file was declarative.
    pub fn table(&self) -> Option<&TableDefinition> {
        match self {
            PreviousFile::DeclarativeTable(table) => Some(table),
            _ => None,
        }
    }

    fn from_snapshot(snapshot: &MigrationSnapshot, path: &str) -> Option<Self> {
        if let Some(table) = snapshot.declarative_tables.get(path) {
            return Some(PreviousFile::DeclarativeTable(table.clone()));
        }
        if let Some(checksums) = snapshot.split_statements.get(path) {
            return Some(PreviousFile::SplitStatements {
                checksums: checksums.clone(),
            });
        }
        snapshot
            .file_content_checksums
            .get(path)
            .map(|fc| PreviousFile::FileContent {
                checksum: fc.checksum.clone(),
            })
    }
}

/// Statement-level change within a modified `splitStatements` file.
///
/// There is no `Modified` bucket: blocks have no identity beyond their
/// content, so an edit is a delete plus an add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementChange {
    Added { checksum: String, statement: String },
    Deleted { checksum: String },
}

/// One changed file.
#[derive(Debug, Clone)]
pub enum FileChange {
    Added {
        current: ParsedFile,
    },
    Modified {
        current: ParsedFile,
        previous: PreviousFile,
        statement_changes: Vec<StatementChange>,
    },
    Deleted {
        path: String,
        previous: PreviousFile,
    },
}

impl FileChange {
    pub fn path(&self) -> &str {
        match self {
            FileChange::Added { current } => &current.path,
            FileChange::Modified { current, .. } => &current.path,
            FileChange::Deleted { path, .. } => path,
        }
    }
}

/// Full diff between a snapshot and the current traversal.
#[derive(Debug, Clone, Default)]
pub struct StateDifference {
    pub file_changes: Vec<FileChange>,
}

impl StateDifference {
    pub fn is_empty(&self) -> bool {
        self.file_changes.is_empty()
    }

    /// Paths touched, in change order.
    pub fn touched_paths(&self) -> Vec<String> {
        self.file_changes
            .iter()
            .map(|c| c.path().to_string())
            .collect()
    }
}

/// Compare the current parse results against the last snapshot.
pub fn diff(snapshot: &MigrationSnapshot, current: &[ParsedFile]) -> StateDifference {
    let prev_paths = snapshot.paths();
    let curr_by_path: AHashMap<&str, &ParsedFile> =
        current.iter().map(|f| (f.path.as_str(), f)).collect();

    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut deleted = Vec::new();

    for file in current {
        if !prev_paths.contains(file.path.as_str()) {
            added.push(FileChange::Added {
                current: file.clone(),
            });
        }
    }

    for path in &prev_paths {
        let previous = PreviousFile::from_snapshot(snapshot, path)
            .expect("path came from the snapshot key union");
        match curr_by_path.get(path) {
            None => deleted.push(FileChange::Deleted {
                path: (*path).to_string(),
                previous,
            }),
            Some(file) => {
                if let Some(statement_changes) = compare_file(&previous, file) {
                    modified.push(FileChange::Modified {
                        current: (*file).clone(),
                        previous,
                        statement_changes,
                    });
                }
            }
        }
    }

    added.sort_by(|a, b| a.path().cmp(b.path()));
    modified.sort_by(|a, b| a.path().cmp(b.path()));
    deleted.sort_by(|a, b| a.path().cmp(b.path()));

    debug!(
        "diff: {} added, {} modified, {} deleted",
        added.len(),
        modified.len(),
        deleted.len()
    );

    let mut file_changes = added;
    file_changes.append(&mut modified);
    file_changes.append(&mut deleted);
    StateDifference { file_changes }
}

/// `Some(statement_changes)` when the file changed, `None` when it did not.
fn compare_file(previous: &PreviousFile, current: &ParsedFile) -> Option<Vec<StatementChange>> {
    match (previous, &current.kind) {
        (PreviousFile::FileContent { checksum }, FileKind::FileContent { checksum: now }) => {
            (checksum != now).then(Vec::new)
        }
        (PreviousFile::SplitStatements { checksums }, FileKind::SplitStatements(statements)) => {
            let changes = split_statement_changes(checksums, statements);
            (!changes.is_empty()).then_some(changes)
        }
        (PreviousFile::DeclarativeTable(old), FileKind::DeclarativeTable(new)) => {
            (old != new).then(Vec::new)
        }
        // Variant change: full replacement of whatever statement identity
        // existed on either side.
        (previous, kind) => {
            let mut changes = Vec::new();
            if let PreviousFile::SplitStatements { checksums } = previous {
                changes.extend(checksums.iter().map(|c| StatementChange::Deleted {
                    checksum: c.clone(),
                }));
            }
            if let FileKind::SplitStatements(statements) = kind {
                changes.extend(statements.iter().map(|s| StatementChange::Added {
                    checksum: s.checksum.clone(),
                    statement: s.text.clone(),
                }));
            }
            Some(changes)
        }
    }
}

/// Set difference over block checksums: additions in current file order,
/// deletions in snapshot order.
fn split_statement_changes(
    previous: &[String],
    current: &[crate::parser::SplitStatement],
) -> Vec<StatementChange> {
    let prev_set: ahash::AHashSet<&str> = previous.iter().map(String::as_str).collect();
    let curr_set: ahash::AHashSet<&str> =
        current.iter().map(|s| s.checksum.as_str()).collect();

    let mut changes: Vec<StatementChange> = current
        .iter()
        .filter(|s| !prev_set.contains(s.checksum.as_str()))
        .map(|s| StatementChange::Added {
            checksum: s.checksum.clone(),
            statement: s.text.clone(),
        })
        .collect();
    changes.extend(
        previous
            .iter()
            .filter(|c| !curr_set.contains(c.as_str()))
            .map(|c| StatementChange::Deleted {
                checksum: c.clone(),
            }),
    );
    changes
}
