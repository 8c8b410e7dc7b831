//! Migration file rendering.
//!
//! Emits the human-readable, directive-preserving migration `.sql`. The
//! header markers are load-bearing: downstream tooling (and our own
//! collaboration manager) parses them back out of migration files, so the
//! exact strings here are part of the tool's contract.

use crate::differ::{columns, FileChange, StateDifference};
use crate::naming::format_generated;
use crate::parser::{FileKind, ParsedFile};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

const NOTE_DECLARATIVE: &str =
    "-- NOTE: File is declarative. Generated ALTER TABLE statements for incremental changes.";
const NOTE_FULL_CONTENT: &str =
    "-- NOTE: File content has changed. Including complete content:";
const NOTE_NO_DROPS: &str = "-- NOTE: DROP statements are NOT automatically generated.";

/// Matches the per-file section headers of a rendered migration.
static FILE_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--\s*(?:Added|Modified|Deleted) File:\s*(.+?)\s*$").unwrap());

/// Render the complete migration body for a diff.
///
/// Sections appear as Added, then Modified, then Deleted files, each group
/// sorted by path — the order [`crate::differ::diff`] already guarantees.
pub fn render_migration(
    name: &str,
    generated_at: DateTime<Utc>,
    diff: &StateDifference,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("-- SQLSync Migration: {name}\n"));
    out.push_str(&format!(
        "-- Generated: {}\n",
        format_generated(generated_at)
    ));

    for change in &diff.file_changes {
        out.push('\n');
        match change {
            FileChange::Added { current } => {
                out.push_str(&format!("-- Added File: {}\n", current.path));
                push_critical(&mut out, current);
                out.push_str(NOTE_FULL_CONTENT);
                out.push('\n');
                push_content(&mut out, &current.cleaned);
            }
            FileChange::Modified {
                current, previous, ..
            } => {
                out.push_str(&format!("-- Modified File: {}\n", current.path));
                push_critical(&mut out, current);
                match (previous.table(), &current.kind) {
                    (Some(old), FileKind::DeclarativeTable(new)) => {
                        out.push_str(NOTE_DECLARATIVE);
                        out.push('\n');
                        push_table_sections(&mut out, &columns::compare_tables(old, new));
                    }
                    _ => {
                        out.push_str(NOTE_FULL_CONTENT);
                        out.push('\n');
                        push_content(&mut out, &current.cleaned);
                    }
                }
            }
            FileChange::Deleted { path, .. } => {
                out.push_str(&format!("-- Deleted File: {path}\n"));
                out.push_str(NOTE_NO_DROPS);
                out.push('\n');
            }
        }
    }

    out
}

fn push_critical(out: &mut String, file: &ParsedFile) {
    if file.critical {
        out.push_str("-- sqlsync: critical\n");
    }
}

fn push_content(out: &mut String, cleaned: &str) {
    out.push_str(cleaned);
    if !cleaned.ends_with('\n') {
        out.push('\n');
    }
}

/// The `ADDED / MODIFIED / DROPPED COLUMNS` sections for a declarative
/// modification. Empty sections are omitted.
fn push_table_sections(out: &mut String, diff: &columns::TableDiff) {
    if let Some(stmt) = diff.rename_statement() {
        out.push_str(&stmt);
        out.push('\n');
        return;
    }

    let added = diff.added_statements();
    if !added.is_empty() {
        out.push_str("-- ADDED COLUMNS\n");
        for stmt in added {
            out.push_str(&stmt);
            out.push('\n');
        }
    }
    let modified = diff.modified_statements();
    if !modified.is_empty() {
        out.push_str("-- MODIFIED COLUMNS\n");
        for stmt in modified {
            out.push_str(&stmt);
            out.push('\n');
        }
    }
    let dropped = diff.dropped_statements();
    if !dropped.is_empty() {
        out.push_str("-- DROPPED COLUMNS\n");
        for stmt in dropped {
            out.push_str(&stmt);
            out.push('\n');
        }
    }
}

/// Recover the file paths a rendered migration touched, in section order.
/// This is how foreign migrations (pulled from other developers) are
/// understood without their snapshots.
pub fn touched_files(content: &str) -> Vec<String> {
    let mut paths = Vec::new();
    for line in content.lines() {
        if let Some(caps) = FILE_HEADER_RE.captures(line) {
            let path = caps.get(1).unwrap().as_str().to_string();
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}
