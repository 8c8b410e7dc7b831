//! Unit tests for the migration renderer.
//!
//! Tests cover:
//! - Header lines and the exact section markers
//! - Declarative modifications (column sections, empty sections omitted)
//! - Full-content emission for added and non-declarative modified files
//! - Deletion notes carrying no executable SQL
//! - touched_files as the inverse of the headers
//! - Determinism at a fixed timestamp

use chrono::{TimeZone, Utc};
use sqlsync::differ::diff;
use sqlsync::parser::{parse_source_file, ParsedFile, SourceFile};
use sqlsync::renderer::{render_migration, touched_files};
use sqlsync::state::MigrationSnapshot;

fn parsed(path: &str, text: &str) -> ParsedFile {
    parse_source_file(&SourceFile {
        path: path.to_string(),
        text: text.to_string(),
    })
    .unwrap()
}

fn at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

// =============================================================================
// Header and added files
// =============================================================================

#[test]
fn test_header_lines() {
    let files = vec![parsed("schema/a.sql", "SELECT 1;")];
    let body = render_migration("initial_schema", at(), &diff(&MigrationSnapshot::default(), &files));
    assert!(body.starts_with("-- SQLSync Migration: initial_schema\n"));
    assert!(body.contains("-- Generated: 2024-03-01T12:00:00Z\n"));
}

#[test]
fn test_added_file_includes_complete_cleaned_content() {
    let files = vec![parsed(
        "schema/tables/users/table.sql",
        "-- sqlsync: declarativeTable\n-- internal note\nCREATE TABLE users (id SERIAL PRIMARY KEY);",
    )];
    let body = render_migration("initial_schema", at(), &diff(&MigrationSnapshot::default(), &files));
    assert!(body.contains("-- Added File: schema/tables/users/table.sql"));
    assert!(body.contains("-- NOTE: File content has changed. Including complete content:"));
    assert!(body.contains("-- sqlsync: declarativeTable"));
    assert!(body.contains("CREATE TABLE users (id SERIAL PRIMARY KEY);"));
    assert!(!body.contains("internal note"));
}

#[test]
fn test_critical_directive_is_copied_as_metadata() {
    let files = vec![parsed(
        "schema/tables/t.sql",
        "-- sqlsync: declarativeTable\n-- sqlsync: critical\nCREATE TABLE t (id INT);",
    )];
    let body = render_migration("m", at(), &diff(&MigrationSnapshot::default(), &files));
    let header_idx = body.find("-- Added File:").unwrap();
    let critical_idx = body[header_idx..].find("-- sqlsync: critical").unwrap();
    assert!(critical_idx > 0);
}

// =============================================================================
// Declarative modifications
// =============================================================================

#[test]
fn test_declarative_modification_sections() {
    let before = vec![parsed(
        "schema/tables/users/table.sql",
        "-- sqlsync: declarativeTable\nCREATE TABLE users (id SERIAL PRIMARY KEY, username TEXT NOT NULL);",
    )];
    let after = vec![parsed(
        "schema/tables/users/table.sql",
        "-- sqlsync: declarativeTable\nCREATE TABLE users (id SERIAL PRIMARY KEY, username TEXT NOT NULL, created_at TIMESTAMP DEFAULT NOW());",
    )];
    let body = render_migration(
        "add_created_at",
        at(),
        &diff(&MigrationSnapshot::from_parsed(&before), &after),
    );
    assert!(body.contains("-- Modified File: schema/tables/users/table.sql"));
    assert!(body.contains(
        "-- NOTE: File is declarative. Generated ALTER TABLE statements for incremental changes."
    ));
    assert!(body.contains("-- ADDED COLUMNS"));
    assert!(body
        .contains("ALTER TABLE public.users ADD COLUMN created_at TIMESTAMP DEFAULT NOW();"));
    assert!(!body.contains("MODIFIED COLUMNS"));
    assert!(!body.contains("DROPPED COLUMNS"));
}

#[test]
fn test_declarative_sections_appear_in_order() {
    let before = vec![parsed(
        "schema/t.sql",
        "-- sqlsync: declarativeTable\nCREATE TABLE t (id INT, old_col TEXT, v TEXT);",
    )];
    let after = vec![parsed(
        "schema/t.sql",
        "-- sqlsync: declarativeTable\nCREATE TABLE t (id INT, v VARCHAR(10), fresh INT);",
    )];
    let body = render_migration(
        "mixed",
        at(),
        &diff(&MigrationSnapshot::from_parsed(&before), &after),
    );
    let added = body.find("-- ADDED COLUMNS").unwrap();
    let modified = body.find("-- MODIFIED COLUMNS").unwrap();
    let dropped = body.find("-- DROPPED COLUMNS").unwrap();
    assert!(added < modified && modified < dropped);
    assert!(body.contains("ALTER TABLE public.t ADD COLUMN fresh INT;"));
    assert!(body.contains("ALTER TABLE public.t ALTER COLUMN v TYPE VARCHAR(10);"));
    assert!(body.contains("ALTER TABLE public.t DROP COLUMN old_col;"));
}

// =============================================================================
// Non-declarative modifications and deletions
// =============================================================================

#[test]
fn test_split_modification_renders_full_content() {
    let before = vec![parsed(
        "schema/idx.sql",
        "-- sqlsync: splitStatements\n-- sqlsync: startStatement\nCREATE INDEX a ON t (x);\n-- sqlsync: endStatement\n",
    )];
    let after = vec![parsed(
        "schema/idx.sql",
        "-- sqlsync: splitStatements\n-- sqlsync: startStatement\nCREATE INDEX b ON t (y);\n-- sqlsync: endStatement\n",
    )];
    let body = render_migration(
        "reindex",
        at(),
        &diff(&MigrationSnapshot::from_parsed(&before), &after),
    );
    assert!(body.contains("-- NOTE: File content has changed. Including complete content:"));
    assert!(body.contains("CREATE INDEX b ON t (y);"));
    assert!(!body.contains("CREATE INDEX a ON t (x);"));
}

#[test]
fn test_deleted_file_emits_only_a_note() {
    let before = vec![parsed("schema/gone.sql", "DROP TABLE nothing;")];
    let body = render_migration(
        "cleanup",
        at(),
        &diff(&MigrationSnapshot::from_parsed(&before), &[]),
    );
    assert!(body.contains("-- Deleted File: schema/gone.sql"));
    assert!(body.contains("-- NOTE: DROP statements are NOT automatically generated."));
    // No executable SQL for the deletion: every non-empty line in the
    // deletion section is a comment.
    let section = body.split("-- Deleted File:").nth(1).unwrap();
    for line in section.lines().skip(1) {
        assert!(line.is_empty() || line.starts_with("--"), "unexpected SQL: {line}");
    }
}

// =============================================================================
// touched_files
// =============================================================================

#[test]
fn test_touched_files_recovers_headers() {
    let before = vec![
        parsed("schema/keep.sql", "SELECT 1;"),
        parsed("schema/gone.sql", "SELECT 2;"),
    ];
    let after = vec![
        parsed("schema/keep.sql", "SELECT 1 + 1;"),
        parsed("schema/new.sql", "SELECT 3;"),
    ];
    let difference = diff(&MigrationSnapshot::from_parsed(&before), &after);
    let body = render_migration("m", at(), &difference);
    assert_eq!(touched_files(&body), difference.touched_paths());
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_rendering_is_deterministic() {
    let before = vec![parsed(
        "schema/t.sql",
        "-- sqlsync: declarativeTable\nCREATE TABLE t (id INT);",
    )];
    let after = vec![parsed(
        "schema/t.sql",
        "-- sqlsync: declarativeTable\nCREATE TABLE t (id INT, name TEXT);",
    )];
    let difference = diff(&MigrationSnapshot::from_parsed(&before), &after);
    let first = render_migration("m", at(), &difference);
    let second = render_migration("m", at(), &difference);
    assert_eq!(first, second);
}
