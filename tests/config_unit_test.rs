//! Unit tests for configuration loading and source-tree traversal.
//!
//! Tests cover:
//! - Config parsing, defaults, and validation failures
//! - Resolved project directories
//! - Traversal ordering: `order` entries first, then files, then dirs
//! - Unknown `order` entries are fatal

use sqlsync::config::{load_project, DEFAULT_MAX_ROLLBACKS};
use sqlsync::error::Error;
use sqlsync::traverse::collect_sources;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_config(root: &Path, yaml: &str) -> PathBuf {
    let path = root.join("sqlsync.yaml");
    fs::write(&path, yaml).unwrap();
    path
}

// =============================================================================
// Config parsing
// =============================================================================

#[test]
fn test_valid_config_resolves_directories() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "config:\n  migrations:\n    outputDir: out/migrations\n    maxRollbacks: 5\nschema:\n  tables: ~\n",
    );
    let project = load_project(&path).unwrap();
    assert_eq!(project.config_dir, dir.path());
    assert_eq!(project.schema_dir, dir.path().join("schema"));
    assert_eq!(project.migrations_dir, dir.path().join("out/migrations"));
    assert_eq!(project.config.max_rollbacks(), 5);
}

#[test]
fn test_max_rollbacks_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "config:\n  migrations:\n    outputDir: migrations\nschema:\n  tables: ~\n",
    );
    let project = load_project(&path).unwrap();
    assert_eq!(project.config.max_rollbacks(), DEFAULT_MAX_ROLLBACKS);
}

#[test]
fn test_missing_config_file_is_invalid() {
    let dir = TempDir::new().unwrap();
    let err = load_project(&dir.path().join("nope.yaml")).unwrap_err();
    assert!(matches!(err, Error::ConfigInvalid(_)));
}

#[test]
fn test_missing_output_dir_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "config:\n  migrations: {}\nschema:\n  tables: ~\n");
    assert!(matches!(
        load_project(&path).unwrap_err(),
        Error::ConfigInvalid(_)
    ));
}

#[test]
fn test_zero_max_rollbacks_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "config:\n  migrations:\n    outputDir: migrations\n    maxRollbacks: 0\nschema:\n  tables: ~\n",
    );
    assert!(matches!(
        load_project(&path).unwrap_err(),
        Error::ConfigInvalid(_)
    ));
}

#[test]
fn test_malformed_yaml_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write_config(dir.path(), "config: [not: a mapping\n");
    assert!(matches!(
        load_project(&path).unwrap_err(),
        Error::ConfigInvalid(_)
    ));
}

// =============================================================================
// Traversal
// =============================================================================

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("-- {rel}\nSELECT 1;\n")).unwrap();
}

#[test]
fn test_traversal_respects_order_then_lexicographic() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "config:\n  migrations:\n    outputDir: migrations\nschema:\n  order:\n    - tables\n    - views\n",
    );
    touch(dir.path(), "schema/functions/f.sql");
    touch(dir.path(), "schema/views/v.sql");
    touch(dir.path(), "schema/tables/t.sql");
    touch(dir.path(), "schema/root.sql");

    let project = load_project(&path).unwrap();
    let sources = collect_sources(&project).unwrap();
    let paths: Vec<&str> = sources.iter().map(|s| s.path.as_str()).collect();
    // Ordered dirs first, then remaining files, then remaining dirs.
    assert_eq!(
        paths,
        vec![
            "schema/tables/t.sql",
            "schema/views/v.sql",
            "schema/root.sql",
            "schema/functions/f.sql",
        ]
    );
}

#[test]
fn test_nested_order_nodes() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "config:\n  migrations:\n    outputDir: migrations\nschema:\n  tables:\n    order:\n      - users\n      - orders\n",
    );
    touch(dir.path(), "schema/tables/orders/table.sql");
    touch(dir.path(), "schema/tables/audit/table.sql");
    touch(dir.path(), "schema/tables/users/table.sql");

    let project = load_project(&path).unwrap();
    let sources = collect_sources(&project).unwrap();
    let paths: Vec<&str> = sources.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "schema/tables/users/table.sql",
            "schema/tables/orders/table.sql",
            "schema/tables/audit/table.sql",
        ]
    );
}

#[test]
fn test_unknown_order_entry_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "config:\n  migrations:\n    outputDir: migrations\nschema:\n  order:\n    - phantom\n",
    );
    touch(dir.path(), "schema/tables/t.sql");
    let project = load_project(&path).unwrap();
    assert!(matches!(
        collect_sources(&project).unwrap_err(),
        Error::ConfigInvalid(_)
    ));
}

#[test]
fn test_missing_schema_dir_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "config:\n  migrations:\n    outputDir: migrations\nschema:\n  tables: ~\n",
    );
    let project = load_project(&path).unwrap();
    assert!(matches!(
        collect_sources(&project).unwrap_err(),
        Error::ConfigInvalid(_)
    ));
}

#[test]
fn test_non_sql_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        dir.path(),
        "config:\n  migrations:\n    outputDir: migrations\nschema:\n  tables: ~\n",
    );
    touch(dir.path(), "schema/tables/t.sql");
    fs::write(dir.path().join("schema/tables/README.md"), "notes").unwrap();

    let project = load_project(&path).unwrap();
    let sources = collect_sources(&project).unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].path, "schema/tables/t.sql");
}
