//! Applied-migration ledger.
//!
//! `.sqlsync-local-applied.txt` records, one filename per line, the
//! migrations the developer has run against their local database. The file
//! is append-only; names already present are never re-added.

use crate::error::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Ledger file name, resolved against the config directory.
pub const LEDGER_FILE: &str = ".sqlsync-local-applied.txt";

/// Read the ledger in recorded order; missing file is an empty ledger.
pub fn read(config_dir: &Path) -> Result<Vec<String>> {
    let path = config_dir.join(LEDGER_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Append the given names, skipping any already present. Returns the names
/// actually written, in order.
pub fn append(config_dir: &Path, names: &[String]) -> Result<Vec<String>> {
    let existing = read(config_dir)?;
    let fresh: Vec<String> = names
        .iter()
        .filter(|n| !existing.contains(n))
        .cloned()
        .collect();
    if fresh.is_empty() {
        return Ok(fresh);
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config_dir.join(LEDGER_FILE))?;
    for name in &fresh {
        writeln!(file, "{name}")?;
    }
    Ok(fresh)
}
