//! Text normalization for checksumming and directive handling.
//!
//! Source files pass through three stages before anything else looks at
//! them: directive spacing is normalized, non-directive comments are
//! stripped, and a whitespace-free rendition feeds the content hash.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Prefix every recognized directive line carries after normalization.
pub const DIRECTIVE_PREFIX: &str = "-- sqlsync:";

/// Matches any spelling of a directive line: `--`, optional spaces,
/// `sqlsync`, optional spaces, `:`, payload.
static DIRECTIVE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*--\s*sqlsync\s*:\s*(.*)$").unwrap());

/// True if the line is a `-- sqlsync:` directive in any accepted spelling.
pub fn is_directive_line(line: &str) -> bool {
    DIRECTIVE_LINE_RE.is_match(line)
}

/// Extract the payload of a directive line, if it is one.
pub fn directive_payload(line: &str) -> Option<&str> {
    DIRECTIVE_LINE_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end())
}

/// Rewrite every directive line to the canonical `-- sqlsync: <payload>`
/// spelling. Non-directive lines are untouched.
pub fn normalize_directives(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match directive_payload(line) {
            Some(payload) if payload.is_empty() => out.push_str(DIRECTIVE_PREFIX),
            Some(payload) => {
                out.push_str(DIRECTIVE_PREFIX);
                out.push(' ');
                out.push_str(payload);
            }
            None => out.push_str(line),
        }
    }
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Drop `--` comment lines except directives, and lines left empty.
/// Non-comment lines survive byte-for-byte in their original order.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("--") && !is_directive_line(line) {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Remove every Unicode whitespace character. Checksum input only.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Lowercase SHA-256 hex digest of the input.
pub fn checksum(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checksum of the whitespace-stripped text; the canonical content hash.
pub fn content_checksum(text: &str) -> String {
    checksum(&strip_whitespace(text))
}
