//! Split-statement block capture.
//!
//! A `splitStatements` file is a sequence of blocks delimited by
//! `startStatement` / `endStatement` markers. Each block is tracked by the
//! checksum of its whitespace-stripped text; the block's identity is its
//! content, so reordering blocks does not register as a change.

use super::{Directive, SplitStatement};
use crate::error::{Error, Result};
use crate::normalize::{content_checksum, directive_payload};
use ahash::AHashSet;

/// Walk the cleaned text and capture marker-delimited blocks in file order.
pub fn parse_split_statements(path: &str, cleaned: &str) -> Result<Vec<SplitStatement>> {
    let mut statements = Vec::new();
    let mut seen = AHashSet::new();
    let mut open: Option<(usize, Vec<&str>)> = None;

    for (idx, line) in cleaned.lines().enumerate() {
        let marker = directive_payload(line).and_then(Directive::from_payload);
        match marker {
            Some(Directive::StartStatement) => {
                if let Some((opened_at, _)) = open {
                    return Err(Error::SplitStatementsUnclosed {
                        path: path.to_string(),
                        message: format!(
                            "startStatement on line {} while the block from line {} is still open",
                            idx + 1,
                            opened_at + 1
                        ),
                    });
                }
                open = Some((idx, Vec::new()));
            }
            Some(Directive::EndStatement) => {
                let Some((_, lines)) = open.take() else {
                    return Err(Error::SplitStatementsUnclosed {
                        path: path.to_string(),
                        message: format!("endStatement on line {} without startStatement", idx + 1),
                    });
                };
                let text = lines.join("\n");
                let checksum = content_checksum(&text);
                if !seen.insert(checksum.clone()) {
                    return Err(Error::ChecksumCollision {
                        path: path.to_string(),
                        checksum,
                    });
                }
                statements.push(SplitStatement { checksum, text });
            }
            _ => {
                if let Some((_, lines)) = open.as_mut() {
                    lines.push(line);
                }
            }
        }
    }

    if let Some((opened_at, _)) = open {
        return Err(Error::SplitStatementsUnclosed {
            path: path.to_string(),
            message: format!(
                "startStatement on line {} has no matching endStatement",
                opened_at + 1
            ),
        });
    }

    Ok(statements)
}
