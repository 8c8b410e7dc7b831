//! The `status` command: report pending changes without writing anything.

use crate::config;
use crate::differ::{self, FileChange};
use crate::parser;
use crate::state::{self, enhanced, ledger};
use crate::traverse;
use std::path::Path;

pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let project = config::load_project(config_path)?;
    let sources = traverse::collect_sources(&project)?;
    let parsed = parser::parse_all(&sources)?;

    let sync_state = state::load(&project.config_dir)?;
    let enhanced_state = enhanced::load(&project.config_dir)?;
    let applied = ledger::read(&project.config_dir)?;

    match sync_state.latest() {
        Some((name, _)) => println!("Baseline migration: {name}"),
        None => println!("Baseline migration: (none)"),
    }

    let baseline = sync_state
        .latest()
        .map(|(_, snap)| snap.clone())
        .unwrap_or_default();
    let difference = differ::diff(&baseline, &parsed);

    if difference.is_empty() {
        println!("No pending changes.");
    } else {
        println!("Pending changes:");
        for change in &difference.file_changes {
            match change {
                FileChange::Added { current } => {
                    println!("  added     {} ({})", current.path, current.file_type())
                }
                FileChange::Modified {
                    current,
                    statement_changes,
                    ..
                } => {
                    if statement_changes.is_empty() {
                        println!("  modified  {} ({})", current.path, current.file_type());
                    } else {
                        println!(
                            "  modified  {} ({}, {} statement change(s))",
                            current.path,
                            current.file_type(),
                            statement_changes.len()
                        );
                    }
                }
                FileChange::Deleted { path, previous } => {
                    println!("  deleted   {path} ({})", previous.file_type())
                }
            }
        }
    }

    let unapplied: Vec<&str> = sync_state
        .names()
        .filter(|name| !applied.iter().any(|a| a == name))
        .collect();
    if !unapplied.is_empty() {
        println!("Not yet applied locally:");
        for name in unapplied {
            println!("  {name}");
        }
    }

    let marked = enhanced_state.marked();
    if !marked.is_empty() {
        println!("Protected from rollback:");
        for name in marked {
            println!("  {name}");
        }
    }

    Ok(())
}
