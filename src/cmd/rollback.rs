//! The `rollback` command: list, plan, apply, and protection marks.

use crate::config;
use crate::rollback;
use crate::state::{self, enhanced, ledger};
use std::path::Path;

/// What the flag combination asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackMode {
    /// Enumerate migrations with status; never mutates.
    List,
    /// Compute and print the plan without applying it.
    Plan,
    /// Apply the plan: delete files, prune state.
    Apply,
    /// Protect the target from rollback.
    Mark,
    /// Remove the target's protection.
    Unmark,
}

pub fn run(config_path: &Path, name: Option<&str>, mode: RollbackMode) -> anyhow::Result<()> {
    let project = config::load_project(config_path)?;
    let mut sync_state = state::load(&project.config_dir)?;
    let mut enhanced_state = enhanced::load(&project.config_dir)?;

    if mode == RollbackMode::List {
        let applied = ledger::read(&project.config_dir)?;
        let listing = rollback::list(&sync_state, &enhanced_state, &applied);
        if listing.is_empty() {
            println!("No migrations recorded.");
            return Ok(());
        }
        for entry in listing {
            let when = entry
                .timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".into());
            let author = entry.author.unwrap_or_else(|| "-".into());
            let mut flags = Vec::new();
            if entry.marked {
                flags.push("protected");
            }
            if entry.applied_locally {
                flags.push("applied");
            }
            println!(
                "  {}  {}  {}  {}",
                entry.name,
                when,
                author,
                flags.join(",")
            );
        }
        return Ok(());
    }

    let Some(name) = name else {
        anyhow::bail!("a migration name is required (or use --list)");
    };

    match mode {
        RollbackMode::Mark => {
            if rollback::mark(&mut enhanced_state, name, project.config.max_rollbacks())? {
                enhanced::save(&project.config_dir, &mut enhanced_state)?;
                println!("Marked {name} as protected");
            } else {
                eprintln!(
                    "Warning: refusing to mark {name}; {} migrations may be marked at once",
                    project.config.max_rollbacks()
                );
            }
        }
        RollbackMode::Unmark => {
            let was_marked = rollback::unmark(&mut enhanced_state, name)?;
            enhanced::save(&project.config_dir, &mut enhanced_state)?;
            if was_marked {
                println!("Unmarked {name}");
            } else {
                println!("{name} was not marked");
            }
        }
        RollbackMode::Plan => {
            let plan = rollback::plan(&sync_state, &enhanced_state, name)?;
            println!("Rollback plan (newest first):");
            for entry in &plan {
                println!("  {entry}");
            }
            println!("Re-run with --force to apply.");
        }
        RollbackMode::Apply => {
            let plan = rollback::plan(&sync_state, &enhanced_state, name)?;
            rollback::apply(
                &project.migrations_dir,
                &mut sync_state,
                &mut enhanced_state,
                &plan,
            )?;
            state::save(&project.config_dir, &sync_state)?;
            enhanced::save(&project.config_dir, &mut enhanced_state)?;
            println!("Rolled back {} migration(s):", plan.len());
            for entry in &plan {
                println!("  {entry}");
            }
        }
        RollbackMode::List => unreachable!(),
    }

    Ok(())
}
