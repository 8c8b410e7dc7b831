//! The `sync` command: reconcile the migrations directory with the state.

use crate::collab;
use crate::config;
use crate::differ;
use crate::naming::timestamp_from_filename;
use crate::parser;
use crate::renderer;
use crate::state::{self, enhanced};
use crate::traverse;
use std::fs;
use std::path::Path;

pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let project = config::load_project(config_path)?;
    let sources = traverse::collect_sources(&project)?;
    let parsed = parser::parse_all(&sources)?;

    let mut sync_state = state::load(&project.config_dir)?;
    let mut enhanced_state = enhanced::load(&project.config_dir)?;

    let baseline = sync_state
        .latest()
        .map(|(_, snap)| snap.clone())
        .unwrap_or_default();
    let locally_modified = differ::diff(&baseline, &parsed).touched_paths();

    let report = collab::report(&sync_state, &project.migrations_dir, &locally_modified)?;

    if report.is_clean() {
        println!("State and migrations directory agree.");
        return Ok(());
    }

    for name in &report.new_migrations {
        let content = fs::read_to_string(project.migrations_dir.join(name))?;
        enhanced_state.record_migration(enhanced::MigrationInfo {
            name: name.clone(),
            timestamp: timestamp_from_filename(name),
            applied_changes: renderer::touched_files(&content),
            author: None,
            marked: false,
        });
        println!("Registered foreign migration {name}");
    }

    for name in &report.removed_migrations {
        sync_state.snapshots.remove(name);
        println!("Pruned missing migration {name}");
    }
    enhanced_state.retain_migrations(|name| {
        sync_state.contains(name) || report.new_migrations.iter().any(|n| n == name)
    });

    state::save(&project.config_dir, &sync_state)?;
    enhanced::save(&project.config_dir, &mut enhanced_state)?;

    if report.has_conflicts() {
        println!("Conflicts detected:");
        for conflict in &report.conflicts {
            println!("  {} overlaps local edits:", conflict.migration);
            for file in &conflict.files {
                println!("    {file}");
            }
        }
        println!("Review the files above, then run `sqlsync resolve` to adopt a new baseline.");
    } else if !report.new_migrations.is_empty() {
        println!(
            "Note: the diff baseline still predates the registered migration(s); \
             run `sqlsync resolve` to adopt the current tree as the baseline."
        );
    }

    Ok(())
}
