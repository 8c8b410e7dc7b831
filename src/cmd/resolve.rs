//! The `resolve` command: adopt the current tree as the diff baseline.
//!
//! After `sync` has surfaced foreign migrations (and the operator has
//! reviewed or hand-merged them), `resolve` snapshots the current parse
//! under the greatest on-disk migration name so the next `generate` diffs
//! against what is actually on disk.

use crate::collab;
use crate::config;
use crate::differ;
use crate::error::Error;
use crate::parser;
use crate::renderer;
use crate::naming::timestamp_from_filename;
use crate::state::{self, enhanced, MigrationSnapshot};
use crate::traverse;
use std::fs;
use std::path::Path;

pub fn run(config_path: &Path, force: bool) -> anyhow::Result<()> {
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

    if report.has_conflicts() && !force {
        return Err(Error::ConflictDetected(format!(
            "{}; re-run with --force to adopt the current tree anyway",
            report.conflict_summary()
        ))
        .into());
    }

    let on_disk = collab::list_migration_files(&project.migrations_dir)?;
    let Some(latest) = on_disk.last().cloned() else {
        anyhow::bail!("nothing to resolve: the migrations directory is empty");
    };

    for name in &on_disk {
        if enhanced_state.migration(name).is_none() {
            let content = fs::read_to_string(project.migrations_dir.join(name))?;
            enhanced_state.record_migration(enhanced::MigrationInfo {
                name: name.clone(),
                timestamp: timestamp_from_filename(name),
                applied_changes: renderer::touched_files(&content),
                author: None,
                marked: false,
            });
        }
    }

    sync_state.snapshots.retain(|name, _| on_disk.contains(name));
    sync_state
        .snapshots
        .insert(latest.clone(), MigrationSnapshot::from_parsed(&parsed));
    enhanced_state.retain_migrations(|name| on_disk.iter().any(|n| n == name));

    state::save(&project.config_dir, &sync_state)?;
    enhanced::save(&project.config_dir, &mut enhanced_state)?;

    println!("Adopted the current tree as the baseline under {latest}");
    Ok(())
}
