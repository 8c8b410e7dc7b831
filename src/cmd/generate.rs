//! The `generate` command: diff the tree, render and write the migration,
//! then record the new snapshot.

use crate::collab;
use crate::config;
use crate::differ;
use crate::error::Error;
use crate::naming::MigrationNamer;
use crate::parser;
use crate::renderer;
use crate::state::{self, enhanced, MigrationSnapshot};
use crate::traverse;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub fn run(
    config_path: &Path,
    name: &str,
    force: bool,
    skip_conflict_check: bool,
) -> anyhow::Result<()> {
    let project = config::load_project(config_path)?;
    let sources = traverse::collect_sources(&project)?;
    let parsed = parser::parse_all(&sources)?;

    let mut sync_state = state::load(&project.config_dir)?;
    let mut enhanced_state = enhanced::load(&project.config_dir)?;

    let baseline = sync_state
        .latest()
        .map(|(_, snap)| snap.clone())
        .unwrap_or_default();
    let difference = differ::diff(&baseline, &parsed);

    if !skip_conflict_check {
        let report = collab::report(
            &sync_state,
            &project.migrations_dir,
            &difference.touched_paths(),
        )?;
        if report.has_conflicts() && !force {
            return Err(Error::ConflictDetected(report.conflict_summary()).into());
        }
        if !report.new_migrations.is_empty() && !force {
            eprintln!(
                "Warning: {} migration(s) on disk are not in the local state:",
                report.new_migrations.len()
            );
            for name in &report.new_migrations {
                eprintln!("  {name}");
            }
            anyhow::bail!(
                "run `sqlsync sync` to reconcile, or re-run with --force to generate anyway"
            );
        }
    }

    if difference.is_empty() {
        println!("No changes detected.");
        return Ok(());
    }

    // The filename must sort after both the on-disk migrations and the
    // baseline key, or the next diff would pick the wrong snapshot.
    let latest_ts = sync_state.latest().map(|(key, _)| key[..14].to_string());
    let mut namer = MigrationNamer::new();
    let mut filename = namer.filename(name);
    while project.migrations_dir.join(&filename).exists()
        || latest_ts.as_deref().is_some_and(|ts| &filename[..14] <= ts)
    {
        filename = namer.filename(name);
    }

    let content = renderer::render_migration(name, Utc::now(), &difference);

    // The migration file goes first; only once it is durable does the
    // state learn about it. A crash in between leaves an orphan file that
    // `sync` reconciles.
    fs::create_dir_all(&project.migrations_dir)?;
    let migration_path = project.migrations_dir.join(&filename);
    fs::write(&migration_path, &content)?;

    let touched = difference.touched_paths();
    sync_state
        .snapshots
        .insert(filename.clone(), MigrationSnapshot::from_parsed(&parsed));
    state::save(&project.config_dir, &sync_state)?;

    let checksums: BTreeMap<String, String> = parsed
        .iter()
        .map(|f| (f.path.clone(), f.checksum.clone()))
        .collect();
    enhanced_state.record_migration(enhanced::MigrationInfo {
        name: filename.clone(),
        timestamp: Utc::now(),
        applied_changes: touched.clone(),
        author: std::env::var("USER").ok(),
        marked: false,
    });
    enhanced_state.update_files(&filename, &touched, &checksums);
    enhanced::save(&project.config_dir, &mut enhanced_state)?;

    println!("Generated {}", migration_path.display());
    println!("  {} file change(s)", difference.file_changes.len());
    Ok(())
}
