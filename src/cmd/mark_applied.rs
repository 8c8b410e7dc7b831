//! The `mark-applied` command: record migrations in the local ledger.

use crate::config;
use crate::error::Error;
use crate::state::{self, ledger};
use std::path::Path;

pub fn run(config_path: &Path, name: &str) -> anyhow::Result<()> {
    let project = config::load_project(config_path)?;
    let sync_state = state::load(&project.config_dir)?;

    let names: Vec<String> = if name == "all" {
        let applied = ledger::read(&project.config_dir)?;
        sync_state
            .names()
            .filter(|n| !applied.iter().any(|a| a == n))
            .map(String::from)
            .collect()
    } else {
        if !sync_state.contains(name) && !project.migrations_dir.join(name).exists() {
            return Err(Error::UnknownMigration(name.to_string()).into());
        }
        vec![name.to_string()]
    };

    let written = ledger::append(&project.config_dir, &names)?;
    if written.is_empty() {
        println!("Nothing to record.");
    } else {
        println!("Marked {} migration(s) as applied:", written.len());
        for name in written {
            println!("  {name}");
        }
    }
    Ok(())
}
