pub mod generate;
pub mod mark_applied;
pub mod resolve;
pub mod rollback;
pub mod status;
pub mod sync;

pub use rollback::RollbackMode;

use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::{generate as emit_completions, Shell};
use std::io;
use std::path::PathBuf;

const AFTER_HELP: &str = "\x1b[1mCommon workflows:\x1b[0m
  Generate a migration for pending schema edits:
    sqlsync generate add_users_table

  Inspect pending changes without writing anything:
    sqlsync status

  Reconcile after pulling teammates' migrations:
    sqlsync sync

  Plan and apply a rollback:
    sqlsync rollback 20240301120000_add_users_table.sql
    sqlsync rollback 20240301120000_add_users_table.sql --force

\x1b[1mMore info:\x1b[0m
  Run 'sqlsync <command> --help' for command-specific options.
  Enable completions: sqlsync completions <shell>";

#[derive(Parser)]
#[command(name = "sqlsync")]
#[command(author = "Helge Sverre <helge.sverre@gmail.com>")]
#[command(version)]
#[command(about = "Declarative SQL schema management: diff a tree of .sql sources and emit timestamped migrations")]
#[command(after_help = AFTER_HELP)]
#[command(arg_required_else_help = true)]
#[command(max_term_width = 100)]
pub struct Cli {
    /// Path to the sqlsync.yaml configuration file
    #[arg(short, long, global = true, default_value = "sqlsync.yaml", value_hint = ValueHint::FilePath)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

// Help heading constants for consistency
const BEHAVIOR: &str = "Behavior";
const MODE: &str = "Mode";

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a timestamped migration from pending schema edits
    #[command(visible_alias = "gen")]
    #[command(after_help = "\x1b[1mExamples:\x1b[0m
  sqlsync generate add_users_table
  sqlsync generate fix_prices --force
  sqlsync generate hotfix --skip-conflict-check")]
    Generate {
        /// Migration name (sanitized into the filename)
        name: String,

        /// Proceed despite new or conflicting migrations on disk
        #[arg(long, help_heading = BEHAVIOR)]
        force: bool,

        /// Skip the migrations-directory reconciliation check entirely
        #[arg(long, help_heading = BEHAVIOR)]
        skip_conflict_check: bool,
    },

    /// Show pending file changes and unapplied migrations
    #[command(visible_alias = "st")]
    Status,

    /// Reconcile the migrations directory with the recorded state
    Sync,

    /// Adopt the current tree as the new baseline after a conflict
    #[command(after_help = "\x1b[1mExamples:\x1b[0m
  sqlsync resolve
  sqlsync resolve --force")]
    Resolve {
        /// Re-baseline even when conflicts are present
        #[arg(long, help_heading = BEHAVIOR)]
        force: bool,
    },

    /// Plan or apply a rollback, or manage protection marks
    #[command(visible_alias = "rb")]
    #[command(after_help = "\x1b[1mExamples:\x1b[0m
  sqlsync rollback --list
  sqlsync rollback 20240301120000_add_users_table.sql
  sqlsync rollback 20240301120000_add_users_table.sql --force
  sqlsync rollback 20240301120000_add_users_table.sql --mark")]
    Rollback {
        /// Target migration filename (inclusive)
        name: Option<String>,

        /// List all migrations with status, author, and timestamp
        #[arg(long, conflicts_with_all = ["mark", "unmark", "force"], help_heading = MODE)]
        list: bool,

        /// Protect the target from rollback
        #[arg(long, conflicts_with = "unmark", help_heading = MODE)]
        mark: bool,

        /// Remove the target's protection mark
        #[arg(long, help_heading = MODE)]
        unmark: bool,

        /// Apply the plan (delete migration files, prune state)
        #[arg(long, help_heading = BEHAVIOR)]
        force: bool,
    },

    /// Record migrations as applied to the local database
    #[command(visible_alias = "ma")]
    MarkApplied {
        /// Migration filename, or `all` for every unapplied migration
        name: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            name,
            force,
            skip_conflict_check,
        } => generate::run(&cli.config, &name, force, skip_conflict_check),
        Commands::Status => status::run(&cli.config),
        Commands::Sync => sync::run(&cli.config),
        Commands::Resolve { force } => resolve::run(&cli.config, force),
        Commands::Rollback {
            name,
            list,
            mark,
            unmark,
            force,
        } => {
            let mode = if list {
                RollbackMode::List
            } else if mark {
                RollbackMode::Mark
            } else if unmark {
                RollbackMode::Unmark
            } else if force {
                RollbackMode::Apply
            } else {
                RollbackMode::Plan
            };
            rollback::run(&cli.config, name.as_deref(), mode)
        }
        Commands::MarkApplied { name } => mark_applied::run(&cli.config, &name),
        Commands::Completions { shell } => {
            emit_completions(shell, &mut Cli::command(), "sqlsync", &mut io::stdout());
            Ok(())
        }
    }
}
