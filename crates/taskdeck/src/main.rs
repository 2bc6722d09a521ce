//! CLI entry point for taskdeck.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use taskdeck_app::{AppConfig, TracingTelemetry, shared};
use taskdeck_core::Provider;
use taskdeck_store_fs::FileStore;
use tracing::debug;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt::format::FmtSpan};

use commands::Workspace;

mod commands;

const APP_DIR: &str = "taskdeck";

/// Todos with filtered queries, stored as JSON snapshots.
#[derive(Parser, Debug)]
#[command(
    name = "taskdeck",
    version,
    about = "taskdeck: todos with due dates, filters and progress stats"
)]
struct Cli {
    /// Data directory (defaults to the platform data dir).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new todo.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Due date (RFC3339).
        #[arg(long)]
        due: Option<String>,
    },

    /// Edit fields of an existing todo.
    Edit {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// New due date (RFC3339).
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
    },

    /// Flip a todo between open and complete.
    Toggle {
        #[arg(long)]
        id: String,
    },

    /// Delete a todo.
    Rm {
        #[arg(long)]
        id: String,
    },

    /// List todos, newest first.
    Ls {
        /// Status filter: all, open or complete.
        #[arg(long, default_value = "all")]
        filter: String,
        /// Case-insensitive text in title or description.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },

    /// Show completion statistics.
    Stats {
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },

    /// Sign in with a mock provider (demo or google).
    Login { provider: Provider },

    /// Sign out and forget the stored session.
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// Edit the signed-in user's profile.
    Profile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LsFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let Cli { data_dir, cmd } = Cli::parse();

    install_tracing();

    let data_dir = resolve_data_dir(data_dir)?;
    execute_command(data_dir, cmd)
}

fn execute_command(data_dir: PathBuf, command: Command) -> Result<()> {
    debug!(data_dir = %data_dir.display(), "Opening workspace");
    let config = AppConfig::load(&data_dir)?;
    let store = FileStore::open(config.storage_dir(&data_dir))?;
    let telemetry = Arc::new(TracingTelemetry::new(config.telemetry.enabled));
    let mut workspace = Workspace::new(shared(store), &config, telemetry);

    tokio::runtime::Runtime::new()?.block_on(workspace.run(command))
}

fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .context("Could not determine a data directory; pass --data-dir")
}

fn install_tracing() {
    // RUST_LOG wins; INFO applies only when it is unset or unparsable.
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
