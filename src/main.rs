mod activity;
mod bank;
mod cli;
mod config;
mod error;
mod fixedpoint;
mod repl;
mod session;
mod storage;
mod transactions;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::activity::ActivityLog;
use crate::cli::{run_command, Args};
use crate::config::Config;
use crate::repl::Repl;
use crate::session::Session;
use crate::storage::SnapshotStore;

/// Diagnostics go to stderr, filtered by RUST_LOG. Quiet by default so the
/// prompt is not interleaved with log output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = Config::from(&args);

    let store = SnapshotStore::new(&config);
    let ledger = store
        .load()
        .with_context(|| format!("loading the ledger from {}", config.data_dir().display()))?;
    let activity = ActivityLog::new(&config.log_file);
    debug!(accounts = ledger.len(), log = %activity.path().display(), "bank opened");

    let mut session = Session::new(ledger, store, activity);
    let stdout = std::io::stdout();

    match &args.command {
        None => {
            let stdin = std::io::stdin();
            Repl::new(&mut session, stdin.lock(), stdout.lock()).run()
        }
        Some(command) => run_command(&mut session, command, &mut stdout.lock()),
    }
}
