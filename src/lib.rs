//! # completion-sync
//!
//! Fetches zsh completion scripts for a fixed set of command-line tools and
//! stages them in one directory for the shell's completion system.
//!
//! Each tool is synced one of three ways:
//! - **release**: download the latest release archive from GitHub, unpack it
//!   and pick out the completion file
//! - **raw**: download a single completion file by URL
//! - **command**: run a locally installed tool that prints its own completion
//!
//! ## Quick Start
//!
//! ```no_run
//! use completion_sync::{Config, Syncer, TaskList, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let syncer = Syncer::new(Config::default())?;
//!
//!     // Runs every task; SIGTERM/SIGINT/SIGHUP stop the run early.
//!     // Temporary directories are removed either way.
//!     let summary = run_with_shutdown(&syncer, &TaskList::builtin()).await?;
//!     println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Subprocess runner
pub mod command;
/// Configuration types
pub mod config;
/// Direct single-file downloads
pub mod direct;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Latest-release lookup and asset download
pub mod fetcher;
mod http;
/// Job scheduling and shutdown
pub mod orchestrator;
/// Compiled-in task list
pub mod tasks;
/// Temporary directory bookkeeping
pub mod temp_registry;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use command::CommandSpec;
pub use config::Config;
pub use direct::RawDownload;
pub use error::{DataError, Error, ExecutionError, NetworkError, Result};
pub use fetcher::{AssetNaming, ReleaseFetcher};
pub use orchestrator::{SyncContext, SyncSummary, Syncer};
pub use tasks::{Task, TaskList};
pub use temp_registry::TempRegistry;

/// Run `tasks` with graceful signal handling.
///
/// Equivalent to [`Syncer::run`], except that a termination signal stops the
/// run early. Cleanup of temporary directories happens in both cases.
///
/// - **Unix:** listens for SIGTERM, SIGINT and SIGHUP, falling back to Ctrl+C if
///   none of them can be registered.
/// - **Windows/other:** Ctrl+C only (`tokio::signal::ctrl_c()`); there is no
///   SIGTERM or SIGHUP handling on these platforms.
pub async fn run_with_shutdown(syncer: &Syncer, tasks: &TaskList) -> Result<SyncSummary> {
    syncer.run_until(tasks, wait_for_signal()).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use futures::future::select_all;
    use tokio::signal::unix::{SignalKind, signal};

    let mut registered = Vec::new();
    for (kind, name) in [
        (SignalKind::terminate(), "SIGTERM"),
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::hangup(), "SIGHUP"),
    ] {
        // Registration may fail in restricted environments (containers, tests)
        match signal(kind) {
            Ok(stream) => registered.push((stream, name)),
            Err(e) => tracing::warn!(error = %e, signal = name, "could not register signal handler"),
        }
    }

    if registered.is_empty() {
        tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
        tokio::signal::ctrl_c().await.ok();
        return;
    }

    let waits = registered.iter_mut().map(|(stream, name)| {
        Box::pin(async move {
            stream.recv().await;
            *name
        })
    });
    let (name, _, _) = select_all(waits).await;
    tracing::info!(signal = name, "Received termination signal");
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler the run can only end on its own
        tracing::error!(error = %e, "could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!(signal = "Ctrl+C", "Received termination signal");
}
