//! Sync orchestration (decomposed into focused submodules)
//!
//! [`Syncer`] owns everything a job needs (configuration, HTTP client, temp
//! registry) in a shared [`SyncContext`], submits one job per task to a
//! bounded pool and waits for them. The supervisor loop and shutdown handling
//! live in the `lifecycle` submodule.

mod lifecycle;

use crate::config::Config;
use crate::error::Result;
use crate::extraction;
use crate::fetcher::ReleaseFetcher;
use crate::tasks::{Task, TaskList};
use crate::temp_registry::TempRegistry;
use crate::utils;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// State shared by every job of a run
#[derive(Debug)]
pub struct SyncContext {
    /// Runtime configuration
    pub config: Config,
    /// HTTP client shared by every download
    pub client: reqwest::Client,
    /// Release lookup and asset download
    pub fetcher: ReleaseFetcher,
    /// Temporary directories to remove at shutdown
    pub temp: TempRegistry,
}

/// Outcome counts for one run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Jobs that finished successfully
    pub succeeded: usize,
    /// Jobs that returned an error or panicked
    pub failed: usize,
    /// Whether the run was cut short by a shutdown request
    pub interrupted: bool,
    /// Temporary directories removed by the final cleanup
    pub temp_dirs_removed: usize,
}

impl SyncSummary {
    /// Every job ran and none failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.interrupted
    }
}

/// Runs a [`TaskList`] against the configured output directory
pub struct Syncer {
    ctx: Arc<SyncContext>,
    permits: Arc<Semaphore>,
    shutdown: Mutex<CancellationToken>,
}

impl Syncer {
    /// Create a syncer using the system temp directory for scratch space
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_temp_registry(config, TempRegistry::new())
    }

    /// Create a syncer that registers scratch directories with `temp`
    pub fn with_temp_registry(config: Config, temp: TempRegistry) -> Result<Self> {
        config.validate()?;
        let client = config.http_client()?;
        let fetcher = ReleaseFetcher::new(client.clone(), &config);
        let permits = Arc::new(Semaphore::new(config.max_concurrent_tasks));

        Ok(Self {
            ctx: Arc::new(SyncContext {
                config,
                client,
                fetcher,
                temp,
            }),
            permits,
            shutdown: Mutex::new(CancellationToken::new()),
        })
    }

    /// The configuration this syncer runs with
    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    /// Registry of scratch directories created by jobs
    pub fn temp_registry(&self) -> &TempRegistry {
        &self.ctx.temp
    }

    /// Token that stops a running sync when cancelled
    ///
    /// Cancelling has the same effect as a termination signal: in-flight jobs
    /// are aborted and temporary directories are removed. A token stops one
    /// run only. Once that run returns, the syncer switches to a fresh token,
    /// so call this again before the next run.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.lock_shutdown().clone()
    }

    /// Swap in a fresh token if the current one has been used up
    fn rearm_shutdown(&self) {
        let mut token = self.lock_shutdown();
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
    }

    fn lock_shutdown(&self) -> MutexGuard<'_, CancellationToken> {
        self.shutdown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run every task to completion
    pub async fn run(&self, tasks: &TaskList) -> Result<SyncSummary> {
        self.run_until(tasks, std::future::pending()).await
    }
}

/// Run one task, returning the files it wrote to the output directory
pub(crate) async fn execute(ctx: &SyncContext, task: &Task) -> Result<Vec<PathBuf>> {
    let output_dir = &ctx.config.output_dir;
    match task {
        Task::Release(repo) => sync_release(ctx, repo).await,
        Task::Raw(download) => {
            let path = crate::direct::download_raw(&ctx.client, download, output_dir).await?;
            Ok(vec![path])
        }
        Task::Command(spec) => Ok(vec![spec.run(output_dir).await?]),
    }
}

/// Fetch, extract, then copy every completion file into the output directory
async fn sync_release(ctx: &SyncContext, repo: &str) -> Result<Vec<PathBuf>> {
    let archive = ctx.fetcher.download_latest(repo, &ctx.temp).await?;
    let candidates = extraction::extract_completions(&archive, &ctx.temp).await?;

    let mut installed = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        installed.push(utils::install_file(candidate, &ctx.config.output_dir).await?);
    }

    info!(repo, files = ?installed, "installed release completions");
    Ok(installed)
}
