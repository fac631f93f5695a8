//! Supervisor loop and shutdown coordination.

use crate::error::Result;
use crate::tasks::TaskList;
use crate::temp_registry::TempRegistry;
use crate::utils;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::{SyncSummary, Syncer, execute};

/// Removes registered temp dirs when dropped, unless already finished
///
/// Keeps cleanup single-sourced: the normal path calls [`finish`](Self::finish),
/// early returns and unwinding go through `Drop`.
///
/// An extraction still running on the blocking pool when this fires cannot be
/// interrupted mid-entry; it notices the cancellation after the current entry
/// and removes its own directory.
struct CleanupGuard {
    registry: TempRegistry,
    finished: bool,
}

impl CleanupGuard {
    fn new(registry: TempRegistry) -> Self {
        Self {
            registry,
            finished: false,
        }
    }

    fn finish(mut self) -> usize {
        self.finished = true;
        self.registry.cleanup()
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.registry.cleanup();
        }
    }
}

impl Syncer {
    /// Run every task until done or until `shutdown` resolves
    ///
    /// All tasks are submitted at once; the semaphore caps how many run at the
    /// same time. A failing task is logged and counted, and never stops its
    /// siblings. When `shutdown` resolves (or the
    /// [`shutdown_token`](Self::shutdown_token) is cancelled) the remaining
    /// jobs are aborted. Temporary directories are removed on every path out
    /// of this function.
    ///
    /// # Errors
    ///
    /// Only fails if the output directory cannot be created; job failures are
    /// reported through the returned [`SyncSummary`].
    pub async fn run_until<F>(&self, tasks: &TaskList, shutdown: F) -> Result<SyncSummary>
    where
        F: Future<Output = ()>,
    {
        let guard = CleanupGuard::new(self.ctx.temp.clone());
        utils::ensure_dir(&self.ctx.config.output_dir).await?;

        info!(
            tasks = tasks.len(),
            max_concurrent = self.ctx.config.max_concurrent_tasks,
            output_dir = ?self.ctx.config.output_dir,
            "starting sync"
        );

        let mut jobs = JoinSet::new();
        for task in tasks.tasks() {
            let ctx = Arc::clone(&self.ctx);
            let permits = Arc::clone(&self.permits);
            jobs.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                info!(kind = task.kind(), task = %task, "Starting task");
                let result = execute(&ctx, &task).await;
                (task, result)
            });
        }

        let token = self.shutdown_token();
        let stop = async move {
            tokio::select! {
                () = shutdown => {}
                () = token.cancelled() => {}
            }
        };
        tokio::pin!(stop);

        let mut summary = SyncSummary::default();
        loop {
            tokio::select! {
                biased;
                () = &mut stop => {
                    warn!(remaining = jobs.len(), "shutdown requested, aborting remaining tasks");
                    summary.interrupted = true;
                    break;
                }
                next = jobs.join_next() => match next {
                    None => break,
                    Some(Ok((task, Ok(files)))) => {
                        summary.succeeded += 1;
                        info!(kind = task.kind(), task = %task, files = files.len(), "Completed task");
                    }
                    Some(Ok((task, Err(e)))) => {
                        summary.failed += 1;
                        error!(
                            kind = task.kind(),
                            task = %task,
                            error_kind = e.kind(),
                            error = %e,
                            "Task failed"
                        );
                    }
                    Some(Err(e)) => {
                        summary.failed += 1;
                        error!(error = %e, "Task panicked");
                    }
                },
            }
        }

        if summary.interrupted {
            jobs.shutdown().await;
            match utils::sweep_part_files(&self.ctx.config.output_dir).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "removed partial output files"),
                Err(e) => warn!(error = %e, "failed to sweep partial output files"),
            }
        }

        summary.temp_dirs_removed = guard.finish();
        self.rearm_shutdown();

        if summary.is_success() {
            info!(succeeded = summary.succeeded, "Sync success!");
        } else {
            warn!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                interrupted = summary.interrupted,
                "sync finished with problems"
            );
        }

        Ok(summary)
    }
}
