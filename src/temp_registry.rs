//! Registry of temporary directories created during a sync run.
//!
//! Jobs create their scratch directories through [`TempRegistry::create_dir`],
//! which records the directory before handing its path out. The supervisor
//! calls [`TempRegistry::cleanup`] exactly once on every exit path.

use crate::error::{IoResultExt, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::TempDir;
use tracing::{debug, info, warn};

const DIR_PREFIX: &str = "completion-sync-";

/// Thread-safe, append-only list of temporary directories
///
/// Cloning is cheap and every clone shares the same list.
#[derive(Clone, Debug, Default)]
pub struct TempRegistry {
    base: Option<PathBuf>,
    dirs: Arc<Mutex<Vec<TempDir>>>,
}

impl TempRegistry {
    /// Create a registry that places directories in the system temp location
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that places directories under `base`
    pub fn in_dir(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
            dirs: Arc::default(),
        }
    }

    /// Create a fresh directory and register it for cleanup
    ///
    /// The directory is registered before the path is returned, so anything a
    /// caller writes into it is covered by [`cleanup`](Self::cleanup) even if
    /// the caller fails halfway.
    pub fn create_dir(&self, label: &str) -> Result<PathBuf> {
        let prefix = format!("{DIR_PREFIX}{}-", sanitize_label(label));
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let dir = match &self.base {
            Some(base) => builder.tempdir_in(base).at_path(base)?,
            None => builder.tempdir().at_path(&std::env::temp_dir())?,
        };

        let path = dir.path().to_path_buf();
        self.lock().push(dir);
        debug!(?path, label, "created temporary directory");
        Ok(path)
    }

    /// Paths of every directory registered so far, in creation order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().iter().map(|d| d.path().to_path_buf()).collect()
    }

    /// Number of registered directories
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no directory has been registered yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Recursively remove every registered directory
    ///
    /// Safe to call more than once; later calls only see directories created
    /// after the previous call. A directory that fails to delete is logged and
    /// the rest are still removed. Returns the number of directories removed.
    pub fn cleanup(&self) -> usize {
        let dirs = std::mem::take(&mut *self.lock());
        let mut removed = 0;

        for dir in dirs {
            let path = dir.path().to_path_buf();
            if !path.exists() {
                continue;
            }
            match dir.close() {
                Ok(()) => removed += 1,
                Err(e) => warn!(?path, error = %e, "failed to remove temporary directory"),
            }
        }

        info!(removed, "Cleaned up all temporary directories");
        removed
    }

    /// Whether `path` lives inside one of the registered directories
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().iter().any(|d| path.starts_with(d.path()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TempDir>> {
        self.dirs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
