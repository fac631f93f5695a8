//! Archive extraction and completion-file discovery
//!
//! Unpacks a downloaded release archive into a fresh temporary directory and
//! picks out the files that look like zsh completions (see [`classify`]).

mod classify;
mod tar;
mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use classify::{Classification, classify, collect_completions};

use crate::error::{DataError, Error, ExecutionError, Result};
use crate::temp_registry::TempRegistry;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Archive formats understood by [`unpack`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// gzip-compressed tarball (`.tar.gz`, `.tgz`)
    TarGz,
    /// xz-compressed tarball (`.tar.xz`, `.txz`)
    TarXz,
    /// Uncompressed tarball (`.tar`)
    Tar,
    /// ZIP archive (`.zip`)
    Zip,
}

/// Detect the archive format from the file name
#[must_use]
pub fn detect_archive_format(path: &Path) -> Option<ArchiveFormat> {
    let name = path.file_name()?.to_str()?.to_lowercase();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveFormat::TarGz)
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
        Some(ArchiveFormat::TarXz)
    } else if name.ends_with(".tar") {
        Some(ArchiveFormat::Tar)
    } else if name.ends_with(".zip") {
        Some(ArchiveFormat::Zip)
    } else {
        None
    }
}

/// Unpack `archive_path` into `dest_path` (blocking)
///
/// Stops with [`ExecutionError::Cancelled`] before the next entry once
/// `cancel` fires.
pub fn unpack(archive_path: &Path, dest_path: &Path, cancel: &CancellationToken) -> Result<()> {
    let format =
        detect_archive_format(archive_path).ok_or_else(|| DataError::UnsupportedArchive {
            archive: archive_path.to_path_buf(),
        })?;

    match format {
        ArchiveFormat::Zip => zip::unpack_zip(archive_path, dest_path, cancel),
        _ => tar::unpack_tar(archive_path, format, dest_path, cancel),
    }
}

fn cancelled(archive_path: &Path) -> Error {
    Error::Execution(ExecutionError::Cancelled {
        task: format!("extraction of {}", archive_path.display()),
    })
}

/// Blocking half of [`extract_completions`]
///
/// If `cancel` fired while this ran, the supervisor may already have removed
/// `dest_path`, and the entry unpacked last may have recreated it. Remove it
/// again so nothing outlives the run.
fn unpack_and_collect(
    archive_path: &Path,
    dest_path: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<PathBuf>> {
    let result =
        unpack(archive_path, dest_path, cancel).and_then(|()| collect_completions(dest_path));

    if cancel.is_cancelled() {
        if let Err(e) = std::fs::remove_dir_all(dest_path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(?dest_path, error = %e, "failed to remove abandoned extraction dir");
        }
        return Err(cancelled(archive_path));
    }

    result
}

/// Unpack `archive_path` into a new registered temp dir and return its
/// completion files
///
/// All returned paths live inside the new directory.
///
/// # Errors
///
/// [`Error::Data`] if the archive can't be read or holds no completion file,
/// [`Error::Filesystem`] if writing the unpacked tree fails.
pub async fn extract_completions(
    archive_path: &Path,
    registry: &TempRegistry,
) -> Result<Vec<PathBuf>> {
    let label = archive_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("archive");
    let dest = registry.create_dir(label)?;

    // Fires when this future is dropped, i.e. when the job is aborted
    let cancel = CancellationToken::new();
    let abort_guard = cancel.clone().drop_guard();

    let archive_owned = archive_path.to_path_buf();
    let dest_owned = dest.clone();
    let completions = spawn_blocking(move || {
        unpack_and_collect(&archive_owned, &dest_owned, &cancel)
    })
    .await
    .map_err(|e| {
        Error::Execution(ExecutionError::TaskFailed {
            task: format!("extract {}", archive_path.display()),
            reason: e.to_string(),
        })
    })??;
    let _ = abort_guard.disarm();

    if completions.is_empty() {
        return Err(DataError::NoCompletions {
            archive: archive_path.to_path_buf(),
        }
        .into());
    }

    info!(
        ?archive_path,
        count = completions.len(),
        "extracted completion files"
    );
    Ok(completions)
}
