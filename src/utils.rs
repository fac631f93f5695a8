//! Utility functions for staging files into the output directory
//!
//! Everything that lands in the output directory is first written to a hidden
//! `.part` sibling and then renamed, so a failed job never leaves a truncated
//! file under a final name.

use crate::error::{Error, IoResultExt, Result};
use std::path::{Path, PathBuf};

/// Suffix of staging files; specific enough that a sweep never touches
/// another program's partial downloads
const PART_SUFFIX: &str = ".completion-sync.part";

/// Hidden staging path used while `target` is being written
///
/// # Examples
///
/// ```
/// use completion_sync::utils::part_path;
/// use std::path::Path;
///
/// assert_eq!(
///     part_path(Path::new("/zsh/_bat")),
///     Path::new("/zsh/._bat.completion-sync.part")
/// );
/// ```
#[must_use]
pub fn part_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}{PART_SUFFIX}"))
}

/// Move a finished `.part` file onto its final name
pub async fn promote(part: &Path, target: &Path) -> Result<()> {
    tokio::fs::rename(part, target).await.at_path(target)
}

/// Remove a leftover `.part` file, ignoring a file that is already gone
pub async fn discard(part: &Path) {
    if let Err(e) = tokio::fs::remove_file(part).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(?part, error = %e, "failed to remove partial file");
    }
}

/// Copy `source` into `dest_dir`, keeping its file name
///
/// Returns the path of the installed file.
pub async fn install_file(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = source.file_name().ok_or_else(|| {
        Error::filesystem(
            source,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let target = dest_dir.join(name);
    let part = part_path(&target);

    if let Err(e) = tokio::fs::copy(source, &part).await {
        discard(&part).await;
        return Err(Error::filesystem(&part, e));
    }
    if let Err(e) = promote(&part, &target).await {
        discard(&part).await;
        return Err(e);
    }

    tracing::debug!(?source, ?target, "installed completion file");
    Ok(target)
}

/// Remove staging files left behind by aborted jobs
///
/// Only names produced by [`part_path`] are touched. Returns how many were
/// removed.
pub async fn sweep_part_files(dir: &Path) -> Result<usize> {
    let mut entries = tokio::fs::read_dir(dir).await.at_path(dir)?;
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await.at_path(dir)? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') && name.ends_with(PART_SUFFIX) {
            discard(&entry.path()).await;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Create the output directory (and parents) if it does not exist yet
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.at_path(dir)
}
