use crate::error::{IoResultExt, Result};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// watchexec ships its zsh completion as a file literally named `zsh`
const BARE_ZSH_TARGET: &str = "_watchexec";

/// What to do with one unpacked file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Completion file; move it to the extraction root under this name
    Rename(String),
    /// Completion file that already follows the `_name` convention
    Keep,
    /// PowerShell completion, never wanted
    Skip,
    /// Not a completion file
    Ignore,
}

/// Classify a file by its path relative to the extraction root
///
/// Rules are checked in order: a file named exactly `zsh`, a `.ps1` suffix, a
/// `.zsh` suffix, then any path segment starting with `_`.
#[must_use]
pub fn classify(relative: &Path) -> Classification {
    let Some(name) = relative.file_name().and_then(|n| n.to_str()) else {
        return Classification::Ignore;
    };

    if name == "zsh" {
        return Classification::Rename(BARE_ZSH_TARGET.to_string());
    }

    match relative.extension().and_then(|e| e.to_str()) {
        Some("ps1") => return Classification::Skip,
        Some("zsh") => {
            if let Some(stem) = relative.file_stem().and_then(|s| s.to_str()) {
                return Classification::Rename(format!("_{stem}"));
            }
        }
        _ => {}
    }

    let has_underscore_segment = relative.components().any(|c| match c {
        Component::Normal(segment) => segment.to_str().is_some_and(|s| s.starts_with('_')),
        _ => false,
    });

    if has_underscore_segment {
        Classification::Keep
    } else {
        Classification::Ignore
    }
}

/// Walk `root` and return every completion file, renaming as needed
///
/// Renamed files are moved directly under `root`; kept files stay where they
/// were unpacked.
pub fn collect_completions(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            crate::error::Error::filesystem(path, e.into())
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    let mut completions = Vec::new();
    for path in files {
        let relative = path.strip_prefix(root).unwrap_or(&path);
        match classify(relative) {
            Classification::Rename(name) => {
                let target = root.join(&name);
                std::fs::rename(&path, &target).at_path(&path)?;
                debug!(from = ?relative, to = %name, "renamed completion file");
                completions.push(target);
            }
            Classification::Keep => {
                debug!(path = ?relative, "accepted completion file");
                completions.push(path);
            }
            Classification::Skip => {
                debug!(path = ?relative, "skipping PowerShell completion");
            }
            Classification::Ignore => {}
        }
    }

    Ok(completions)
}
