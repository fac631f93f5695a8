use crate::error::{DataError, Error, IoResultExt, Result};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::cancelled;

/// Extract a single ZIP entry to disk, creating directories as needed
fn extract_zip_entry(mut file: zip::read::ZipFile, dest_path: &Path) -> Result<Option<PathBuf>> {
    let file_path = match file.enclosed_name() {
        Some(path) => dest_path.join(path),
        None => {
            warn!(name = file.name(), "skipping entry with unsafe path");
            return Ok(None);
        }
    };

    if file.is_dir() {
        std::fs::create_dir_all(&file_path).at_path(&file_path)?;
        return Ok(None);
    }

    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).at_path(parent)?;
    }

    let mut outfile = std::fs::File::create(&file_path).at_path(&file_path)?;
    std::io::copy(&mut file, &mut outfile).at_path(&file_path)?;

    Ok(Some(file_path))
}

/// Unpack a ZIP archive into `dest_path`, checking `cancel` before every entry
pub fn unpack_zip(archive_path: &Path, dest_path: &Path, cancel: &CancellationToken) -> Result<()> {
    debug!(?archive_path, ?dest_path, "unpacking ZIP archive");

    let file = std::fs::File::open(archive_path).at_path(archive_path)?;
    let corrupt = |e: zip::result::ZipError| {
        Error::Data(DataError::CorruptArchive {
            archive: archive_path.to_path_buf(),
            reason: e.to_string(),
        })
    };

    let mut archive = zip::ZipArchive::new(file).map_err(corrupt)?;

    let mut extracted = 0usize;
    for i in 0..archive.len() {
        if cancel.is_cancelled() {
            return Err(cancelled(archive_path));
        }
        let entry = archive.by_index(i).map_err(corrupt)?;
        if extract_zip_entry(entry, dest_path)?.is_some() {
            extracted += 1;
        }
    }

    debug!(?archive_path, extracted, "ZIP extraction finished");
    Ok(())
}
