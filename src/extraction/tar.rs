use crate::error::{DataError, Error, IoResultExt, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use xz2::read::XzDecoder;

use super::{ArchiveFormat, cancelled};

/// Unpack a (possibly compressed) tarball into `dest_path`
///
/// Entries that would land outside `dest_path` are skipped. `cancel` is
/// checked before every entry.
pub fn unpack_tar(
    archive_path: &Path,
    format: ArchiveFormat,
    dest_path: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    debug!(?archive_path, ?format, ?dest_path, "unpacking tar archive");

    let file = std::fs::File::open(archive_path).at_path(archive_path)?;
    let reader: Box<dyn Read> = match format {
        ArchiveFormat::TarGz => Box::new(GzDecoder::new(file)),
        ArchiveFormat::TarXz => Box::new(XzDecoder::new(file)),
        ArchiveFormat::Tar => Box::new(file),
        ArchiveFormat::Zip => {
            return Err(DataError::UnsupportedArchive {
                archive: archive_path.to_path_buf(),
            }
            .into());
        }
    };

    let corrupt = |e: std::io::Error| {
        Error::Data(DataError::CorruptArchive {
            archive: archive_path.to_path_buf(),
            reason: e.to_string(),
        })
    };

    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_mtime(false);

    let mut extracted = 0usize;
    for entry in archive.entries().map_err(corrupt)? {
        if cancel.is_cancelled() {
            return Err(cancelled(archive_path));
        }
        let mut entry = entry.map_err(corrupt)?;
        if entry.unpack_in(dest_path).map_err(corrupt)? {
            extracted += 1;
        } else {
            let name = entry.path().map(|p| p.display().to_string()).unwrap_or_default();
            warn!(path = %name, "skipping entry with unsafe path");
        }
    }

    debug!(?archive_path, extracted, "tar extraction finished");
    Ok(())
}
