//! Direct download of a single completion file by URL.

use crate::error::Result;
use crate::http;
use crate::utils::{discard, part_path, promote};
use std::path::{Path, PathBuf};
use tracing::info;

/// A raw file to fetch verbatim into the output directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawDownload {
    /// Source URL
    pub url: String,
    /// File name inside the output directory
    pub filename: String,
}

impl RawDownload {
    /// Convenience constructor
    pub fn new(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
        }
    }
}

/// Fetch `download.url` and write its body to `{output_dir}/{filename}`
///
/// The body is written byte for byte. On any failure nothing is left under
/// the final name.
pub async fn download_raw(
    client: &reqwest::Client,
    download: &RawDownload,
    output_dir: &Path,
) -> Result<PathBuf> {
    let target = output_dir.join(&download.filename);
    let part = part_path(&target);

    let result = match http::download_to(client, &download.url, &part).await {
        Ok(bytes) => promote(&part, &target).await.map(|()| bytes),
        Err(e) => Err(e),
    };

    match result {
        Ok(bytes) => {
            info!(url = %download.url, ?target, bytes, "downloaded raw completion file");
            Ok(target)
        }
        Err(e) => {
            discard(&part).await;
            Err(e)
        }
    }
}
