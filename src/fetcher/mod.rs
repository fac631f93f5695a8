//! Latest-release lookup and asset download
//!
//! Resolves a repository's latest release tag through the GitHub REST API,
//! works out the archive name (see [`naming`]) and downloads it into a fresh
//! temporary directory.

pub mod naming;

pub use naming::{AssetNaming, SPECIAL_CASES, asset_name, program_name};

use crate::config::Config;
use crate::error::{DataError, Error, NetworkError, Result};
use crate::http;
use crate::temp_registry::TempRegistry;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Subset of the "latest release" payload that we read
#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: Option<String>,
}

/// Downloads release archives from a GitHub-compatible host
#[derive(Clone, Debug)]
pub struct ReleaseFetcher {
    client: reqwest::Client,
    api_base_url: String,
    download_base_url: String,
}

impl ReleaseFetcher {
    /// Create a fetcher using the hosts from `config`
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            download_base_url: config.download_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the "latest release" endpoint for `repo`
    #[must_use]
    pub fn latest_release_url(&self, repo: &str) -> String {
        format!("{}/repos/{repo}/releases/latest", self.api_base_url)
    }

    /// URL of the asset `asset` attached to release `tag` of `repo`
    #[must_use]
    pub fn asset_url(&self, repo: &str, tag: &str, asset: &str) -> String {
        format!(
            "{}/{repo}/releases/download/{tag}/{asset}",
            self.download_base_url
        )
    }

    /// Fetch the tag of the latest release of `repo`
    ///
    /// # Errors
    ///
    /// [`Error::Network`] when the API can't be reached or answers with a
    /// non-success status, [`Error::Data`] when the body isn't JSON or has no
    /// `tag_name`.
    pub async fn latest_tag(&self, repo: &str) -> Result<String> {
        let url = self.latest_release_url(repo);
        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        let body = http::get_with(request, &url)
            .await?
            .text()
            .await
            .map_err(|source| {
                Error::Network(NetworkError::Request {
                    url: url.clone(),
                    source,
                })
            })?;

        let release: LatestRelease =
            serde_json::from_str(&body).map_err(|source| DataError::InvalidJson {
                url: url.clone(),
                source,
            })?;

        let tag = release
            .tag_name
            .filter(|t| !t.is_empty())
            .ok_or(DataError::MissingField {
                url,
                field: "tag_name",
            })?;

        debug!(repo, tag = %tag, "resolved latest release");
        Ok(tag)
    }

    /// Download the latest release archive of `repo`
    ///
    /// The scratch directory is registered with `registry` before the download
    /// starts. Returns the path of the archive inside that directory.
    pub async fn download_latest(&self, repo: &str, registry: &TempRegistry) -> Result<PathBuf> {
        let dir = registry.create_dir(program_name(repo))?;

        let tag = self.latest_tag(repo).await?;
        let asset = asset_name(repo, &tag);
        let url = self.asset_url(repo, &tag, &asset);

        let archive = dir.join(&asset);
        let bytes = http::download_to(&self.client, &url, &archive).await?;

        info!(repo, tag = %tag, asset = %asset, bytes, "downloaded release archive");
        Ok(archive)
    }
}
