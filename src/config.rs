//! Configuration types for completion-sync
//!
//! The task list and the asset naming table are compiled in (see
//! [`crate::tasks`] and [`crate::fetcher::naming`]). This module only covers
//! the runtime knobs: where output goes, which hosts to talk to, and how many
//! jobs may run at once.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use tokio::sync::Semaphore;

/// Main configuration for a sync run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory that receives the completion files (default: "./zsh")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Base URL of the release API (default: "https://api.github.com")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL that release assets are downloaded from (default: "https://github.com")
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,

    /// Maximum number of jobs running at once (default: host parallelism)
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Timeout applied to each HTTP request (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent sent with every request; the GitHub API rejects requests without one
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            api_base_url: default_api_base_url(),
            download_base_url: default_download_base_url(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Check that the configuration can drive a run
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the concurrency limit is zero or too
    /// large, a base URL cannot be parsed, or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_tasks == 0 {
            return Err(Error::Config {
                message: "max_concurrent_tasks must be at least 1".to_string(),
                key: Some("max_concurrent_tasks".to_string()),
            });
        }
        if self.max_concurrent_tasks > Semaphore::MAX_PERMITS {
            return Err(Error::Config {
                message: format!(
                    "max_concurrent_tasks must be at most {}",
                    Semaphore::MAX_PERMITS
                ),
                key: Some("max_concurrent_tasks".to_string()),
            });
        }

        for (key, value) in [
            ("api_base_url", &self.api_base_url),
            ("download_base_url", &self.download_base_url),
        ] {
            if let Err(e) = url::Url::parse(value) {
                return Err(Error::Config {
                    message: format!("invalid URL {value:?}: {e}"),
                    key: Some(key.to_string()),
                });
            }
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config {
                message: "request_timeout must be greater than zero".to_string(),
                key: Some("request_timeout".to_string()),
            });
        }

        Ok(())
    }

    /// Build the HTTP client shared by every job
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the TLS backend cannot be initialised.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: None,
            })
    }
}

// Default value functions
fn default_output_dir() -> PathBuf {
    PathBuf::from("zsh")
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_download_base_url() -> String {
    "https://github.com".to_string()
}

fn default_max_concurrent_tasks() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_user_agent() -> String {
    format!("completion-sync/{}", env!("CARGO_PKG_VERSION"))
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
