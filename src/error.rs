//! Error types for completion-sync
//!
//! Every job in a sync run reports failures through [`Error`]. The variants map
//! onto four kinds of failure:
//! - network (unreachable host, timeout, non-success HTTP status)
//! - data (unexpected API payloads, unusable archives)
//! - filesystem (permission or space problems while writing)
//! - execution (missing binaries, non-zero exit codes)

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for completion-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for completion-sync
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api_base_url")
        key: Option<String>,
    },

    /// Network error while talking to the release API or a download host
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Unexpected data (API payload, archive contents)
    #[error("data error: {0}")]
    Data(#[from] DataError),

    /// Filesystem operation failed
    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        /// The path being read, written or removed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// External program could not be run or failed
    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
}

/// Network-related errors
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request could not be sent or the body could not be read
    #[error("request to {url} failed: {source}")]
    Request {
        /// The URL that was requested
        url: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("GET {url} returned status {status}")]
    Status {
        /// The URL that was requested
        url: String,
        /// HTTP status code returned by the server
        status: u16,
    },
}

/// Data-related errors
#[derive(Debug, Error)]
pub enum DataError {
    /// The response body was not valid JSON
    #[error("invalid JSON from {url}: {source}")]
    InvalidJson {
        /// The URL whose response could not be parsed
        url: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// A required field was missing from an API response
    #[error("response from {url} is missing field `{field}`")]
    MissingField {
        /// The URL whose response was incomplete
        url: String,
        /// Name of the missing field
        field: &'static str,
    },

    /// The archive format could not be determined from its name
    #[error("unsupported archive format: {}", .archive.display())]
    UnsupportedArchive {
        /// Path to the archive
        archive: PathBuf,
    },

    /// The archive could not be read
    #[error("failed to unpack {}: {reason}", .archive.display())]
    CorruptArchive {
        /// Path to the archive
        archive: PathBuf,
        /// Reason reported by the decoder
        reason: String,
    },

    /// The archive unpacked fine but held no completion files
    #[error("no completion files found in {}", .archive.display())]
    NoCompletions {
        /// Path to the archive
        archive: PathBuf,
    },
}

/// Subprocess and task execution errors
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The program is not installed or not on PATH
    #[error("program `{program}` not found on PATH")]
    NotFound {
        /// Program name that was looked up
        program: String,
    },

    /// The program was found but could not be started
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The program exited unsuccessfully
    #[error("`{program}` exited with {}", describe_exit(.code))]
    ExitStatus {
        /// Program that failed
        program: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
    },

    /// Work stopped because the run is shutting down
    #[error("{task} was cancelled")]
    Cancelled {
        /// Description of the interrupted work
        task: String,
    },

    /// A job or blocking helper panicked or was cancelled
    #[error("task `{task}` did not complete: {reason}")]
    TaskFailed {
        /// Description of the task
        task: String,
        /// Panic or cancellation message
        reason: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("status {c}"))
}

impl Error {
    /// Short machine-readable kind, used as a structured log field
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config",
            Error::Network(_) => "network",
            Error::Data(_) => "data",
            Error::Filesystem { .. } => "filesystem",
            Error::Execution(_) => "execution",
        }
    }

    /// Build a [`Error::Filesystem`] for the given path
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Attach the offending path to I/O errors
pub(crate) trait IoResultExt<T> {
    fn at_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| Error::filesystem(path, e))
    }
}
