//! Thin GET helpers over `reqwest` that map failures onto [`NetworkError`].

use crate::error::{Error, IoResultExt, NetworkError, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Send a GET request and fail on anything but a 2xx status
pub(crate) async fn get(client: &reqwest::Client, url: &str) -> Result<reqwest::Response> {
    get_with(client.get(url), url).await
}

/// Like [`get`] but for a pre-built request (extra headers and so on)
pub(crate) async fn get_with(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<reqwest::Response> {
    let response = request.send().await.map_err(|source| request_error(url, source))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Network(NetworkError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }));
    }

    Ok(response)
}

/// Stream a GET response body into `dest`
///
/// The file is created only after the server answered with a success status.
/// Returns the number of bytes written.
pub(crate) async fn download_to(client: &reqwest::Client, url: &str, dest: &Path) -> Result<u64> {
    let mut response = get(client, url).await?;

    let mut file = tokio::fs::File::create(dest).await.at_path(dest)?;
    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| request_error(url, source))?
    {
        file.write_all(&chunk).await.at_path(dest)?;
        written += chunk.len() as u64;
    }
    file.flush().await.at_path(dest)?;

    debug!(url, ?dest, bytes = written, "downloaded");
    Ok(written)
}

fn request_error(url: &str, source: reqwest::Error) -> Error {
    Error::Network(NetworkError::Request {
        url: url.to_string(),
        source,
    })
}
