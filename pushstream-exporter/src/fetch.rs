//! Retrieval of the raw `channels-stats` document.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// Errors raised while fetching the statistics document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid scrape URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("Unsupported scheme: {0:?}")]
    UnsupportedScheme(String),
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Fetches the statistics document from a fixed location.
///
/// `http` and `https` URIs go through a shared HTTP client; `file` URIs read
/// a local file, which is handy for fixtures.
#[derive(Debug, Clone)]
pub enum Fetcher {
    Http { client: reqwest::Client, url: Url },
    File { path: PathBuf, timeout: Duration },
}

impl Fetcher {
    /// Validate `uri` and build a fetcher that gives up after `timeout`.
    pub fn new(uri: &str, timeout: Duration) -> Result<Self, FetchError> {
        let url = Url::parse(uri).map_err(|e| FetchError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {
                let client = reqwest::Client::builder()
                    .timeout(timeout)
                    .no_proxy()
                    .build()?;
                Ok(Fetcher::Http { client, url })
            }
            "file" => {
                let path = url.to_file_path().map_err(|_| FetchError::InvalidUri {
                    uri: uri.to_string(),
                    reason: "not a local file path".to_string(),
                })?;
                Ok(Fetcher::File { path, timeout })
            }
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Location being scraped, for logging.
    pub fn location(&self) -> String {
        match self {
            Fetcher::Http { url, .. } => url.to_string(),
            Fetcher::File { path, .. } => path.display().to_string(),
        }
    }

    /// Fetch the raw response body.
    pub async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        match self {
            Fetcher::Http { client, url } => {
                let response = client.get(url.clone()).send().await?;

                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status.as_u16()));
                }

                Ok(response.bytes().await?.to_vec())
            }
            Fetcher::File { path, timeout } => {
                tokio::time::timeout(*timeout, tokio::fs::read(path))
                    .await
                    .map_err(|_| FetchError::Timeout(*timeout))?
                    .map_err(|source| FetchError::Io {
                        path: path.display().to_string(),
                        source,
                    })
            }
        }
    }
}
