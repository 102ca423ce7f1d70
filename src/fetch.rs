//! Source retrieval: turn a source reference into raw image bytes.
//!
//! `http://` and `https://` references are downloaded with `reqwest`; anything
//! else is treated as a filesystem path (with an optional `file://` prefix)
//! when `[fetch] allow_local_files` is enabled. Bodies larger than
//! `[fetch] max_bytes` are rejected while streaming, before they are fully
//! buffered.
//!
//! Timeouts are the adapter's concern, not the transform engine's: the
//! `reqwest` client carries the configured `timeout_secs`.

use crate::config::FetchConfig;
use async_trait::async_trait;
use std::error::Error as StdError;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("Source not found: {0}")]
    NotFound(String),
    #[error("Source returned HTTP {status}: {source_ref}")]
    Status { status: u16, source_ref: String },
    #[error("TLS failure for {0}")]
    Tls(String),
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Source exceeds {limit} bytes: {source_ref}")]
    TooLarge { limit: usize, source_ref: String },
    #[error("Local files are disabled: {0}")]
    LocalFilesDisabled(String),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError>;
}

/// Production fetcher: HTTP(S) via `reqwest`, local files via `tokio::fs`.
pub struct SourceFetcher {
    client: reqwest::Client,
    max_bytes: usize,
    allow_local_files: bool,
}

impl SourceFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            max_bytes: config.max_bytes,
            allow_local_files: config.allow_local_files,
        })
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, &e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                source_ref: url.to_string(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(self.too_large(url));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| classify_request_error(url, &e))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url, bytes = body.len(), "fetched source");
        Ok(body)
    }

    async fn fetch_file(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        if !self.allow_local_files {
            return Err(FetchError::LocalFilesDisabled(source.to_string()));
        }
        let path = Path::new(source.strip_prefix("file://").unwrap_or(source));

        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|_| FetchError::NotFound(source.to_string()))?;
        if !meta.is_file() {
            return Err(FetchError::NotFound(source.to_string()));
        }
        if meta.len() > self.max_bytes as u64 {
            return Err(self.too_large(source));
        }

        let body = tokio::fs::read(path)
            .await
            .map_err(|e| FetchError::Connection(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = body.len(), "read local source");
        Ok(body)
    }

    fn too_large(&self, source: &str) -> FetchError {
        FetchError::TooLarge {
            limit: self.max_bytes,
            source_ref: source.to_string(),
        }
    }
}

#[async_trait]
impl Fetcher for SourceFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        if is_http(source) {
            self.fetch_http(source).await
        } else {
            self.fetch_file(source).await
        }
    }
}

fn is_http(source: &str) -> bool {
    let lower = source.get(..8).unwrap_or(source).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn classify_request_error(url: &str, err: &reqwest::Error) -> FetchError {
    if err.is_builder() {
        FetchError::NotFound(url.to_string())
    } else if mentions_tls(err) {
        FetchError::Tls(url.to_string())
    } else {
        FetchError::Connection(format!("{url}: {err}"))
    }
}

/// `reqwest` does not expose TLS failures as a kind; look for them in the
/// error chain instead.
fn mentions_tls(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let msg = e.to_string().to_ascii_lowercase();
        if msg.contains("certificate") || msg.contains("tls") || msg.contains("handshake") {
            return true;
        }
        current = e.source();
    }
    false
}
