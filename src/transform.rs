//! Thumbnail requests, end to end.
//!
//! [`Transformer`] ties the pieces together for one `(source, width, height)`
//! request:
//!
//! ```text
//! validate → derive key → cache lookup ─hit─────────────────────→ encode
//!                              └─miss→ fetch → decode → letterbox → encode → cache store
//! ```
//!
//! Validation happens before any I/O. Fetch and decode failures abort the
//! request before the cache is touched, so a broken source is never cached.
//! Decode, letterbox and encode are CPU-bound and run on the blocking pool.

use crate::cache::CacheManager;
use crate::fetch::{FetchError, Fetcher};
use crate::imaging::{
    BackendError, Background, Bitmap, Dimensions, EncodeParams, ImageBackend, Quality,
    resize_and_pad,
};
use crate::naming::derive_cache_key;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum TransformError {
    /// Missing or out-of-range request parameters.
    #[error("{0}")]
    InvalidArgument(String),
    /// The source could not be fetched or is not an image.
    #[error("{0}")]
    SourceUnavailable(String),
    /// Local failure while producing the thumbnail.
    #[error("{0}")]
    Processing(String),
}

impl TransformError {
    fn from_fetch(source: &str, err: &FetchError) -> Self {
        let message = match err {
            FetchError::NotFound(_)
            | FetchError::Status { .. }
            | FetchError::TooLarge { .. }
            | FetchError::LocalFilesDisabled(_) => NOT_AN_IMAGE.to_string(),
            FetchError::Tls(_) => "Failed to open ssl connection".to_string(),
            FetchError::Connection(_) => format!("Could not open connection to {source}"),
        };
        Self::SourceUnavailable(message)
    }
}

const NOT_AN_IMAGE: &str = "URL not found or not an image";

/// Raw request parameters, exactly as received. Any of them may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbnailRequest {
    pub url: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl ThumbnailRequest {
    pub fn new(url: &str, width: impl ToString, height: impl ToString) -> Self {
        Self {
            url: Some(url.to_string()),
            width: Some(width.to_string()),
            height: Some(height.to_string()),
        }
    }
}

pub struct Transformer {
    fetcher: Arc<dyn Fetcher>,
    backend: Arc<dyn ImageBackend>,
    cache: Arc<CacheManager>,
    background: Background,
    encode: EncodeParams,
    max_pixels: u64,
}

/// Largest output canvas accepted by default, in pixels (8000x8000).
pub const DEFAULT_MAX_PIXELS: u64 = 8000 * 8000;

impl Transformer {
    /// Black padding, default JPEG quality and [`DEFAULT_MAX_PIXELS`]; see
    /// [`with_background`](Self::with_background), [`with_quality`](Self::with_quality)
    /// and [`with_max_pixels`](Self::with_max_pixels).
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        backend: Arc<dyn ImageBackend>,
        cache: Arc<CacheManager>,
    ) -> Self {
        Self {
            fetcher,
            backend,
            cache,
            background: Background::default(),
            encode: EncodeParams::default(),
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.encode.quality = quality;
        self
    }

    /// Reject requests whose `width * height` exceeds `max_pixels`.
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Validate raw request parameters, then [`transform`](Self::transform).
    pub async fn handle(&self, request: &ThumbnailRequest) -> Result<Vec<u8>, TransformError> {
        let (Some(url), Some(width), Some(height)) =
            (&request.url, &request.width, &request.height)
        else {
            return Err(TransformError::InvalidArgument(format!(
                "Arguments cannot be nil, got: url={}, width={}, height={}",
                request.url.as_deref().unwrap_or_default(),
                request.width.as_deref().unwrap_or_default(),
                request.height.as_deref().unwrap_or_default(),
            )));
        };

        let (Ok(w), Ok(h)) = (width.trim().parse::<i64>(), height.trim().parse::<i64>()) else {
            return Err(not_positive(width, height));
        };
        self.transform(url, w, h).await
    }

    /// Produce the JPEG thumbnail of `source` at exactly `width`×`height`.
    pub async fn transform(
        &self,
        source: &str,
        width: i64,
        height: i64,
    ) -> Result<Vec<u8>, TransformError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(TransformError::InvalidArgument(format!(
                "Arguments cannot be nil, got: url={source}, width={width}, height={height}"
            )));
        }
        let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(not_positive(width, height));
        };
        if w == 0 || h == 0 {
            return Err(not_positive(width, height));
        }
        if u64::from(w) * u64::from(h) > self.max_pixels {
            return Err(TransformError::InvalidArgument(format!(
                "Requested size exceeds {} pixels, got: width={width}, height={height}",
                self.max_pixels
            )));
        }
        let target = Dimensions::new(w, h);
        let key = derive_cache_key(source, w, h);

        if let Some(cached) = self.cache.lookup(&key).await {
            debug!(%key, "serving cached thumbnail");
            return self.encode(cached).await;
        }

        let bytes = self
            .fetcher
            .fetch(source)
            .await
            .map_err(|e| {
                debug!(source, error = %e, "fetch failed");
                TransformError::from_fetch(source, &e)
            })?;

        let backend = Arc::clone(&self.backend);
        let background = self.background;
        let encode = self.encode;
        let (thumbnail, encoded) = run_blocking(move || {
            let original = backend.decode(&bytes).map_err(|e| {
                debug!(error = %e, "source does not decode");
                TransformError::SourceUnavailable(NOT_AN_IMAGE.to_string())
            })?;
            let thumbnail =
                resize_and_pad(backend.as_ref(), &original, target, background).map_err(processing)?;
            let encoded = backend.encode(&thumbnail, &encode).map_err(processing)?;
            Ok((thumbnail, encoded))
        })
        .await?;

        self.cache
            .store(&key, Arc::new(thumbnail), encoded.clone())
            .await;
        Ok(encoded)
    }

    async fn encode(&self, bitmap: Arc<Bitmap>) -> Result<Vec<u8>, TransformError> {
        let backend = Arc::clone(&self.backend);
        let params = self.encode;
        run_blocking(move || backend.encode(&bitmap, &params).map_err(processing)).await
    }
}

fn not_positive(width: impl std::fmt::Display, height: impl std::fmt::Display) -> TransformError {
    TransformError::InvalidArgument(format!(
        "Width and height must be positive integers, got: width={width}, height={height}"
    ))
}

fn processing(err: BackendError) -> TransformError {
    error!(error = %err, "thumbnail processing failed");
    TransformError::Processing(err.to_string())
}

async fn run_blocking<T, F>(f: F) -> Result<T, TransformError>
where
    F: FnOnce() -> Result<T, TransformError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "blocking task failed");
        TransformError::Processing(format!("blocking task failed: {e}"))
    })?
}
