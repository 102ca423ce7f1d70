//! Shared test utilities for the letterbox unit tests.
//!
//! Synthetic images (so no test depends on fixture files) and a stub
//! [`Fetcher`] that counts calls.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fetcher = StubFetcher::bytes(&jpeg_bytes(200, 150));
//! let bitmap = gradient_bitmap(64, 48);
//! assert_close(bitmap.pixel(0, 0), [0, 0, 128], 1);
//! ```

use crate::fetch::{FetchError, Fetcher};
use crate::imaging::{Bitmap, EncodeParams, ImageBackend, RustBackend};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

// =========================================================================
// Synthetic images
// =========================================================================

/// Bitmap whose red channel ramps left to right and green top to bottom.
/// Blue is fixed at 128 so no pixel matches a black or white background.
pub fn gradient_bitmap(width: u32, height: u32) -> Bitmap {
    Bitmap::from_fn(width, height, |x, y| {
        [
            (x * 255 / width.max(2).saturating_sub(1)).min(255) as u8,
            (y * 255 / height.max(2).saturating_sub(1)).min(255) as u8,
            128,
        ]
    })
}

/// JPEG encoding of [`gradient_bitmap`].
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    RustBackend::new()
        .encode(&gradient_bitmap(width, height), &EncodeParams::default())
        .unwrap()
}

/// Assert each channel of `actual` is within `tolerance` of `expected`.
/// JPEG is lossy, so exact pixel comparisons only hold before encoding.
#[track_caller]
pub fn assert_close(actual: [u8; 3], expected: [u8; 3], tolerance: u8) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(
            a.abs_diff(*e) <= tolerance,
            "pixel {actual:?} not within {tolerance} of {expected:?}"
        );
    }
}

// =========================================================================
// Fetcher stub
// =========================================================================

/// Fetcher that answers every source with the same response and records
/// what it was asked for.
pub struct StubFetcher {
    response: Result<Vec<u8>, FetchError>,
    calls: AtomicUsize,
    sources: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn bytes(bytes: &[u8]) -> Self {
        Self {
            response: Ok(bytes.to_vec()),
            calls: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: FetchError) -> Self {
        Self {
            response: Err(err),
            calls: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sources passed to `fetch`, in call order.
    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sources.lock().unwrap().push(source.to_string());
        self.response.clone()
    }
}
