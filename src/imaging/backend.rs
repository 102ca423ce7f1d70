//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: decode, encode, resize, and extend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Pixels travel between the backend and the rest of the crate as a
//! [`Bitmap`], so nothing outside `rust_backend` depends on `image` types.

use super::params::{EncodeParams, ExtentParams, ResizeParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A decoded RGB8 image, row-major, three bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Wrap a raw pixel buffer. The buffer length must be `width * height * 3`
    /// and both dimensions must be non-zero.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Bitmap dimensions must be positive, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(BackendError::ProcessingFailed(format!(
                "Pixel buffer for {width}x{height} must hold {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A bitmap where every pixel is `color`.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// RGB value at `(x, y)`. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Trait for image codec backends.
///
/// Every backend must implement all four operations so the transform engine
/// and cache stay backend-agnostic. Implementations must be `Send + Sync`:
/// a single backend is shared by every in-flight request.
pub trait ImageBackend: Send + Sync {
    /// Decode encoded bytes (any supported input format) into a bitmap.
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, BackendError>;

    /// Encode a bitmap into the output format (JPEG).
    fn encode(&self, bitmap: &Bitmap, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;

    /// Resample to exactly the requested dimensions.
    fn resize(&self, bitmap: &Bitmap, params: &ResizeParams) -> Result<Bitmap, BackendError>;

    /// Place the bitmap on a solid canvas at the given offset.
    fn extend(&self, bitmap: &Bitmap, params: &ExtentParams) -> Result<Bitmap, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{Background, Quality};
    use std::sync::Mutex;

    /// Mock backend that records operations and fabricates bitmaps of the
    /// requested size instead of resampling.
    /// Uses Mutex (not RefCell) so it is Sync and can sit behind an `Arc`.
    #[derive(Default)]
    pub struct MockBackend {
        pub decode_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Encode {
            width: u32,
            height: u32,
            quality: u8,
        },
        Resize {
            width: u32,
            height: u32,
        },
        Extend {
            width: u32,
            height: u32,
            offset_x: u32,
            offset_y: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Each decode pops one entry, so list them in reverse call order.
        pub fn with_decoded(dims: Vec<Dimensions>) -> Self {
            Self {
                decode_results: Mutex::new(dims),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, bytes: &[u8]) -> Result<Bitmap, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(bytes.len()));

            let dims = self
                .decode_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::Decode("No mock dimensions".to_string()))?;
            Ok(Bitmap::filled(dims.width, dims.height, [200, 200, 200]))
        }

        fn encode(&self, bitmap: &Bitmap, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: bitmap.width(),
                height: bitmap.height(),
                quality: params.quality.value(),
            });
            Ok(format!("{}x{}", bitmap.width(), bitmap.height()).into_bytes())
        }

        fn resize(&self, _bitmap: &Bitmap, params: &ResizeParams) -> Result<Bitmap, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                width: params.width,
                height: params.height,
            });
            Ok(Bitmap::filled(params.width, params.height, [200, 200, 200]))
        }

        fn extend(&self, _bitmap: &Bitmap, params: &ExtentParams) -> Result<Bitmap, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Extend {
                width: params.width,
                height: params.height,
                offset_x: params.offset_x,
                offset_y: params.offset_y,
            });
            Ok(Bitmap::filled(
                params.width,
                params.height,
                params.background.rgb(),
            ))
        }
    }

    // =========================================================================
    // Bitmap
    // =========================================================================

    #[test]
    fn bitmap_rejects_wrong_buffer_length() {
        let result = Bitmap::new(2, 2, vec![0; 11]);
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn bitmap_rejects_zero_dimensions() {
        assert!(Bitmap::new(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn bitmap_pixel_is_row_major() {
        let bmp = Bitmap::from_fn(3, 2, |x, y| [x as u8, y as u8, 7]);
        assert_eq!(bmp.pixel(0, 0), [0, 0, 7]);
        assert_eq!(bmp.pixel(2, 0), [2, 0, 7]);
        assert_eq!(bmp.pixel(1, 1), [1, 1, 7]);
        assert_eq!(bmp.pixels().len(), 18);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn bitmap_pixel_out_of_bounds_panics() {
        Bitmap::filled(2, 2, [0, 0, 0]).pixel(2, 0);
    }

    // =========================================================================
    // MockBackend
    // =========================================================================

    #[test]
    fn mock_records_decode() {
        let backend = MockBackend::with_decoded(vec![Dimensions::new(800, 600)]);

        let bmp = backend.decode(b"abc").unwrap();
        assert_eq!(bmp.dimensions(), Dimensions::new(800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Decode(3)]);
    }

    #[test]
    fn mock_records_extend_with_background() {
        let backend = MockBackend::new();
        let src = Bitmap::filled(10, 10, [1, 2, 3]);

        let out = backend
            .extend(
                &src,
                &ExtentParams {
                    width: 20,
                    height: 30,
                    offset_x: 5,
                    offset_y: 10,
                    background: Background::new([9, 9, 9]),
                },
            )
            .unwrap();

        assert_eq!(out.pixel(0, 0), [9, 9, 9]);
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::Extend {
                width: 20,
                height: 30,
                offset_x: 5,
                offset_y: 10,
            }
        ));
    }

    #[test]
    fn mock_records_encode_quality() {
        let backend = MockBackend::new();
        backend
            .encode(
                &Bitmap::filled(4, 3, [0, 0, 0]),
                &EncodeParams {
                    quality: Quality::new(85),
                },
            )
            .unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Encode {
                width: 4,
                height: 3,
                quality: 85
            }]
        );
    }
}
