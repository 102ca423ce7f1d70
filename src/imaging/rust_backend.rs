//! Pure Rust codec backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image::load_from_memory` → RGB8 |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Extend | `RgbImage::from_pixel` canvas + `image::imageops::replace` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Bitmap, ImageBackend};
use super::params::{EncodeParams, ExtentParams, ResizeParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageBuffer, ImageEncoder, Rgb, RgbImage};

/// Borrowed view of a [`Bitmap`] as an `image` buffer, no copy.
type RgbView<'a> = ImageBuffer<Rgb<u8>, &'a [u8]>;

/// MIME type of everything [`RustBackend::encode`] produces.
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

/// `image`-crate backend.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn view(bitmap: &Bitmap) -> Result<RgbView<'_>, BackendError> {
    ImageBuffer::from_raw(bitmap.width(), bitmap.height(), bitmap.pixels()).ok_or_else(|| {
        BackendError::ProcessingFailed(format!(
            "Pixel buffer does not match {}x{}",
            bitmap.width(),
            bitmap.height()
        ))
    })
}

fn into_bitmap(img: RgbImage) -> Result<Bitmap, BackendError> {
    let (width, height) = img.dimensions();
    Bitmap::new(width, height, img.into_raw())
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, BackendError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| BackendError::Decode(format!("Failed to decode image: {}", e)))?;
        into_bitmap(img.to_rgb8())
    }

    fn encode(&self, bitmap: &Bitmap, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, params.quality.value())
            .write_image(
                bitmap.pixels(),
                bitmap.width(),
                bitmap.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))?;
        Ok(out)
    }

    fn resize(&self, bitmap: &Bitmap, params: &ResizeParams) -> Result<Bitmap, BackendError> {
        let src = view(bitmap)?;
        let resized =
            image::imageops::resize(&src, params.width, params.height, FilterType::Lanczos3);
        into_bitmap(resized)
    }

    fn extend(&self, bitmap: &Bitmap, params: &ExtentParams) -> Result<Bitmap, BackendError> {
        let src = view(bitmap)?;
        let mut canvas = RgbImage::from_pixel(
            params.width,
            params.height,
            Rgb(params.background.rgb()),
        );
        image::imageops::replace(
            &mut canvas,
            &src,
            i64::from(params.offset_x),
            i64::from(params.offset_y),
        );
        into_bitmap(canvas)
    }
}
