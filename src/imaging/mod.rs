//! Image processing: decode, letterbox, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Resize** | Lanczos3 via `image::imageops::resize` |
//! | **Pad** | solid canvas + `image::imageops::replace` |
//! | **Encode** | `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for letterbox geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`resize_and_pad`], combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Bitmap, Dimensions, ImageBackend};
pub use calculations::{LetterboxPlan, Placement, center_offset, fit_within, plan_letterbox};
pub use operations::resize_and_pad;
pub use params::{Background, EncodeParams, ExtentParams, Quality, ResizeParams};
pub use rust_backend::{OUTPUT_CONTENT_TYPE, RustBackend};
