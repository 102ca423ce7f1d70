//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take the requested box, compute a [`LetterboxPlan`], and call the
//! backend for the pixel work.

use super::backend::{BackendError, Bitmap, Dimensions, ImageBackend};
use super::calculations::{LetterboxPlan, plan_letterbox};
use super::params::{Background, ExtentParams, ResizeParams};
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Resize and pad `original` to exactly `target`, preserving aspect ratio.
///
/// Enlargements never upsample past native resolution: the image is fitted
/// and centered on a `background` canvas instead. A target equal to the
/// source size returns an untouched copy.
pub fn resize_and_pad(
    backend: &dyn ImageBackend,
    original: &Bitmap,
    target: Dimensions,
    background: Background,
) -> Result<Bitmap> {
    let source = original.dimensions();
    let plan = plan_letterbox(source, target);
    debug!(
        placement = ?plan.placement,
        source = %format_dims(source),
        target = %format_dims(target),
        "letterbox plan"
    );
    apply_plan(backend, original, &plan, background)
}

/// Execute a precomputed plan.
fn apply_plan(
    backend: &dyn ImageBackend,
    original: &Bitmap,
    plan: &LetterboxPlan,
    background: Background,
) -> Result<Bitmap> {
    let scaled = if plan.needs_resize(original.dimensions()) {
        backend.resize(
            original,
            &ResizeParams {
                width: plan.scaled.width,
                height: plan.scaled.height,
            },
        )?
    } else {
        original.clone()
    };

    if !plan.needs_padding() {
        return Ok(scaled);
    }

    backend.extend(
        &scaled,
        &ExtentParams {
            width: plan.canvas.width,
            height: plan.canvas.height,
            offset_x: plan.offset.0,
            offset_y: plan.offset.1,
            background,
        },
    )
}

fn format_dims(d: Dimensions) -> String {
    format!("{}x{}", d.width, d.height)
}
