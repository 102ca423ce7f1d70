//! Pure calculation functions for letterbox geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;

/// How a source image is mapped onto the requested box.
///
/// Cases are decided in declaration order by [`plan_letterbox`]; the first
/// match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Target is larger on both axes: keep native resolution, pad all sides.
    PadBoth,
    /// Target is wider only: fit to the target height, pad left and right.
    PadWidth,
    /// Target is taller only: fit to the target width, pad top and bottom.
    PadHeight,
    /// Neither axis grows: resample straight to the target, no padding.
    Scale,
}

/// Fully resolved letterbox operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterboxPlan {
    pub placement: Placement,
    /// Size of the image content before padding.
    pub scaled: Dimensions,
    /// Final output size (always equal to the target).
    pub canvas: Dimensions,
    /// Top-left corner of the content on the canvas.
    pub offset: (u32, u32),
}

impl LetterboxPlan {
    /// Whether the plan needs a resample step.
    pub fn needs_resize(&self, source: Dimensions) -> bool {
        self.scaled != source
    }

    /// Whether the plan needs a padding step.
    pub fn needs_padding(&self) -> bool {
        self.scaled != self.canvas
    }
}

/// Decide how to map `source` onto `target`.
///
/// # Examples
/// ```
/// # use letterbox::imaging::{plan_letterbox, Dimensions, Placement};
/// // 1000x600 into 500x300 → straight downscale
/// let plan = plan_letterbox(Dimensions::new(1000, 600), Dimensions::new(500, 300));
/// assert_eq!(plan.placement, Placement::Scale);
///
/// // 1000x600 into 2000x300 → fit to 300 high (500 wide), pad 750 each side
/// let plan = plan_letterbox(Dimensions::new(1000, 600), Dimensions::new(2000, 300));
/// assert_eq!(plan.placement, Placement::PadWidth);
/// assert_eq!(plan.scaled, Dimensions::new(500, 300));
/// assert_eq!(plan.offset, (750, 0));
/// ```
pub fn plan_letterbox(source: Dimensions, target: Dimensions) -> LetterboxPlan {
    let (placement, scaled) = if target.width > source.width && target.height > source.height {
        (Placement::PadBoth, source)
    } else if target.width > source.width {
        (
            Placement::PadWidth,
            fit_within(source, Dimensions::new(source.width, target.height)),
        )
    } else if target.height > source.height {
        (
            Placement::PadHeight,
            fit_within(source, Dimensions::new(target.width, source.height)),
        )
    } else {
        (Placement::Scale, target)
    };

    LetterboxPlan {
        placement,
        scaled,
        canvas: target,
        offset: center_offset(scaled, target),
    }
}

/// Largest size with the source aspect ratio that fits inside `bounds`.
///
/// One axis matches the bound exactly; the other is rounded and never
/// exceeds its bound or drops below one pixel.
pub fn fit_within(source: Dimensions, bounds: Dimensions) -> Dimensions {
    let scale_w = bounds.width as f64 / source.width as f64;
    let scale_h = bounds.height as f64 / source.height as f64;

    if scale_w <= scale_h {
        let h = (source.height as f64 * scale_w).round() as u32;
        Dimensions::new(bounds.width, h.clamp(1, bounds.height))
    } else {
        let w = (source.width as f64 * scale_h).round() as u32;
        Dimensions::new(w.clamp(1, bounds.width), bounds.height)
    }
}

/// Offset that centers `inner` inside `outer` (center gravity).
///
/// Odd leftovers put the extra pixel on the right/bottom edge.
pub fn center_offset(inner: Dimensions, outer: Dimensions) -> (u32, u32) {
    (
        outer.width.saturating_sub(inner.width) / 2,
        outer.height.saturating_sub(inner.height) / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(w: u32, h: u32) -> Dimensions {
        Dimensions::new(w, h)
    }

    // =========================================================================
    // plan_letterbox tests
    // =========================================================================

    #[test]
    fn both_axes_larger_pads_at_native_size() {
        let plan = plan_letterbox(dims(1000, 600), dims(8000, 8000));
        assert_eq!(plan.placement, Placement::PadBoth);
        assert_eq!(plan.scaled, dims(1000, 600));
        assert_eq!(plan.canvas, dims(8000, 8000));
        assert_eq!(plan.offset, (3500, 3700));
        assert!(!plan.needs_resize(dims(1000, 600)));
        assert!(plan.needs_padding());
    }

    #[test]
    fn wider_target_fits_height_and_pads_sides() {
        // 1000x600 → 1200x300: height 300 means width 500
        let plan = plan_letterbox(dims(1000, 600), dims(1200, 300));
        assert_eq!(plan.placement, Placement::PadWidth);
        assert_eq!(plan.scaled, dims(500, 300));
        assert_eq!(plan.offset, (350, 0));
    }

    #[test]
    fn wider_target_with_equal_height_keeps_native_size() {
        let plan = plan_letterbox(dims(1000, 600), dims(1200, 600));
        assert_eq!(plan.placement, Placement::PadWidth);
        assert_eq!(plan.scaled, dims(1000, 600));
        assert_eq!(plan.offset, (100, 0));
    }

    #[test]
    fn taller_target_fits_width_and_pads_top_bottom() {
        // 1000x600 → 500x900: width 500 means height 300
        let plan = plan_letterbox(dims(1000, 600), dims(500, 900));
        assert_eq!(plan.placement, Placement::PadHeight);
        assert_eq!(plan.scaled, dims(500, 300));
        assert_eq!(plan.offset, (0, 300));
    }

    #[test]
    fn smaller_target_scales_directly() {
        let plan = plan_letterbox(dims(1000, 600), dims(500, 300));
        assert_eq!(plan.placement, Placement::Scale);
        assert_eq!(plan.scaled, dims(500, 300));
        assert_eq!(plan.offset, (0, 0));
        assert!(!plan.needs_padding());
    }

    #[test]
    fn smaller_target_with_different_ratio_still_scales_directly() {
        let plan = plan_letterbox(dims(1000, 600), dims(100, 500));
        assert_eq!(plan.placement, Placement::Scale);
        assert_eq!(plan.scaled, dims(100, 500));
    }

    #[test]
    fn identical_target_is_noop_scale() {
        let plan = plan_letterbox(dims(640, 480), dims(640, 480));
        assert_eq!(plan.placement, Placement::Scale);
        assert!(!plan.needs_resize(dims(640, 480)));
        assert!(!plan.needs_padding());
    }

    #[test]
    fn width_branch_wins_over_height_branch() {
        // Only the width grows; the height branch must not be considered.
        let plan = plan_letterbox(dims(100, 100), dims(150, 100));
        assert_eq!(plan.placement, Placement::PadWidth);
    }

    // =========================================================================
    // fit_within tests
    // =========================================================================

    #[test]
    fn fit_landscape_into_shorter_box() {
        assert_eq!(fit_within(dims(1000, 600), dims(1000, 300)), dims(500, 300));
    }

    #[test]
    fn fit_portrait_into_narrower_box() {
        assert_eq!(fit_within(dims(600, 1000), dims(300, 1000)), dims(300, 500));
    }

    #[test]
    fn fit_never_collapses_to_zero() {
        // Extreme ratios round the minor axis toward zero; the 1px floor holds.
        assert_eq!(fit_within(dims(1, 1000), dims(1, 1)), dims(1, 1));
        assert_eq!(fit_within(dims(2000, 1), dims(1000, 1)), dims(1000, 1));
    }

    // =========================================================================
    // center_offset tests
    // =========================================================================

    #[test]
    fn center_offset_even_split() {
        assert_eq!(center_offset(dims(100, 50), dims(200, 150)), (50, 50));
    }

    #[test]
    fn center_offset_odd_leftover_floors() {
        assert_eq!(center_offset(dims(100, 100), dims(101, 103)), (0, 1));
    }
}
