//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides the letterbox plan) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1-100, default 90). Clamped on construction.
//! - [`Background`]: Solid RGB fill used for letterbox padding (default black).
//! - [`ResizeParams`]: Exact target dimensions for a resample.
//! - [`ExtentParams`]: Canvas size, placement offset and fill for padding.
//! - [`EncodeParams`]: Output encoding settings.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Padding color for letterboxed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Background([u8; 3]);

impl Background {
    pub fn new(rgb: [u8; 3]) -> Self {
        Self(rgb)
    }

    pub fn rgb(self) -> [u8; 3] {
        self.0
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }
}

/// Parameters for an exact resample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
}

/// Parameters for placing an image on a solid canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtentParams {
    /// Final canvas dimensions.
    pub width: u32,
    pub height: u32,
    /// Top-left corner of the source image on the canvas.
    pub offset_x: u32,
    pub offset_y: u32,
    pub background: Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeParams {
    pub quality: Quality,
}
