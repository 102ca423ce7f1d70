//! Cache key naming for transformed images.
//!
//! Every `(source, width, height)` request maps to one key, used both as the
//! local-tier map key and as the object name in the remote store:
//!
//! - `https://example.com/a.jpg`, 500×300 → `https___example.com_a.jpg_width=500_height=300.jpeg`
//! - `  photos/cat 1.png `, 64×64 → `photos_cat_1.png_width=64_height=64.jpeg`
//!
//! Keys are readable rather than hashed. Two distinct sources that sanitize to
//! the same string (e.g. `a/b` and `a_b`) share a key.

use std::fmt;

/// Extension appended to every key; matches the single output format.
pub const OUTPUT_SUFFIX: &str = ".jpeg";

/// A derived cache key. Construct with [`derive_cache_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the cache key for a request.
///
/// The source is trimmed and every character outside `[0-9A-Za-z.-]` becomes
/// `_`. Path separators are replaced too, so the whole sanitized string is
/// already a single path segment.
pub fn derive_cache_key(source: &str, width: u32, height: u32) -> CacheKey {
    CacheKey(format!(
        "{}_width={}_height={}{}",
        sanitize_source(source),
        width,
        height,
        OUTPUT_SUFFIX
    ))
}

/// Replace every character outside `[0-9A-Za-z.-]` with `_`.
pub fn sanitize_source(source: &str) -> String {
    source
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_url_key() {
        assert_eq!(
            derive_cache_key("https://example.com/a.jpg", 500, 300).as_str(),
            "https___example.com_a.jpg_width=500_height=300.jpeg"
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(
            derive_cache_key("  https://example.com/a.jpg\n", 500, 300),
            derive_cache_key("https://example.com/a.jpg", 500, 300)
        );
    }

    #[test]
    fn query_strings_and_spaces_are_replaced() {
        assert_eq!(
            sanitize_source("http://x.io/img?id=7&s=big one"),
            "http___x.io_img_id_7_s_big_one"
        );
    }

    #[test]
    fn dots_and_dashes_survive() {
        assert_eq!(sanitize_source("my-photo.v2.png"), "my-photo.v2.png");
    }

    #[test]
    fn non_ascii_becomes_one_underscore_per_char() {
        assert_eq!(sanitize_source("café.jpg"), "caf_.jpg");
    }

    #[test]
    fn key_is_deterministic() {
        let a = derive_cache_key("https://example.com/a.jpg", 500, 300);
        let b = derive_cache_key("https://example.com/a.jpg", 500, 300);
        assert_eq!(a, b);
    }

    #[test]
    fn key_changes_with_each_input() {
        let base = derive_cache_key("https://example.com/a.jpg", 500, 300);
        assert_ne!(base, derive_cache_key("https://example.com/b.jpg", 500, 300));
        assert_ne!(base, derive_cache_key("https://example.com/a.jpg", 501, 300));
        assert_ne!(base, derive_cache_key("https://example.com/a.jpg", 500, 301));
    }

    #[test]
    fn width_and_height_are_not_interchangeable() {
        assert_ne!(
            derive_cache_key("a.jpg", 300, 500),
            derive_cache_key("a.jpg", 500, 300)
        );
    }

    #[test]
    fn key_ends_with_output_suffix() {
        assert!(derive_cache_key("a.png", 1, 1).as_str().ends_with(OUTPUT_SUFFIX));
    }
}
