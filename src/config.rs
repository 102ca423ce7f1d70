//! Server configuration module.
//!
//! Handles loading, validating, and merging `letterbox.toml`. Stock defaults
//! are overridden by whatever keys the user file sets; command-line flags
//! override both for the listen address.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! host = "0.0.0.0"
//! port = 4567
//!
//! [cache]
//! capacity = 3              # Decoded thumbnails kept in memory
//!
//! [output]
//! quality = 90              # JPEG quality (1-100)
//! background = "#000000"    # Letterbox padding color
//! max_pixels = 64000000     # Largest width * height accepted
//!
//! [fetch]
//! timeout_secs = 30
//! max_bytes = 26214400      # 25 MiB
//! allow_local_files = false
//!
//! [store]
//! backend = "s3"            # "s3" or "memory"
//! bucket = "letterbox-thumbnails"
//! region = "us-east-1"
//! # endpoint = "http://localhost:9000"
//! # access_key = "..."
//! # secret_key = "..."
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Background, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration loaded from `letterbox.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Listen address for `letterbox serve`.
    pub server: ServerConfig,
    /// Local cache tier sizing.
    pub cache: CacheConfig,
    /// Output encoding and letterbox fill.
    pub output: OutputConfig,
    /// Source download limits.
    pub fetch: FetchConfig,
    /// Remote object store.
    pub store: StoreConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.capacity == 0 {
            return Err(ConfigError::Validation(
                "cache.capacity must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.output.max_pixels == 0 {
            return Err(ConfigError::Validation(
                "output.max_pixels must be > 0".into(),
            ));
        }
        if Background::from_hex(&self.output.background).is_none() {
            return Err(ConfigError::Validation(format!(
                "output.background must be a #rrggbb color, got {:?}",
                self.output.background
            )));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch.timeout_secs must be positive".into(),
            ));
        }
        if self.fetch.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "fetch.max_bytes must be positive".into(),
            ));
        }
        if self.store.bucket.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store.bucket must not be empty".into(),
            ));
        }
        if self.store.access_key.is_some() != self.store.secret_key.is_some() {
            return Err(ConfigError::Validation(
                "store.access_key and store.secret_key must be set together".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4567,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of decoded thumbnails held in memory. Oldest inserted
    /// entries are evicted first.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u8,
    /// Letterbox padding color as `#rrggbb`.
    pub background: String,
    /// Largest accepted `width * height`. Larger requests are rejected
    /// before anything is fetched or allocated.
    pub max_pixels: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            background: "#000000".to_string(),
            max_pixels: crate::transform::DEFAULT_MAX_PIXELS,
        }
    }
}

impl OutputConfig {
    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }

    /// Parsed padding color. Falls back to black for values that
    /// [`Config::validate`] would reject.
    pub fn background(&self) -> Background {
        Background::from_hex(&self.background).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Whole-request timeout for source downloads.
    pub timeout_secs: u64,
    /// Largest accepted source body.
    pub max_bytes: usize,
    pub user_agent: String,
    /// Accept filesystem paths as sources. Off by default so the HTTP
    /// endpoint cannot read arbitrary files from the host.
    pub allow_local_files: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_bytes: 25 * 1024 * 1024,
            user_agent: concat!("letterbox/", env!("CARGO_PKG_VERSION")).to_string(),
            allow_local_files: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    S3,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub bucket: String,
    pub region: String,
    /// Custom S3-compatible endpoint (MinIO, LocalStack, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::S3,
            bucket: "letterbox-thumbnails".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key: None,
            secret_key: None,
        }
    }
}

impl StoreConfig {
    /// Static credentials, when both halves are configured.
    pub fn credentials(&self) -> Option<(String, String)> {
        Some((self.access_key.clone()?, self.secret_key.clone()?))
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file, or stock defaults when `path` is `None`.
///
/// An explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let overlay = match path {
        Some(p) => {
            let content = fs::read_to_string(p)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `letterbox.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Letterbox Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
host = "0.0.0.0"
port = 4567

# ---------------------------------------------------------------------------
# Local cache tier
# ---------------------------------------------------------------------------
[cache]
# Decoded thumbnails kept in memory. The oldest inserted entry is evicted
# first; evicted thumbnails are still served from the object store.
capacity = 3

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# JPEG encoding quality (1 = worst, 100 = best).
quality = 90

# Padding color used when the requested box is larger than the source.
background = "#000000"

# Largest accepted width * height. Requests above this are rejected with
# a 400 before the source is fetched.
max_pixels = 64000000

# ---------------------------------------------------------------------------
# Source fetching
# ---------------------------------------------------------------------------
[fetch]
timeout_secs = 30

# Largest accepted source image, in bytes (25 MiB).
max_bytes = 26214400

# user_agent = "letterbox/<version>"

# Accept filesystem paths as sources. Keep this off for public servers.
allow_local_files = false

# ---------------------------------------------------------------------------
# Remote object store
# ---------------------------------------------------------------------------
[store]
# "s3" for S3 or any S3-compatible service, "memory" for a process-local map.
backend = "s3"
bucket = "letterbox-thumbnails"
region = "us-east-1"

# Custom endpoint for S3-compatible services; enables path-style requests.
# endpoint = "http://localhost:9000"

# Static credentials. Omit both to use the default AWS credential chain.
# access_key = "..."
# secret_key = "..."
"##
}
