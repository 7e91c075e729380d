//! Store configuration.
//!
//! Handles loading, validating, and merging `depot.toml`. User values are
//! layered over the stock defaults, so a config file only needs the keys it
//! wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! storage_root = "storage"          # Directory holding one subdirectory per image
//! max_upload_bytes = 10485760       # 10 MiB, inclusive
//! allowed_extensions = ["jpg", "jpeg", "png", "gif", "bmp", "webp"]
//! public_base_path = "/api/images"  # Prefix for manifest references
//! quality = 75                      # Lossy WebP quality for variants (1-100)
//!
//! [variants.phone]
//! width = 640
//! height = 480
//!
//! [variants.tablet]
//! width = 1024
//! height = 768
//!
//! [variants.desktop]
//! width = 1920
//! height = 1080
//!
//! [processing]
//! max_processes = 4                 # Omit for auto-detection (= CPU cores)
//! ```
//!
//! ## Variants replace, everything else merges
//!
//! Tables are merged key-by-key, except `[variants]`: when a config file names
//! any variant, its set of variants replaces the stock set entirely. This is
//! the only way to drop one of the stock variants.
//!
//! ## Validation
//!
//! Unknown keys are rejected. After merging, [`StoreConfig::validate`] checks
//! that at least one variant exists, variant names are safe file-name
//! components (and not `original` or `metadata`), bounds are non-zero, the
//! quality is in range, and the upload limits are usable.

use crate::imaging::Bounds;
use crate::storage::{METADATA_FILE, ORIGINAL_STEM};
use crate::validation::{UploadLimits, is_safe_component};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "depot.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Store configuration loaded from `depot.toml`.
///
/// Built once at startup and handed to the store; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding one subdirectory per image.
    pub storage_root: String,
    /// Inclusive upload size ceiling in bytes.
    pub max_upload_bytes: u64,
    /// Original file extensions accepted on upload, case-insensitive.
    pub allowed_extensions: Vec<String>,
    /// Prefix for the retrieval references in upload manifests.
    pub public_base_path: String,
    /// Lossy WebP encoding quality for variants (1 = smallest, 100 = best).
    pub quality: u32,
    /// Variant name → bounding box.
    pub variants: BTreeMap<String, Bounds>,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_root: "storage".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_extensions: ["jpg", "jpeg", "png", "gif", "bmp", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            public_base_path: "/api/images".to_string(),
            quality: 75,
            variants: BTreeMap::from([
                ("phone".to_string(), Bounds::new(640, 480)),
                ("tablet".to_string(), Bounds::new(1024, 768)),
                ("desktop".to_string(), Bounds::new(1920, 1080)),
            ]),
            processing: ProcessingConfig::default(),
        }
    }
}

const RESERVED_VARIANT_NAMES: [&str; 2] = [ORIGINAL_STEM, "metadata"];

impl StoreConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.variants.is_empty() {
            return Err(ConfigError::Validation(
                "at least one variant must be configured".into(),
            ));
        }
        for (name, bounds) in &self.variants {
            if !is_safe_component(name) {
                return Err(ConfigError::Validation(format!(
                    "variant name {name:?} may only contain ASCII letters, digits, '-' and '_'"
                )));
            }
            if RESERVED_VARIANT_NAMES.contains(&name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "variant name {name:?} is reserved"
                )));
            }
            if bounds.width == 0 || bounds.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "variants.{name} width and height must be non-zero"
                )));
            }
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Validation("quality must be 1-100".into()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "max_upload_bytes must be non-zero".into(),
            ));
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "allowed_extensions must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .allowed_extensions
            .iter()
            .find(|ext| !is_safe_component(normalize_extension(ext).as_str()))
        {
            return Err(ConfigError::Validation(format!(
                "allowed_extensions entry {bad:?} is not a plain extension"
            )));
        }
        Ok(())
    }

    /// The admissibility limits for uploads, with extensions normalized to
    /// lowercase and stripped of any leading dot.
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_bytes: self.max_upload_bytes,
            allowed_extensions: self
                .allowed_extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
        }
    }

    pub fn storage_root(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Caller-facing reference for one variant of an image.
    pub fn variant_url(&self, id: &str, variant: &str) -> String {
        format!("{}/{id}/{variant}", self.base_path())
    }

    /// Caller-facing reference for an image's metadata record.
    pub fn metadata_url(&self, id: &str) -> String {
        let stem = METADATA_FILE.trim_end_matches(".json");
        format!("{}/{id}/{stem}", self.base_path())
    }

    fn base_path(&self) -> &str {
        self.public_base_path.trim_end_matches('/')
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel variant workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config, clamped to available cores.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(StoreConfig::default())?)
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<StoreConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => {
            let mut base = base;
            if ov.get("variants").is_some() {
                if let toml::Value::Table(table) = &mut base {
                    table.remove("variants");
                }
            }
            merge_toml(base, ov)
        }
        None => base,
    };
    let config: StoreConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the file at `path`, or stock defaults if it is absent.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<StoreConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `depot.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Depot Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Directory holding one subdirectory per stored image.
storage_root = "storage"

# Largest accepted upload in bytes (inclusive). 10 MiB.
max_upload_bytes = 10485760

# Original file extensions accepted on upload (case-insensitive).
allowed_extensions = ["jpg", "jpeg", "png", "gif", "bmp", "webp"]

# Prefix for the retrieval references returned in upload manifests.
public_base_path = "/api/images"

# Lossy WebP quality for every variant (1 = smallest, 100 = best).
quality = 75

# ---------------------------------------------------------------------------
# Variants
# ---------------------------------------------------------------------------
# Each variant is a bounding box. Images are shrunk to fit, keeping their
# aspect ratio, and never enlarged. Every variant is stored as WebP.
#
# Naming any variant here replaces the whole default set.
# Names may use ASCII letters, digits, '-' and '_'.
[variants.phone]
width = 640
height = 480

[variants.tablet]
width = 1024
height = 768

[variants.desktop]
width = 1920
height = 1080

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel variant workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
