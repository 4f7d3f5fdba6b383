//! Library configuration module.
//!
//! Handles loading, validating, and merging the optional `config.toml` that
//! lives in the works root next to the artist directories. The works root
//! itself is never discovered here: callers pass it in explicitly.
//!
//! ## Config File Location
//!
//! ```text
//! works/
//! ├── config.toml              # Optional, overrides stock defaults
//! ├── 1001/                    # Artist directory (numeric name)
//! │   ├── 88100_p0.jpg
//! │   └── 88100_p0.jpg.json    # Sidecar metadata
//! └── 1002/
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [media]
//! prefix = "/media"                                  # mediaRef = <prefix>/<artist>/<file>
//! extensions = ["jpg", "jpeg", "png", "webp", "gif"] # Case-insensitive
//!
//! [pagination]
//! options = [20, 50, 100, 200, 500]  # Accepted perPage values (plus "all")
//! default = 100                      # Used when perPage is missing or unknown
//!
//! [artists]
//! fallback_id = "single"   # Id for a non-numeric root scanned as one artist
//! ```
//!
//! Unknown keys are rejected to catch typos early.

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
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Library configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    /// Media locator construction and recognized image extensions.
    pub media: MediaConfig,
    /// Enumerated page sizes and the default.
    pub pagination: PaginationConfig,
    /// Artist discovery settings.
    pub artists: ArtistsConfig,
}

impl LibraryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.media.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "media.extensions must not be empty".into(),
            ));
        }
        if self.pagination.options.is_empty() {
            return Err(ConfigError::Validation(
                "pagination.options must not be empty".into(),
            ));
        }
        if self.pagination.options.contains(&0) {
            return Err(ConfigError::Validation(
                "pagination.options values must be non-zero".into(),
            ));
        }
        if !self.pagination.options.contains(&self.pagination.default) {
            return Err(ConfigError::Validation(format!(
                "pagination.default ({}) must be one of pagination.options",
                self.pagination.default
            )));
        }
        if self.artists.fallback_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "artists.fallback_id must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Media locator and file recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Prefix for constructed media references.
    pub prefix: String,
    /// Image file extensions, without the dot. Matched case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            prefix: "/media".to_string(),
            extensions: ["jpg", "jpeg", "png", "webp", "gif"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl MediaConfig {
    /// Whether `ext` (without the dot) is a recognized image extension.
    pub fn is_image_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }
}

/// Pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Accepted numeric `perPage` values.
    pub options: Vec<u32>,
    /// Fallback page size for missing or unrecognized `perPage`.
    pub default: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            options: vec![20, 50, 100, 200, 500],
            default: 100,
        }
    }
}

/// Artist discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtistsConfig {
    /// Artist id used when the root holds no numeric artist directories
    /// and its own directory name is not numeric either.
    pub fallback_id: String,
}

impl Default for ArtistsConfig {
    fn default() -> Self {
        Self {
            fallback_id: "single".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LibraryConfig::default()).expect("default config must serialize")
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LibraryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LibraryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the works root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<LibraryConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# works-index Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Place this file in the works root.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Media
# ---------------------------------------------------------------------------
[media]
# Prefix for media references handed to clients:
#   <prefix>/<artist id>/<file name>  (both components percent-encoded)
prefix = "/media"

# Image file extensions to index (case-insensitive, without the dot).
extensions = ["jpg", "jpeg", "png", "webp", "gif"]

# ---------------------------------------------------------------------------
# Pagination
# ---------------------------------------------------------------------------
[pagination]
# Accepted perPage values. "all" is always accepted as well.
options = [20, 50, 100, 200, 500]

# Page size used when perPage is missing or not one of the options.
default = 100

# ---------------------------------------------------------------------------
# Artists
# ---------------------------------------------------------------------------
[artists]
# When the root has no numeric artist directories it is scanned as a single
# artist. Its own name is used if numeric, otherwise this id.
fallback_id = "single"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = LibraryConfig::default();
        assert_eq!(config.media.prefix, "/media");
        assert_eq!(config.pagination.options, vec![20, 50, 100, 200, 500]);
        assert_eq!(config.pagination.default, 100);
        assert_eq!(config.artists.fallback_id, "single");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let media = MediaConfig::default();
        assert!(media.is_image_extension("JPG"));
        assert!(media.is_image_extension("Webp"));
        assert!(media.is_image_extension("gif"));
        assert!(!media.is_image_extension("json"));
        assert!(!media.is_image_extension("tiff"));
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[media]
prefix = "/files"
"#;
        let config: LibraryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.media.prefix, "/files");
        // Defaults preserved
        assert_eq!(config.media.extensions.len(), 5);
        assert_eq!(config.pagination.default, 100);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.pagination.default, 100);
        assert_eq!(config.media.prefix, "/media");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[pagination]
options = [10, 30]
default = 30
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.pagination.options, vec![10, 30]);
        assert_eq!(config.pagination.default, 30);
        assert_eq!(config.artists.fallback_id, "single");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[media\nprefix = ").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[pagination]\ndefault = 77\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str("[p]\nv = [1, 2, 3]\nk = 1").unwrap();
        let overlay: toml::Value = toml::from_str("[p]\nv = [9]").unwrap();
        let merged = merge_toml(base, overlay);
        let v = merged["p"]["v"].as_array().unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(merged["p"]["k"].as_integer(), Some(1));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<LibraryConfig, _> = toml::from_str("unknown_key = 1");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<LibraryConfig, _> = toml::from_str("[media]\nprefx = \"/x\"");
        assert!(result.is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(LibraryConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_zero_page_size() {
        let mut config = LibraryConfig::default();
        config.pagination.options = vec![0, 100];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_empty_extensions() {
        let mut config = LibraryConfig::default();
        config.media.extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: LibraryConfig = toml::from_str(stock_config_toml()).unwrap();
        let default = LibraryConfig::default();
        assert_eq!(config.media.extensions, default.media.extensions);
        assert_eq!(config.pagination.options, default.pagination.options);
        assert_eq!(config.artists.fallback_id, default.artists.fallback_id);
    }
}
