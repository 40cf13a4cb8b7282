//! Tool configuration.
//!
//! Handles loading, validating, and merging `config.toml` files. Configuration
//! is layered: stock defaults are overridden by a shared file in the presets
//! directory, which is in turn overridden by a per-project file.
//!
//! ## Config File Location
//!
//! ```text
//! presets/
//! ├── config.toml      # Shared (overrides stock defaults)
//! ├── KD.toml          # Project KD (overrides shared)
//! ├── KD.txt           # Project KD template + format mapping
//! └── HJ.txt           # Project HJ, shared config only
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [levels]
//! day = 4          # Path segment holding the shoot day token
//! media = 5        # Path segment holding CAMERA / SOUND
//! roll = 6         # Path segment holding the roll name
//!
//! [units]
//! MU = "Main Unit"
//! 2U = "Second Unit"
//! SU = "Splinter Unit"
//! TE = "Tests"
//!
//! [delivery]
//! fixed_extensions = ["mhl", "md5", "txt"]
//! companion_files = 4
//! deliverable = "A001"
//! medium = "L7"
//! # codename = "KINGDOM"
//! ```
//!
//! Config files are sparse. Override just the values you want; unknown keys
//! are rejected to catch typos early. The `[units]` table merges key by key,
//! so a project file can add a unit code without restating the stock ones.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Shared config file name inside the presets directory.
pub const SHARED_CONFIG: &str = "config.toml";

/// Extensions every delivery lists. A layer may add to these, not drop them.
pub const STOCK_FIXED_EXTENSIONS: [&str; 3] = ["mhl", "md5", "txt"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml` layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Positional path levels.
    pub levels: Levels,
    /// Two-letter unit code → unit reference.
    pub units: BTreeMap<String, String>,
    /// Constants of the physical delivery.
    pub delivery: DeliveryConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            levels: Levels::default(),
            units: default_units(),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl ToolConfig {
    /// Validate config values are usable by the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Levels { day, media, roll } = self.levels;
        if day == media || day == roll || media == roll {
            return Err(ConfigError::Validation(
                "levels.day, levels.media and levels.roll must be distinct".into(),
            ));
        }
        if self.units.is_empty() {
            return Err(ConfigError::Validation("units must not be empty".into()));
        }
        if let Some(code) = self.units.keys().find(|c| c.chars().count() != 2) {
            return Err(ConfigError::Validation(format!(
                "unit code '{code}' must be exactly two characters"
            )));
        }
        let fixed = self.delivery.fixed_extension_set();
        if let Some(missing) = STOCK_FIXED_EXTENSIONS.iter().find(|e| !fixed.contains(**e)) {
            return Err(ConfigError::Validation(format!(
                "delivery.fixed_extensions must include '{missing}'"
            )));
        }
        Ok(())
    }
}

/// Segment indices into a slash-split manifest path.
///
/// With the defaults, `KD0097/KINGDOM/DAILIES/ORIGINAL/<day>/<media>/<roll>/…`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Levels {
    pub day: usize,
    pub media: usize,
    pub roll: usize,
}

impl Levels {
    /// Minimum number of segments a path needs.
    pub fn required_depth(&self) -> usize {
        self.day.max(self.media).max(self.roll) + 1
    }
}

impl Default for Levels {
    fn default() -> Self {
        Self {
            day: 4,
            media: 5,
            roll: 6,
        }
    }
}

/// Delivery constants that end up in the rendered document and filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Extensions always listed, for files delivered next to the media.
    pub fixed_extensions: Vec<String>,
    /// Files on the tape that the manifest itself does not list.
    pub companion_files: usize,
    /// Deliverable id used in the output filename.
    pub deliverable: String,
    /// Medium suffix appended to the barcode (LTO-7 → `L7`).
    pub medium: String,
    /// Name used in the output filename instead of the project id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            fixed_extensions: STOCK_FIXED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            companion_files: 4,
            deliverable: "A001".into(),
            medium: "L7".into(),
            codename: None,
        }
    }
}

impl DeliveryConfig {
    /// Fixed extensions, lower-cased and deduplicated.
    pub fn fixed_extension_set(&self) -> BTreeSet<String> {
        self.fixed_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

/// Stock unit table.
pub fn default_units() -> BTreeMap<String, String> {
    [
        ("MU", "Main Unit"),
        ("2U", "Second Unit"),
        ("SU", "Splinter Unit"),
        ("TE", "Tests"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ToolConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock config does not serialize: {e}")))
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

/// Load a TOML file as a raw value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays in order onto `base`, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = Option<toml::Value>>,
) -> Result<ToolConfig, ConfigError> {
    let merged = overlays.into_iter().flatten().fold(base, merge_toml);
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config for a project.
///
/// Layers: stock defaults → `{presets}/config.toml` → `{presets}/{project}.toml`.
pub fn load_config(presets_dir: &Path, project: &str) -> Result<ToolConfig, ConfigError> {
    let shared = load_raw_config(&presets_dir.join(SHARED_CONFIG))?;
    let project_layer = load_raw_config(&presets_dir.join(format!("{project}.toml")))?;
    resolve_config(stock_defaults_value()?, [shared, project_layer])
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# metablock configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Config files live in the presets directory:
#   presets/config.toml   -> shared (overrides stock defaults)
#   presets/<PROJECT>.toml -> one project (overrides shared)
#
# Each layer only needs the keys it wants to override.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Path levels
# ---------------------------------------------------------------------------
# Zero-based segment indices into each <file> path of the hash-list.
# With the defaults a path looks like:
#   KD0097/KINGDOM/DAILIES/ORIGINAL/<day>/<CAMERA|SOUND>/<roll>/<file>
[levels]
day = 4
media = 5
roll = 6

# ---------------------------------------------------------------------------
# Unit references
# ---------------------------------------------------------------------------
# Two-letter code at the start of the shoot day suffix (MU03, 2U01, ...).
# Unknown codes flag the output for manual review.
[units]
2U = "Second Unit"
MU = "Main Unit"
SU = "Splinter Unit"
TE = "Tests"

# ---------------------------------------------------------------------------
# Delivery
# ---------------------------------------------------------------------------
[delivery]
# Always listed under file formats: files delivered next to the media.
# mhl, md5 and txt are required; more may be added.
fixed_extensions = ["mhl", "md5", "txt"]

# Added to the manifest's file count for the total files figure.
companion_files = 4

# Output filename: <codename|project>_<deliverable>_<barcode><medium>_METADATA.txt
deliverable = "A001"
medium = "L7"
# codename = "KINGDOM"
"##
}
