//! Optional TOML settings file.
//!
//! Protocol and threshold settings change rarely, so they live in a file
//! passed with `--config` instead of on the command line:
//!
//! ```toml
//! [protocol]
//! actuator_shift = 12
//!
//! [thresholds]
//! temperature = 21.0
//! moisture = 50.0
//! brightness = 60
//!
//! [limits]
//! temperature = [0.0, 30.0]
//! moisture = [0.0, 100.0]
//! brightness = [0.0, 40000.0]
//!
//! [display]
//! brightness_range = [300.0, 10000.0]
//! ```
//!
//! Every field has a serde default, so a partial file (or no file at all)
//! yields the stock values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use leafysan_core::protocol::constants::DEFAULT_ACTUATOR_SHIFT;
use leafysan_core::{ThresholdCandidate, ThresholdError, ThresholdLimits, ThresholdRange};

use crate::domain::config::BridgeConfig;
use crate::domain::display::DisplayRange;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A file system I/O error occurred.
    #[error("I/O error reading settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A `[limits]` range is unordered, negative or too large.
    #[error("invalid [limits] section: {0}")]
    Limits(#[from] ThresholdError),
}

// ── Settings schema types ─────────────────────────────────────────────────────

/// Top-level settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsFile {
    #[serde(default)]
    pub protocol: ProtocolSettings,
    #[serde(default)]
    pub thresholds: ThresholdSettings,
    #[serde(default)]
    pub limits: LimitSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

/// Serial protocol revision parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProtocolSettings {
    /// Right-shift applied to the actuator slot before masking.
    #[serde(default = "default_actuator_shift")]
    pub actuator_shift: u32,
}

/// Setpoints in force at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdSettings {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_moisture")]
    pub moisture: f64,
    #[serde(default = "default_brightness")]
    pub brightness: f64,
}

/// Inclusive `[min, max]` ranges accepted from dashboards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitSettings {
    #[serde(default = "default_temperature_limits")]
    pub temperature: [f64; 2],
    #[serde(default = "default_moisture_limits")]
    pub moisture: [f64; 2],
    #[serde(default = "default_brightness_limits")]
    pub brightness: [f64; 2],
}

/// Dashboard gauge bands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplaySettings {
    #[serde(default = "default_brightness_range")]
    pub brightness_range: [f64; 2],
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_actuator_shift() -> u32 {
    DEFAULT_ACTUATOR_SHIFT
}
fn default_temperature() -> f64 {
    21.0
}
fn default_moisture() -> f64 {
    50.0
}
fn default_brightness() -> f64 {
    60.0
}
fn default_temperature_limits() -> [f64; 2] {
    [0.0, 30.0]
}
fn default_moisture_limits() -> [f64; 2] {
    [0.0, 100.0]
}
fn default_brightness_limits() -> [f64; 2] {
    [0.0, 40_000.0]
}
fn default_brightness_range() -> [f64; 2] {
    [300.0, 10_000.0]
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            actuator_shift: default_actuator_shift(),
        }
    }
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            moisture: default_moisture(),
            brightness: default_brightness(),
        }
    }
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            temperature: default_temperature_limits(),
            moisture: default_moisture_limits(),
            brightness: default_brightness_limits(),
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            brightness_range: default_brightness_range(),
        }
    }
}

// ── Loading and applying ──────────────────────────────────────────────────────

/// Loads a settings file from `path`.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] if the file cannot be read and
/// [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings(path: &Path) -> Result<SettingsFile, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

impl SettingsFile {
    /// Copies these settings into `config`.
    ///
    /// The actuator shift is checked later, when the channel codec is built.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Limits`] if a `[limits]` range is invalid.
    pub fn apply_to(&self, config: &mut BridgeConfig) -> Result<(), SettingsError> {
        let range = |[min, max]: [f64; 2]| ThresholdRange::new(min, max);

        config.limits = ThresholdLimits::new(
            range(self.limits.temperature),
            range(self.limits.moisture),
            range(self.limits.brightness),
        )?;
        config.actuator_shift = self.protocol.actuator_shift;
        config.initial_thresholds = ThresholdCandidate {
            temperature: Some(self.thresholds.temperature),
            moisture: Some(self.thresholds.moisture),
            brightness: Some(self.thresholds.brightness),
        };
        let [min, max] = self.display.brightness_range;
        config.brightness_display = DisplayRange::new(min, max);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
