//! Conversions between raw channel units and dashboard display units.
//!
//! The controller reports moisture and temperature in tenths and brightness
//! as a raw light level.  Dashboards show one-decimal values and gauges that
//! run from 0 to 100 %.  Every conversion lives here as a named function so
//! the protocol core never has to know about presentation.

use serde::{Deserialize, Serialize};

/// Scales a value held in tenths to its display unit (`×0.1`).
pub fn tenths_to_display(tenths: u32) -> f64 {
    f64::from(tenths) / 10.0
}

/// Formats a value held in tenths with exactly one decimal.
///
/// Integer arithmetic keeps the output exact: `487` becomes `"48.7"`.
pub fn format_tenths(tenths: u32) -> String {
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Formats an arbitrary display value with exactly one decimal.
pub fn format_one_decimal(value: f64) -> String {
    format!("{value:.1}")
}

/// A gauge band used to clamp-and-normalize a reading into a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRange {
    pub min: f64,
    pub max: f64,
}

impl DisplayRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamps `value` into the band and maps it onto 0–100 %.
    ///
    /// A degenerate band (`max <= min`) maps everything to 0 %.
    ///
    /// # Example
    ///
    /// ```rust
    /// use leafysan_bridge::domain::DisplayRange;
    ///
    /// let band = DisplayRange::new(300.0, 10_000.0);
    /// assert_eq!(band.normalize_percent(100.0), 0.0);
    /// assert_eq!(band.normalize_percent(20_000.0), 100.0);
    /// ```
    pub fn normalize_percent(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span.is_nan() || span <= 0.0 {
            return 0.0;
        }
        let clamped = value.clamp(self.min, self.max);
        (clamped - self.min) / span * 100.0
    }
}

impl Default for DisplayRange {
    /// The brightness gauge band: 300 to 10000.
    fn default() -> Self {
        Self::new(300.0, 10_000.0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
