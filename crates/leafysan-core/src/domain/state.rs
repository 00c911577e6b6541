//! State store: the latest channel values plus the current threshold set.
//!
//! # Ownership
//!
//! There is exactly one [`StateStore`] per serial session.  It is created when
//! the session starts and handed by reference (or behind a lock, see below) to
//! everything that reads or writes it:
//!
//! - the serial reader writes channel values via [`StateStore::apply_frame`];
//! - dashboards write thresholds via [`StateStore::set_thresholds`];
//! - the setpoint tick and the archive writer only read.
//!
//! # Concurrency
//!
//! The store itself is a plain struct with no interior mutability.  When the
//! bridge shares it between tasks it wraps it in a lock held for exactly one
//! method call, so each update is applied whole and no reader ever observes a
//! half-written record.  No history is kept here; history lives in the CSV
//! archive.

use std::fmt;

use thiserror::Error;

use crate::protocol::channel::{ChannelCodec, ChannelUpdate};
use crate::protocol::frame::Frame;

// ── Channel values ────────────────────────────────────────────────────────────

/// On/off state of the four actuators driven by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorStates {
    pub heating: bool,
    pub watering: bool,
    pub lighting: bool,
    pub ventilation: bool,
}

/// Latest sensor readings in raw integer units.
///
/// Display scaling (tenths → one decimal, percentage bands) is a presentation
/// concern of the dashboard, not of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelValues {
    /// Light level as reported by the firmware.
    pub brightness: u32,
    /// Soil moisture in tenths of a percent.
    pub moisture_tenths: u32,
    /// Air temperature in tenths of a degree Celsius.
    pub temperature_tenths: u32,
    /// CO₂ concentration in ppm.
    pub co2: u32,
    pub actuators: ActuatorStates,
}

impl ChannelValues {
    /// Overwrites the channels present in `update` and keeps the rest.
    pub fn apply(&mut self, update: &ChannelUpdate) {
        if let Some(v) = update.brightness {
            self.brightness = v;
        }
        if let Some(v) = update.moisture {
            self.moisture_tenths = v;
        }
        if let Some(v) = update.temperature {
            self.temperature_tenths = v;
        }
        if let Some(v) = update.co2 {
            self.co2 = v;
        }
        if let Some(a) = update.actuators {
            self.actuators = a;
        }
    }
}

// ── Thresholds ────────────────────────────────────────────────────────────────

/// Setpoints pushed to the controller once per tick.
///
/// Temperature and moisture are kept as integer tenths so that the outbound
/// encoding is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub temperature_tenths: u16,
    pub moisture_tenths: u16,
    pub brightness: u16,
}

impl Default for Thresholds {
    /// 21.0 °C, 50.0 % moisture, brightness 60.
    fn default() -> Self {
        Self {
            temperature_tenths: 210,
            moisture_tenths: 500,
            brightness: 60,
        }
    }
}

/// Identifies one threshold field in validation reports and log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdField {
    Temperature,
    Moisture,
    Brightness,
}

impl ThresholdField {
    pub fn name(self) -> &'static str {
        match self {
            ThresholdField::Temperature => "temperature",
            ThresholdField::Moisture => "moisture",
            ThresholdField::Brightness => "brightness",
        }
    }

    /// Factor between the display unit and the stored integer unit.
    fn scale(self) -> f64 {
        match self {
            ThresholdField::Temperature | ThresholdField::Moisture => 10.0,
            ThresholdField::Brightness => 1.0,
        }
    }
}

impl fmt::Display for ThresholdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reasons a single threshold field was not committed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    /// The candidate was NaN or infinite.
    #[error("{field}: value is not a finite number")]
    NotFinite { field: ThresholdField },

    /// The candidate lay outside the accepted range.
    #[error("{field}: {value} outside accepted range {min}..={max}")]
    OutOfRange {
        field: ThresholdField,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A configured range cannot be represented in the stored integer unit.
    #[error("{field}: invalid limit range {min}..={max}")]
    InvalidLimits {
        field: ThresholdField,
        min: f64,
        max: f64,
    },
}

/// Inclusive range accepted for one threshold, in display units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRange {
    pub min: f64,
    pub max: f64,
}

impl ThresholdRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Accepted ranges for dashboard threshold updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdLimits {
    temperature: ThresholdRange,
    moisture: ThresholdRange,
    brightness: ThresholdRange,
}

impl Default for ThresholdLimits {
    /// Temperature 0–30 °C, moisture 0–100 %, brightness 0–40000.
    fn default() -> Self {
        Self {
            temperature: ThresholdRange::new(0.0, 30.0),
            moisture: ThresholdRange::new(0.0, 100.0),
            brightness: ThresholdRange::new(0.0, 40_000.0),
        }
    }
}

impl ThresholdLimits {
    /// Builds limits after checking that every range is ordered, non-negative
    /// and representable in the 16-bit stored unit.
    ///
    /// # Errors
    ///
    /// Returns [`ThresholdError::InvalidLimits`] for the first offending range.
    pub fn new(
        temperature: ThresholdRange,
        moisture: ThresholdRange,
        brightness: ThresholdRange,
    ) -> Result<Self, ThresholdError> {
        for (field, range) in [
            (ThresholdField::Temperature, temperature),
            (ThresholdField::Moisture, moisture),
            (ThresholdField::Brightness, brightness),
        ] {
            let representable = range.max * field.scale() <= f64::from(u16::MAX);
            if !(range.min >= 0.0 && range.min <= range.max && representable) {
                return Err(ThresholdError::InvalidLimits {
                    field,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(Self {
            temperature,
            moisture,
            brightness,
        })
    }

    pub fn range(&self, field: ThresholdField) -> ThresholdRange {
        match field {
            ThresholdField::Temperature => self.temperature,
            ThresholdField::Moisture => self.moisture,
            ThresholdField::Brightness => self.brightness,
        }
    }

    /// Validates `value` for `field` and converts it to the stored unit.
    fn admit(&self, field: ThresholdField, value: f64) -> Result<u16, ThresholdError> {
        if !value.is_finite() {
            return Err(ThresholdError::NotFinite { field });
        }
        let range = self.range(field);
        if !range.contains(value) {
            return Err(ThresholdError::OutOfRange {
                field,
                value,
                min: range.min,
                max: range.max,
            });
        }
        // In range and the range is representable, so the cast cannot truncate.
        Ok((value * field.scale()).round() as u16)
    }
}

/// A proposed threshold update; `None` fields are left alone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThresholdCandidate {
    pub temperature: Option<f64>,
    pub moisture: Option<f64>,
    pub brightness: Option<f64>,
}

/// Per-field outcome of [`StateStore::set_thresholds`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThresholdUpdate {
    pub accepted: Vec<ThresholdField>,
    pub rejected: Vec<ThresholdError>,
}

impl ThresholdUpdate {
    /// `true` when no proposed field was rejected.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ── State store ───────────────────────────────────────────────────────────────

/// Latest channel values plus the current threshold set.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    values: ChannelValues,
    thresholds: Thresholds,
    limits: ThresholdLimits,
    codec: ChannelCodec,
}

impl StateStore {
    /// Creates a store with zeroed readings and default thresholds.
    pub fn new(codec: ChannelCodec, limits: ThresholdLimits) -> Self {
        Self {
            values: ChannelValues::default(),
            thresholds: Thresholds::default(),
            limits,
            codec,
        }
    }

    /// Decodes `frame` and writes the channels it carried.
    ///
    /// Channels absent from the frame keep their previous value.  Applying the
    /// same frame twice leaves the store exactly as after the first time.
    pub fn apply_frame(&mut self, frame: &Frame) -> ChannelUpdate {
        let update = self.codec.decode(frame);
        self.values.apply(&update);
        update
    }

    /// Snapshot of the latest readings.
    pub fn current_values(&self) -> ChannelValues {
        self.values
    }

    /// Snapshot of the current setpoints.
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn limits(&self) -> &ThresholdLimits {
        &self.limits
    }

    /// Commits each field of `candidate` that passes validation.
    ///
    /// Fields are validated independently: a rejected field keeps its previous
    /// value while the valid fields of the same candidate are still applied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use leafysan_core::{StateStore, ThresholdCandidate};
    ///
    /// let mut store = StateStore::default();
    /// let update = store.set_thresholds(&ThresholdCandidate {
    ///     temperature: Some(31.0),
    ///     moisture: Some(42.5),
    ///     brightness: None,
    /// });
    /// assert_eq!(update.rejected.len(), 1);
    /// assert_eq!(store.thresholds().temperature_tenths, 210);
    /// assert_eq!(store.thresholds().moisture_tenths, 425);
    /// ```
    pub fn set_thresholds(&mut self, candidate: &ThresholdCandidate) -> ThresholdUpdate {
        let mut report = ThresholdUpdate::default();

        for (field, proposed) in [
            (ThresholdField::Temperature, candidate.temperature),
            (ThresholdField::Moisture, candidate.moisture),
            (ThresholdField::Brightness, candidate.brightness),
        ] {
            let Some(value) = proposed else { continue };
            match self.limits.admit(field, value) {
                Ok(stored) => {
                    match field {
                        ThresholdField::Temperature => self.thresholds.temperature_tenths = stored,
                        ThresholdField::Moisture => self.thresholds.moisture_tenths = stored,
                        ThresholdField::Brightness => self.thresholds.brightness = stored,
                    }
                    report.accepted.push(field);
                }
                Err(e) => report.rejected.push(e),
            }
        }

        report
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
