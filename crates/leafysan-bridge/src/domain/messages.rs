//! JSON message types for the dashboard WebSocket protocol.
//!
//! Every message is a JSON object with a `"type"` field naming the variant
//! and, where there is a payload, a `"data"` field carrying it:
//!
//! ```json
//! {"type":"values"}
//! {"type":"archive","date":1718000000000}
//! {"type":"thresholds","data":{"temperature":22.5,"moisture":"48","brightness":500}}
//! ```
//!
//! Serde's `#[serde(tag = "type")]` attribute handles the discriminant.
//!
//! # Why separate request and response types?
//!
//! The two directions carry different information: dashboards *ask* for
//! values, archives and threshold changes; the bridge *answers* with
//! formatted readings.  Two enums make it a compile-time error to send a
//! request where a response is expected.

use serde::{Deserialize, Serialize};

// ── Dashboard → Bridge ────────────────────────────────────────────────────────

/// All messages a dashboard can send to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DashboardRequest {
    /// Ask for the latest readings and actuator states.
    Values,

    /// Ask for one day of the CSV archive.
    Archive {
        /// Any instant within the wanted day, in milliseconds since the Unix
        /// epoch.  Missing or non-positive means today.
        #[serde(default)]
        date: Option<f64>,
    },

    /// Propose new setpoints.
    Thresholds {
        #[serde(default)]
        data: ThresholdsPayload,
    },
}

impl DashboardRequest {
    /// The `"type"` string of this request, for log messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Values => "values",
            Self::Archive { .. } => "archive",
            Self::Thresholds { .. } => "thresholds",
        }
    }
}

/// Raw threshold fields exactly as the dashboard sent them.
///
/// Dashboards send numbers or numeric strings depending on the form widget,
/// so each field is kept as an untyped JSON value until the application
/// layer validates it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdsPayload {
    #[serde(default)]
    pub temperature: Option<serde_json::Value>,
    #[serde(default)]
    pub moisture: Option<serde_json::Value>,
    #[serde(default)]
    pub brightness: Option<serde_json::Value>,
}

// ── Bridge → Dashboard ────────────────────────────────────────────────────────

/// All messages the bridge sends to a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DashboardResponse {
    /// Latest readings, formatted for display.
    Values { data: ValuesPayload },

    /// CSV text of the requested day, header first; empty when the day has
    /// no archive.
    Archive { data: String },

    /// The setpoints in force after a threshold update.
    Thresholds { data: ThresholdsEcho },
}

/// Readings as shown by the dashboard gauges.
///
/// ```json
/// {"brightness":4177,"moisture":"48.7","temperature":"22.4","co2":612,
///  "heating":1,"watering":0,"lighting":1,"ventilation":0,"brightness_percent":"39.9"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuesPayload {
    /// Raw light level.
    pub brightness: u32,
    /// Soil moisture in percent, one decimal.
    pub moisture: String,
    /// Air temperature in °C, one decimal.
    pub temperature: String,
    /// CO₂ in ppm.
    pub co2: u32,
    /// Actuator states as `0`/`1`.
    pub heating: u8,
    pub watering: u8,
    pub lighting: u8,
    pub ventilation: u8,
    /// Brightness normalized into the gauge band, one decimal.
    pub brightness_percent: String,
}

/// Setpoints in display units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsEcho {
    pub temperature: f64,
    pub moisture: f64,
    pub brightness: u16,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
