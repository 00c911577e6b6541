//! Dashboard request handling.
//!
//! Pure functions that translate between the JSON dashboard protocol and the
//! State Store:
//!
//! ```text
//! text frame ──parse_request──▶ DashboardRequest
//! ChannelValues ──values_response──▶ DashboardResponse::Values
//! ThresholdsPayload ──threshold_candidate──▶ ThresholdCandidate ──▶ StateStore
//! Thresholds ──thresholds_response──▶ DashboardResponse::Thresholds
//! ```
//!
//! None of these functions perform I/O or hold locks; the WebSocket session
//! takes the store lock for exactly one call.

use serde_json::Value;
use thiserror::Error;

use leafysan_core::{ChannelValues, ThresholdCandidate, Thresholds};

use crate::domain::display::{format_one_decimal, format_tenths, tenths_to_display, DisplayRange};
use crate::domain::messages::{
    DashboardRequest, DashboardResponse, ThresholdsEcho, ThresholdsPayload, ValuesPayload,
};

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors raised while reading a dashboard message.
///
/// The session logs these and keeps running; a bad message never closes it.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The frame was not a JSON object, or its fields had the wrong shape.
    #[error("malformed dashboard message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The object had no string `"type"` field.
    #[error("dashboard message has no \"type\" field")]
    MissingType,

    /// The `"type"` field named a request this bridge does not handle.
    #[error("unknown dashboard message type: {0:?}")]
    UnknownType(String),
}

const REQUEST_TYPES: [&str; 3] = ["values", "archive", "thresholds"];

// ── Dashboard → Bridge ────────────────────────────────────────────────────────

/// Parses one WebSocket text frame into a [`DashboardRequest`].
///
/// # Errors
///
/// - [`DashboardError::Malformed`] for invalid JSON or a wrongly shaped payload.
/// - [`DashboardError::MissingType`] when there is no string `"type"`.
/// - [`DashboardError::UnknownType`] for any other `"type"` value.
///
/// # Example
///
/// ```rust
/// use leafysan_bridge::application::parse_request;
/// use leafysan_bridge::domain::DashboardRequest;
///
/// let req = parse_request(r#"{"type":"values"}"#).unwrap();
/// assert_eq!(req, DashboardRequest::Values);
/// ```
pub fn parse_request(text: &str) -> Result<DashboardRequest, DashboardError> {
    let value: Value = serde_json::from_str(text)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DashboardError::MissingType)?;
    if !REQUEST_TYPES.contains(&kind) {
        return Err(DashboardError::UnknownType(kind.to_string()));
    }

    Ok(serde_json::from_value(value)?)
}

/// Builds a [`ThresholdCandidate`] from the raw fields of a thresholds request.
///
/// Numbers and numeric strings become proposals; anything else (missing,
/// `null`, booleans, text, non-finite values) leaves that field out so the
/// State Store keeps its previous value.
pub fn threshold_candidate(payload: &ThresholdsPayload) -> ThresholdCandidate {
    ThresholdCandidate {
        temperature: payload.temperature.as_ref().and_then(loose_number),
        moisture: payload.moisture.as_ref().and_then(loose_number),
        brightness: payload.brightness.as_ref().and_then(loose_number),
    }
}

/// Reads a JSON number or a numeric string.
fn loose_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

// ── Bridge → Dashboard ────────────────────────────────────────────────────────

/// Formats a State Store snapshot as a values reply.
pub fn values_response(values: &ChannelValues, brightness_band: &DisplayRange) -> DashboardResponse {
    let percent = brightness_band.normalize_percent(f64::from(values.brightness));
    DashboardResponse::Values {
        data: ValuesPayload {
            brightness: values.brightness,
            moisture: format_tenths(values.moisture_tenths),
            temperature: format_tenths(values.temperature_tenths),
            co2: values.co2,
            heating: u8::from(values.actuators.heating),
            watering: u8::from(values.actuators.watering),
            lighting: u8::from(values.actuators.lighting),
            ventilation: u8::from(values.actuators.ventilation),
            brightness_percent: format_one_decimal(percent),
        },
    }
}

/// Echoes the setpoints in force, in display units.
pub fn thresholds_response(thresholds: &Thresholds) -> DashboardResponse {
    DashboardResponse::Thresholds {
        data: ThresholdsEcho {
            temperature: tenths_to_display(u32::from(thresholds.temperature_tenths)),
            moisture: tenths_to_display(u32::from(thresholds.moisture_tenths)),
            brightness: thresholds.brightness,
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use leafysan_core::{ActuatorStates, StateStore};
    use serde_json::json;

    // ── parse_request ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_values_request() {
        let req = parse_request(r#"{"type":"values"}"#).unwrap();
        assert_eq!(req, DashboardRequest::Values);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let result = parse_request("{not json");
        assert!(matches!(result, Err(DashboardError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_missing_type() {
        let result = parse_request(r#"{"data":{}}"#);
        assert!(matches!(result, Err(DashboardError::MissingType)));
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        // Act
        let result = parse_request(r#"{"type":"restart"}"#);

        // Assert
        match result {
            Err(DashboardError::UnknownType(t)) => assert_eq!(t, "restart"),
            other => panic!("expected UnknownType, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_wrongly_typed_archive_date() {
        let result = parse_request(r#"{"type":"archive","date":"yesterday"}"#);
        assert!(matches!(result, Err(DashboardError::Malformed(_))));
    }

    // ── threshold_candidate ──────────────────────────────────────────────────

    #[test]
    fn test_candidate_accepts_numbers_and_numeric_strings() {
        // Arrange
        let payload = ThresholdsPayload {
            temperature: Some(json!(22.5)),
            moisture: Some(json!(" 48.25 ")),
            brightness: Some(json!(500)),
        };

        // Act
        let c = threshold_candidate(&payload);

        // Assert
        assert_eq!(c.temperature, Some(22.5));
        assert_eq!(c.moisture, Some(48.25));
        assert_eq!(c.brightness, Some(500.0));
    }

    #[test]
    fn test_candidate_ignores_non_numeric_values() {
        let payload = ThresholdsPayload {
            temperature: Some(json!("warm")),
            moisture: Some(json!(true)),
            brightness: Some(json!("NaN")),
        };
        assert_eq!(threshold_candidate(&payload), ThresholdCandidate::default());
    }

    #[test]
    fn test_candidate_from_partial_payload_updates_only_present_fields() {
        // Arrange
        let mut store = StateStore::default();
        let payload = ThresholdsPayload {
            temperature: Some(json!(31)),
            moisture: Some(json!("42.46")),
            brightness: None,
        };

        // Act
        let update = store.set_thresholds(&threshold_candidate(&payload));

        // Assert: temperature rejected, moisture rounded to tenths, brightness untouched
        assert_eq!(update.rejected.len(), 1);
        let t = store.thresholds();
        assert_eq!(t.temperature_tenths, 210);
        assert_eq!(t.moisture_tenths, 425);
        assert_eq!(t.brightness, 60);
    }

    // ── responses ────────────────────────────────────────────────────────────

    #[test]
    fn test_values_response_formats_display_units() {
        // Arrange
        let values = ChannelValues {
            brightness: 4177,
            moisture_tenths: 487,
            temperature_tenths: 224,
            co2: 612,
            actuators: ActuatorStates {
                heating: true,
                watering: false,
                lighting: true,
                ventilation: false,
            },
        };

        // Act
        let resp = values_response(&values, &DisplayRange::new(0.0, 10_000.0));

        // Assert
        match resp {
            DashboardResponse::Values { data } => {
                assert_eq!(data.brightness, 4177);
                assert_eq!(data.moisture, "48.7");
                assert_eq!(data.temperature, "22.4");
                assert_eq!(data.co2, 612);
                assert_eq!((data.heating, data.watering), (1, 0));
                assert_eq!((data.lighting, data.ventilation), (1, 0));
                assert_eq!(data.brightness_percent, "41.8");
            }
            other => panic!("expected Values, got {other:?}"),
        }
    }

    #[test]
    fn test_values_response_for_fresh_store_is_all_zero() {
        let resp = values_response(&ChannelValues::default(), &DisplayRange::default());
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json["data"]["temperature"], "0.0");
        assert_eq!(json["data"]["brightness_percent"], "0.0");
        assert_eq!(json["data"]["ventilation"], 0);
    }

    #[test]
    fn test_thresholds_response_echoes_display_units() {
        let resp = thresholds_response(&Thresholds::default());
        assert_eq!(
            resp,
            DashboardResponse::Thresholds {
                data: ThresholdsEcho {
                    temperature: 21.0,
                    moisture: 50.0,
                    brightness: 60,
                }
            }
        );
    }
}
