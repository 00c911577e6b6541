//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! `main.rs` assembles it from CLI arguments and the optional settings file;
//! nothing below `main` reads the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use leafysan_core::protocol::constants::DEFAULT_ACTUATOR_SHIFT;
use leafysan_core::{ThresholdCandidate, ThresholdLimits};

use crate::domain::display::DisplayRange;

/// All runtime configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use leafysan_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.ws_bind_addr.port(), 8080);
/// assert_eq!(cfg.serial_port, "/dev/ttyUSB0");
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Serial device the controller is attached to.
    pub serial_port: String,

    /// Serial line speed.  The link is always 8 data bits, no parity, one
    /// stop bit.
    pub baud_rate: u32,

    /// Append one CSV row per tick to the daily archive.
    pub write_data: bool,

    /// Directory holding the daily `data_Y-M-D.csv` archive files.
    pub data_dir: PathBuf,

    /// The address and port the dashboard WebSocket server binds to.
    pub ws_bind_addr: SocketAddr,

    /// Period of the setpoint tick (and of archive rows when enabled).
    pub tick_interval: Duration,

    /// Right-shift applied to the actuator slot before masking.
    pub actuator_shift: u32,

    /// Setpoints applied through normal validation at startup.
    pub initial_thresholds: ThresholdCandidate,

    /// Accepted ranges for dashboard threshold updates.
    pub limits: ThresholdLimits,

    /// Gauge band for `brightness_percent` in the values reply.
    pub brightness_display: DisplayRange,
}

impl Default for BridgeConfig {
    /// | Field              | Default           |
    /// |--------------------|-------------------|
    /// | serial_port        | `/dev/ttyUSB0`    |
    /// | baud_rate          | 115200            |
    /// | write_data         | `false`           |
    /// | data_dir           | `data`            |
    /// | ws_bind_addr       | `0.0.0.0:8080`    |
    /// | tick_interval      | 1 second          |
    /// | actuator_shift     | 12                |
    /// | initial_thresholds | 21.0 / 50.0 / 60  |
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            write_data: false,
            data_dir: PathBuf::from("data"),
            // Compile-time-known valid socket address.
            ws_bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            tick_interval: Duration::from_millis(1000),
            actuator_shift: DEFAULT_ACTUATOR_SHIFT,
            initial_thresholds: ThresholdCandidate {
                temperature: Some(21.0),
                moisture: Some(50.0),
                brightness: Some(60.0),
            },
            limits: ThresholdLimits::default(),
            brightness_display: DisplayRange::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use leafysan_core::ThresholdField;

    #[test]
    fn test_default_ws_port_is_8080() {
        // Arrange / Act
        let cfg = BridgeConfig::default();
        // Assert
        assert_eq!(cfg.ws_bind_addr.port(), 8080);
    }

    #[test]
    fn test_default_serial_link_settings() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.serial_port, "/dev/ttyUSB0");
        assert_eq!(cfg.baud_rate, 115_200);
    }

    #[test]
    fn test_default_does_not_write_archive() {
        let cfg = BridgeConfig::default();
        assert!(!cfg.write_data);
        assert_eq!(cfg.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_default_tick_is_one_second() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.tick_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_default_actuator_shift_is_12() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.actuator_shift, 12);
    }

    #[test]
    fn test_default_limits_match_dashboard_ranges() {
        let cfg = BridgeConfig::default();
        let t = cfg.limits.range(ThresholdField::Temperature);
        assert_eq!((t.min, t.max), (0.0, 30.0));
        let b = cfg.limits.range(ThresholdField::Brightness);
        assert_eq!((b.min, b.max), (0.0, 40_000.0));
    }
}
