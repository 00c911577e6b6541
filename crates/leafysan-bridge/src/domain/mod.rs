//! Domain layer for leafysan-bridge.
//!
//! The domain layer contains pure types that have no dependencies on I/O,
//! serial ports, sockets, or async runtimes.
//!
//! # What belongs in the domain layer?
//!
//! - Message types (the JSON "language" between dashboard and bridge)
//! - Display conversions between raw channel units and dashboard units
//! - Configuration structures
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, serial port, or `WebSocket` types
//! - File I/O or environment variable reading

pub mod config;
pub mod display;
pub mod messages;

pub use config::BridgeConfig;
pub use display::DisplayRange;
pub use messages::{DashboardRequest, DashboardResponse, ThresholdsPayload, ValuesPayload};
