//! leafysan-bridge library crate.
//!
//! This crate connects a greenhouse controller on a serial port to browser
//! dashboards over WebSocket.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser dashboards (JSON over WebSocket)
//!         ↕
//! [leafysan-bridge]
//!   ├── domain/           Pure types: JSON messages, display conversions, BridgeConfig
//!   ├── application/      Request handling and archive formatting (no I/O)
//!   └── infrastructure/
//!         ├── ws_server/       WebSocket accept loop (tokio-tungstenite)
//!         ├── serial_conn/     Serial reader and setpoint tick (tokio-serial)
//!         ├── archive_writer/  Daily CSV files (csv)
//!         └── settings/        Optional TOML settings file
//!         ↕
//! Greenhouse controller (bit-packed frames over serial, leafysan-core)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `leafysan-core` only.
//! - `infrastructure` depends on all other layers plus `tokio`, `tungstenite`
//!   and `tokio-serial`.

/// Domain layer: pure business-logic types (no I/O).
pub mod domain;

/// Application layer: dashboard request handling and archive formatting.
pub mod application;

/// Infrastructure layer: serial port, WebSocket server, CSV archive, settings.
pub mod infrastructure;
