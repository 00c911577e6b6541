//! Domain entities for the Leafysan bridge.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain**.  Domain code holds the core rules of the
//! application and never imports serial ports, sockets, files or runtimes, so
//! it can be tested anywhere without setup.
//!
//! Here the domain is the [`state::StateStore`]: the latest sensor readings
//! and actuator states, and the threshold setpoints the dashboards control.

/// The process-wide current-values / thresholds record.
pub mod state;
