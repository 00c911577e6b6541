//! # leafysan-core
//!
//! Shared library for the Leafysan greenhouse bridge containing the serial
//! framing protocol, the channel codec, the setpoint encoder, and the state
//! store that ties them together.
//!
//! It has zero dependencies on OS APIs, serial ports, sockets, or async
//! runtimes.  Every function here is a plain in-memory computation.
//!
//! # Architecture overview (for beginners)
//!
//! A greenhouse controller board measures light, soil moisture, temperature
//! and CO₂, and drives four actuators (heating, watering, lighting,
//! ventilation).  It talks to the host computer over a serial cable using a
//! compact, bit-packed framing protocol.  The host relays the readings to
//! browser dashboards and pushes threshold setpoints back to the board.
//!
//! This crate (`leafysan-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How bytes travel over the serial link.  Inbound bytes
//!   are folded into frames by the [`FrameDecoder`], interpreted by the
//!   [`ChannelCodec`], and outbound setpoints are packed by
//!   [`encode_setpoints`].
//!
//! - **`domain`** – The [`StateStore`]: the latest channel values plus the
//!   current threshold setpoints, with range-validated threshold updates.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `leafysan_core::FrameDecoder` instead of `leafysan_core::protocol::frame::FrameDecoder`.
pub use domain::state::{
    ActuatorStates, ChannelValues, StateStore, ThresholdCandidate, ThresholdError,
    ThresholdField, ThresholdLimits, ThresholdRange, ThresholdUpdate, Thresholds,
};
pub use protocol::channel::{ChannelCodec, ChannelUpdate};
pub use protocol::frame::{DecodeEvent, Frame, FrameDecoder};
pub use protocol::setpoint::{decode_setpoints, encode_setpoints};
pub use protocol::ProtocolError;
