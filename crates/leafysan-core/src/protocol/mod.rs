//! Serial link protocol: framing, channel interpretation and setpoint encoding.
//!
//! Wire format (both directions):
//! ```text
//! [0x40 start][payload byte]*[0x3F end]
//!
//! payload byte:  [role:2][fragment:6]
//! ```
//! A payload byte always has bit 6 or bit 7 set (role prefix `0x80` or
//! `0xC0`), so it can never collide with the two marker bytes.

use thiserror::Error;

pub mod channel;
pub mod constants;
pub mod frame;
pub mod setpoint;

pub use channel::{ChannelCodec, ChannelUpdate};
pub use frame::{DecodeEvent, DecoderState, Frame, FrameDecoder};
pub use setpoint::{decode_setpoints, encode_setpoints};

/// Errors raised by the protocol layer.
///
/// Inbound framing never fails: malformed input degrades to a
/// [`DecodeEvent::InvalidDataset`] instead.  These errors cover configuration
/// mistakes and the strict parsing of outbound setpoint frames.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The actuator shift would push the 6-bit actuator field outside an 18-bit slot.
    #[error("invalid actuator shift {shift}: must be at most {max}")]
    InvalidActuatorShift { shift: u32, max: u32 },

    /// A setpoint frame did not have the fixed outbound length.
    #[error("setpoint frame length mismatch: expected {expected} bytes, got {actual}")]
    FrameLength { expected: usize, actual: usize },

    /// The frame did not begin with the start marker and end with the end marker.
    #[error("setpoint frame is not delimited by start/end markers")]
    MissingMarkers,

    /// A setpoint slot was absent from the decoded frame.
    #[error("setpoint slot {0} missing from frame")]
    MissingSlot(usize),

    /// The slot index carried in the low bits did not match the slot position.
    #[error("setpoint slot index mismatch: position {position}, tagged {tagged}")]
    SlotIndexMismatch { position: usize, tagged: u8 },
}
