//! Setpoint encoder: packs the threshold set into an outbound frame.
//!
//! Wire format (always 11 bytes):
//! ```text
//! [0x40][b0 b1 b2][m0 m1 m2][t0 t1 t2][0x3F]
//!
//! x0 = role | (value >> 10) & 0x3F
//! x1 = role | (value >>  4) & 0x3F
//! x2 = role | (value & 0x0F) << 2 | slot
//! ```
//! `b`, `m` and `t` are brightness, moisture (tenths) and temperature
//! (tenths) in slots 0, 1 and 2.  The role prefix is `0x80` for even slots and
//! `0xC0` for odd slots, so the receiving firmware can find slot boundaries
//! with the same role-change rule the host decoder uses.
//!
//! Read back through the [`FrameDecoder`], each triplet reconstructs to
//! `value << 2 | slot`: the decoder's numeric shift recovers the value and the
//! two low bits confirm the slot position.

use crate::domain::state::Thresholds;
use crate::protocol::constants::{
    BYTES_PER_SETPOINT, END_MARKER, FRAGMENT_MASK, NUMERIC_SHIFT, ROLE_PREFIX_DATA,
    ROLE_PREFIX_DATA_ALT, SETPOINT_COUNT, SETPOINT_FRAME_LEN, SLOT_BRIGHTNESS, SLOT_MOISTURE,
    SLOT_TEMPERATURE, START_MARKER,
};
use crate::protocol::frame::{DecodeEvent, FrameDecoder};
use crate::protocol::ProtocolError;

/// Builds the outbound setpoint frame for `thresholds`.
///
/// Deterministic and free of I/O: the caller hands the bytes to the serial
/// transport once per tick.
///
/// # Examples
///
/// ```rust
/// use leafysan_core::{encode_setpoints, decode_setpoints, Thresholds};
///
/// let thresholds = Thresholds::default();
/// let frame = encode_setpoints(&thresholds);
/// assert_eq!(frame.len(), 11);
/// assert_eq!(decode_setpoints(&frame).unwrap(), thresholds);
/// ```
pub fn encode_setpoints(thresholds: &Thresholds) -> [u8; SETPOINT_FRAME_LEN] {
    let mut buf = [0u8; SETPOINT_FRAME_LEN];
    buf[0] = START_MARKER;
    buf[SETPOINT_FRAME_LEN - 1] = END_MARKER;

    for (slot, value) in slot_values(thresholds).into_iter().enumerate() {
        let prefix = role_prefix(slot);
        let value = u32::from(value);
        let at = 1 + slot * BYTES_PER_SETPOINT;

        buf[at] = prefix | ((value >> 10) as u8 & FRAGMENT_MASK);
        buf[at + 1] = prefix | ((value >> 4) as u8 & FRAGMENT_MASK);
        // Last byte of the triplet: low nibble plus the 2-bit slot index.
        buf[at + 2] = prefix | (((value & 0x0F) as u8) << 2) | slot as u8;
    }

    buf
}

/// Parses an outbound setpoint frame back into [`Thresholds`].
///
/// This is the reference decoder for [`encode_setpoints`]; it reuses the
/// inbound [`FrameDecoder`] so both directions share one bit layout.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the frame has the wrong length, is not
/// delimited by markers, lacks a slot, or carries a slot index that does not
/// match its position.
pub fn decode_setpoints(bytes: &[u8]) -> Result<Thresholds, ProtocolError> {
    if bytes.len() != SETPOINT_FRAME_LEN {
        return Err(ProtocolError::FrameLength {
            expected: SETPOINT_FRAME_LEN,
            actual: bytes.len(),
        });
    }
    if bytes[0] != START_MARKER || bytes[SETPOINT_FRAME_LEN - 1] != END_MARKER {
        return Err(ProtocolError::MissingMarkers);
    }

    let frame = match FrameDecoder::new().feed_slice(bytes).as_slice() {
        [DecodeEvent::Parsed(frame)] => *frame,
        _ => return Err(ProtocolError::MissingSlot(0)),
    };

    let mut values = [0u16; SETPOINT_COUNT];
    for (position, value) in values.iter_mut().enumerate() {
        let raw = frame
            .slot(position)
            .ok_or(ProtocolError::MissingSlot(position))?;
        let tagged = (raw & 0b11) as u8;
        if usize::from(tagged) != position {
            return Err(ProtocolError::SlotIndexMismatch { position, tagged });
        }
        // An 18-bit slot shifted right by two always fits in 16 bits.
        *value = (raw >> NUMERIC_SHIFT) as u16;
    }

    Ok(Thresholds {
        brightness: values[SLOT_BRIGHTNESS],
        moisture_tenths: values[SLOT_MOISTURE],
        temperature_tenths: values[SLOT_TEMPERATURE],
    })
}

/// Setpoint values in slot order.
fn slot_values(t: &Thresholds) -> [u16; SETPOINT_COUNT] {
    let mut values = [0u16; SETPOINT_COUNT];
    values[SLOT_BRIGHTNESS] = t.brightness;
    values[SLOT_MOISTURE] = t.moisture_tenths;
    values[SLOT_TEMPERATURE] = t.temperature_tenths;
    values
}

fn role_prefix(slot: usize) -> u8 {
    if slot % 2 == 0 {
        ROLE_PREFIX_DATA
    } else {
        ROLE_PREFIX_DATA_ALT
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
