//! Reserved byte values, slot numbering and bit masks of the serial protocol.

// ── Marker and role bytes ─────────────────────────────────────────────────────

/// Opens a frame (`0100 0000`).
pub const START_MARKER: u8 = 0x40;

/// Closes a frame (`0011 1111`).
pub const END_MARKER: u8 = 0x3F;

/// Role prefix used by even-numbered slots (`1000 0000`).
pub const ROLE_PREFIX_DATA: u8 = 0x80;

/// Role prefix used by odd-numbered slots (`1100 0000`).
pub const ROLE_PREFIX_DATA_ALT: u8 = 0xC0;

/// Mask selecting the 2-bit role tag of a payload byte.
pub const ROLE_MASK: u8 = 0xC0;

/// Mask selecting the 6-bit fragment carried by a payload byte.
pub const FRAGMENT_MASK: u8 = 0x3F;

/// Bits carried by one fragment.
pub const FRAGMENT_BITS: u32 = 6;

/// Fragments that make up one slot (3 × 6 = 18 bits).
pub const FRAGMENTS_PER_SLOT: u8 = 3;

/// Width of a reconstructed slot value in bits.
pub const SLOT_BITS: u32 = FRAGMENT_BITS * FRAGMENTS_PER_SLOT as u32;

// ── Slot numbering ────────────────────────────────────────────────────────────

/// Number of slots retained per inbound frame; later slots are dropped.
pub const MAX_SLOTS: usize = 5;

/// Slot 0: brightness (inbound reading and outbound setpoint).
pub const SLOT_BRIGHTNESS: usize = 0;
/// Slot 1: moisture in tenths of a percent.
pub const SLOT_MOISTURE: usize = 1;
/// Slot 2: temperature in tenths of a degree.
pub const SLOT_TEMPERATURE: usize = 2;
/// Slot 3: CO₂ concentration in ppm (inbound only).
pub const SLOT_CO2: usize = 3;
/// Slot 4: actuator bitfield (inbound only).
pub const SLOT_ACTUATORS: usize = 4;

/// Numeric slots carry two reserved low bits below the value.
pub const NUMERIC_SHIFT: u32 = 2;

// ── Actuator bitfield ─────────────────────────────────────────────────────────

/// Right-shift applied to slot 4 before masking, as sent by current firmware.
pub const DEFAULT_ACTUATOR_SHIFT: u32 = 12;

/// Largest shift that keeps the 6-bit actuator field inside an 18-bit slot.
pub const MAX_ACTUATOR_SHIFT: u32 = SLOT_BITS - FRAGMENT_BITS;

pub const LIGHTING_ON: u32 = 0x20;
pub const WATERING_ON: u32 = 0x10;
pub const HEATING_ON: u32 = 0x08;
pub const VENTILATION_ON: u32 = 0x04;

// ── Outbound setpoint frame ───────────────────────────────────────────────────

/// Setpoints carried by one outbound frame.
pub const SETPOINT_COUNT: usize = 3;

/// Payload bytes per setpoint.
pub const BYTES_PER_SETPOINT: usize = 3;

/// Payload bytes of an outbound frame.
pub const SETPOINT_PAYLOAD_LEN: usize = SETPOINT_COUNT * BYTES_PER_SETPOINT;

/// Total outbound frame length including both markers.
pub const SETPOINT_FRAME_LEN: usize = SETPOINT_PAYLOAD_LEN + 2;
