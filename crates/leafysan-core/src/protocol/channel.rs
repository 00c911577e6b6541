//! Channel codec: gives the slots of a decoded [`Frame`] their meaning.
//!
//! | Slot | Channel      | Raw unit                 |
//! |------|--------------|--------------------------|
//! | 0    | brightness   | firmware light level     |
//! | 1    | moisture     | tenths of a percent      |
//! | 2    | temperature  | tenths of a degree       |
//! | 3    | CO₂          | ppm                      |
//! | 4    | actuators    | bitfield                 |
//!
//! Numeric slots drop the two reserved low bits.  The actuator slot is shifted
//! right by a protocol-version dependent amount and then tested against four
//! fixed masks.  No display scaling happens here: the codec deals in raw
//! integer units only.

use crate::domain::state::ActuatorStates;
use crate::protocol::constants::{
    DEFAULT_ACTUATOR_SHIFT, HEATING_ON, LIGHTING_ON, MAX_ACTUATOR_SHIFT, NUMERIC_SHIFT,
    SLOT_ACTUATORS, SLOT_BRIGHTNESS, SLOT_CO2, SLOT_MOISTURE, SLOT_TEMPERATURE, VENTILATION_ON,
    WATERING_ON,
};
use crate::protocol::frame::Frame;
use crate::protocol::ProtocolError;

/// The channels carried by one frame.
///
/// Every field is `None` when the frame did not carry the matching slot, so
/// applying the update leaves that channel's previous value in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelUpdate {
    pub brightness: Option<u32>,
    pub moisture: Option<u32>,
    pub temperature: Option<u32>,
    pub co2: Option<u32>,
    pub actuators: Option<ActuatorStates>,
}

/// Interprets frame slots as typed channel values.
///
/// The actuator shift differs between firmware revisions, so it is a
/// parameter rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCodec {
    actuator_shift: u32,
}

impl Default for ChannelCodec {
    fn default() -> Self {
        Self {
            actuator_shift: DEFAULT_ACTUATOR_SHIFT,
        }
    }
}

impl ChannelCodec {
    /// Creates a codec for firmware that shifts the actuator field by `actuator_shift`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidActuatorShift`] if the shift would move
    /// the 6-bit actuator field outside the 18-bit slot.
    pub fn new(actuator_shift: u32) -> Result<Self, ProtocolError> {
        if actuator_shift > MAX_ACTUATOR_SHIFT {
            return Err(ProtocolError::InvalidActuatorShift {
                shift: actuator_shift,
                max: MAX_ACTUATOR_SHIFT,
            });
        }
        Ok(Self { actuator_shift })
    }

    pub fn actuator_shift(&self) -> u32 {
        self.actuator_shift
    }

    /// Decodes the populated slots of `frame`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use leafysan_core::{ChannelCodec, Frame};
    ///
    /// let frame = Frame::from_slots([Some(0x4146), None, None, None, None]);
    /// let update = ChannelCodec::default().decode(&frame);
    /// assert_eq!(update.brightness, Some(0x4146 >> 2));
    /// assert_eq!(update.moisture, None);
    /// ```
    pub fn decode(&self, frame: &Frame) -> ChannelUpdate {
        let numeric = |slot: usize| frame.slot(slot).map(|raw| raw >> NUMERIC_SHIFT);

        ChannelUpdate {
            brightness: numeric(SLOT_BRIGHTNESS),
            moisture: numeric(SLOT_MOISTURE),
            temperature: numeric(SLOT_TEMPERATURE),
            co2: numeric(SLOT_CO2),
            actuators: frame
                .slot(SLOT_ACTUATORS)
                .map(|raw| self.decode_actuators(raw)),
        }
    }

    fn decode_actuators(&self, raw: u32) -> ActuatorStates {
        let field = raw >> self.actuator_shift;
        ActuatorStates {
            heating: field & HEATING_ON != 0,
            watering: field & WATERING_ON != 0,
            lighting: field & LIGHTING_ON != 0,
            ventilation: field & VENTILATION_ON != 0,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
