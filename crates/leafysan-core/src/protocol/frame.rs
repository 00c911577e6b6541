//! Frame decoder: folds the raw serial byte stream into complete frames.
//!
//! # How the framing works (for beginners)
//!
//! The controller sends a start marker (`0x40`), then a run of payload bytes,
//! then an end marker (`0x3F`).  There is no length field.  Instead, the top
//! two bits of every payload byte carry a *role tag*, and the controller flips
//! the tag whenever it moves on to the next logical reading (a *slot*).  The
//! decoder therefore detects slot boundaries by watching for a role change.
//!
//! Each payload byte contributes a 6-bit *fragment*.  Up to three fragments
//! are packed into one slot, most-significant fragment first:
//!
//! ```text
//! fragment 0 → bits 12..17
//! fragment 1 → bits  6..11
//! fragment 2 → bits  0..5
//! ```
//!
//! # State machine
//!
//! ```text
//!            start marker                      end marker (slots > 0)
//!   Idle ───────────────────▶ Collecting ───────────────────────────▶ Idle + Parsed
//!    ▲                         │    ▲   │
//!    │                         │    └───┘ start marker: restart, discard partial data
//!    └─────────────────────────┘
//!      end marker (no slots): InvalidDataset
//! ```
//!
//! Transitions are a pure function, [`step`], of the current state and the
//! incoming byte.  [`FrameDecoder`] wraps it for callers that want to keep the
//! state in one place.  Every byte costs O(1) work and nothing here blocks.

use tracing::trace;

use crate::protocol::constants::{
    END_MARKER, FRAGMENTS_PER_SLOT, FRAGMENT_BITS, FRAGMENT_MASK, MAX_SLOTS, ROLE_MASK,
    START_MARKER,
};

// ── Frame ─────────────────────────────────────────────────────────────────────

/// The payload slots of one complete frame.
///
/// A slot is `None` when the frame never carried a fragment for it.  Callers
/// must leave the matching channel untouched in that case instead of zeroing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    slots: [Option<u32>; MAX_SLOTS],
}

impl Frame {
    /// Builds a frame from explicit slot values.
    pub fn from_slots(slots: [Option<u32>; MAX_SLOTS]) -> Self {
        Self { slots }
    }

    /// Returns the reconstructed integer of slot `index`, if it was populated.
    pub fn slot(&self, index: usize) -> Option<u32> {
        self.slots.get(index).copied().flatten()
    }

    /// All five slot positions in order.
    pub fn slots(&self) -> &[Option<u32>; MAX_SLOTS] {
        &self.slots
    }

    /// Number of populated slots.
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// `true` when no slot was populated.
    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }
}

/// Outcome of an end marker reaching an open frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A frame with at least one populated slot.
    Parsed(Frame),
    /// The frame was closed before any payload byte arrived.
    InvalidDataset,
}

// ── Decoder state ─────────────────────────────────────────────────────────────

/// Progress through an open frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Collecting {
    /// Role tag of the slot currently being filled; `None` before the first payload byte.
    pub role: Option<u8>,
    /// Index of the slot currently being filled.  May run past the last
    /// retained slot, in which case further fragments are dropped.
    pub slot_index: usize,
    /// Number of fragments already placed into the current slot.
    pub fragment_cursor: u8,
    /// Slots accumulated so far.
    pub slots: [Option<u32>; MAX_SLOTS],
}

/// Explicit decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    /// No frame is open; payload bytes are ignored.
    #[default]
    Idle,
    /// A start marker has been seen and the frame is being assembled.
    Collecting(Collecting),
}

/// Advances the decoder by one byte.
///
/// This is a pure function: the same `(state, byte)` pair always yields the
/// same result, which keeps the decoder free of stale flags between frames.
///
/// # Examples
///
/// ```rust
/// use leafysan_core::protocol::frame::{step, DecodeEvent, DecoderState};
///
/// let mut state = DecoderState::Idle;
/// let mut event = None;
/// for byte in [0x40, 0x84, 0x85, 0x86, 0x3F] {
///     let (next, ev) = step(state, byte);
///     state = next;
///     event = ev.or(event);
/// }
/// let Some(DecodeEvent::Parsed(frame)) = event else { panic!("expected a frame") };
/// assert_eq!(frame.slot(0), Some((0x04 << 12) | (0x05 << 6) | 0x06));
/// ```
pub fn step(state: DecoderState, byte: u8) -> (DecoderState, Option<DecodeEvent>) {
    match (state, byte) {
        // A start marker always opens a fresh frame, even mid-frame.
        (DecoderState::Collecting(_), START_MARKER) => {
            trace!("start marker inside open frame; resynchronising");
            (DecoderState::Collecting(Collecting::default()), None)
        }
        (DecoderState::Idle, START_MARKER) => {
            (DecoderState::Collecting(Collecting::default()), None)
        }

        (DecoderState::Collecting(c), END_MARKER) => {
            let frame = Frame::from_slots(c.slots);
            let event = if frame.is_empty() {
                DecodeEvent::InvalidDataset
            } else {
                DecodeEvent::Parsed(frame)
            };
            (DecoderState::Idle, Some(event))
        }

        // Outside a frame nothing is accumulated, so a stray end marker is
        // as meaningless as a stray payload byte.
        (DecoderState::Idle, _) => (DecoderState::Idle, None),

        (DecoderState::Collecting(c), b) => {
            (DecoderState::Collecting(accumulate(c, b)), None)
        }
    }
}

/// Places one payload byte into the open frame.
fn accumulate(mut c: Collecting, byte: u8) -> Collecting {
    let role = (byte & ROLE_MASK) >> 6;

    match c.role {
        None => c.role = Some(role),
        Some(current) if current != role => {
            c.fragment_cursor = 0;
            c.slot_index = c.slot_index.saturating_add(1);
            c.role = Some(role);
        }
        Some(_) => {}
    }

    if c.slot_index < MAX_SLOTS {
        if c.fragment_cursor < FRAGMENTS_PER_SLOT {
            let offset = FRAGMENT_BITS * u32::from(FRAGMENTS_PER_SLOT - 1 - c.fragment_cursor);
            let fragment = u32::from(byte & FRAGMENT_MASK) << offset;
            let slot = c.slots[c.slot_index].get_or_insert(0);
            *slot |= fragment;
        } else {
            trace!(
                slot = c.slot_index,
                "more than {FRAGMENTS_PER_SLOT} fragments in one slot; dropping {byte:#04x}"
            );
        }
        c.fragment_cursor = c.fragment_cursor.saturating_add(1);
    }

    c
}

// ── Stateful wrapper ──────────────────────────────────────────────────────────

/// Owns a [`DecoderState`] and feeds bytes through [`step`].
///
/// # Examples
///
/// ```rust
/// use leafysan_core::{DecodeEvent, FrameDecoder};
///
/// let mut decoder = FrameDecoder::new();
/// let events = decoder.feed_slice(&[0x40, 0x3F]);
/// assert_eq!(events, vec![DecodeEvent::InvalidDataset]);
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    state: DecoderState,
}

impl FrameDecoder {
    /// Creates a decoder in the [`DecoderState::Idle`] state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte; returns an event when it closed a frame.
    pub fn feed(&mut self, byte: u8) -> Option<DecodeEvent> {
        let (next, event) = step(self.state, byte);
        self.state = next;
        event
    }

    /// Feeds a chunk of bytes as delivered by one transport read.
    ///
    /// Frames may straddle chunk boundaries; the partial frame stays in the
    /// decoder until the next call.
    pub fn feed_slice(&mut self, bytes: &[u8]) -> Vec<DecodeEvent> {
        bytes.iter().filter_map(|&b| self.feed(b)).collect()
    }

    /// Current state, mainly for diagnostics.
    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// Drops any partially assembled frame.
    pub fn reset(&mut self) {
        self.state = DecoderState::Idle;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
