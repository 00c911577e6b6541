//! Integration tests for the leafysan-core serial protocol.
//!
//! These tests drive raw byte streams through the public API, exercising the
//! frame decoder, channel codec, setpoint encoder and state store together.

use leafysan_core::{
    decode_setpoints, encode_setpoints, ActuatorStates, DecodeEvent, FrameDecoder, StateStore,
    ThresholdCandidate, Thresholds,
};

/// Feeds `bytes` through a fresh decoder and applies every parsed frame to
/// `store`, returning the number of invalid datasets seen.
fn pump(store: &mut StateStore, decoder: &mut FrameDecoder, bytes: &[u8]) -> usize {
    let mut invalid = 0;
    for event in decoder.feed_slice(bytes) {
        match event {
            DecodeEvent::Parsed(frame) => {
                store.apply_frame(&frame);
            }
            DecodeEvent::InvalidDataset => invalid += 1,
        }
    }
    invalid
}

/// Splits an 18-bit value into three role-`10` payload bytes.
fn slot_bytes(value: u32, prefix: u8) -> [u8; 3] {
    [
        prefix | ((value >> 12) & 0x3F) as u8,
        prefix | ((value >> 6) & 0x3F) as u8,
        prefix | (value & 0x3F) as u8,
    ]
}

#[test]
fn test_empty_frame_is_reported_and_leaves_store_untouched() {
    // Arrange
    let mut store = StateStore::default();
    let mut decoder = FrameDecoder::new();
    pump(&mut store, &mut decoder, &[0x40, 0x84, 0x85, 0x86, 0x3F]);
    let before = store.current_values();

    // Act
    let invalid = pump(&mut store, &mut decoder, &[0x40, 0x3F]);

    // Assert
    assert_eq!(invalid, 1);
    assert_eq!(store.current_values(), before);
}

#[test]
fn test_single_slot_frame_sets_brightness_for_sampled_values() {
    for value in [0u32, 1, 3, 4, 0xFFF, 0x1_0000, 0x2_AAAA, (1 << 18) - 1] {
        // Arrange
        let mut bytes = vec![0x40];
        bytes.extend_from_slice(&slot_bytes(value, 0x80));
        bytes.push(0x3F);
        let mut store = StateStore::default();

        // Act
        pump(&mut store, &mut FrameDecoder::new(), &bytes);

        // Assert
        assert_eq!(store.current_values().brightness, value >> 2, "value {value:#x}");
    }
}

#[test]
fn test_end_to_end_brightness_scenario() {
    // Arrange
    let mut store = StateStore::default();

    // Act
    pump(&mut store, &mut FrameDecoder::new(), &[0x40, 0x84, 0x85, 0x86, 0x3F]);

    // Assert: fragments 0x04, 0x05, 0x06 → 0x4146 → 0x1051 after the numeric shift
    assert_eq!(store.current_values().brightness, 0x4146 >> 2);
    assert_eq!(store.current_values().brightness, 4177);
}

#[test]
fn test_resync_scenario_discards_first_attempt() {
    // Arrange
    let mut store = StateStore::default();

    // Act
    pump(&mut store, &mut FrameDecoder::new(), &[0x40, 0x84, 0x40, 0x85, 0x3F]);

    // Assert
    assert_eq!(store.current_values().brightness, (0x05 << 12) >> 2);
}

#[test]
fn test_full_frame_updates_every_channel() {
    // Arrange: brightness 5000, moisture 48.7 %, temperature 22.4 °C, co2 612,
    // heating + lighting on.
    let mut bytes = vec![0x40];
    bytes.extend_from_slice(&slot_bytes(5000 << 2, 0x80));
    bytes.extend_from_slice(&slot_bytes(487 << 2, 0xC0));
    bytes.extend_from_slice(&slot_bytes(224 << 2, 0x80));
    bytes.extend_from_slice(&slot_bytes(612 << 2, 0xC0));
    bytes.extend_from_slice(&slot_bytes((0x08 | 0x20) << 12, 0x80));
    bytes.push(0x3F);
    let mut store = StateStore::default();

    // Act
    pump(&mut store, &mut FrameDecoder::new(), &bytes);

    // Assert
    let v = store.current_values();
    assert_eq!(v.brightness, 5000);
    assert_eq!(v.moisture_tenths, 487);
    assert_eq!(v.temperature_tenths, 224);
    assert_eq!(v.co2, 612);
    assert_eq!(
        v.actuators,
        ActuatorStates {
            heating: true,
            watering: false,
            lighting: true,
            ventilation: false,
        }
    );
}

#[test]
fn test_same_frame_twice_yields_same_state() {
    // Arrange
    let frame = [0x40, 0x84, 0x85, 0x86, 0xC1, 0xC2, 0xC3, 0x3F];
    let mut store = StateStore::default();
    let mut decoder = FrameDecoder::new();

    // Act
    pump(&mut store, &mut decoder, &frame);
    let first = store.current_values();
    pump(&mut store, &mut decoder, &frame);

    // Assert
    assert_eq!(store.current_values(), first);
}

#[test]
fn test_frames_split_across_arbitrary_reads() {
    // Arrange: two frames with noise in between, delivered one byte at a time
    let stream = [0x12, 0x40, 0x84, 0x85, 0x86, 0x3F, 0x99, 0x40, 0xC1, 0x81, 0x3F];
    let mut decoder = FrameDecoder::new();

    // Act
    let events: Vec<DecodeEvent> = stream.iter().filter_map(|&b| decoder.feed(b)).collect();

    // Assert
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| matches!(e, DecodeEvent::Parsed(_))));
}

#[test]
fn test_setpoint_round_trip_across_valid_ranges() {
    for temperature in [0.0, 0.1, 12.3, 21.0, 29.9, 30.0] {
        for moisture in [0.0, 33.3, 50.0, 99.9, 100.0] {
            for brightness in [0.0, 60.0, 12_345.0, 40_000.0] {
                // Arrange
                let mut store = StateStore::default();
                let update = store.set_thresholds(&ThresholdCandidate {
                    temperature: Some(temperature),
                    moisture: Some(moisture),
                    brightness: Some(brightness),
                });
                assert!(update.is_clean());
                let thresholds = store.thresholds();

                // Act
                let decoded = decode_setpoints(&encode_setpoints(&thresholds));

                // Assert
                assert_eq!(decoded, Ok(thresholds));
            }
        }
    }
}

#[test]
fn test_threshold_boundary_thirty_accepted_thirty_one_rejected() {
    let mut store = StateStore::default();

    store.set_thresholds(&ThresholdCandidate {
        temperature: Some(31.0),
        ..Default::default()
    });
    assert_eq!(store.thresholds().temperature_tenths, Thresholds::default().temperature_tenths);

    store.set_thresholds(&ThresholdCandidate {
        temperature: Some(30.0),
        ..Default::default()
    });
    assert_eq!(store.thresholds().temperature_tenths, 300);
}

#[test]
fn test_setpoint_frame_decodes_through_inbound_decoder() {
    // The controller uses the same role-tracking rule, so the host decoder
    // must see exactly three slots in an outbound frame.
    let frame = encode_setpoints(&Thresholds::default());
    let events = FrameDecoder::new().feed_slice(&frame);
    match events.as_slice() {
        [DecodeEvent::Parsed(f)] => assert_eq!(f.populated(), 3),
        other => panic!("unexpected events: {other:?}"),
    }
}
