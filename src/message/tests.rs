//! Unit tests for the wire codec.

use bytes::BufMut;
use proptest::{
    collection::vec,
    prelude::{Strategy, any},
    prop_assert_eq,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner},
};
use rstest::{fixture, rstest};

use super::*;

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    TestRunner::new_with_rng(config, TestRng::deterministic_rng(RngAlgorithm::ChaCha))
}

#[fixture]
fn telemetry() -> Telemetry {
    Telemetry::new(
        Pose2D {
            x: 1.5,
            y: -2.25,
            heading: 0.75,
        },
        Velocity2D {
            vx: 0.1,
            vy: 0.0,
            vth: -0.2,
        },
        vec![0.5, 1.0, f32::INFINITY, 3.25],
    )
}

#[test]
fn depth_quantisation_matches_reference_scenario() {
    let samples = [0.5, -1.0, 2.0, f32::NAN, 0.0, 3.999, 4.0001, 65.6];
    let image = RangeImage {
        width: 4,
        height: 2,
        min_range: 0.1,
        max_range: 5.0,
        samples: &samples,
    };

    let frame = DepthFrame::from_range_image(&image, 1).expect("frame fits");

    assert_eq!(
        frame.samples(),
        &[500, 0, 2000, 0, 0, 3999, 4000, 65535],
        "quantised millimetres"
    );
    assert_eq!((frame.width(), frame.height()), (4, 2));
    assert_eq!(frame.downsample(), 1);
}

#[rstest]
#[case(f32::NEG_INFINITY)]
#[case(f32::INFINITY)]
#[case(-0.0)]
#[case(f32::MIN_POSITIVE / 2.0)]
fn invalid_or_tiny_depth_maps_to_sentinel(#[case] meters: f32) {
    assert_eq!(depth_to_millimeters(meters), INVALID_DEPTH_MM);
}

#[rstest]
#[case(0.0625, 62)]
#[case(0.3125, 312)]
#[case(0.1875, 188)]
#[case(0.5625, 562)]
fn depth_halves_round_to_even(#[case] meters: f32, #[case] millimeters: u16) {
    assert_eq!(depth_to_millimeters(meters), millimeters);
}

#[test]
fn depth_round_trip_preserves_frame() {
    let frame = DepthFrame::new(3, 1, 2, 0.1, 5.0, vec![1, 0, u16::MAX]).expect("shape");
    let encoded = Message::Depth(frame.clone()).encode();

    assert_eq!(encoded.len(), MAGIC_LEN + DEPTH_HEADER_LEN + 6);
    assert_eq!(&encoded[..4], DEPTH_MAGIC);
    assert_eq!(Message::decode(&encoded), Ok(Message::Depth(frame)));
}

#[test]
fn depth_downsampling_skips_rows_and_columns() {
    let samples: Vec<f32> = (1..=12_u8).map(|i| f32::from(i) / 10.0).collect();
    let image = RangeImage {
        width: 4,
        height: 3,
        min_range: 0.0,
        max_range: 2.0,
        samples: &samples,
    };

    let frame = DepthFrame::from_range_image(&image, 2).expect("frame fits");

    assert_eq!((frame.width(), frame.height()), (2, 2));
    assert_eq!(frame.samples(), &[100, 300, 900, 1100]);
    assert_eq!(frame.sample_at(1, 1), Some(1100));
    assert_eq!(frame.sample_at(2, 0), None);
}

#[test]
fn depth_meters_restores_metric_scale() {
    let frame = DepthFrame::new(2, 1, 1, 0.1, 5.0, vec![1250, INVALID_DEPTH_MM]).expect("shape");
    assert_eq!(frame.depth_meters(), vec![1.25, 0.0]);
}

#[test]
fn depth_from_short_source_is_rejected() {
    let samples = [1.0_f32; 3];
    let image = RangeImage {
        width: 2,
        height: 2,
        min_range: 0.0,
        max_range: 1.0,
        samples: &samples,
    };
    assert_eq!(
        DepthFrame::from_range_image(&image, 1),
        Err(FrameError::SourceTooSmall {
            expected: 4,
            actual: 3
        })
    );
}

#[test]
fn depth_constructor_checks_shape() {
    let err = DepthFrame::new(2, 2, 1, 0.0, 1.0, vec![0; 3]).expect_err("shape mismatch");
    assert!(matches!(
        err,
        FrameError::ShapeMismatch {
            expected: 4,
            actual: 3,
            ..
        }
    ));
}

#[rstest]
#[case::missing_sample(-2)]
#[case::extra_sample(2)]
fn depth_length_mismatch_is_truncated(#[case] delta: isize) {
    let frame = DepthFrame::new(2, 2, 1, 0.0, 1.0, vec![7; 4]).expect("shape");
    let mut encoded = Message::Depth(frame).encode().to_vec();
    if delta < 0 {
        encoded.truncate(encoded.len() - delta.unsigned_abs());
    } else {
        encoded.extend(std::iter::repeat_n(0, delta.unsigned_abs()));
    }

    let err = Message::decode(&encoded).expect_err("length mismatch");
    assert!(matches!(
        err,
        DecodeError::TruncatedPayload {
            kind: MessageKind::Depth,
            ..
        }
    ));
}

#[test]
fn depth_header_shorter_than_fixed_fields_is_truncated() {
    let mut encoded = DEPTH_MAGIC.to_vec();
    encoded.put_u16_le(4);
    assert_eq!(
        Message::decode(&encoded),
        Err(DecodeError::TruncatedPayload {
            kind: MessageKind::Depth,
            expected: MAGIC_LEN + DEPTH_HEADER_LEN,
            actual: MAGIC_LEN + 2,
        })
    );
}

#[test]
fn color_downsampling_copies_pixels_verbatim() {
    let pixels: Vec<u8> = (0..3 * 2 * 4).collect();
    let image = RawImage {
        width: 3,
        height: 2,
        pixels: &pixels,
    };

    let frame = ColorFrame::from_raw_image(&image, 2).expect("frame fits");

    assert_eq!((frame.width(), frame.height()), (2, 1));
    assert_eq!(frame.pixels(), &[0, 1, 2, 3, 8, 9, 10, 11]);
    assert_eq!(frame.pixel_at(1, 0), Some([8, 9, 10, 11]));
    assert_eq!(frame.pixel_at(0, 1), None);
}

#[test]
fn color_round_trip_preserves_frame() {
    let frame = ColorFrame::new(2, 2, 3, (0..16).collect()).expect("shape");
    let encoded = Message::Color(frame.clone()).encode();

    assert_eq!(encoded.len(), MAGIC_LEN + COLOR_HEADER_LEN + 16);
    assert_eq!(Message::decode(&encoded), Ok(Message::Color(frame)));
}

#[test]
fn color_truncated_pixels_are_rejected() {
    let frame = ColorFrame::new(2, 1, 1, vec![9; 8]).expect("shape");
    let encoded = Message::Color(frame).encode();

    let err = Message::decode(&encoded[..encoded.len() - 1]).expect_err("truncated");
    assert_eq!(
        err,
        DecodeError::TruncatedPayload {
            kind: MessageKind::Color,
            expected: MAGIC_LEN + COLOR_HEADER_LEN + 8,
            actual: MAGIC_LEN + COLOR_HEADER_LEN + 7,
        }
    );
}

#[rstest]
fn telemetry_round_trip(telemetry: Telemetry) {
    let message = Message::Telemetry(telemetry);
    let encoded = message.encode();

    assert_eq!(encoded.len(), message.encoded_len());
    assert_eq!(encoded.len(), MAGIC_LEN + TELEMETRY_HEADER_LEN + 16);
    assert_eq!(Message::decode(&encoded), Ok(message));
}

#[test]
fn telemetry_with_empty_scan_is_valid() {
    let message = Message::Telemetry(Telemetry::default());
    let encoded = message.encode();

    assert_eq!(encoded.len(), MAGIC_LEN + TELEMETRY_HEADER_LEN);
    assert_eq!(&encoded[encoded.len() - 4..], &[0, 0, 0, 0]);
    assert_eq!(Message::decode(&encoded), Ok(message));
}

#[rstest]
fn telemetry_layout_is_little_endian(telemetry: Telemetry) {
    let encoded = Message::Telemetry(telemetry).encode();

    assert_eq!(&encoded[..4], TELEMETRY_MAGIC);
    assert_eq!(&encoded[4..8], &1.5_f32.to_le_bytes());
    assert_eq!(&encoded[28..32], &4_u32.to_le_bytes());
}

#[rstest]
fn telemetry_with_missing_ranges_is_truncated(telemetry: Telemetry) {
    let encoded = Message::Telemetry(telemetry).encode();
    let err = Message::decode(&encoded[..encoded.len() - 4]).expect_err("truncated");
    assert!(matches!(
        err,
        DecodeError::TruncatedPayload {
            kind: MessageKind::Telemetry,
            ..
        }
    ));
}

#[test]
fn pong_is_four_bytes() {
    assert_eq!(&Message::Pong.encode()[..], PONG_MAGIC);
    assert_eq!(Message::decode(b"pong"), Ok(Message::Pong));
    assert!(matches!(
        Message::decode(b"pong!"),
        Err(DecodeError::TruncatedPayload {
            kind: MessageKind::Pong,
            ..
        })
    ));
}

#[rstest]
#[case::chunk_wrapper(b"CHNK\x01\x00\x00\x00".as_slice())]
#[case::garbage(b"XYZW1234".as_slice())]
#[case::lowercase_ping(b"ping".as_slice())]
#[case::too_short(b"WB".as_slice())]
#[case::empty(b"".as_slice())]
fn unrecognised_magic_is_unknown(#[case] bytes: &[u8]) {
    let err = Message::decode(bytes).expect_err("unknown kind");
    let DecodeError::UnknownMessageKind { magic } = err else {
        panic!("expected UnknownMessageKind, got {err:?}");
    };
    assert_eq!(magic, &bytes[..bytes.len().min(4)]);
}

#[test]
fn unknown_magic_display_escapes_bytes() {
    let err = Message::decode(b"\x00ABC").expect_err("unknown kind");
    assert_eq!(err.to_string(), "unknown message kind `\\x00ABC`");
}

#[test]
fn kinds_resolve_from_their_magic() {
    for kind in MessageKind::ALL {
        assert_eq!(MessageKind::from_magic(kind.magic()), Some(kind));
    }
}

fn depth_frame_strategy() -> impl Strategy<Value = DepthFrame> {
    (1_u16..12, 1_u16..12, 1_i32..4).prop_flat_map(|(width, height, downsample)| {
        let count = usize::from(width) * usize::from(height);
        vec(any::<u16>(), count).prop_map(move |samples| {
            DepthFrame::new(width, height, downsample, 0.1, 8.0, samples).expect("shape")
        })
    })
}

fn color_frame_strategy() -> impl Strategy<Value = ColorFrame> {
    (0_u16..10, 0_u16..10).prop_flat_map(|(width, height)| {
        let len = usize::from(width) * usize::from(height) * COLOR_CHANNELS;
        vec(any::<u8>(), len)
            .prop_map(move |pixels| ColorFrame::new(width, height, 1, pixels).expect("shape"))
    })
}

#[rstest]
#[case(64)]
#[case(128)]
fn generated_depth_frames_round_trip(#[case] cases: u32) {
    deterministic_runner(cases)
        .run(&depth_frame_strategy(), |frame| {
            let message = Message::Depth(frame);
            prop_assert_eq!(Message::decode(&message.encode()), Ok(message));
            Ok(())
        })
        .expect("depth frames should round-trip");
}

#[test]
fn generated_color_frames_round_trip() {
    deterministic_runner(96)
        .run(&color_frame_strategy(), |frame| {
            let message = Message::Color(frame);
            prop_assert_eq!(Message::decode(&message.encode()), Ok(message));
            Ok(())
        })
        .expect("color frames should round-trip");
}
