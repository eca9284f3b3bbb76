//! Synthetic sensor source driving the `publish` subcommand.
//!
//! The robot simulator is not part of this crate; this source fabricates a
//! robot turning on the spot inside a circular room so the link can be
//! exercised end to end.

use std::f32::consts::TAU;

use sensorlink::{
    Pose2D,
    SensorSource,
    Telemetry,
    Velocity2D,
    message::{COLOR_CHANNELS, RangeImage, RawImage},
};

const SCAN_SAMPLES: usize = 360;
const IMAGE_WIDTH: usize = 160;
const IMAGE_HEIGHT: usize = 120;
const ROOM_RADIUS: f32 = 4.0;
const TURN_RATE: f32 = 0.3;
const TICK_SECONDS: f32 = 0.016;

#[derive(Debug)]
pub struct SyntheticSource {
    heading: f32,
    depth: Vec<f32>,
    pixels: Vec<u8>,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self {
            heading: 0.0,
            depth: vec![0.0; IMAGE_WIDTH * IMAGE_HEIGHT],
            pixels: vec![0; IMAGE_WIDTH * IMAGE_HEIGHT * COLOR_CHANNELS],
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "image coordinates are far below f32's exact integer range"
)]
fn ratio(value: usize, extent: usize) -> f32 { value as f32 / extent as f32 }

impl SensorSource for SyntheticSource {
    fn telemetry(&mut self) -> Option<Telemetry> {
        self.heading = (self.heading + TURN_RATE * TICK_SECONDS) % TAU;
        let ranges = (0..SCAN_SAMPLES)
            .map(|i| ROOM_RADIUS + 0.25 * (ratio(i, SCAN_SAMPLES) * TAU * 4.0 + self.heading).sin())
            .collect();
        Some(Telemetry::new(
            Pose2D {
                x: 0.0,
                y: 0.0,
                heading: self.heading,
            },
            Velocity2D {
                vx: 0.0,
                vy: 0.0,
                vth: TURN_RATE,
            },
            ranges,
        ))
    }

    fn range_image(&mut self) -> Option<RangeImage<'_>> {
        for (offset, sample) in self.depth.iter_mut().enumerate() {
            let column = ratio(offset % IMAGE_WIDTH, IMAGE_WIDTH);
            let row = ratio(offset / IMAGE_WIDTH, IMAGE_HEIGHT);
            *sample = if row > 0.9 {
                f32::INFINITY
            } else {
                ROOM_RADIUS * (1.0 + 0.1 * (column * TAU + self.heading).cos())
            };
        }
        Some(RangeImage {
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
            min_range: 0.1,
            max_range: 8.0,
            samples: &self.depth,
        })
    }

    fn color_image(&mut self) -> Option<RawImage<'_>> {
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "heading is wrapped to [0, TAU) so the shade fits in a byte"
        )]
        let shade = (self.heading / TAU * 255.0) as u8;
        for (pixel, chunk) in self.pixels.chunks_exact_mut(COLOR_CHANNELS).enumerate() {
            let column = u8::try_from(pixel % IMAGE_WIDTH).unwrap_or(u8::MAX);
            chunk.copy_from_slice(&[shade, column, 255 - column, 255]);
        }
        Some(RawImage {
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
            pixels: &self.pixels,
        })
    }
}
