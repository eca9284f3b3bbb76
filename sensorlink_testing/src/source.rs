//! Deterministic sensor source.

use sensorlink::{
    SensorSource,
    Telemetry,
    message::{RangeImage, RawImage},
};

/// Hands out the same buffers on every call and counts how often each
/// stream was read.
#[derive(Clone, Debug, Default)]
pub struct FixedSource {
    /// Returned by [`SensorSource::telemetry`].
    pub telemetry: Option<Telemetry>,
    /// Depth extent and samples in metres; `None` when absent.
    pub depth: Option<(usize, usize, Vec<f32>)>,
    /// Colour extent and pixels; `None` when absent.
    pub color: Option<(usize, usize, Vec<u8>)>,
    /// Calls per stream: telemetry, depth, colour.
    pub reads: [usize; 3],
}

impl FixedSource {
    /// A source offering every stream with small images.
    #[must_use]
    pub fn with_all_streams() -> Self {
        Self {
            telemetry: Some(Telemetry {
                ranges: vec![1.0, 2.0, 3.0],
                ..Telemetry::default()
            }),
            depth: Some((4, 2, vec![0.5, -1.0, 2.0, f32::NAN, 0.0, 3.999, 4.0001, 65.6])),
            color: Some((2, 2, (0..16).collect())),
            reads: [0; 3],
        }
    }
}

impl SensorSource for FixedSource {
    fn telemetry(&mut self) -> Option<Telemetry> {
        self.reads[0] += 1;
        self.telemetry.clone()
    }

    fn range_image(&mut self) -> Option<RangeImage<'_>> {
        self.reads[1] += 1;
        self.depth.as_ref().map(|(width, height, samples)| RangeImage {
            width: *width,
            height: *height,
            min_range: 0.1,
            max_range: 5.0,
            samples,
        })
    }

    fn color_image(&mut self) -> Option<RawImage<'_>> {
        self.reads[2] += 1;
        self.color.as_ref().map(|(width, height, pixels)| RawImage {
            width: *width,
            height: *height,
            pixels,
        })
    }
}
