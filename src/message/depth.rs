//! Depth maps (`WBTD`).

use bytes::{Buf, BufMut};

use super::{
    DecodeError,
    FrameError,
    MAGIC_LEN,
    MessageKind,
    sampling::{Extent, check_source_len},
};

/// Bytes between the magic tag and the samples: width, height, downsample
/// factor and the sensor's min/max range.
pub const DEPTH_HEADER_LEN: usize = 2 + 2 + 4 + 4 + 4;

/// Sentinel written for samples that carry no valid measurement.
pub const INVALID_DEPTH_MM: u16 = 0;

/// A captured range image, borrowed from the acquisition layer.
#[derive(Clone, Copy, Debug)]
pub struct RangeImage<'a> {
    /// Source width in pixels.
    pub width: usize,
    /// Source height in pixels.
    pub height: usize,
    /// Sensor minimum range in metres.
    pub min_range: f32,
    /// Sensor maximum range in metres.
    pub max_range: f32,
    /// Row-major samples in metres.
    pub samples: &'a [f32],
}

/// Quantise a depth sample in metres to whole millimetres.
///
/// Non-positive, infinite and NaN samples map to [`INVALID_DEPTH_MM`]. Valid
/// samples round to the nearest millimetre, ties to even, and saturate at
/// 65 535 mm, which caps the representable range at 65.535 m whatever the
/// sensor maximum.
///
/// # Examples
///
/// ```
/// use sensorlink::message::depth_to_millimeters;
///
/// assert_eq!(depth_to_millimeters(0.5), 500);
/// assert_eq!(depth_to_millimeters(0.0625), 62);
/// assert_eq!(depth_to_millimeters(f32::NAN), 0);
/// assert_eq!(depth_to_millimeters(80.0), u16::MAX);
/// ```
#[must_use]
pub fn depth_to_millimeters(meters: f32) -> u16 {
    if meters.is_nan() || meters <= 0.0 || meters.is_infinite() {
        return INVALID_DEPTH_MM;
    }
    let millimeters = (f64::from(meters) * 1000.0).round_ties_even();
    if millimeters >= f64::from(u16::MAX) {
        return u16::MAX;
    }
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is finite, positive and below u16::MAX"
    )]
    let quantised = millimeters as u16;
    quantised
}

/// Depth map quantised to millimetres, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthFrame {
    width: u16,
    height: u16,
    downsample: i32,
    min_range: f32,
    max_range: f32,
    samples: Vec<u16>,
}

impl DepthFrame {
    /// Build a frame from already-quantised samples.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ShapeMismatch`] when `samples` does not hold
    /// exactly `width * height` values.
    pub fn new(
        width: u16,
        height: u16,
        downsample: i32,
        min_range: f32,
        max_range: f32,
        samples: Vec<u16>,
    ) -> Result<Self, FrameError> {
        let expected = usize::from(width) * usize::from(height);
        if samples.len() != expected {
            return Err(FrameError::ShapeMismatch {
                width: width.into(),
                height: height.into(),
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            downsample,
            min_range,
            max_range,
            samples,
        })
    }

    /// Downsample and quantise a captured range image.
    ///
    /// Every `downsample`-th row and column is kept and each sample goes
    /// through [`depth_to_millimeters`].
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] when the source buffer is smaller than its
    /// declared extent or the downsampled extent overflows the wire fields.
    pub fn from_range_image(image: &RangeImage<'_>, downsample: usize) -> Result<Self, FrameError> {
        let extent = Extent::downsampled(image.width, image.height, downsample)?;
        check_source_len(image.width * image.height, image.samples.len())?;
        let samples = extent
            .source_offsets(image.width, image.height)
            .map(|offset| {
                image
                    .samples
                    .get(offset)
                    .map_or(INVALID_DEPTH_MM, |meters| depth_to_millimeters(*meters))
            })
            .collect();
        Self::new(
            extent.width,
            extent.height,
            extent.downsample,
            image.min_range,
            image.max_range,
            samples,
        )
    }

    /// Width in pixels after downsampling.
    #[must_use]
    pub const fn width(&self) -> u16 { self.width }

    /// Height in pixels after downsampling.
    #[must_use]
    pub const fn height(&self) -> u16 { self.height }

    /// Stride used when the frame was captured.
    #[must_use]
    pub const fn downsample(&self) -> i32 { self.downsample }

    /// Sensor minimum range in metres.
    #[must_use]
    pub const fn min_range(&self) -> f32 { self.min_range }

    /// Sensor maximum range in metres.
    #[must_use]
    pub const fn max_range(&self) -> f32 { self.max_range }

    /// Row-major samples in millimetres.
    #[must_use]
    pub fn samples(&self) -> &[u16] { &self.samples }

    /// Sample at column `x`, row `y`.
    #[must_use]
    pub fn sample_at(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = usize::from(y) * usize::from(self.width) + usize::from(x);
        self.samples.get(offset).copied()
    }

    /// Samples converted back to metres; invalid samples stay at `0.0`.
    #[must_use]
    pub fn depth_meters(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|mm| f32::from(*mm) / 1000.0)
            .collect()
    }

    pub(super) fn body_len(&self) -> usize { DEPTH_HEADER_LEN + 2 * self.samples.len() }

    pub(super) fn encode_body(&self, buf: &mut impl BufMut) {
        buf.put_u16_le(self.width);
        buf.put_u16_le(self.height);
        buf.put_i32_le(self.downsample);
        buf.put_f32_le(self.min_range);
        buf.put_f32_le(self.max_range);
        for sample in &self.samples {
            buf.put_u16_le(*sample);
        }
    }

    pub(super) fn decode_body(mut body: &[u8]) -> Result<Self, DecodeError> {
        if body.remaining() < DEPTH_HEADER_LEN {
            return Err(DecodeError::TruncatedPayload {
                kind: MessageKind::Depth,
                expected: MAGIC_LEN + DEPTH_HEADER_LEN,
                actual: MAGIC_LEN + body.remaining(),
            });
        }
        let width = body.get_u16_le();
        let height = body.get_u16_le();
        let downsample = body.get_i32_le();
        let min_range = body.get_f32_le();
        let max_range = body.get_f32_le();
        let count = usize::from(width) * usize::from(height);
        if body.remaining() != 2 * count {
            return Err(DecodeError::TruncatedPayload {
                kind: MessageKind::Depth,
                expected: MAGIC_LEN + DEPTH_HEADER_LEN + 2 * count,
                actual: MAGIC_LEN + DEPTH_HEADER_LEN + body.remaining(),
            });
        }
        let samples = (0..count).map(|_| body.get_u16_le()).collect();
        Ok(Self {
            width,
            height,
            downsample,
            min_range,
            max_range,
            samples,
        })
    }
}
