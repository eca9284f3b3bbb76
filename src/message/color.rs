//! Colour images (`WBTR`).

use bytes::{Buf, BufMut};

use super::{
    DecodeError,
    FrameError,
    MAGIC_LEN,
    MessageKind,
    sampling::{Extent, check_source_len},
};

/// Bytes between the magic tag and the pixels: width, height and downsample
/// factor.
pub const COLOR_HEADER_LEN: usize = 2 + 2 + 4;

/// Interleaved channels per pixel.
pub const COLOR_CHANNELS: usize = 4;

/// A captured colour image, borrowed from the acquisition layer.
///
/// Pixels are four interleaved bytes in whatever channel order the camera
/// produces; no colour-space conversion happens on the wire.
#[derive(Clone, Copy, Debug)]
pub struct RawImage<'a> {
    /// Source width in pixels.
    pub width: usize,
    /// Source height in pixels.
    pub height: usize,
    /// Row-major pixel bytes.
    pub pixels: &'a [u8],
}

/// Raw colour image, row-major, four bytes per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorFrame {
    width: u16,
    height: u16,
    downsample: i32,
    pixels: Vec<u8>,
}

impl ColorFrame {
    /// Build a frame from already-sampled pixel bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ShapeMismatch`] when `pixels` does not hold
    /// exactly `width * height * 4` bytes.
    pub fn new(width: u16, height: u16, downsample: i32, pixels: Vec<u8>) -> Result<Self, FrameError> {
        let expected = usize::from(width) * usize::from(height) * COLOR_CHANNELS;
        if pixels.len() != expected {
            return Err(FrameError::ShapeMismatch {
                width: width.into(),
                height: height.into(),
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            downsample,
            pixels,
        })
    }

    /// Downsample a captured image by stride skipping, copying pixels
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] when the source buffer is smaller than its
    /// declared extent or the downsampled extent overflows the wire fields.
    pub fn from_raw_image(image: &RawImage<'_>, downsample: usize) -> Result<Self, FrameError> {
        let extent = Extent::downsampled(image.width, image.height, downsample)?;
        check_source_len(
            image.width * image.height * COLOR_CHANNELS,
            image.pixels.len(),
        )?;
        let mut pixels = Vec::with_capacity(extent.pixel_count() * COLOR_CHANNELS);
        for offset in extent.source_offsets(image.width, image.height) {
            let start = offset * COLOR_CHANNELS;
            let pixel = image
                .pixels
                .get(start..start + COLOR_CHANNELS)
                .unwrap_or(&[0; COLOR_CHANNELS]);
            pixels.extend_from_slice(pixel);
        }
        Self::new(extent.width, extent.height, extent.downsample, pixels)
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

    /// Row-major pixel bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] { &self.pixels }

    /// Pixel at column `x`, row `y`.
    #[must_use]
    pub fn pixel_at(&self, x: u16, y: u16) -> Option<[u8; COLOR_CHANNELS]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (usize::from(y) * usize::from(self.width) + usize::from(x)) * COLOR_CHANNELS;
        self.pixels
            .get(start..start + COLOR_CHANNELS)
            .and_then(|pixel| pixel.try_into().ok())
    }

    pub(super) fn body_len(&self) -> usize { COLOR_HEADER_LEN + self.pixels.len() }

    pub(super) fn encode_body(&self, buf: &mut impl BufMut) {
        buf.put_u16_le(self.width);
        buf.put_u16_le(self.height);
        buf.put_i32_le(self.downsample);
        buf.put_slice(&self.pixels);
    }

    pub(super) fn decode_body(mut body: &[u8]) -> Result<Self, DecodeError> {
        if body.remaining() < COLOR_HEADER_LEN {
            return Err(DecodeError::TruncatedPayload {
                kind: MessageKind::Color,
                expected: MAGIC_LEN + COLOR_HEADER_LEN,
                actual: MAGIC_LEN + body.remaining(),
            });
        }
        let width = body.get_u16_le();
        let height = body.get_u16_le();
        let downsample = body.get_i32_le();
        let expected = usize::from(width) * usize::from(height) * COLOR_CHANNELS;
        if body.len() != expected {
            return Err(DecodeError::TruncatedPayload {
                kind: MessageKind::Color,
                expected: MAGIC_LEN + COLOR_HEADER_LEN + expected,
                actual: MAGIC_LEN + COLOR_HEADER_LEN + body.len(),
            });
        }
        Ok(Self {
            width,
            height,
            downsample,
            pixels: body.to_vec(),
        })
    }
}
