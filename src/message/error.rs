//! Error types raised by the wire codec.

use thiserror::Error;

use super::MessageKind;

/// Errors produced while decoding a received buffer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer does not start with a recognised magic tag.
    #[error("unknown message kind `{}`", .magic.escape_ascii())]
    UnknownMessageKind {
        /// Leading bytes of the rejected buffer (at most four).
        magic: Vec<u8>,
    },
    /// The payload length does not match the layout its header announces.
    #[error("truncated {kind} payload: expected {expected} bytes, found {actual}")]
    TruncatedPayload {
        /// Kind selected by the magic tag.
        kind: MessageKind,
        /// Byte length required by the header.
        expected: usize,
        /// Byte length actually present.
        actual: usize,
    },
}

impl DecodeError {
    pub(crate) fn unknown(prefix: &[u8]) -> Self {
        let end = prefix.len().min(super::MAGIC_LEN);
        Self::UnknownMessageKind {
            magic: prefix.get(..end).unwrap_or_default().to_vec(),
        }
    }
}

/// Errors produced while building an image frame from captured buffers.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The sample buffer does not hold `width * height` pixels.
    #[error("{width}x{height} frame needs {expected} values, got {actual}")]
    ShapeMismatch {
        /// Frame width in pixels.
        width: usize,
        /// Frame height in pixels.
        height: usize,
        /// Values required by the frame shape.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },
    /// The captured source buffer is smaller than its declared extent.
    #[error("source buffer holds {actual} values, {expected} required")]
    SourceTooSmall {
        /// Values required by the declared extent.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },
    /// The downsampled extent does not fit the 16-bit wire fields.
    #[error("downsampled extent {width}x{height} exceeds the u16 wire limit")]
    DimensionOverflow {
        /// Downsampled width.
        width: usize,
        /// Downsampled height.
        height: usize,
    },
    /// The downsample factor does not fit the signed 32-bit wire field.
    #[error("downsample factor {0} exceeds the i32 wire limit")]
    DownsampleOverflow(usize),
}
