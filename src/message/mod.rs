//! Wire codec for the sensor stream messages.
//!
//! Every message starts with a four byte ASCII magic tag that selects the
//! payload layout. All numeric fields are little-endian and no payload is
//! compressed or checksummed; integrity is left to the transport.
//!
//! ```text
//! WBT2  pose/velocity (6 × f32) | count (u32) | count × f32 ranges
//! WBTD  width, height (u16) | ds (i32) | min, max (f32) | width × height × u16 mm
//! WBTR  width, height (u16) | ds (i32) | width × height × 4 colour bytes
//! pong  liveness reply, no payload
//! ```
//!
//! Encoding is total. Decoding either yields a complete [`Message`] or a
//! [`DecodeError`]; no partial image is ever surfaced.

mod color;
mod depth;
mod error;
mod sampling;
mod telemetry;

use std::fmt;

use bytes::{Bytes, BytesMut};

pub use color::{COLOR_CHANNELS, COLOR_HEADER_LEN, ColorFrame, RawImage};
pub use depth::{DEPTH_HEADER_LEN, DepthFrame, INVALID_DEPTH_MM, RangeImage, depth_to_millimeters};
pub use error::{DecodeError, FrameError};
pub use telemetry::{Pose2D, TELEMETRY_HEADER_LEN, Telemetry, Velocity2D};

/// Length of the magic tag that prefixes every message.
pub const MAGIC_LEN: usize = 4;

/// Magic tag of [`Message::Telemetry`].
pub const TELEMETRY_MAGIC: &[u8; MAGIC_LEN] = b"WBT2";
/// Magic tag of [`Message::Depth`].
pub const DEPTH_MAGIC: &[u8; MAGIC_LEN] = b"WBTD";
/// Magic tag of [`Message::Color`].
pub const COLOR_MAGIC: &[u8; MAGIC_LEN] = b"WBTR";
/// Liveness reply sent in answer to a `ping` probe.
pub const PONG_MAGIC: &[u8; MAGIC_LEN] = b"pong";

/// Discriminant of a [`Message`], used for logging and metric labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Odometry pose, velocity and range samples.
    Telemetry,
    /// Quantised depth map.
    Depth,
    /// Raw colour image.
    Color,
    /// Liveness reply.
    Pong,
}

impl MessageKind {
    /// Every kind recognised by the codec.
    pub const ALL: [Self; 4] = [Self::Telemetry, Self::Depth, Self::Color, Self::Pong];

    /// Return the magic tag written in front of messages of this kind.
    #[must_use]
    pub const fn magic(self) -> &'static [u8; MAGIC_LEN] {
        match self {
            Self::Telemetry => TELEMETRY_MAGIC,
            Self::Depth => DEPTH_MAGIC,
            Self::Color => COLOR_MAGIC,
            Self::Pong => PONG_MAGIC,
        }
    }

    /// Resolve a magic tag to its kind.
    #[must_use]
    pub fn from_magic(magic: &[u8; MAGIC_LEN]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.magic() == magic)
    }

    /// Stable lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Telemetry => "telemetry",
            Self::Depth => "depth",
            Self::Color => "color",
            Self::Pong => "pong",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A logical, self-describing unit of data carried over the link.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Range and odometry telemetry.
    Telemetry(Telemetry),
    /// Depth map in millimetres.
    Depth(DepthFrame),
    /// Colour image.
    Color(ColorFrame),
    /// Reply to a liveness probe.
    Pong,
}

impl Message {
    /// Return the kind of this message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Telemetry(_) => MessageKind::Telemetry,
            Self::Depth(_) => MessageKind::Depth,
            Self::Color(_) => MessageKind::Color,
            Self::Pong => MessageKind::Pong,
        }
    }

    /// Number of bytes produced by [`Message::encode`].
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        MAGIC_LEN
            + match self {
                Self::Telemetry(telemetry) => telemetry.body_len(),
                Self::Depth(frame) => frame.body_len(),
                Self::Color(frame) => frame.body_len(),
                Self::Pong => 0,
            }
    }

    /// Encode the message into a fresh buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use sensorlink::message::Message;
    ///
    /// assert_eq!(&Message::Pong.encode()[..], b"pong");
    /// ```
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Append the encoded message to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        buf.extend_from_slice(self.kind().magic());
        match self {
            Self::Telemetry(telemetry) => telemetry.encode_body(buf),
            Self::Depth(frame) => frame.encode_body(buf),
            Self::Color(frame) => frame.encode_body(buf),
            Self::Pong => {}
        }
    }

    /// Decode one complete message.
    ///
    /// The whole buffer must belong to the message; there is no partial
    /// recovery. Chunk wrappers (`CHNK`) are not messages and are rejected as
    /// unknown.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownMessageKind`] for an unrecognised magic
    /// tag and [`DecodeError::TruncatedPayload`] when the payload length does
    /// not match the layout announced by its header.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let Some((magic, body)) = bytes.split_first_chunk::<MAGIC_LEN>() else {
            return Err(DecodeError::unknown(bytes));
        };
        let Some(kind) = MessageKind::from_magic(magic) else {
            return Err(DecodeError::unknown(magic));
        };
        match kind {
            MessageKind::Telemetry => Telemetry::decode_body(body).map(Self::Telemetry),
            MessageKind::Depth => DepthFrame::decode_body(body).map(Self::Depth),
            MessageKind::Color => ColorFrame::decode_body(body).map(Self::Color),
            MessageKind::Pong if body.is_empty() => Ok(Self::Pong),
            MessageKind::Pong => Err(DecodeError::TruncatedPayload {
                kind,
                expected: MAGIC_LEN,
                actual: bytes.len(),
            }),
        }
    }
}

impl From<Telemetry> for Message {
    fn from(value: Telemetry) -> Self { Self::Telemetry(value) }
}

impl From<DepthFrame> for Message {
    fn from(value: DepthFrame) -> Self { Self::Depth(value) }
}

impl From<ColorFrame> for Message {
    fn from(value: ColorFrame) -> Self { Self::Color(value) }
}

#[cfg(test)]
mod tests;
