//! Range and odometry telemetry (`WBT2`).

use bytes::{Buf, BufMut};

use super::{DecodeError, MAGIC_LEN, MessageKind};

/// Bytes between the magic tag and the range samples: six `f32` fields and
/// the `u32` sample count.
pub const TELEMETRY_HEADER_LEN: usize = 6 * 4 + 4;

/// Planar pose estimate from odometry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose2D {
    /// X position in metres.
    pub x: f32,
    /// Y position in metres.
    pub y: f32,
    /// Heading in radians.
    pub heading: f32,
}

/// Planar velocity estimate from odometry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity2D {
    /// Velocity along X in metres per second.
    pub vx: f32,
    /// Velocity along Y in metres per second.
    pub vy: f32,
    /// Angular velocity in radians per second.
    pub vth: f32,
}

/// Pose, velocity and the latest range scan.
///
/// An empty scan is valid and encodes a zero sample count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Telemetry {
    /// Odometry pose.
    pub pose: Pose2D,
    /// Odometry velocity.
    pub velocity: Velocity2D,
    /// Range samples in metres.
    pub ranges: Vec<f32>,
}

impl Telemetry {
    /// Bundle a pose, velocity and range scan.
    #[must_use]
    pub fn new(pose: Pose2D, velocity: Velocity2D, ranges: Vec<f32>) -> Self {
        Self {
            pose,
            velocity,
            ranges,
        }
    }

    fn sample_count(&self) -> u32 { u32::try_from(self.ranges.len()).unwrap_or(u32::MAX) }

    pub(super) fn body_len(&self) -> usize {
        TELEMETRY_HEADER_LEN + 4 * self.sample_count() as usize
    }

    pub(super) fn encode_body(&self, buf: &mut impl BufMut) {
        let count = self.sample_count();
        for value in [
            self.pose.x,
            self.pose.y,
            self.pose.heading,
            self.velocity.vx,
            self.velocity.vy,
            self.velocity.vth,
        ] {
            buf.put_f32_le(value);
        }
        buf.put_u32_le(count);
        for range in self.ranges.iter().take(count as usize) {
            buf.put_f32_le(*range);
        }
    }

    pub(super) fn decode_body(mut body: &[u8]) -> Result<Self, DecodeError> {
        let truncated = |expected: usize, actual: usize| DecodeError::TruncatedPayload {
            kind: MessageKind::Telemetry,
            expected: MAGIC_LEN.saturating_add(expected),
            actual: MAGIC_LEN + actual,
        };
        if body.remaining() < TELEMETRY_HEADER_LEN {
            return Err(truncated(TELEMETRY_HEADER_LEN, body.remaining()));
        }
        let pose = Pose2D {
            x: body.get_f32_le(),
            y: body.get_f32_le(),
            heading: body.get_f32_le(),
        };
        let velocity = Velocity2D {
            vx: body.get_f32_le(),
            vy: body.get_f32_le(),
            vth: body.get_f32_le(),
        };
        let count = body.get_u32_le() as usize;
        let samples_len = count.saturating_mul(4);
        if body.remaining() != samples_len {
            return Err(truncated(
                TELEMETRY_HEADER_LEN.saturating_add(samples_len),
                TELEMETRY_HEADER_LEN + body.remaining(),
            ));
        }
        let ranges = (0..count).map(|_| body.get_f32_le()).collect();
        Ok(Self::new(pose, velocity, ranges))
    }
}
