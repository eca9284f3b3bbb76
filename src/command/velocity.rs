//! Velocity setpoint datagrams.

use bytes::{Buf, BufMut};

/// Size of a velocity datagram: two little-endian `f32`s.
pub const VELOCITY_DATAGRAM_LEN: usize = 8;

/// Linear and angular velocity setpoint for a differential drive.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocityCommand {
    /// Forward speed in metres per second.
    pub linear: f32,
    /// Turn rate in radians per second.
    pub angular: f32,
}

impl VelocityCommand {
    /// Build a setpoint.
    #[must_use]
    pub const fn new(linear: f32, angular: f32) -> Self { Self { linear, angular } }

    /// Encode as the 8-byte datagram `(v, w)`.
    #[must_use]
    pub fn encode(&self) -> [u8; VELOCITY_DATAGRAM_LEN] {
        let mut buf = [0_u8; VELOCITY_DATAGRAM_LEN];
        let mut cursor = &mut buf[..];
        cursor.put_f32_le(self.linear);
        cursor.put_f32_le(self.angular);
        buf
    }

    /// Read an untagged datagram as a setpoint.
    ///
    /// Only datagrams of exactly eight bytes qualify; anything else is
    /// `None`.
    #[must_use]
    pub fn from_untagged(mut datagram: &[u8]) -> Option<Self> {
        if datagram.len() != VELOCITY_DATAGRAM_LEN {
            return None;
        }
        Some(Self::new(datagram.get_f32_le(), datagram.get_f32_le()))
    }
}
