//! Low-rate command and heartbeat link.
//!
//! The link is a plain UDP socket independent of the data channel. Only the
//! exact four bytes `ping` carry meaning here; everything else is handed on
//! untouched as an [`Command::Untagged`] datagram for the caller to
//! interpret. By convention an untagged 8-byte datagram is a
//! [`VelocityCommand`], but nothing on the wire says so.

use bytes::Bytes;

mod link;
mod sender;
mod velocity;

pub use link::{COMMAND_BUFFER_LEN, CommandLink};
pub use sender::CommandSender;
pub use velocity::{VELOCITY_DATAGRAM_LEN, VelocityCommand};

/// Liveness probe payload.
pub const PING: &[u8; 4] = b"ping";

/// A datagram received on the command link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Liveness probe; answer with a pong on the data channel.
    Ping,
    /// Any other payload, uninterpreted.
    Untagged(Bytes),
}

impl Command {
    /// Classify a received datagram.
    ///
    /// # Examples
    ///
    /// ```
    /// use sensorlink::command::Command;
    ///
    /// assert_eq!(Command::parse(b"ping"), Command::Ping);
    /// assert!(matches!(Command::parse(b"PING"), Command::Untagged(_)));
    /// ```
    #[must_use]
    pub fn parse(datagram: &[u8]) -> Self {
        if datagram == PING {
            Self::Ping
        } else {
            Self::Untagged(Bytes::copy_from_slice(datagram))
        }
    }

    /// Interpret an untagged datagram as a velocity setpoint.
    #[must_use]
    pub fn as_velocity(&self) -> Option<VelocityCommand> {
        match self {
            Self::Ping => None,
            Self::Untagged(payload) => VelocityCommand::from_untagged(payload),
        }
    }
}
