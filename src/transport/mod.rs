//! Uniform "one complete frame" delivery over UDP or TCP.
//!
//! A [`Transport`] moves encoded messages as opaque frames. The UDP variant
//! splits oversize frames into `CHNK` datagrams and reassembles them on
//! arrival; the TCP variant prefixes each frame with its length. [`Channel`]
//! layers the wire codec on top and picks the variant once, at construction.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::TransportKind;

mod channel;
mod error;
mod retry;
mod tcp;
mod udp;

pub use channel::{Channel, ChannelListener};
pub use error::{ConnectError, OpenError, TransportError};
pub use retry::{RetryPolicy, connect_with_retry};
pub use tcp::{ConnectionState, DEFAULT_MAX_FRAME_LENGTH, TcpTransport, frame_codec};
pub use udp::{RECV_BUFFER_LEN, UdpTransport};

/// Moves whole frames between two endpoints.
///
/// Implementations deliver each frame intact or not at all; a receiver never
/// sees a partial frame.
#[async_trait]
pub trait Transport: Send + std::fmt::Debug {
    /// Which transport this is.
    fn kind(&self) -> TransportKind;

    /// Address of the local socket.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the socket.
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Send one frame to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the frame could not be handed to the
    /// socket. The frame is lost; nothing is retried.
    async fn send_frame(&mut self, frame: Bytes) -> Result<(), TransportError>;

    /// Wait for the next complete frame.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when reading from the socket fails.
    async fn recv_frame(&mut self) -> Result<Option<Bytes>, TransportError>;
}
