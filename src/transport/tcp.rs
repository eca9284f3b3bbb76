//! Stream transport with little-endian length-prefixed frames.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::{
    codec::{Framed, LengthDelimitedCodec},
    sync::CancellationToken,
};

use super::{ConnectError, RetryPolicy, Transport, TransportError, connect_with_retry};
use crate::config::TransportKind;

/// Largest frame accepted or sent by default (16 MiB).
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

const LENGTH_PREFIX_LEN: usize = 4;

/// Build the codec used on the data stream: a four-byte little-endian length
/// followed by the frame.
#[must_use]
pub fn frame_codec(max_frame_length: usize) -> LengthDelimitedCodec {
    let mut builder = LengthDelimitedCodec::builder();
    builder.length_field_length(LENGTH_PREFIX_LEN);
    builder.little_endian();
    builder.max_frame_length(max_frame_length);
    builder.new_codec()
}

/// Lifecycle of the single stream behind a [`TcpTransport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Frames can be sent and received.
    Established,
    /// A send or read failed, or the peer closed the stream. The transport
    /// is not rebuilt; the caller decides whether to reconnect.
    Severed,
}

/// One TCP stream carrying length-prefixed frames.
///
/// Frames are never chunked; large frames delay everything queued behind
/// them on the stream.
#[derive(Debug)]
pub struct TcpTransport {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
    state: ConnectionState,
    max_frame_length: usize,
}

impl TcpTransport {
    /// Wrap an established stream.
    #[must_use]
    pub fn from_stream(stream: TcpStream) -> Self {
        if let Err(err) = stream.set_nodelay(true) {
            debug!("failed to disable Nagle's algorithm: {err}");
        }
        Self {
            framed: Framed::new(stream, frame_codec(DEFAULT_MAX_FRAME_LENGTH)),
            state: ConnectionState::Established,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }

    /// Connect to `addr`, retrying according to `policy` until it succeeds
    /// or `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] when the policy gives up or the token fires.
    pub async fn connect(
        addr: SocketAddr,
        policy: &RetryPolicy,
        shutdown: &CancellationToken,
    ) -> Result<Self, ConnectError> {
        let stream = connect_with_retry(policy, shutdown, || TcpStream::connect(addr)).await?;
        info!("connected to {addr}");
        Ok(Self::from_stream(stream))
    }

    /// Accept one stream from `listener`.
    ///
    /// # Errors
    ///
    /// Returns any error raised by `accept`.
    pub async fn accept(listener: &TcpListener) -> io::Result<Self> {
        let (stream, peer) = listener.accept().await?;
        info!("accepted stream from {peer}");
        Ok(Self::from_stream(stream))
    }

    /// Set the largest frame accepted or sent.
    #[must_use]
    pub fn with_max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = max_frame_length;
        self.framed.codec_mut().set_max_frame_length(max_frame_length);
        self
    }

    /// Current connection state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState { self.state }

    /// Address of the remote end.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the socket.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> { self.framed.get_ref().peer_addr() }

    fn sever(&mut self) {
        if self.state == ConnectionState::Established {
            self.state = ConnectionState::Severed;
            let peer = self.peer_addr().ok();
            // Emit via both `log` and `tracing` for tests that capture either.
            warn!("stream to {peer:?} severed");
            tracing::warn!(?peer, "stream severed");
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn kind(&self) -> TransportKind { TransportKind::Tcp }

    fn local_addr(&self) -> io::Result<SocketAddr> { self.framed.get_ref().local_addr() }

    async fn send_frame(&mut self, frame: Bytes) -> Result<(), TransportError> {
        if self.state == ConnectionState::Severed {
            return Err(TransportError::ConnectionUnavailable);
        }
        if frame.len() > self.max_frame_length {
            return Err(TransportError::FrameTooLarge {
                len: frame.len(),
                max: self.max_frame_length,
            });
        }
        if let Err(err) = self.framed.send(frame).await {
            self.sever();
            return Err(TransportError::SendFailed(err));
        }
        Ok(())
    }

    async fn recv_frame(&mut self) -> Result<Option<Bytes>, TransportError> {
        if self.state == ConnectionState::Severed {
            return Err(TransportError::ConnectionUnavailable);
        }
        match self.framed.next().await {
            Some(Ok(frame)) => Ok(Some(frame.freeze())),
            Some(Err(err)) => {
                self.sever();
                Err(TransportError::RecvFailed(err))
            }
            None => {
                debug!("peer closed the stream");
                self.state = ConnectionState::Severed;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;
    use tracing_test::traced_test;

    use super::*;

    async fn pair() -> (TcpStream, TcpTransport) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("listener.local_addr");
        let (client, server) = tokio::join!(TcpStream::connect(addr), TcpTransport::accept(&listener));
        (client.expect("connect"), server.expect("accept"))
    }

    #[test]
    fn codec_prefix_is_little_endian() {
        use tokio_util::codec::Encoder;

        let mut buf = bytes::BytesMut::new();
        frame_codec(64)
            .encode(Bytes::from_static(b"pong"), &mut buf)
            .expect("encode");
        assert_eq!(&buf[..], b"\x04\x00\x00\x00pong");
    }

    #[traced_test]
    #[tokio::test]
    async fn corrupt_prefix_severs_and_logs() {
        let (mut client, transport) = pair().await;
        let mut transport = transport.with_max_frame_length(4);
        client.write_all(&[0xff; 4]).await.expect("write");

        assert!(transport.recv_frame().await.is_err());
        assert_eq!(transport.state(), ConnectionState::Severed);
        assert!(logs_contain("stream severed"));
        assert!(matches!(
            transport.send_frame(Bytes::from_static(b"pong")).await,
            Err(TransportError::ConnectionUnavailable)
        ));
    }

    #[tokio::test]
    async fn eof_is_a_clean_close() {
        let (client, mut transport) = pair().await;
        drop(client);

        assert!(matches!(transport.recv_frame().await, Ok(None)));
        assert_eq!(transport.state(), ConnectionState::Severed);
    }
}
