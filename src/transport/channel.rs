//! Message-level channel over a boxed [`Transport`].

use std::{io, net::SocketAddr};

use log::{debug, info, warn};
use tokio::{
    net::{TcpListener, lookup_host},
    select,
};
use tokio_util::sync::CancellationToken;

use super::{OpenError, TcpTransport, Transport, TransportError, UdpTransport};
use crate::{
    config::{LinkConfig, TransportKind},
    message::Message,
};

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, OpenError> {
    let mut addrs = lookup_host((host, port))
        .await
        .map_err(|source| OpenError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    addrs.next().ok_or_else(|| OpenError::NoAddress {
        host: host.to_owned(),
        port,
    })
}

/// Sends and receives whole [`Message`]s.
///
/// The transport is chosen once when the channel is built. Sends are best
/// effort: a failure is logged and counted, the message is dropped and the
/// error handed back so the caller can decide what to do next.
#[derive(Debug)]
pub struct Channel {
    transport: Box<dyn Transport>,
}

impl Channel {
    /// Wrap an existing transport.
    #[must_use]
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    /// Open the publisher side of the link described by `config`.
    ///
    /// A TCP link blocks until connected, following `config.retry`.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError`] when the peer cannot be resolved, the socket
    /// cannot be bound, or connecting is cancelled or gives up.
    pub async fn open(config: &LinkConfig, shutdown: &CancellationToken) -> Result<Self, OpenError> {
        let peer = resolve(&config.peer_host, config.peer_port).await?;
        let channel = match config.transport {
            TransportKind::Udp => Self::new(
                UdpTransport::bind_sender(peer, config.fragmentation)
                    .await
                    .map_err(OpenError::Bind)?,
            ),
            TransportKind::Tcp => Self::new(
                TcpTransport::connect(peer, &config.retry, shutdown)
                    .await?
                    .with_max_frame_length(config.max_frame_length),
            ),
        };
        info!("opened {} channel to {peer}", config.transport);
        Ok(channel)
    }

    /// Bind the consumer side of the link described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError`] when the listen address cannot be resolved or
    /// bound.
    pub async fn listen(config: &LinkConfig) -> Result<ChannelListener, OpenError> {
        let local = resolve(&config.listen_host, config.peer_port).await?;
        let inner = match config.transport {
            TransportKind::Udp => ListenerKind::Udp(
                UdpTransport::bind_receiver(local, config.reassembly)
                    .await
                    .map_err(OpenError::Bind)?
                    .with_fragmentation(config.fragmentation),
            ),
            TransportKind::Tcp => ListenerKind::Tcp {
                listener: TcpListener::bind(local).await.map_err(OpenError::Bind)?,
                max_frame_length: config.max_frame_length,
            },
        };
        let listener = ChannelListener { inner };
        if let Ok(addr) = listener.local_addr() {
            info!("listening for {} on {addr}", config.transport);
        }
        Ok(listener)
    }

    /// Transport in use.
    #[must_use]
    pub fn kind(&self) -> TransportKind { self.transport.kind() }

    /// Address of the local socket.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.transport.local_addr() }

    /// Encode and send one message.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] that caused the message to be dropped.
    pub async fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        let kind = message.kind();
        let frame = message.encode();
        let len = frame.len();
        match self.transport.send_frame(frame).await {
            Ok(()) => {
                debug!("sent {kind} message ({len} bytes) over {}", self.kind());
                crate::metrics::inc_messages_sent(kind);
                Ok(())
            }
            Err(err) => {
                warn!("dropping {kind} message ({len} bytes) over {}: {err}", self.kind());
                crate::metrics::inc_send_failures();
                Err(err)
            }
        }
    }

    /// Wait for the next message that decodes.
    ///
    /// Malformed frames are logged, counted and skipped. Returns `Ok(None)`
    /// when the peer closed a stream cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when reading from the socket fails.
    pub async fn recv(&mut self) -> Result<Option<Message>, TransportError> {
        loop {
            let Some(frame) = self.transport.recv_frame().await? else {
                return Ok(None);
            };
            match Message::decode(&frame) {
                Ok(message) => return Ok(Some(message)),
                Err(err) => {
                    warn!("discarding frame of {} bytes: {err}", frame.len());
                    crate::metrics::inc_decode_errors();
                }
            }
        }
    }
}

#[derive(Debug)]
enum ListenerKind {
    Udp(UdpTransport),
    Tcp {
        listener: TcpListener,
        max_frame_length: usize,
    },
}

/// A bound consumer socket waiting for its publisher.
#[derive(Debug)]
pub struct ChannelListener {
    inner: ListenerKind,
}

impl ChannelListener {
    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match &self.inner {
            ListenerKind::Udp(transport) => transport.local_addr(),
            ListenerKind::Tcp { listener, .. } => listener.local_addr(),
        }
    }

    /// Produce a channel. UDP is ready at once; TCP waits for one stream.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError::Accept`] when accepting fails and
    /// [`ConnectError::Cancelled`](super::ConnectError::Cancelled) when
    /// `shutdown` fires first.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn accept(self, shutdown: &CancellationToken) -> Result<Channel, OpenError> {
        match self.inner {
            ListenerKind::Udp(transport) => Ok(Channel::new(transport)),
            ListenerKind::Tcp {
                listener,
                max_frame_length,
            } => {
                let transport = select! {
                    biased;

                    () = shutdown.cancelled() => {
                        return Err(super::ConnectError::Cancelled.into());
                    }
                    res = TcpTransport::accept(&listener) => res.map_err(OpenError::Accept)?,
                };
                Ok(Channel::new(transport.with_max_frame_length(max_frame_length)))
            }
        }
    }
}
