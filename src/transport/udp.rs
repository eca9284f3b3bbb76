//! Datagram transport with transparent fragmentation.

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use tokio::net::UdpSocket;

use super::{Transport, TransportError};
use crate::{
    config::TransportKind,
    fragment::{
        FragmentationConfig,
        Fragmenter,
        Reassembler,
        ReassemblyConfig,
        decode_chunk,
    },
};

/// Size of the buffer a single datagram is read into.
pub const RECV_BUFFER_LEN: usize = 64 * 1024;

/// UDP socket that sends frames as one datagram or a run of `CHNK`
/// fragments, and reassembles fragments on receipt.
///
/// A sender is bound to a fixed peer. A receiver learns its peer from the
/// most recent datagram so replies go back to whoever spoke last.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
    learns_peer: bool,
    fragmentation: FragmentationConfig,
    fragmenter: Fragmenter,
    reassembler: Reassembler,
    recv_buf: Box<[u8]>,
}

impl UdpTransport {
    fn new(
        socket: UdpSocket,
        peer: Option<SocketAddr>,
        fragmentation: FragmentationConfig,
        reassembly: ReassemblyConfig,
    ) -> Self {
        Self {
            socket,
            peer,
            learns_peer: peer.is_none(),
            fragmentation,
            fragmenter: Fragmenter::from_config(&fragmentation),
            reassembler: Reassembler::new(reassembly),
            recv_buf: vec![0; RECV_BUFFER_LEN].into_boxed_slice(),
        }
    }

    /// Bind an ephemeral local socket that sends to `peer`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while binding the socket.
    pub async fn bind_sender(
        peer: SocketAddr,
        fragmentation: FragmentationConfig,
    ) -> io::Result<Self> {
        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        Ok(Self::new(
            socket,
            Some(peer),
            fragmentation,
            ReassemblyConfig::default(),
        ))
    }

    /// Bind `local` and wait for a peer to send first.
    ///
    /// # Errors
    ///
    /// Returns any error raised while binding the socket.
    pub async fn bind_receiver(local: SocketAddr, reassembly: ReassemblyConfig) -> io::Result<Self> {
        let socket = UdpSocket::bind(local).await?;
        Ok(Self::new(
            socket,
            None,
            FragmentationConfig::default(),
            reassembly,
        ))
    }

    /// Replace the splitting policy, restarting message ids at one.
    #[must_use]
    pub fn with_fragmentation(mut self, fragmentation: FragmentationConfig) -> Self {
        self.fragmentation = fragmentation;
        self.fragmenter = Fragmenter::from_config(&fragmentation);
        self
    }

    /// Replace the reassembly bounds, dropping any partial messages.
    #[must_use]
    pub fn with_reassembly(mut self, reassembly: ReassemblyConfig) -> Self {
        self.reassembler = Reassembler::new(reassembly);
        self
    }

    /// Current peer, if known.
    #[must_use]
    pub const fn peer(&self) -> Option<SocketAddr> { self.peer }

    /// Borrow the reassembly table.
    #[must_use]
    pub const fn reassembler(&self) -> &Reassembler { &self.reassembler }

    async fn send_fragmented(
        &mut self,
        frame: &Bytes,
        peer: SocketAddr,
    ) -> Result<(), TransportError> {
        let batch = self.fragmenter.fragment(frame)?;
        let count = batch.len();
        let mut sent = 0_usize;
        let mut first_failure = None;
        for fragment in &batch {
            let result = match fragment.to_datagram() {
                Ok(datagram) => self
                    .socket
                    .send_to(&datagram, peer)
                    .await
                    .map(drop)
                    .map_err(TransportError::SendFailed),
                Err(err) => Err(TransportError::ChunkEncode(err)),
            };
            match result {
                Ok(()) => sent += 1,
                Err(err) => {
                    warn!(
                        "fragment {} of {count} for message {} not sent: {err}",
                        fragment.header().index(),
                        batch.message_id()
                    );
                    first_failure.get_or_insert(err);
                }
            }
        }
        crate::metrics::add_fragments_sent(sent);
        debug!(
            "sent message {} as {sent}/{count} fragments to {peer}",
            batch.message_id()
        );
        first_failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    fn kind(&self) -> TransportKind { TransportKind::Udp }

    fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }

    async fn send_frame(&mut self, frame: Bytes) -> Result<(), TransportError> {
        let Some(peer) = self.peer else {
            return Err(TransportError::ConnectionUnavailable);
        };
        if self.fragmentation.needs_fragmentation(frame.len()) {
            return self.send_fragmented(&frame, peer).await;
        }
        self.socket
            .send_to(&frame, peer)
            .await
            .map(drop)
            .map_err(TransportError::SendFailed)
    }

    async fn recv_frame(&mut self) -> Result<Option<Bytes>, TransportError> {
        loop {
            let (len, from) = self
                .socket
                .recv_from(&mut self.recv_buf)
                .await
                .map_err(TransportError::RecvFailed)?;
            if self.learns_peer {
                self.peer = Some(from);
            }
            let datagram = &self.recv_buf[..len];
            match decode_chunk(datagram) {
                Ok(None) => return Ok(Some(Bytes::copy_from_slice(datagram))),
                Ok(Some((header, payload))) => match self.reassembler.push(header, payload) {
                    Ok(Some(message)) => return Ok(Some(message.into_payload())),
                    Ok(None) => {}
                    Err(err) => {
                        warn!("discarding fragment from {from}: {err}");
                        crate::metrics::inc_decode_errors();
                    }
                },
                Err(err) => {
                    warn!("discarding malformed chunk from {from}: {err}");
                    crate::metrics::inc_decode_errors();
                }
            }
        }
    }
}
