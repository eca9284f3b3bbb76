//! Non-blocking receiver for command datagrams.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
};

use log::{debug, warn};
use tokio::net::UdpSocket;

use super::Command;

/// Largest command datagram read in full; longer ones are truncated.
pub const COMMAND_BUFFER_LEN: usize = 2048;

/// UDP socket polled once per control cycle for commands.
#[derive(Debug)]
pub struct CommandLink {
    socket: UdpSocket,
    buf: Box<[u8]>,
}

impl CommandLink {
    /// Listen on `port` on every IPv4 interface.
    ///
    /// # Errors
    ///
    /// Returns any error raised while binding the socket.
    pub async fn bind(port: u16) -> io::Result<Self> {
        Self::bind_addr((Ipv4Addr::UNSPECIFIED, port).into()).await
    }

    /// Listen on an explicit address.
    ///
    /// # Errors
    ///
    /// Returns any error raised while binding the socket.
    pub async fn bind_addr(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        debug!("command link listening on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            buf: vec![0; COMMAND_BUFFER_LEN].into_boxed_slice(),
        })
    }

    /// Address the link is bound to.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }

    /// Take at most one pending command without waiting.
    ///
    /// Returns `None` when nothing is queued. Socket errors are logged and
    /// also yield `None`; the link stays usable.
    pub fn poll(&mut self) -> Option<Command> {
        match self.socket.try_recv_from(&mut self.buf) {
            Ok((len, from)) => {
                let command = Command::parse(&self.buf[..len]);
                debug!("command from {from}: {command:?}");
                Some(command)
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => None,
            Err(err) => {
                warn!("command link receive failed: {err}");
                None
            }
        }
    }
}
