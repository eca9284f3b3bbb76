//! Client side of the command link.

use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};

use tokio::net::UdpSocket;

use super::{PING, VelocityCommand};

/// Fire-and-forget sender of command datagrams.
#[derive(Debug)]
pub struct CommandSender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl CommandSender {
    /// Bind an ephemeral socket that sends to `target`.
    ///
    /// # Errors
    ///
    /// Returns any error raised while binding the socket.
    pub async fn bind(target: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        Ok(Self {
            socket: UdpSocket::bind(local).await?,
            target,
        })
    }

    /// Destination of every datagram.
    #[must_use]
    pub const fn target(&self) -> SocketAddr { self.target }

    /// Send a velocity setpoint.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the socket.
    pub async fn send_velocity(&self, command: VelocityCommand) -> io::Result<()> {
        self.send_raw(&command.encode()).await
    }

    /// Send a liveness probe.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the socket.
    pub async fn send_ping(&self) -> io::Result<()> { self.send_raw(PING).await }

    /// Send an arbitrary datagram.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the socket.
    pub async fn send_raw(&self, datagram: &[u8]) -> io::Result<()> {
        self.socket.send_to(datagram, self.target).await.map(drop)
    }
}
