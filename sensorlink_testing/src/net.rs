//! Loopback links with ephemeral ports.

use std::io;

use sensorlink::{Channel, LinkConfig, OpenError, TransportKind};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// A configuration bound to loopback with every port left to the OS.
#[must_use]
pub fn loopback_config(transport: TransportKind) -> LinkConfig {
    LinkConfig {
        transport,
        peer_host: "127.0.0.1".to_owned(),
        peer_port: 0,
        listen_host: "127.0.0.1".to_owned(),
        command_port: 0,
        ..LinkConfig::default()
    }
}

fn on_loopback(config: &LinkConfig, transport: TransportKind) -> LinkConfig {
    LinkConfig {
        transport,
        peer_host: "127.0.0.1".to_owned(),
        peer_port: 0,
        listen_host: "127.0.0.1".to_owned(),
        ..config.clone()
    }
}

/// Open a UDP publisher channel aimed at a freshly bound consumer.
///
/// Returns `(publisher, consumer)`. Fragmentation and reassembly settings
/// come from `config`; addresses are overridden.
///
/// # Errors
///
/// Returns [`OpenError`] when either end cannot be bound.
pub async fn udp_link(config: &LinkConfig) -> Result<(Channel, Channel), OpenError> {
    let mut config = on_loopback(config, TransportKind::Udp);
    let token = CancellationToken::new();
    let listener = Channel::listen(&config).await?;
    config.peer_port = listener.local_addr().map_err(OpenError::Bind)?.port();
    let consumer = listener.accept(&token).await?;
    let publisher = Channel::open(&config, &token).await?;
    Ok((publisher, consumer))
}

/// Connect a TCP publisher channel to a freshly bound consumer.
///
/// Returns `(publisher, consumer)`.
///
/// # Errors
///
/// Returns [`OpenError`] when binding, connecting or accepting fails.
pub async fn tcp_link(config: &LinkConfig) -> Result<(Channel, Channel), OpenError> {
    let mut config = on_loopback(config, TransportKind::Tcp);
    let token = CancellationToken::new();
    let listener = Channel::listen(&config).await?;
    config.peer_port = listener.local_addr().map_err(OpenError::Bind)?.port();
    let (consumer, publisher) =
        tokio::join!(listener.accept(&token), Channel::open(&config, &token));
    Ok((publisher?, consumer?))
}

/// Accept a TCP consumer channel whose peer is a bare stream, for tests that
/// write raw bytes.
///
/// # Errors
///
/// Returns any error raised while binding, connecting or accepting.
pub async fn raw_tcp_peer(config: &LinkConfig) -> io::Result<(TcpStream, Channel)> {
    let config = on_loopback(config, TransportKind::Tcp);
    let token = CancellationToken::new();
    let listener = Channel::listen(&config).await.map_err(io::Error::other)?;
    let addr = listener.local_addr()?;
    let (stream, consumer) = tokio::join!(TcpStream::connect(addr), listener.accept(&token));
    Ok((stream?, consumer.map_err(io::Error::other)?))
}
