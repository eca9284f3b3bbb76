//! Error types for the transport layer.

use std::io;

use thiserror::Error;

use crate::fragment::FragmentationError;

/// Errors raised while sending or receiving frames.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No stream is established, or the peer of a datagram socket is not yet
    /// known.
    #[error("connection unavailable")]
    ConnectionUnavailable,
    /// The socket refused an outbound frame.
    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),
    /// Reading from the socket failed.
    #[error("receive failed: {0}")]
    RecvFailed(#[source] io::Error),
    /// The frame exceeds the stream codec's maximum length.
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },
    /// The frame could not be split into datagrams.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// A chunk header could not be encoded.
    #[error("failed to encode chunk header: {0}")]
    ChunkEncode(#[source] bincode::error::EncodeError),
}

/// Errors raised while establishing a stream connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The cancellation token fired before a connection was made.
    #[error("connection attempt cancelled")]
    Cancelled,
    /// Every permitted attempt failed.
    #[error("gave up after {attempts} connection attempts: {last}")]
    AttemptsExhausted {
        attempts: u32,
        #[source]
        last: io::Error,
    },
}

/// Errors raised while opening a [`Channel`](super::Channel).
#[derive(Debug, Error)]
pub enum OpenError {
    /// Host name resolution failed.
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded but produced no address.
    #[error("{host}:{port} resolved to no addresses")]
    NoAddress { host: String, port: u16 },
    /// Binding a local socket failed.
    #[error("failed to bind: {0}")]
    Bind(#[source] io::Error),
    /// Accepting an inbound stream failed.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),
    /// Connecting to the peer failed.
    #[error(transparent)]
    Connect(#[from] ConnectError),
}
