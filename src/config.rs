//! Link configuration types.
//!
//! [`LinkConfig`] gathers every knob the publisher and consumer need: which
//! transport to use, where the peer lives, which sensor streams run and how
//! often, and the bounds applied by fragmentation, reassembly and connection
//! retry. Values are plain data; the binary fills them from the command line
//! and environment.

use std::{fmt, str::FromStr, time::Duration};

use thiserror::Error;

use crate::{
    fragment::{FragmentationConfig, MIN_DATAGRAM_SIZE, ReassemblyConfig},
    transport::{DEFAULT_MAX_FRAME_LENGTH, RetryPolicy},
};

/// Peer host used when none is configured.
pub const DEFAULT_PEER_HOST: &str = "127.0.0.1";
/// Data port used when none is configured.
pub const DEFAULT_PEER_PORT: u16 = 5600;
/// Local address a consumer binds when none is configured.
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";
/// Command and heartbeat port used when none is configured.
pub const DEFAULT_COMMAND_PORT: u16 = 5555;

/// Network transport carrying the data channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Datagrams, fragmented when oversize.
    #[default]
    Udp,
    /// A single stream with length-prefixed frames.
    Tcp,
}

impl TransportKind {
    /// Lower-case name used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Returned when a transport name is neither `udp` nor `tcp`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown transport `{0}`; expected `udp` or `tcp`")]
pub struct UnknownTransport(pub String);

impl FromStr for TransportKind {
    type Err = UnknownTransport;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "udp" => Ok(Self::Udp),
            "tcp" => Ok(Self::Tcp),
            _ => Err(UnknownTransport(value.to_owned())),
        }
    }
}

/// Enable flag, send interval and downsample factor for one sensor stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// Whether the stream is published at all.
    pub enabled: bool,
    /// Publish on every `send_every`-th tick.
    pub send_every: u32,
    /// Keep every `downsample`-th row and column.
    pub downsample: usize,
}

impl StreamConfig {
    /// Build a stream configuration, raising zero intervals and factors to
    /// one.
    #[must_use]
    pub fn new(enabled: bool, send_every: u32, downsample: usize) -> Self {
        Self {
            enabled,
            send_every,
            downsample,
        }
        .normalized()
    }

    /// A stream that never publishes.
    #[must_use]
    pub fn disabled() -> Self { Self::new(false, 1, 1) }

    /// Clamp the interval and factor to at least one.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.send_every = self.send_every.max(1);
        self.downsample = self.downsample.max(1);
        self
    }
}

/// Complete configuration for one link endpoint.
///
/// # Examples
///
/// ```
/// use sensorlink::config::{LinkConfig, TransportKind};
///
/// let config = LinkConfig::default();
/// assert_eq!(config.transport, TransportKind::Udp);
/// assert_eq!(config.peer_port, 5600);
/// assert_eq!(config.fragmentation.max_datagram_size, 1200);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LinkConfig {
    /// Transport carrying the data channel.
    pub transport: TransportKind,
    /// Host of the consumer the publisher sends to.
    pub peer_host: String,
    /// Data port on the consumer.
    pub peer_port: u16,
    /// Host a consumer binds its data socket to.
    pub listen_host: String,
    /// Local UDP port of the command and heartbeat link.
    pub command_port: u16,
    /// Telemetry stream settings; the downsample factor is unused.
    pub telemetry: StreamConfig,
    /// Depth stream settings.
    pub depth: StreamConfig,
    /// Colour stream settings.
    pub color: StreamConfig,
    /// Datagram splitting policy for UDP.
    pub fragmentation: FragmentationConfig,
    /// Reassembly bounds for UDP.
    pub reassembly: ReassemblyConfig,
    /// Largest TCP frame accepted or sent.
    pub max_frame_length: usize,
    /// TCP connection establishment policy.
    pub retry: RetryPolicy,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Udp,
            peer_host: DEFAULT_PEER_HOST.to_owned(),
            peer_port: DEFAULT_PEER_PORT,
            listen_host: DEFAULT_LISTEN_HOST.to_owned(),
            command_port: DEFAULT_COMMAND_PORT,
            telemetry: StreamConfig::new(true, 1, 1),
            depth: StreamConfig::new(true, 3, 2),
            color: StreamConfig::new(false, 6, 2),
            fragmentation: FragmentationConfig::default(),
            reassembly: ReassemblyConfig::default(),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            retry: RetryPolicy::default(),
        }
    }
}

impl LinkConfig {
    /// Clamp values that would otherwise stall or break the link.
    ///
    /// Datagram ceilings below 512 bytes are raised to 512, stream intervals
    /// and factors to one, and the retry policy is normalised.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.fragmentation.max_datagram_size =
            self.fragmentation.max_datagram_size.max(MIN_DATAGRAM_SIZE);
        self.telemetry = self.telemetry.normalized();
        self.depth = self.depth.normalized();
        self.color = self.color.normalized();
        self.retry = self.retry.normalized();
        self
    }

    /// Shorthand for the idle window applied to partial UDP messages.
    #[must_use]
    pub const fn reassembly_timeout(&self) -> Duration { self.reassembly.idle_timeout }
}
