#![doc(html_root_url = "https://docs.rs/sensorlink/latest")]
//! Public API for the `sensorlink` library.
//!
//! This crate streams robot sensor data to a remote consumer over UDP or
//! TCP and carries a small command and heartbeat link back. It provides the
//! wire codec for telemetry, depth and colour messages, datagram
//! fragmentation with bounded reassembly, a uniform message channel over
//! either transport, and a tick-driven publisher tying them together.

pub mod command;
pub mod config;
pub mod fragment;
pub mod message;
pub mod metrics;
pub mod publisher;
pub mod transport;

pub use command::{Command, CommandLink, CommandSender, VelocityCommand};
pub use config::{LinkConfig, StreamConfig, TransportKind};
pub use fragment::{
    CHUNK_HEADER_LEN,
    CHUNK_MAGIC,
    ChunkHeader,
    DuplicatePolicy,
    FragmentBatch,
    FragmentFrame,
    FragmentIndex,
    FragmentationConfig,
    FragmentationError,
    Fragmenter,
    MessageId,
    ReassembledMessage,
    Reassembler,
    ReassemblyConfig,
    ReassemblyError,
    SharedReassembler,
};
pub use message::{
    ColorFrame,
    DecodeError,
    DepthFrame,
    FrameError,
    Message,
    MessageKind,
    Pose2D,
    Telemetry,
    Velocity2D,
};
pub use metrics::{
    DECODE_ERRORS,
    FRAGMENTS_SENT,
    MESSAGES_SENT,
    REASSEMBLY_EVICTIONS,
    SEND_FAILURES,
};
pub use publisher::{SensorPublisher, SensorSource, StreamSchedule, TickReport};
pub use transport::{
    Channel,
    ChannelListener,
    ConnectError,
    OpenError,
    RetryPolicy,
    TcpTransport,
    Transport,
    TransportError,
    UdpTransport,
};
