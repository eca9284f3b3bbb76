//! Command line interface for the `sensorlink` binary.
//!
//! Every link setting can also come from the environment, using the
//! variable names of the robot controller deployment.

use std::net::SocketAddr;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, builder::BoolishValueParser};

/// Command line arguments for the `sensorlink` binary.
#[derive(Debug, Parser)]
#[command(
    name = "sensorlink",
    version,
    about = "Stream robot sensor data over UDP or TCP"
)]
pub struct Cli {
    /// Link settings shared by every subcommand.
    #[command(flatten)]
    pub link: LinkArgs,
    /// Serve Prometheus metrics on this address.
    #[arg(long, env = "METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
    /// Action to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Transport selected on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    /// Datagrams, fragmented when oversize.
    Udp,
    /// Length-prefixed frames on one stream.
    Tcp,
}

/// Link configuration flags.
#[derive(Debug, Args)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag mirrors one deployment switch"
)]
pub struct LinkArgs {
    /// Data transport.
    #[arg(long, env = "TELEMETRY_PROTO", value_enum, ignore_case = true, default_value = "udp")]
    pub proto: TransportArg,
    /// Consumer host the publisher sends to.
    #[arg(long, env = "TELEMETRY_HOST", default_value = "127.0.0.1")]
    pub host: String,
    /// Consumer data port.
    #[arg(long, env = "TELEMETRY_PORT", default_value_t = 5600)]
    pub port: u16,
    /// Address the consumer binds.
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub listen_host: String,
    /// UDP port of the command and heartbeat link.
    #[arg(long, env = "CMD_LISTEN_PORT", default_value_t = 5555)]
    pub cmd_port: u16,
    /// Publish telemetry.
    #[arg(long, env = "TELEMETRY_ENABLE", action = ArgAction::Set, value_parser = BoolishValueParser::new(), default_value = "1")]
    pub telemetry_enable: bool,
    /// Publish telemetry every N ticks.
    #[arg(long, env = "TELEMETRY_SEND_EVERY", default_value_t = 1)]
    pub telemetry_send_every: u32,
    /// Publish depth images.
    #[arg(long, env = "DEPTH_ENABLE", action = ArgAction::Set, value_parser = BoolishValueParser::new(), default_value = "1")]
    pub depth_enable: bool,
    /// Publish depth every N ticks.
    #[arg(long, env = "DEPTH_SEND_EVERY", default_value_t = 3)]
    pub depth_send_every: u32,
    /// Depth downsample factor.
    #[arg(long, env = "DEPTH_DOWNSAMPLE", default_value_t = 2)]
    pub depth_downsample: usize,
    /// Publish colour images.
    #[arg(long, env = "RGB_ENABLE", action = ArgAction::Set, value_parser = BoolishValueParser::new(), default_value = "0")]
    pub rgb_enable: bool,
    /// Publish colour every N ticks.
    #[arg(long, env = "RGB_SEND_EVERY", default_value_t = 6)]
    pub rgb_send_every: u32,
    /// Colour downsample factor.
    #[arg(long, env = "RGB_DOWNSAMPLE", default_value_t = 2)]
    pub rgb_downsample: usize,
    /// Split oversize UDP messages into chunks.
    #[arg(long, env = "CHUNKING", action = ArgAction::Set, value_parser = BoolishValueParser::new(), default_value = "1")]
    pub chunking: bool,
    /// Datagram ceiling in bytes; values below 512 are raised.
    #[arg(long, env = "MAX_DGRAM", default_value_t = 1200)]
    pub max_dgram: usize,
}

/// Subcommands of the `sensorlink` binary.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Publish synthetic sensor data as a robot would.
    Publish(PublishArgs),
    /// Receive and log messages as a consumer.
    Receive(ReceiveArgs),
    /// Send velocity setpoints to the robot.
    Drive(DriveArgs),
    /// Probe the robot and wait for its pong.
    Ping(PingArgs),
}

/// Options for `publish`.
#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Milliseconds per simulation tick.
    #[arg(long, default_value_t = 16)]
    pub period_ms: u64,
}

/// Options for `receive`.
#[derive(Debug, Args)]
pub struct ReceiveArgs {
    /// Stop after this many messages.
    #[arg(long)]
    pub count: Option<u64>,
}

/// Options for `drive`.
#[derive(Debug, Args)]
pub struct DriveArgs {
    /// Forward speed in metres per second.
    #[arg(long, allow_hyphen_values = true)]
    pub v: f32,
    /// Turn rate in radians per second.
    #[arg(long, allow_hyphen_values = true)]
    pub w: f32,
    /// Host running the robot's command link.
    #[arg(long, env = "CMD_HOST", default_value = "127.0.0.1")]
    pub cmd_host: String,
    /// Number of datagrams to send.
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,
    /// Milliseconds between datagrams.
    #[arg(long, default_value_t = 100)]
    pub interval_ms: u64,
}

/// Options for `ping`.
#[derive(Debug, Args)]
pub struct PingArgs {
    /// Host running the robot's command link.
    #[arg(long, env = "CMD_HOST", default_value = "127.0.0.1")]
    pub cmd_host: String,
    /// Milliseconds to wait for the pong.
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,
}
