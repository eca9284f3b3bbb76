//! `sensorlink` binary: publish, receive, drive and probe a sensor link.

mod cli;
mod synthetic;

use std::{io, process::ExitCode, time::Duration};

use clap::Parser;
use log::{error, info, warn};
use sensorlink::{
    Channel,
    CommandSender,
    FragmentationConfig,
    LinkConfig,
    Message,
    OpenError,
    SensorPublisher,
    StreamConfig,
    TransportError,
    TransportKind,
    VelocityCommand,
};
use thiserror::Error;
use tokio::{
    net::lookup_host,
    signal,
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

use crate::{
    cli::{Cli, Commands, DriveArgs, LinkArgs, PingArgs, PublishArgs, ReceiveArgs, TransportArg},
    synthetic::SyntheticSource,
};

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Open(#[from] OpenError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("command link: {0}")]
    Io(#[from] io::Error),
    #[error("could not resolve {0}")]
    Unresolved(String),
    #[error("no pong within {0:?}")]
    NoPong(Duration),
    #[cfg(feature = "metrics")]
    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

fn link_config(args: &LinkArgs) -> LinkConfig {
    LinkConfig {
        transport: match args.proto {
            TransportArg::Udp => TransportKind::Udp,
            TransportArg::Tcp => TransportKind::Tcp,
        },
        peer_host: args.host.clone(),
        peer_port: args.port,
        listen_host: args.listen_host.clone(),
        command_port: args.cmd_port,
        telemetry: StreamConfig::new(args.telemetry_enable, args.telemetry_send_every, 1),
        depth: StreamConfig::new(args.depth_enable, args.depth_send_every, args.depth_downsample),
        color: StreamConfig::new(args.rgb_enable, args.rgb_send_every, args.rgb_downsample),
        fragmentation: FragmentationConfig::new(args.max_dgram).with_enabled(args.chunking),
        ..LinkConfig::default()
    }
    .normalized()
}

#[cfg(feature = "metrics")]
fn install_metrics(addr: std::net::SocketAddr) -> Result<(), RunError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!("serving metrics on {addr}");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics(addr: std::net::SocketAddr) -> Result<(), RunError> {
    warn!("metrics support not compiled in; ignoring --metrics-addr {addr}");
    Ok(())
}

async fn command_target(host: &str, port: u16) -> Result<std::net::SocketAddr, RunError> {
    lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| RunError::Unresolved(format!("{host}:{port}")))
}

async fn publish(
    config: &LinkConfig,
    args: &PublishArgs,
    shutdown: &CancellationToken,
) -> Result<(), RunError> {
    info!(
        "publishing over {} to {}:{}; commands on udp port {}",
        config.transport, config.peer_host, config.peer_port, config.command_port
    );
    let mut publisher = SensorPublisher::open(config, shutdown).await?;
    let mut source = SyntheticSource::default();
    publisher
        .run(&mut source, Duration::from_millis(args.period_ms.max(1)), shutdown)
        .await;
    Ok(())
}

fn describe(message: &Message) -> String {
    match message {
        Message::Telemetry(telemetry) => format!(
            "telemetry pose=({:.2}, {:.2}, {:.2}) ranges={}",
            telemetry.pose.x,
            telemetry.pose.y,
            telemetry.pose.heading,
            telemetry.ranges.len()
        ),
        Message::Depth(frame) => format!(
            "depth {}x{} ds={} range=[{:.2}, {:.2}]",
            frame.width(),
            frame.height(),
            frame.downsample(),
            frame.min_range(),
            frame.max_range()
        ),
        Message::Color(frame) => format!(
            "color {}x{} ds={}",
            frame.width(),
            frame.height(),
            frame.downsample()
        ),
        Message::Pong => "pong".to_owned(),
    }
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn receive(
    config: &LinkConfig,
    args: &ReceiveArgs,
    shutdown: &CancellationToken,
) -> Result<(), RunError> {
    let mut channel = Channel::listen(config).await?.accept(shutdown).await?;
    let mut received = 0_u64;
    while args.count.is_none_or(|count| received < count) {
        let next = tokio::select! {
            biased;

            () = shutdown.cancelled() => break,
            next = channel.recv() => next?,
        };
        let Some(message) = next else {
            info!("publisher closed the stream");
            break;
        };
        received += 1;
        info!("#{received} {}", describe(&message));
    }
    Ok(())
}

async fn drive(config: &LinkConfig, args: &DriveArgs) -> Result<(), RunError> {
    let target = command_target(&args.cmd_host, config.command_port).await?;
    let sender = CommandSender::bind(target).await?;
    let command = VelocityCommand::new(args.v, args.w);
    for sent in 1..=args.repeat.max(1) {
        sender.send_velocity(command).await?;
        if sent < args.repeat {
            sleep(Duration::from_millis(args.interval_ms)).await;
        }
    }
    info!("sent v={} w={} to {target}", args.v, args.w);
    Ok(())
}

async fn ping(
    config: &LinkConfig,
    args: &PingArgs,
    shutdown: &CancellationToken,
) -> Result<(), RunError> {
    let mut channel = Channel::listen(config).await?.accept(shutdown).await?;
    let target = command_target(&args.cmd_host, config.command_port).await?;
    CommandSender::bind(target).await?.send_ping().await?;
    let wait = Duration::from_millis(args.timeout_ms);
    let pong = timeout(wait, async {
        loop {
            match channel.recv().await? {
                Some(Message::Pong) => return Ok::<bool, TransportError>(true),
                Some(_) => {}
                None => return Ok(false),
            }
        }
    })
    .await;
    match pong {
        Ok(Ok(true)) => {
            info!("pong from robot at {target}");
            Ok(())
        }
        Ok(Ok(false)) | Err(_) => Err(RunError::NoPong(wait)),
        Ok(Err(err)) => Err(err.into()),
    }
}

async fn run(cli: Cli, shutdown: CancellationToken) -> Result<(), RunError> {
    if let Some(addr) = cli.metrics_addr {
        install_metrics(addr)?;
    }
    let config = link_config(&cli.link);
    match &cli.command {
        Commands::Publish(args) => publish(&config, args, &shutdown).await,
        Commands::Receive(args) => receive(&config, args, &shutdown).await,
        Commands::Drive(args) => drive(&config, args).await,
        Commands::Ping(args) => ping(&config, args, &shutdown).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_err() {
            warn!("failed to listen for ctrl-c");
            return;
        }
        trigger.cancel();
    });

    match run(cli, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
