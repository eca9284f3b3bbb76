//! Tick-driven sensor publisher.
//!
//! Each call to [`SensorPublisher::tick`] advances the publisher's own tick
//! counter, answers at most one pending command, then encodes and sends
//! whichever streams are due. Sends never block beyond the socket write and
//! a failed send only loses that one message.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::{select, time::interval};
use tokio_util::sync::CancellationToken;

use crate::{
    command::{Command, CommandLink},
    config::{LinkConfig, StreamConfig},
    message::{ColorFrame, DepthFrame, Message, MessageKind, RangeImage, RawImage, Telemetry},
    transport::Channel,
};

/// Supplier of already-captured sensor buffers.
///
/// Each method returns `None` when the device is absent or has nothing new.
pub trait SensorSource {
    /// Latest pose, velocity and range scan.
    fn telemetry(&mut self) -> Option<Telemetry>;

    /// Latest depth image in metres.
    fn range_image(&mut self) -> Option<RangeImage<'_>>;

    /// Latest colour image.
    fn color_image(&mut self) -> Option<RawImage<'_>>;
}

/// Which streams are due on a given tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamSchedule {
    telemetry: StreamConfig,
    depth: StreamConfig,
    color: StreamConfig,
}

impl StreamSchedule {
    /// Build a schedule from per-stream settings.
    #[must_use]
    pub fn new(telemetry: StreamConfig, depth: StreamConfig, color: StreamConfig) -> Self {
        Self {
            telemetry: telemetry.normalized(),
            depth: depth.normalized(),
            color: color.normalized(),
        }
    }

    /// Build a schedule from a link configuration.
    #[must_use]
    pub fn from_config(config: &LinkConfig) -> Self {
        Self::new(config.telemetry, config.depth, config.color)
    }

    /// Settings for the stream carrying `kind`, if it is scheduled at all.
    #[must_use]
    pub const fn stream(&self, kind: MessageKind) -> Option<&StreamConfig> {
        match kind {
            MessageKind::Telemetry => Some(&self.telemetry),
            MessageKind::Depth => Some(&self.depth),
            MessageKind::Color => Some(&self.color),
            MessageKind::Pong => None,
        }
    }

    /// Whether `kind` is published on `tick`.
    ///
    /// Ticks count from one, so a stream with interval `n` first goes out on
    /// tick `n`.
    #[must_use]
    pub fn is_due(&self, kind: MessageKind, tick: u64) -> bool {
        self.stream(kind)
            .is_some_and(|stream| stream.enabled && tick % u64::from(stream.send_every) == 0)
    }
}

/// Outcome of one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at one.
    pub tick: u64,
    /// Command taken from the command link, if any.
    pub command: Option<Command>,
    /// Messages handed to the transport.
    pub sent: Vec<MessageKind>,
    /// Messages that were due but dropped.
    pub dropped: Vec<MessageKind>,
}

/// Publishes sensor messages on a [`Channel`] and answers pings.
#[derive(Debug)]
pub struct SensorPublisher {
    channel: Channel,
    commands: Option<CommandLink>,
    schedule: StreamSchedule,
    tick: u64,
}

impl SensorPublisher {
    /// Publish on `channel` following `schedule`.
    #[must_use]
    pub fn new(channel: Channel, schedule: StreamSchedule) -> Self {
        Self {
            channel,
            commands: None,
            schedule,
            tick: 0,
        }
    }

    /// Poll `link` for commands on every tick.
    #[must_use]
    pub fn with_command_link(mut self, link: CommandLink) -> Self {
        self.commands = Some(link);
        self
    }

    /// Open the channel and command link described by `config`.
    ///
    /// A command link that cannot be bound is logged and left out; the data
    /// channel still runs.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError`](crate::transport::OpenError) when the data
    /// channel cannot be opened.
    pub async fn open(
        config: &LinkConfig,
        shutdown: &CancellationToken,
    ) -> Result<Self, crate::transport::OpenError> {
        let channel = Channel::open(config, shutdown).await?;
        let publisher = Self::new(channel, StreamSchedule::from_config(config));
        match CommandLink::bind(config.command_port).await {
            Ok(link) => Ok(publisher.with_command_link(link)),
            Err(err) => {
                warn!(
                    "command link on port {} unavailable: {err}",
                    config.command_port
                );
                Ok(publisher)
            }
        }
    }

    /// Number of ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 { self.tick }

    /// Borrow the underlying channel.
    #[must_use]
    pub const fn channel(&self) -> &Channel { &self.channel }

    /// Run one control cycle against `source`.
    pub async fn tick<S: SensorSource + ?Sized>(&mut self, source: &mut S) -> TickReport {
        self.tick = self.tick.saturating_add(1);
        let tick = self.tick;
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };

        if let Some(command) = self.commands.as_mut().and_then(CommandLink::poll) {
            if command == Command::Ping {
                self.publish(Message::Pong, &mut report).await;
            }
            report.command = Some(command);
        }

        if self.schedule.is_due(MessageKind::Telemetry, tick)
            && let Some(telemetry) = source.telemetry()
        {
            self.publish(Message::Telemetry(telemetry), &mut report).await;
        }

        if self.schedule.is_due(MessageKind::Depth, tick) {
            let downsample = self.schedule.depth.downsample;
            let frame = source
                .range_image()
                .map(|image| DepthFrame::from_range_image(&image, downsample));
            self.publish_frame(MessageKind::Depth, frame, &mut report).await;
        }

        if self.schedule.is_due(MessageKind::Color, tick) {
            let downsample = self.schedule.color.downsample;
            let frame = source
                .color_image()
                .map(|image| ColorFrame::from_raw_image(&image, downsample));
            self.publish_frame(MessageKind::Color, frame, &mut report).await;
        }

        report
    }

    /// Tick every `period` until `shutdown` is cancelled.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn run<S: SensorSource + ?Sized>(
        &mut self,
        source: &mut S,
        period: Duration,
        shutdown: &CancellationToken,
    ) {
        let mut ticker = interval(period);
        info!("publishing every {period:?} over {}", self.channel.kind());
        loop {
            select! {
                biased;

                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.tick(source).await;
                    debug!("tick {}: sent {:?}", report.tick, report.sent);
                }
            }
        }
        info!("publisher stopped after {} ticks", self.tick);
    }

    async fn publish_frame<F, E>(
        &mut self,
        kind: MessageKind,
        frame: Option<Result<F, E>>,
        report: &mut TickReport,
    ) where
        F: Into<Message>,
        E: std::fmt::Display,
    {
        match frame {
            Some(Ok(frame)) => self.publish(frame.into(), report).await,
            Some(Err(err)) => {
                warn!("skipping {kind} frame: {err}");
                report.dropped.push(kind);
            }
            None => {}
        }
    }

    async fn publish(&mut self, message: Message, report: &mut TickReport) {
        let kind = message.kind();
        if self.channel.send(&message).await.is_ok() {
            report.sent.push(kind);
        } else {
            report.dropped.push(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn schedule() -> StreamSchedule {
        StreamSchedule::new(
            StreamConfig::new(true, 1, 1),
            StreamConfig::new(true, 3, 2),
            StreamConfig::new(false, 6, 2),
        )
    }

    #[rstest]
    #[case(MessageKind::Telemetry, 1, true)]
    #[case(MessageKind::Depth, 1, false)]
    #[case(MessageKind::Depth, 3, true)]
    #[case(MessageKind::Depth, 6, true)]
    #[case(MessageKind::Color, 6, false)]
    #[case(MessageKind::Pong, 6, false)]
    fn streams_fire_on_their_interval(
        #[case] kind: MessageKind,
        #[case] tick: u64,
        #[case] expected: bool,
    ) {
        assert_eq!(schedule().is_due(kind, tick), expected);
    }

    #[test]
    fn zero_interval_publishes_every_tick() {
        let schedule = StreamSchedule::new(
            StreamConfig {
                enabled: true,
                send_every: 0,
                downsample: 0,
            },
            StreamConfig::disabled(),
            StreamConfig::disabled(),
        );
        assert!((1..=4).all(|tick| schedule.is_due(MessageKind::Telemetry, tick)));
        let telemetry = schedule.stream(MessageKind::Telemetry).expect("scheduled");
        assert_eq!(telemetry.downsample, 1);
    }
}
