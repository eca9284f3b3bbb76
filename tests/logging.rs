//! Log output of the channel and publisher.

mod common;

use std::net::SocketAddr;

use common::recv_message;
use log::Level;
use rstest::rstest;
use sensorlink::{
    SensorPublisher,
    StreamConfig,
    StreamSchedule,
    TransportKind,
    message::Message,
};
use sensorlink_testing::{FixedSource, LoggerHandle, logger, loopback_config, udp_link};
use tokio::net::UdpSocket;

#[rstest]
#[tokio::test]
async fn discarded_frames_are_logged(mut logger: LoggerHandle) {
    let (mut publisher, mut consumer) = udp_link(&loopback_config(TransportKind::Udp))
        .await
        .expect("udp link");
    let target = consumer.local_addr().expect("consumer addr");
    let raw = UdpSocket::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind");

    raw.send_to(b"XYZW1234", target).await.expect("send");
    publisher.send(&Message::Pong).await.expect("send");
    assert_eq!(recv_message(&mut consumer).await, Message::Pong);

    let warnings = logger.messages_at(Level::Warn);
    assert!(
        warnings
            .iter()
            .any(|msg| msg.starts_with("discarding frame of 8 bytes")),
        "missing discard warning: {warnings:?}"
    );
}

#[rstest]
#[tokio::test]
async fn dropped_message_is_logged(mut logger: LoggerHandle) {
    let (_publisher, mut consumer) = udp_link(&loopback_config(TransportKind::Udp))
        .await
        .expect("udp link");

    consumer
        .send(&Message::Pong)
        .await
        .expect_err("no peer yet");

    let warnings = logger.messages_at(Level::Warn);
    assert!(
        warnings
            .iter()
            .any(|msg| msg.contains("dropping pong message (4 bytes) over udp")),
        "missing drop warning: {warnings:?}"
    );
}

#[rstest]
#[tokio::test]
async fn skipped_frame_is_logged(mut logger: LoggerHandle) {
    let (channel, _consumer) = udp_link(&loopback_config(TransportKind::Udp))
        .await
        .expect("udp link");
    let schedule = StreamSchedule::new(
        StreamConfig::disabled(),
        StreamConfig::new(true, 1, 1),
        StreamConfig::disabled(),
    );
    let mut publisher = SensorPublisher::new(channel, schedule);
    let mut source = FixedSource {
        depth: Some((10, 10, vec![1.0; 3])),
        ..FixedSource::default()
    };

    let report = publisher.tick(&mut source).await;

    assert!(report.sent.is_empty());
    let warnings = logger.messages_at(Level::Warn);
    assert!(
        warnings.iter().any(|msg| msg.starts_with("skipping depth frame")),
        "missing skip warning: {warnings:?}"
    );
}
