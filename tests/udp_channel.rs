//! Loopback tests for the UDP channel.

mod common;

use std::{net::SocketAddr, time::Duration};

use bytes::{Bytes, BytesMut};
use common::{IO_TIMEOUT, large_color_frame, recv_message};
use rstest::rstest;
use sensorlink::{
    CHUNK_HEADER_LEN,
    ChunkHeader,
    FragmentationConfig,
    LinkConfig,
    MessageId,
    TransportKind,
    fragment::encode_chunk,
    message::{Message, Pose2D, Telemetry, Velocity2D},
};
use sensorlink_testing::{loopback_config, udp_link};
use tokio::{net::UdpSocket, time::timeout};

fn udp_config() -> LinkConfig { loopback_config(TransportKind::Udp) }

async fn raw_sender() -> UdpSocket {
    UdpSocket::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind raw sender")
}

#[tokio::test]
async fn telemetry_arrives_intact() {
    let (mut publisher, mut consumer) = udp_link(&udp_config()).await.expect("udp link");
    let message = Message::Telemetry(Telemetry::new(
        Pose2D {
            x: 1.0,
            y: 2.0,
            heading: 0.5,
        },
        Velocity2D::default(),
        vec![0.25; 360],
    ));

    publisher.send(&message).await.expect("send");

    assert_eq!(recv_message(&mut consumer).await, message);
}

#[rstest]
#[case::fragmented(FragmentationConfig::new(512))]
#[case::unfragmented(FragmentationConfig::new(512).with_enabled(false))]
#[tokio::test]
async fn oversized_color_frame_round_trips(#[case] fragmentation: FragmentationConfig) {
    let config = LinkConfig {
        fragmentation,
        ..udp_config()
    };
    let (mut publisher, mut consumer) = udp_link(&config).await.expect("udp link");
    let message = Message::Color(large_color_frame());
    assert!(message.encoded_len() > 512);

    publisher.send(&message).await.expect("send");

    assert_eq!(recv_message(&mut consumer).await, message);
}

#[tokio::test]
async fn fragments_out_of_order_reassemble() {
    let (_publisher, mut consumer) = udp_link(&udp_config()).await.expect("udp link");
    let target = consumer.local_addr().expect("consumer addr");
    let sender = raw_sender().await;
    let payload = Message::Pong.encode();
    let halves = [&payload[..2], &payload[2..]];
    let total_len = u32::try_from(payload.len()).expect("small payload");

    for index in [1_u16, 0] {
        let header = ChunkHeader::new(MessageId::new(9), total_len, index.into(), 2);
        let mut datagram = BytesMut::new();
        encode_chunk(&header, halves[usize::from(index)], &mut datagram).expect("encode");
        assert_eq!(datagram.len(), CHUNK_HEADER_LEN + 2);
        sender.send_to(&datagram, target).await.expect("send");
    }

    assert_eq!(recv_message(&mut consumer).await, Message::Pong);
}

#[tokio::test]
async fn malformed_datagrams_are_skipped() {
    let (mut publisher, mut consumer) = udp_link(&udp_config()).await.expect("udp link");
    let target = consumer.local_addr().expect("consumer addr");
    let sender = raw_sender().await;

    for garbage in [&b"XYZW1234"[..], b"CHNK\x01", b"WBTD\x02\x00"] {
        sender.send_to(garbage, target).await.expect("send garbage");
    }
    publisher.send(&Message::Pong).await.expect("send");

    assert_eq!(recv_message(&mut consumer).await, Message::Pong);
}

#[tokio::test]
async fn consumer_replies_to_last_sender() {
    let (mut publisher, mut consumer) = udp_link(&udp_config()).await.expect("udp link");
    publisher.send(&Message::Pong).await.expect("prime peer");
    assert_eq!(recv_message(&mut consumer).await, Message::Pong);

    consumer.send(&Message::Pong).await.expect("reply");

    assert_eq!(recv_message(&mut publisher).await, Message::Pong);
}

#[tokio::test]
async fn consumer_without_peer_cannot_send() {
    let (_publisher, mut consumer) = udp_link(&udp_config()).await.expect("udp link");

    let err = consumer
        .send(&Message::Pong)
        .await
        .expect_err("no peer learnt yet");

    assert!(matches!(
        err,
        sensorlink::TransportError::ConnectionUnavailable
    ));
}

#[tokio::test]
async fn pong_on_the_wire_is_four_bytes() {
    let sink = raw_sender().await;
    let config = LinkConfig {
        peer_port: sink.local_addr().expect("sink addr").port(),
        ..udp_config()
    };
    let token = tokio_util::sync::CancellationToken::new();
    let mut publisher = sensorlink::Channel::open(&config, &token)
        .await
        .expect("open");

    publisher.send(&Message::Pong).await.expect("send");

    let mut buf = [0_u8; 64];
    let (len, _) = timeout(IO_TIMEOUT, sink.recv_from(&mut buf))
        .await
        .expect("timed out")
        .expect("recv");
    assert_eq!(Bytes::copy_from_slice(&buf[..len]), Bytes::from_static(b"pong"));
}

#[tokio::test]
async fn incomplete_series_yields_nothing() {
    let (_publisher, mut consumer) = udp_link(&udp_config()).await.expect("udp link");
    let target = consumer.local_addr().expect("consumer addr");
    let sender = raw_sender().await;
    let header = ChunkHeader::new(MessageId::new(3), 8, 0_u16.into(), 2);
    let mut datagram = BytesMut::new();
    encode_chunk(&header, b"pong", &mut datagram).expect("encode");
    sender.send_to(&datagram, target).await.expect("send");

    let outcome = timeout(Duration::from_millis(200), consumer.recv()).await;

    assert!(outcome.is_err(), "half a message must not be surfaced");
}
