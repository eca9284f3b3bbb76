//! Shared utilities for integration tests.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::time::Duration;

use sensorlink::{Channel, message::Message};
use tokio::time::timeout;

/// Upper bound on any single loopback exchange.
pub const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Receive the next message, failing the test if none arrives in time.
#[expect(
    clippy::expect_used,
    reason = "a missing or failed receive must abort the test immediately"
)]
pub async fn recv_message(channel: &mut Channel) -> Message {
    timeout(IO_TIMEOUT, channel.recv())
        .await
        .expect("receive timed out")
        .expect("receive failed")
        .expect("stream closed")
}

/// A colour frame whose encoded message needs several datagrams.
#[expect(clippy::expect_used, reason = "fixed extent always matches its pixels")]
pub fn large_color_frame() -> sensorlink::ColorFrame {
    let pixels = (0..=u8::MAX).cycle().take(40 * 30 * 4).collect();
    sensorlink::ColorFrame::new(40, 30, 1, pixels).expect("shape")
}
