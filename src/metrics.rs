//! Metric helpers for `sensorlink`.
//!
//! This module defines metric names and simple helper functions wrapping
//! the [`metrics`](https://docs.rs/metrics) crate. With the `metrics`
//! feature disabled the helpers compile to nothing.

#[cfg(feature = "metrics")]
use metrics::counter;

use crate::message::MessageKind;

/// Name of the counter tracking messages handed to a transport.
pub const MESSAGES_SENT: &str = "sensorlink_messages_sent_total";
/// Name of the counter tracking failed sends.
pub const SEND_FAILURES: &str = "sensorlink_send_failures_total";
/// Name of the counter tracking chunk datagrams sent.
pub const FRAGMENTS_SENT: &str = "sensorlink_fragments_sent_total";
/// Name of the counter tracking partial messages discarded as stale.
pub const REASSEMBLY_EVICTIONS: &str = "sensorlink_reassembly_evictions_total";
/// Name of the counter tracking inbound frames that failed to decode.
pub const DECODE_ERRORS: &str = "sensorlink_decode_errors_total";

/// Record a message successfully handed to the transport.
pub fn inc_messages_sent(kind: MessageKind) {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_SENT, "kind" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Record a failed send.
pub fn inc_send_failures() {
    #[cfg(feature = "metrics")]
    counter!(SEND_FAILURES).increment(1);
}

/// Record `count` chunk datagrams sent.
pub fn add_fragments_sent(count: usize) {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_SENT).increment(u64::try_from(count).unwrap_or(u64::MAX));
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record `count` stale partial messages evicted.
pub fn add_reassembly_evictions(count: usize) {
    #[cfg(feature = "metrics")]
    counter!(REASSEMBLY_EVICTIONS).increment(u64::try_from(count).unwrap_or(u64::MAX));
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record an inbound frame that could not be decoded.
pub fn inc_decode_errors() {
    #[cfg(feature = "metrics")]
    counter!(DECODE_ERRORS).increment(1);
}
