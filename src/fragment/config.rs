//! Configuration used by datagram fragmentation and reassembly.

use std::{num::NonZeroUsize, time::Duration};

use super::CHUNK_HEADER_LEN;

/// Smallest datagram ceiling accepted from configuration.
pub const MIN_DATAGRAM_SIZE: usize = 512;

/// Datagram ceiling used when none is configured.
pub const DEFAULT_DATAGRAM_SIZE: usize = 1200;

/// Idle window after which a partial message is discarded.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest reassembled message accepted by default (16 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Settings that decide when and how outbound messages are split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentationConfig {
    /// Ceiling on a single datagram. This is a configured budget, not the
    /// path MTU.
    pub max_datagram_size: usize,
    /// Bytes reserved ahead of each fragment's payload.
    pub header_allowance: usize,
    /// Whether oversize messages are split at all.
    pub enabled: bool,
}

impl Default for FragmentationConfig {
    fn default() -> Self {
        Self {
            max_datagram_size: DEFAULT_DATAGRAM_SIZE,
            header_allowance: CHUNK_HEADER_LEN,
            enabled: true,
        }
    }
}

impl FragmentationConfig {
    /// Fragment datagrams up to `max_datagram_size` bytes.
    #[must_use]
    pub fn new(max_datagram_size: usize) -> Self {
        Self {
            max_datagram_size,
            ..Self::default()
        }
    }

    /// Reserve `header_allowance` bytes per fragment instead of the chunk
    /// header length.
    ///
    /// Values smaller than [`CHUNK_HEADER_LEN`] are raised to it so a
    /// fragment never outgrows the ceiling.
    #[must_use]
    pub fn with_header_allowance(mut self, header_allowance: usize) -> Self {
        self.header_allowance = header_allowance.max(CHUNK_HEADER_LEN);
        self
    }

    /// Enable or disable splitting.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Maximum payload bytes carried by a single fragment; never zero.
    #[must_use]
    pub fn fragment_payload_cap(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_datagram_size.saturating_sub(self.header_allowance))
            .unwrap_or(NonZeroUsize::MIN)
    }

    /// Whether an encoded message of `encoded_len` bytes must be split.
    #[must_use]
    pub fn needs_fragmentation(&self, encoded_len: usize) -> bool {
        self.enabled && encoded_len > self.max_datagram_size
    }
}

/// Behaviour when a fragment index arrives twice for the same message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Replace the stored bytes; the last writer wins.
    #[default]
    Overwrite,
    /// Refuse the fragment with
    /// [`ReassemblyError::DuplicateFragment`](super::ReassemblyError::DuplicateFragment).
    Reject,
}

/// Bounds on inbound reassembly state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Time without a new fragment after which a partial message is evicted.
    pub idle_timeout: Duration,
    /// Hard cap on the declared length of a reassembled message.
    pub max_message_size: NonZeroUsize,
    /// Handling of repeated fragment indices.
    pub duplicates: DuplicatePolicy,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_message_size: NonZeroUsize::new(DEFAULT_MAX_MESSAGE_SIZE)
                .unwrap_or(NonZeroUsize::MAX),
            duplicates: DuplicatePolicy::Overwrite,
        }
    }
}
