//! Error types emitted by the fragmentation layer.

use std::num::NonZeroUsize;

use thiserror::Error;

use super::{FragmentIndex, MessageId};

/// Errors produced while fragmenting outbound messages.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The payload needs more fragments than the header can count.
    #[error("payload of {len} bytes needs {needed} fragments; at most {max} allowed", max = u16::MAX)]
    CountOverflow { len: usize, needed: usize },
    /// The payload length does not fit the header's `u32` length field.
    #[error("payload of {0} bytes exceeds the chunk length field")]
    TooLarge(usize),
}

/// Errors produced while reassembling inbound fragments.
///
/// A rejected fragment never disturbs entries for other message ids.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The header announced zero fragments.
    #[error("message {message_id} announced zero fragments")]
    EmptySeries { message_id: MessageId },
    /// The fragment index is not below the announced count.
    #[error("fragment {index} of message {message_id} is outside 0..{count}")]
    IndexOutOfRange {
        message_id: MessageId,
        index: FragmentIndex,
        count: u16,
    },
    /// The announced or buffered length exceeds the configured cap.
    #[error("message {message_id} needs {size} bytes; limit is {limit}")]
    MessageTooLarge {
        message_id: MessageId,
        size: usize,
        limit: NonZeroUsize,
    },
    /// The concatenated fragments disagree with the announced length.
    #[error("message {message_id} reassembled to {actual} bytes; header declared {declared}")]
    LengthMismatch {
        message_id: MessageId,
        declared: usize,
        actual: usize,
    },
    /// The fragment index was already stored and duplicates are rejected.
    #[error("duplicate fragment {index} for message {message_id}")]
    DuplicateFragment {
        message_id: MessageId,
        index: FragmentIndex,
    },
}
