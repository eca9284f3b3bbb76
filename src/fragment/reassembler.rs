//! Inbound helper that stitches chunk fragments back into complete messages.
//!
//! [`Reassembler`] mirrors the outbound [`Fragmenter`](crate::fragment::Fragmenter)
//! by collecting fragment payloads keyed by [`MessageId`]. Fragments may
//! arrive in any order and may repeat. Partial messages that stop receiving
//! fragments are evicted after an idle window so sustained loss cannot grow
//! the table without bound. The helper owns no sockets; transports and tests
//! drive it directly.

use std::{
    collections::{BTreeMap, HashMap, hash_map::Entry},
    num::NonZeroUsize,
    sync::{Mutex, PoisonError},
    time::Instant,
};

use bytes::{Bytes, BytesMut};
use log::debug;

use super::{
    ChunkHeader,
    DuplicatePolicy,
    FragmentIndex,
    MessageId,
    ReassemblyConfig,
    ReassemblyError,
};
use crate::message::{DecodeError, Message};

#[derive(Debug)]
struct PartialMessage {
    count: u16,
    total_len: u32,
    fragments: BTreeMap<u16, Bytes>,
    buffered: usize,
    last_touch: Instant,
}

impl PartialMessage {
    fn new(header: &ChunkHeader, now: Instant) -> Self {
        Self {
            count: header.count(),
            total_len: header.total_len(),
            fragments: BTreeMap::new(),
            buffered: 0,
            last_touch: now,
        }
    }

    fn contains(&self, index: FragmentIndex) -> bool { self.fragments.contains_key(&index.get()) }

    fn store(&mut self, header: &ChunkHeader, payload: &[u8], now: Instant) {
        self.count = header.count();
        self.total_len = header.total_len();
        self.last_touch = now;
        let replaced = self
            .fragments
            .insert(header.index().get(), Bytes::copy_from_slice(payload));
        self.buffered = self.buffered + payload.len() - replaced.map_or(0, |old| old.len());
    }

    fn is_complete(&self) -> bool {
        self.fragments.len() >= usize::from(self.count)
            && (0..self.count).all(|index| self.fragments.contains_key(&index))
    }

    fn concatenate(self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.buffered);
        for (_, fragment) in self.fragments.range(..self.count) {
            buf.extend_from_slice(fragment);
        }
        buf.freeze()
    }
}

/// Container for a fully reassembled message payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReassembledMessage {
    message_id: MessageId,
    payload: Bytes,
}

impl ReassembledMessage {
    /// Construct a new [`ReassembledMessage`].
    #[must_use]
    pub const fn new(message_id: MessageId, payload: Bytes) -> Self {
        Self {
            message_id,
            payload,
        }
    }

    /// Identifier shared by the fragments that formed this message.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.message_id }

    /// Borrow the reassembled payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Consume the message, returning the payload bytes.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }

    /// Decode the payload as a wire [`Message`].
    ///
    /// # Errors
    ///
    /// Returns any [`DecodeError`] raised by [`Message::decode`].
    pub fn decode(&self) -> Result<Message, DecodeError> { Message::decode(&self.payload) }
}

/// Stateful fragment reassembler with idle-time eviction.
#[derive(Debug)]
pub struct Reassembler {
    config: ReassemblyConfig,
    buffers: HashMap<MessageId, PartialMessage>,
}

impl Default for Reassembler {
    fn default() -> Self { Self::new(ReassemblyConfig::default()) }
}

impl Reassembler {
    /// Create an empty reassembler.
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            config,
            buffers: HashMap::new(),
        }
    }

    /// Return the active configuration.
    #[must_use]
    pub const fn config(&self) -> &ReassemblyConfig { &self.config }

    /// Process a fragment using the current time.
    ///
    /// Returns `Ok(Some(_))` when the fragment completes its message and
    /// `Ok(None)` while more fragments are required.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError`] when the header is inconsistent, the
    /// message exceeds the configured cap, or a duplicate is refused.
    pub fn push(
        &mut self,
        header: ChunkHeader,
        payload: &[u8],
    ) -> Result<Option<ReassembledMessage>, ReassemblyError> {
        self.push_at(header, payload, Instant::now())
    }

    /// Process a fragment using an explicit clock reading.
    ///
    /// The fragment is stored and the entry's last-touch time refreshed
    /// before completeness is checked. Any push that does not complete a
    /// message sweeps stale entries, including one that is rejected.
    ///
    /// # Errors
    ///
    /// See [`Reassembler::push`].
    pub fn push_at(
        &mut self,
        header: ChunkHeader,
        payload: &[u8],
        now: Instant,
    ) -> Result<Option<ReassembledMessage>, ReassemblyError> {
        let outcome = self.store_at(header, payload, now);
        if !matches!(outcome, Ok(Some(_))) {
            self.purge_expired_at(now);
        }
        outcome
    }

    fn store_at(
        &mut self,
        header: ChunkHeader,
        payload: &[u8],
        now: Instant,
    ) -> Result<Option<ReassembledMessage>, ReassemblyError> {
        self.validate(&header)?;
        let message_id = header.message_id();
        let limit = self.config.max_message_size;

        let mut entry = match self.buffers.entry(message_id) {
            Entry::Occupied(occupied) => occupied,
            Entry::Vacant(vacant) => vacant.insert_entry(PartialMessage::new(&header, now)),
        };
        let partial = entry.get_mut();
        if self.config.duplicates == DuplicatePolicy::Reject && partial.contains(header.index()) {
            return Err(ReassemblyError::DuplicateFragment {
                message_id,
                index: header.index(),
            });
        }
        partial.store(&header, payload, now);
        if partial.buffered > limit.get() {
            let size = partial.buffered;
            entry.remove();
            return Err(ReassemblyError::MessageTooLarge {
                message_id,
                size,
                limit,
            });
        }

        if entry.get().is_complete() {
            let partial = entry.remove();
            let declared = partial.total_len as usize;
            let payload = partial.concatenate();
            if payload.len() != declared {
                return Err(ReassemblyError::LengthMismatch {
                    message_id,
                    declared,
                    actual: payload.len(),
                });
            }
            return Ok(Some(ReassembledMessage::new(message_id, payload)));
        }
        Ok(None)
    }

    fn validate(&self, header: &ChunkHeader) -> Result<(), ReassemblyError> {
        let message_id = header.message_id();
        if header.count() == 0 {
            return Err(ReassemblyError::EmptySeries { message_id });
        }
        if !header.index().is_within(header.count()) {
            return Err(ReassemblyError::IndexOutOfRange {
                message_id,
                index: header.index(),
                count: header.count(),
            });
        }
        let size = header.total_len() as usize;
        let limit = self.config.max_message_size;
        if size > limit.get() {
            return Err(ReassemblyError::MessageTooLarge {
                message_id,
                size,
                limit,
            });
        }
        Ok(())
    }

    /// Remove partial messages idle for longer than the configured window.
    ///
    /// Returns the identifiers of messages that were evicted.
    pub fn purge_expired(&mut self) -> Vec<MessageId> { self.purge_expired_at(Instant::now()) }

    /// Remove idle partial messages using an explicit clock reading.
    ///
    /// Returns the identifiers of messages that were evicted.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<MessageId> {
        let mut evicted = Vec::new();
        let timeout = self.config.idle_timeout;

        self.buffers.retain(|message_id, partial| {
            let expired = now.saturating_duration_since(partial.last_touch) > timeout;
            if expired {
                debug!(
                    "evicting stale message {message_id}: {} of {} fragments",
                    partial.fragments.len(),
                    partial.count
                );
                evicted.push(*message_id);
            }
            !expired
        });

        if !evicted.is_empty() {
            crate::metrics::add_reassembly_evictions(evicted.len());
        }
        evicted
    }

    /// Number of partial messages currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffers.len() }

    /// Payload bytes held across all partial messages.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize {
        self.buffers.values().map(|partial| partial.buffered).sum()
    }
}

/// A [`Reassembler`] guarded by a single mutex.
///
/// Fragments for different message ids may race when capture and network
/// I/O run on separate threads; every push takes the one lock.
#[derive(Debug, Default)]
pub struct SharedReassembler {
    inner: Mutex<Reassembler>,
}

impl SharedReassembler {
    /// Wrap a reassembler for shared use.
    #[must_use]
    pub fn new(reassembler: Reassembler) -> Self {
        Self {
            inner: Mutex::new(reassembler),
        }
    }

    /// Process a fragment under the lock.
    ///
    /// A poisoned lock is recovered.
    ///
    /// # Errors
    ///
    /// See [`Reassembler::push`].
    pub fn push(
        &self,
        header: ChunkHeader,
        payload: &[u8],
    ) -> Result<Option<ReassembledMessage>, ReassemblyError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(header, payload)
    }

    /// Number of partial messages currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .buffered_len()
    }

    /// Consume the wrapper, returning the inner reassembler.
    #[must_use]
    pub fn into_inner(self) -> Reassembler {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
