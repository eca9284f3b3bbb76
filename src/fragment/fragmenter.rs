//! Outbound helper that splits encoded messages into chunk fragments.
//!
//! [`Fragmenter`] owns the sender's message-id counter, so each channel
//! keeps its own sequence and tests can start from a known id. Fragment
//! payloads are zero-copy slices of the encoded message.

use std::num::NonZeroUsize;

use bincode::error::EncodeError;
use bytes::{Bytes, BytesMut};

use super::{
    ChunkHeader,
    FragmentIndex,
    FragmentationConfig,
    FragmentationError,
    MessageId,
    payload::{CHUNK_HEADER_LEN, encode_chunk},
};

/// Identifier handed out for the first message a fragmenter splits.
pub const FIRST_MESSAGE_ID: MessageId = MessageId::new(1);

/// Splits payloads into [`FragmentBatch`]es of bounded size.
#[derive(Debug)]
pub struct Fragmenter {
    payload_cap: NonZeroUsize,
    next_message_id: MessageId,
}

impl Fragmenter {
    /// Create a fragmenter carrying at most `payload_cap` bytes per fragment.
    #[must_use]
    pub const fn new(payload_cap: NonZeroUsize) -> Self {
        Self {
            payload_cap,
            next_message_id: FIRST_MESSAGE_ID,
        }
    }

    /// Create a fragmenter sized from a [`FragmentationConfig`].
    #[must_use]
    pub fn from_config(config: &FragmentationConfig) -> Self {
        Self::new(config.fragment_payload_cap())
    }

    /// Start numbering messages at `message_id`.
    #[must_use]
    pub const fn with_first_id(mut self, message_id: MessageId) -> Self {
        self.next_message_id = message_id;
        self
    }

    /// Maximum payload bytes per fragment.
    #[must_use]
    pub const fn payload_cap(&self) -> NonZeroUsize { self.payload_cap }

    /// Identifier the next call to [`Fragmenter::fragment`] will use.
    #[must_use]
    pub const fn peek_message_id(&self) -> MessageId { self.next_message_id }

    /// Split `payload` under a fresh message id.
    ///
    /// The id is consumed only when splitting succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError`] when the payload cannot be described by
    /// a chunk header.
    pub fn fragment(&mut self, payload: &Bytes) -> Result<FragmentBatch, FragmentationError> {
        let batch = self.fragment_with_id(self.next_message_id, payload)?;
        self.next_message_id = self.next_message_id.next();
        Ok(batch)
    }

    /// Split `payload`, tagging every fragment with `message_id`.
    ///
    /// An empty payload yields a single empty fragment.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::TooLarge`] when the payload length does
    /// not fit in `u32`, or [`FragmentationError::CountOverflow`] when more
    /// than `u16::MAX` fragments would be needed.
    pub fn fragment_with_id(
        &self,
        message_id: MessageId,
        payload: &Bytes,
    ) -> Result<FragmentBatch, FragmentationError> {
        let len = payload.len();
        let total_len = u32::try_from(len).map_err(|_| FragmentationError::TooLarge(len))?;
        let cap = self.payload_cap.get();
        let needed = len.div_ceil(cap).max(1);
        let count = u16::try_from(needed)
            .map_err(|_| FragmentationError::CountOverflow { len, needed })?;

        let mut fragments = Vec::with_capacity(needed);
        for (index, start) in FragmentIndex::series(count).zip((0..len.max(1)).step_by(cap)) {
            let end = (start + cap).min(len);
            let header = ChunkHeader::new(message_id, total_len, index, count);
            fragments.push(FragmentFrame::new(header, payload.slice(start..end)));
        }
        Ok(FragmentBatch::new(message_id, fragments))
    }
}

/// Metadata and payload for a single outbound fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentFrame {
    header: ChunkHeader,
    payload: Bytes,
}

impl FragmentFrame {
    /// Construct a new fragment frame.
    #[must_use]
    pub const fn new(header: ChunkHeader, payload: Bytes) -> Self { Self { header, payload } }

    /// Return the fragment header.
    #[must_use]
    pub const fn header(&self) -> &ChunkHeader { &self.header }

    /// Return the fragment payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Size of the datagram this fragment encodes to.
    #[must_use]
    pub fn datagram_len(&self) -> usize { CHUNK_HEADER_LEN + self.payload.len() }

    /// Encode the fragment as a `CHNK` datagram.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the header cannot be encoded.
    pub fn to_datagram(&self) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::with_capacity(self.datagram_len());
        encode_chunk(&self.header, &self.payload, &mut buf)?;
        Ok(buf.freeze())
    }

    /// Consume the frame, returning its components.
    #[must_use]
    pub fn into_parts(self) -> (ChunkHeader, Bytes) { (self.header, self.payload) }
}

/// Fragments produced for a single logical message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentBatch {
    message_id: MessageId,
    fragments: Vec<FragmentFrame>,
}

impl FragmentBatch {
    fn new(message_id: MessageId, fragments: Vec<FragmentFrame>) -> Self {
        debug_assert!(!fragments.is_empty(), "fragment batches must not be empty");
        Self {
            message_id,
            fragments,
        }
    }

    /// Return the [`MessageId`] shared by all fragments.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.message_id }

    /// Return the fragments in index order.
    #[must_use]
    pub fn fragments(&self) -> &[FragmentFrame] { self.fragments.as_slice() }

    /// Number of fragments in the batch.
    #[expect(
        clippy::len_without_is_empty,
        reason = "batches are guaranteed non-empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.fragments.len() }

    /// Whether the message required more than one fragment.
    #[must_use]
    pub fn is_fragmented(&self) -> bool { self.fragments.len() > 1 }
}

impl IntoIterator for FragmentBatch {
    type Item = FragmentFrame;
    type IntoIter = std::vec::IntoIter<FragmentFrame>;

    fn into_iter(self) -> Self::IntoIter { self.fragments.into_iter() }
}

impl<'a> IntoIterator for &'a FragmentBatch {
    type Item = &'a FragmentFrame;
    type IntoIter = std::slice::Iter<'a, FragmentFrame>;

    fn into_iter(self) -> Self::IntoIter { self.fragments.iter() }
}
