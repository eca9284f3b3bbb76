use bincode::{Decode, Encode};

use super::{FragmentIndex, MessageId};

/// Reassembly header carried by every `CHNK` datagram.
///
/// The header records which logical message the fragment belongs to, the
/// length of the reassembled message, and the fragment's position among
/// `count` fragments. Fragments are not required to share a length; the last
/// one is usually shorter.
///
/// # Examples
///
/// ```
/// use sensorlink::fragment::{ChunkHeader, FragmentIndex, MessageId};
/// let header = ChunkHeader::new(MessageId::new(7), 3000, FragmentIndex::FIRST, 3);
/// assert_eq!(header.message_id().get(), 7);
/// assert_eq!(header.total_len(), 3000);
/// assert_eq!(header.count(), 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
pub struct ChunkHeader {
    message_id: MessageId,
    total_len: u32,
    index: FragmentIndex,
    count: u16,
}

impl ChunkHeader {
    /// Create a new chunk header.
    #[must_use]
    pub const fn new(message_id: MessageId, total_len: u32, index: FragmentIndex, count: u16) -> Self {
        Self {
            message_id,
            total_len,
            index,
            count,
        }
    }

    /// Return the logical message identifier.
    #[must_use]
    pub const fn message_id(&self) -> MessageId { self.message_id }

    /// Return the byte length of the reassembled message.
    #[must_use]
    pub const fn total_len(&self) -> u32 { self.total_len }

    /// Return the fragment position relative to the message.
    #[must_use]
    pub const fn index(&self) -> FragmentIndex { self.index }

    /// Return the number of fragments making up the message.
    #[must_use]
    pub const fn count(&self) -> u16 { self.count }

    /// Report whether this is the final fragment by position.
    #[must_use]
    pub const fn is_last_fragment(&self) -> bool { self.index.is_last_of(self.count) }
}
