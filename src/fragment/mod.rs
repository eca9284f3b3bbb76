//! Datagram fragmentation and reassembly.
//!
//! Messages whose encoding exceeds the configured datagram ceiling are split
//! into `CHNK` fragments by a [`Fragmenter`] and stitched back together by a
//! [`Reassembler`]. Both halves work on bytes only and stay independent of
//! the socket that carries them.

pub mod config;
pub mod error;
pub mod fragmenter;
pub mod header;
pub mod id;
pub mod index;
pub mod payload;
pub mod reassembler;

pub use config::{
    DEFAULT_DATAGRAM_SIZE,
    DEFAULT_IDLE_TIMEOUT,
    DEFAULT_MAX_MESSAGE_SIZE,
    DuplicatePolicy,
    FragmentationConfig,
    MIN_DATAGRAM_SIZE,
    ReassemblyConfig,
};
pub use error::{FragmentationError, ReassemblyError};
pub use fragmenter::{FIRST_MESSAGE_ID, FragmentBatch, FragmentFrame, Fragmenter};
pub use header::ChunkHeader;
pub use id::MessageId;
pub use index::FragmentIndex;
pub use payload::{CHUNK_HEADER_LEN, CHUNK_MAGIC, decode_chunk, encode_chunk, is_chunk};
pub use reassembler::{ReassembledMessage, Reassembler, SharedReassembler};
