//! Encoding helpers for `CHNK` datagrams.
//!
//! A chunk datagram is the literal `CHNK` tag, the fixed-width
//! [`ChunkHeader`] and finally the raw fragment bytes. Header fields are
//! little-endian with no variable-length integer encoding so the header is
//! always [`CHUNK_HEADER_LEN`] bytes on the wire.

use bincode::{
    config::{self, Configuration, Fixint, LittleEndian, NoLimit},
    decode_from_slice,
    encode_into_slice,
    error::{DecodeError, EncodeError},
};
use bytes::{BufMut, BytesMut};

use super::ChunkHeader;

/// Magic prefix that marks a chunk datagram.
pub const CHUNK_MAGIC: &[u8; 4] = b"CHNK";

/// Bytes occupied by the tag and header ahead of each fragment's payload.
pub const CHUNK_HEADER_LEN: usize = CHUNK_MAGIC.len() + 4 + 4 + 2 + 2;

const HEADER_BODY_LEN: usize = CHUNK_HEADER_LEN - CHUNK_MAGIC.len();

type WireConfig = Configuration<LittleEndian, Fixint, NoLimit>;

const fn wire_config() -> WireConfig {
    config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}

/// Report whether `datagram` starts with the chunk tag.
#[must_use]
pub fn is_chunk(datagram: &[u8]) -> bool { datagram.starts_with(CHUNK_MAGIC) }

/// Append a chunk datagram for `header` and `payload` to `dst`.
///
/// # Errors
///
/// Returns a [`bincode::error::EncodeError`] if the header cannot be encoded.
pub fn encode_chunk(
    header: &ChunkHeader,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<(), EncodeError> {
    let mut header_bytes = [0_u8; HEADER_BODY_LEN];
    let written = encode_into_slice(header, &mut header_bytes, wire_config())?;
    if written != HEADER_BODY_LEN {
        return Err(EncodeError::Other("chunk header must encode to a fixed width"));
    }
    dst.reserve(CHUNK_HEADER_LEN + payload.len());
    dst.put_slice(CHUNK_MAGIC);
    dst.put_slice(&header_bytes);
    dst.put_slice(payload);
    Ok(())
}

/// Attempt to split a datagram into its chunk header and payload.
///
/// Returns `Ok(None)` when the chunk tag is absent, so callers can fall back
/// to decoding the datagram as a complete message.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the tag is present but the header is cut
/// short.
pub fn decode_chunk(datagram: &[u8]) -> Result<Option<(ChunkHeader, &[u8])>, DecodeError> {
    let Some(rest) = datagram.strip_prefix(CHUNK_MAGIC.as_slice()) else {
        return Ok(None);
    };
    if rest.len() < HEADER_BODY_LEN {
        return Err(DecodeError::UnexpectedEnd {
            additional: HEADER_BODY_LEN - rest.len(),
        });
    }
    let (header, consumed) = decode_from_slice::<ChunkHeader, _>(rest, wire_config())?;
    let payload = rest.get(consumed..).unwrap_or_default();
    Ok(Some((header, payload)))
}
