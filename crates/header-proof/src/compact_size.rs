//! Compact-size ("varint") length prefixes.
//!
//! Only the 1-byte and `0xfd` + u16 forms are decoded. Equihash solutions
//! never need more, and the `0xfe`/`0xff` forms are rejected rather than
//! guessed at.

use crate::error::{Error, Result};

/// Marker for a 2-byte little-endian length.
pub const MARKER_U16: u8 = 0xfd;
/// Marker for a 4-byte little-endian length.
pub const MARKER_U32: u8 = 0xfe;
/// Marker for an 8-byte little-endian length.
pub const MARKER_U64: u8 = 0xff;

/// A compact-size prefixed field borrowed from a larger buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarBytes<'a> {
    /// The payload, without its prefix.
    pub data: &'a [u8],
    /// The prefix and payload exactly as they appear in the buffer.
    pub raw: &'a [u8],
}

impl<'a> VarBytes<'a> {
    /// Total bytes consumed from the buffer (prefix + payload).
    pub fn consumed(&self) -> usize {
        self.raw.len()
    }

    /// Length of the prefix alone.
    pub fn prefix_len(&self) -> usize {
        self.raw.len() - self.data.len()
    }
}

/// Decode a compact-size prefixed byte array starting at `offset`.
///
/// Returns the payload together with the verbatim prefixed bytes, so callers
/// hashing the field can reproduce the original prefix encoding.
pub fn decode_var_bytes(buffer: &[u8], offset: usize) -> Result<VarBytes<'_>> {
    let marker = *buffer.get(offset).ok_or(Error::OutOfBounds {
        offset,
        needed: 1,
        len: buffer.len(),
    })?;

    let (prefix_len, data_len) = match marker {
        MARKER_U16 => {
            let len_bytes = buffer
                .get(offset + 1..offset + 3)
                .ok_or(Error::OutOfBounds {
                    offset,
                    needed: 3,
                    len: buffer.len(),
                })?;
            (3, u16::from_le_bytes([len_bytes[0], len_bytes[1]]) as usize)
        }
        MARKER_U32 | MARKER_U64 => {
            return Err(Error::UnsupportedFormat { marker, offset });
        }
        len => (1, len as usize),
    };

    let end = offset + prefix_len + data_len;
    if end > buffer.len() {
        return Err(Error::OutOfBounds {
            offset,
            needed: prefix_len + data_len,
            len: buffer.len(),
        });
    }

    Ok(VarBytes {
        data: &buffer[offset + prefix_len..end],
        raw: &buffer[offset..end],
    })
}

/// Encode a compact-size length prefix.
pub fn encode_compact_size(value: u64, output: &mut Vec<u8>) {
    if value < MARKER_U16 as u64 {
        output.push(value as u8);
    } else if value <= 0xffff {
        output.push(MARKER_U16);
        output.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        output.push(MARKER_U32);
        output.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        output.push(MARKER_U64);
        output.extend_from_slice(&value.to_le_bytes());
    }
}
