//! Byte-order conversions between display and internal hash forms, plus
//! fixed-width integer encoding.
//!
//! Explorers and RPC nodes print hashes byte-reversed ("display" form). The
//! header serialization and the Merkle tree work on the raw protocol order
//! ("internal" form).

use ethnum::u256;

use crate::error::{Error, Result};

/// Number of hex characters in a 32-byte digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Byte order for fixed-width integer encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

/// Strip an optional `0x`/`0X` prefix.
pub fn strip_hex_prefix(hex_str: &str) -> &str {
    hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str)
}

/// Convert a display-form hash string to internal byte order.
///
/// Short inputs are left-padded with zeros to 64 hex characters, so `"0x"`
/// decodes to the all-zero digest.
pub fn to_internal(display_hex: &str) -> Result<[u8; 32]> {
    let digits = strip_hex_prefix(display_hex.trim());

    if digits.len() % 2 != 0 {
        return Err(Error::Format(format!(
            "odd number of hex digits ({})",
            digits.len()
        )));
    }
    if digits.len() > DIGEST_HEX_LEN {
        return Err(Error::Format(format!(
            "digest has {} hex digits, at most {} allowed",
            digits.len(),
            DIGEST_HEX_LEN
        )));
    }

    let padded = format!("{:0>width$}", digits, width = DIGEST_HEX_LEN);
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(&padded, &mut bytes)?;
    bytes.reverse();
    Ok(bytes)
}

/// Convert internal-order bytes back to the display hex string.
pub fn to_display(internal: &[u8; 32]) -> String {
    let mut reversed = *internal;
    reversed.reverse();
    hex::encode(reversed)
}

/// Read the internal bytes as eight big-endian 32-bit words.
pub fn to_digest_words(internal: &[u8]) -> Result<[u32; 8]> {
    let bytes: &[u8; 32] = internal.try_into().map_err(|_| Error::Length {
        expected: 32,
        actual: internal.len(),
    })?;
    Ok(digest_words(bytes))
}

/// Infallible form of [`to_digest_words`] for a fixed-size digest.
pub fn digest_words(internal: &[u8; 32]) -> [u32; 8] {
    let mut words = [0u32; 8];
    for (word, chunk) in words.iter_mut().zip(internal.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

/// Inverse of [`to_digest_words`].
pub fn from_digest_words(words: &[u32; 8]) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    bytes
}

/// Encode `value` into exactly `width` bytes.
///
/// Widths beyond 32 bytes are zero-extended on the high side.
pub fn fixed_width_encode(value: u256, width: usize, endianness: Endianness) -> Result<Vec<u8>> {
    let be = value.to_be_bytes();
    let significant = 32 - be.iter().take_while(|b| **b == 0).count();
    if significant > width {
        return Err(Error::Range { width });
    }

    let mut out = vec![0u8; width];
    out[width - significant..].copy_from_slice(&be[32 - significant..]);
    if endianness == Endianness::Little {
        out.reverse();
    }
    Ok(out)
}

/// Parse a hex integer such as the `bits` or `nonce` fields of an RPC header.
pub fn parse_hex_u256(hex_str: &str) -> Result<u256> {
    let digits = strip_hex_prefix(hex_str.trim());
    if digits.is_empty() {
        return Ok(u256::ZERO);
    }
    if digits.len() > DIGEST_HEX_LEN {
        return Err(Error::Range { width: 32 });
    }
    u256::from_str_radix(digits, 16).map_err(|e| Error::Format(e.to_string()))
}
