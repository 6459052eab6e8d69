//! Proof-of-work decoding: compact "bits" to a 256-bit target, and target to
//! the cumulative-work value of a block.
//!
//! This only decodes numbers. It does not check a header hash against its
//! target or the target against chain rules.

use ethnum::u256;

use crate::error::{Error, Result};

/// Expand compact "bits" into a 256-bit target.
///
/// The bits format is `[exponent (1 byte)][mantissa (3 bytes)]` and
/// `target = mantissa * 256^(exponent - 3)`. The full 24-bit mantissa is
/// used; there is no sign bit.
///
/// Fails with [`Error::Range`] if the target would not fit in 256 bits.
pub fn bits_to_target(bits: u32) -> Result<u256> {
    let exponent = (bits >> 24) & 0xff;
    let mantissa = u256::from(bits & 0x00ff_ffff);

    if exponent <= 3 {
        return Ok(mantissa >> (8 * (3 - exponent)));
    }

    if mantissa == u256::ZERO {
        return Ok(u256::ZERO);
    }

    let shift = 8 * (exponent - 3);
    if shift >= 256 || mantissa.leading_zeros() < shift {
        return Err(Error::Range { width: 32 });
    }
    Ok(mantissa << shift)
}

/// Work represented by a target: `(2^256 - 1 - target) / (target + 1) + 1`.
///
/// This equals `2^256 / (target + 1)` without needing a 257-bit numerator.
/// A zero target yields zero work.
pub fn target_to_work(target: u256) -> u256 {
    if target == u256::ZERO {
        return u256::ZERO;
    }

    match target.checked_add(u256::ONE) {
        Some(divisor) => (u256::MAX - target) / divisor + u256::ONE,
        // target == 2^256 - 1: numerator is zero
        None => u256::ONE,
    }
}

/// Work for a compact bits value.
///
/// A target wider than 256 bits exceeds `2^256 - 1`, so the work formula
/// evaluates to zero there rather than failing.
pub fn bits_to_work(bits: u32) -> u256 {
    match bits_to_target(bits) {
        Ok(target) => target_to_work(target),
        Err(_) => u256::ZERO,
    }
}

/// Render a 256-bit value as a decimal string.
pub fn to_decimal_string(value: u256) -> String {
    value.to_string()
}
