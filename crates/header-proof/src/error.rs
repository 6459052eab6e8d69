//! Error taxonomy for header and proof verification.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can stop a single verification operation.
///
/// All variants except [`Error::VerificationMismatch`] mean the check could not
/// be performed at all. A mismatch means the check ran and failed; it is only
/// produced when a caller opts in via
/// [`VerificationResult::ensure_valid`](crate::verify::VerificationResult::ensure_valid).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed hex input.
    #[error("invalid hex: {0}")]
    Format(String),

    /// Input has the wrong byte length.
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    /// Compact-size marker beyond the 2-byte length case.
    #[error("unsupported compact-size marker 0x{marker:02x} at offset {offset}")]
    UnsupportedFormat { marker: u8, offset: usize },

    /// Buffer too short for a declared field.
    #[error("field at offset {offset} needs {needed} bytes, buffer has {len}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// Integer too large for its declared width.
    #[error("value does not fit in {width} bytes")]
    Range { width: usize },

    /// Merkle leaf index outside the leaf range.
    #[error("leaf index {index} out of range for {count} leaves")]
    Index { index: usize, count: usize },

    /// A required input field is absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// Transaction id absent from the block.
    #[error("transaction {0} not found in block")]
    NotFound(String),

    /// Computed hash or root disagrees with the claimed value.
    #[error("verification mismatch: expected {expected}, computed {computed}")]
    VerificationMismatch { expected: String, computed: String },
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::Format(err.to_string())
    }
}
