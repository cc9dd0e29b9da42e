//! Codec error types.

use thiserror::Error;

/// Errors from whole-buffer seal/unseal helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The bytes do not start with a sealed envelope
    #[error("not a sealed module (missing or foreign header)")]
    NotSealed,

    /// The envelope's size field disagrees with the actual payload length
    #[error("sealed payload length mismatch: header declares {declared} bytes, found {actual}")]
    LengthMismatch { declared: u64, actual: u64 },

    /// Payload does not fit the 32-bit size field
    #[error("payload of {0} bytes exceeds the envelope size field")]
    PayloadTooLarge(u64),

    /// Protection is disabled, so nothing can be sealed or unsealed
    #[error("protection is disabled")]
    ProtectionDisabled,
}
