use alloy_primitives::Address;
use thiserror::Error;

use crate::SwarmAddress;
use crate::error::ErrorKind;

/// Result type for chunk operations
pub(crate) type Result<T> = std::result::Result<T, ChunkError>;

/// Errors specific to chunk operations
#[derive(Error, Debug)]
pub enum ChunkError {
    /// Chunk size is invalid
    #[error("Invalid chunk size: {message} (expected: {expected}, got: {actual})")]
    InvalidSize {
        /// What was being measured
        message: &'static str,
        /// The size limit or exact size required
        expected: usize,
        /// The size encountered
        actual: usize,
    },

    /// Chunk format is invalid
    #[error("Invalid chunk format: {0}")]
    InvalidFormat(String),

    /// Chunk address verification failed
    #[error("Chunk address verification failed: expected {expected}, got {actual}")]
    VerificationFailed {
        /// Address the caller asked for
        expected: SwarmAddress,
        /// Address derived from the chunk contents
        actual: SwarmAddress,
    },

    /// The recovered signer is not the expected owner
    #[error("Chunk owner mismatch: expected {expected}, got {actual}")]
    OwnerMismatch {
        /// Owner the caller trusts
        expected: Address,
        /// Owner recovered from the signature
        actual: Address,
    },

    /// Signature errors from the crypto library
    #[error("Signature error: {0}")]
    Signature(#[from] alloy_primitives::SignatureError),

    /// Signer errors
    #[error("Signer error: {0}")]
    Signer(#[from] alloy_signer::Error),
}

impl ChunkError {
    pub(crate) const fn invalid_size(message: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidSize {
            message,
            expected,
            actual,
        }
    }

    pub(crate) fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Self::InvalidFormat(msg.into())
    }

    pub(crate) const fn verification_failed(expected: SwarmAddress, actual: SwarmAddress) -> Self {
        Self::VerificationFailed { expected, actual }
    }

    /// Returns the stable kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSize { .. } | Self::InvalidFormat(_) => ErrorKind::Format,
            Self::VerificationFailed { .. } | Self::OwnerMismatch { .. } | Self::Signature(_) => {
                ErrorKind::Verification
            }
            Self::Signer(_) => ErrorKind::Io,
        }
    }
}
