//! Error types for postage operations.

use alloy_primitives::Address;
use pollen_primitives::ErrorKind;
use thiserror::Error;

/// Errors that can occur when working with stamps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StampError {
    /// The batch bucket is full and cannot accept more chunks.
    #[error("bucket full: bucket {bucket} has reached capacity {capacity}")]
    BucketFull {
        /// The bucket that is full.
        bucket: u32,
        /// Maximum capacity of the bucket.
        capacity: u32,
    },

    /// Depth and bucket depth do not describe a usable batch.
    #[error("invalid bucket layout: depth {depth}, bucket depth {bucket_depth}")]
    InvalidLayout {
        /// The batch depth.
        depth: u8,
        /// The bucket depth.
        bucket_depth: u8,
    },

    /// A persisted counter array does not fit the batch.
    #[error("invalid issuer state: {0}")]
    InvalidState(&'static str),

    /// Invalid stamp data format.
    #[error("invalid stamp data: {0}")]
    InvalidData(&'static str),

    /// The owner recovered from the signature doesn't match the issuer.
    #[error("owner mismatch: expected {expected}, got {actual}")]
    OwnerMismatch {
        /// The expected owner address.
        expected: Address,
        /// The actual owner recovered from the signature.
        actual: Address,
    },

    /// Signature recovery failed.
    #[error("invalid signature")]
    InvalidSignature,
}

impl StampError {
    /// Returns the stable kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::BucketFull { .. } => ErrorKind::Capacity,
            Self::InvalidLayout { .. } | Self::InvalidState(_) | Self::InvalidData(_) => {
                ErrorKind::Format
            }
            Self::OwnerMismatch { .. } | Self::InvalidSignature => ErrorKind::Verification,
        }
    }
}

/// Errors that can occur when signing stamps.
#[derive(Debug, Error)]
pub enum SigningError {
    /// A stamp-related error occurred.
    #[error(transparent)]
    Stamp(#[from] StampError),

    /// Signing operation failed.
    #[error(transparent)]
    Signer(#[from] alloy_signer::Error),
}

impl SigningError {
    /// Returns the stable kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Stamp(err) => err.kind(),
            Self::Signer(_) => ErrorKind::Io,
        }
    }
}
