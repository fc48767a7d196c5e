//! Error types for file operations.

use pollen_postage::SigningError;
use pollen_primitives::{ErrorKind, PrimitivesError, SwarmAddress};
use pollen_store::StoreError;
use thiserror::Error;

/// Result type for file operations
pub type Result<T> = std::result::Result<T, FileError>;

/// Errors from splitting, joining and uploading files.
#[derive(Debug, Error)]
pub enum FileError {
    /// A chunk could not be built, parsed or verified
    #[error(transparent)]
    Primitives(#[from] PrimitivesError),

    /// The chunk store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A chunk could not be stamped
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// Encrypted references need a decrypting joiner
    #[error("encrypted reference {0} is not supported")]
    EncryptedReference(SwarmAddress),

    /// An intermediate chunk payload is not a list of references
    #[error("intermediate chunk {address} has a payload of {len} bytes")]
    InvalidIntermediate {
        /// The malformed chunk
        address: SwarmAddress,
        /// Its payload length
        len: usize,
    },

    /// The joined data does not add up to the span of its chunk
    #[error("chunk {address} spans {expected} bytes, children hold {actual}")]
    SpanMismatch {
        /// The intermediate chunk
        address: SwarmAddress,
        /// Span it declares
        expected: u64,
        /// Bytes found beneath it
        actual: u64,
    },

    /// The request limit was shut down mid traversal
    #[error("request limit closed")]
    LimitClosed,
}

impl FileError {
    /// Returns the stable kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Primitives(err) => err.kind(),
            Self::Store(err) => err.kind(),
            Self::Signing(err) => err.kind(),
            Self::EncryptedReference(_)
            | Self::InvalidIntermediate { .. }
            | Self::SpanMismatch { .. } => ErrorKind::Format,
            Self::LimitClosed => ErrorKind::Io,
        }
    }
}
