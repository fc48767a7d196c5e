//! Error types for the pollen-primitives crate
//!
//! The crate uses a two-level error hierarchy:
//!
//! - `PrimitivesError`: The top-level error type that wraps all other errors
//! - Component-specific errors: More detailed errors from specific subsystems
//!   (like `BmtError`, `ChunkError` and `CidError`)
//!
//! Every error in the pollen workspace can be classified with an [`ErrorKind`],
//! which is the stable discriminant callers branch on:
//!
//! ```
//! use pollen_primitives::{ContentChunk, ErrorKind};
//!
//! let err = ContentChunk::new(vec![0u8; 4097]).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Format);
//! ```

use thiserror::Error;

use crate::bmt::BmtError;
use crate::chunk::ChunkError;
use crate::cid::CidError;

/// Result type for operations in the primitives crate
pub type Result<T> = std::result::Result<T, PrimitivesError>;

/// Stable classification of failures across the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed, truncated, oversized or incompatible data. Not retryable.
    Format,
    /// Out of postage capacity. Not retryable without new capacity.
    Capacity,
    /// A signature, owner or address did not check out.
    Verification,
    /// The external store or signer failed. The single operation may be retried.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Format => "format",
            Self::Capacity => "capacity",
            Self::Verification => "verification",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

/// Main error type for the primitives crate
///
/// This enum represents all the possible errors that can occur when using
/// the pollen-primitives crate. It wraps component-specific errors to
/// provide a unified error interface.
#[derive(Error, Debug)]
pub enum PrimitivesError {
    /// Errors from BMT operations
    #[error(transparent)]
    Bmt(#[from] BmtError),

    /// Errors from chunk operations
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// Errors from CID encoding and decoding
    #[error(transparent)]
    Cid(#[from] CidError),

    /// A reference had a length other than 32 or 64 bytes
    #[error("invalid reference length: {0}")]
    InvalidReferenceLength(usize),

    /// Hex decoding errors
    #[error("invalid hex: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),
}

impl PrimitivesError {
    /// Returns the stable kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Chunk(err) => err.kind(),
            Self::Bmt(_) | Self::Cid(_) | Self::InvalidReferenceLength(_) | Self::Hex(_) => {
                ErrorKind::Format
            }
        }
    }
}
