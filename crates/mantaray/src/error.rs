//! Error types for manifest operations.

use pollen_file::FileError;
use pollen_postage::SigningError;
use pollen_primitives::{ErrorKind, PrimitivesError};
use pollen_store::StoreError;
use thiserror::Error;

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, MantarayError>;

/// Errors from building, encoding and persisting a manifest.
#[derive(Debug, Error)]
pub enum MantarayError {
    /// The node does not start with the mantaray 0.2 version hash
    #[error("invalid mantaray version hash")]
    InvalidVersion,

    /// The node ended before a complete field
    #[error("truncated node: needed {needed} more bytes, {available} left")]
    Truncated {
        /// Bytes the field needs
        needed: usize,
        /// Bytes remaining
        available: usize,
    },

    /// References inside one node must all be 32 or all be 64 bytes
    #[error("invalid reference size: {0}")]
    InvalidReferenceSize(usize),

    /// A fork entry is inconsistent with the fork bitmap or prefix limits
    #[error("invalid fork: {0}")]
    InvalidFork(&'static str),

    /// No node terminates the path
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// Paths must have at least one byte
    #[error("empty path")]
    EmptyPath,

    /// A node on the way has not been fetched from the store yet
    #[error("node at {path:?} is not loaded")]
    NotLoaded {
        /// Path that led to the node
        path: String,
    },

    /// A child must be saved before its parent can be encoded
    #[error("fork {0:?} has no reference, save it first")]
    Unsaved(String),

    /// Metadata that cannot be encoded or interpreted
    #[error("invalid metadata: {0}")]
    Metadata(String),

    /// Metadata JSON failed to parse or serialize
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A chunk failed to parse or verify
    #[error(transparent)]
    Chunk(#[from] PrimitivesError),

    /// Splitting or joining node data failed
    #[error(transparent)]
    File(#[from] FileError),

    /// The chunk store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A chunk could not be stamped
    #[error(transparent)]
    Stamp(#[from] SigningError),
}

impl MantarayError {
    /// Returns the stable kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidVersion
            | Self::Truncated { .. }
            | Self::InvalidReferenceSize(_)
            | Self::InvalidFork(_)
            | Self::EmptyPath
            | Self::Unsaved(_)
            | Self::Metadata(_)
            | Self::Json(_) => ErrorKind::Format,
            Self::PathNotFound(_) | Self::NotLoaded { .. } => ErrorKind::Verification,
            Self::Chunk(err) => err.kind(),
            Self::File(err) => err.kind(),
            Self::Store(err) => err.kind(),
            Self::Stamp(err) => err.kind(),
        }
    }

    pub(crate) fn path_not_found(path: &[u8]) -> Self {
        Self::PathNotFound(String::from_utf8_lossy(path).into_owned())
    }

    pub(crate) fn not_loaded(path: &[u8]) -> Self {
        Self::NotLoaded {
            path: String::from_utf8_lossy(path).into_owned(),
        }
    }
}
