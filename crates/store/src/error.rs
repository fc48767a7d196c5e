//! Store error types.

use pollen_primitives::{ErrorKind, SwarmAddress};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Chunk not found.
    #[error("chunk not found: {0}")]
    NotFound(SwarmAddress),

    /// The store could not be reached or failed internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the chunk.
    #[error("chunk {address} rejected: {reason}")]
    Rejected {
        /// The refused chunk.
        address: SwarmAddress,
        /// Why it was refused.
        reason: String,
    },
}

impl StoreError {
    /// Returns the stable kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Io
    }
}
