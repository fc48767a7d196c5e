use thiserror::Error;

/// Result type for BMT operations
pub type Result<T> = std::result::Result<T, BmtError>;

/// Errors specific to BMT operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BmtError {
    /// Input does not fit into a single BMT body
    #[error("invalid data length: {actual} exceeds {max}")]
    InvalidInputSize {
        /// Largest accepted payload
        max: usize,
        /// Length of the rejected payload
        actual: usize,
    },
}

impl BmtError {
    pub(crate) const fn invalid_input_size(max: usize, actual: usize) -> Self {
        Self::InvalidInputSize { max, actual }
    }
}
