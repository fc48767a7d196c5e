//! Traits for chunk types and operations

use bytes::Bytes;

use crate::SwarmAddress;
use crate::chunk::error::ChunkError;
use crate::error::Result;

/// Type alias for chunk addresses
pub type ChunkAddress = SwarmAddress;

/// Core trait for all chunk types in the system.
pub trait Chunk: Send + Sync + 'static {
    /// Get the address of this chunk
    fn address(&self) -> &ChunkAddress;

    /// Get the payload carried by this chunk, without span
    fn data(&self) -> &Bytes;

    /// Get the wire encoding handed to a store
    fn to_bytes(&self) -> Bytes;

    /// Get the total size of this chunk on the wire
    fn size(&self) -> usize;

    /// Verify that this chunk matches an expected address
    fn verify(&self, expected: &ChunkAddress) -> Result<()> {
        let actual = self.address();
        if actual != expected {
            return Err(ChunkError::verification_failed(*expected, *actual).into());
        }
        Ok(())
    }
}

/// Trait for chunks that contain a BMT body
pub trait BmtChunk: Chunk {
    /// Get the span of the chunk data
    fn span(&self) -> u64;
}
