//! Chunk store interface for pollen.
//!
//! The core crates never talk to the network themselves. Everything that
//! persists or fetches chunks goes through a [`ChunkStore`], which a transport
//! implements on top of a Bee node API (or anything else that speaks the chunk
//! wire format). [`MemoryStore`] is the reference implementation used in tests.
//!
//! Every call carries an opaque per-request `Options` value. Timeouts,
//! cancellation and request headers belong in there; the core only threads it
//! through.

mod error;
mod memory;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;

use bytes::Bytes;
use pollen_postage::Stamp;
use pollen_primitives::{Chunk, SwarmAddress};

/// A chunk on its way to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedChunk {
    /// Address the chunk is stored under.
    pub address: SwarmAddress,
    /// Wire bytes: `span || payload`, or the full envelope for single-owner chunks.
    pub data: Bytes,
    /// Postage stamp paying for the chunk.
    pub stamp: Option<Stamp>,
}

impl StampedChunk {
    /// An unstamped chunk.
    pub const fn new(address: SwarmAddress, data: Bytes) -> Self {
        Self {
            address,
            data,
            stamp: None,
        }
    }

    /// Wire form and address of any chunk.
    pub fn from_chunk(chunk: &impl Chunk) -> Self {
        Self::new(*chunk.address(), chunk.to_bytes())
    }

    /// Attaches a stamp.
    #[must_use]
    pub fn with_stamp(mut self, stamp: Stamp) -> Self {
        self.stamp = Some(stamp);
        self
    }
}

/// What a store reports back after accepting a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PutReceipt {
    /// Access control history reference, when the store keeps one.
    pub history_address: Option<SwarmAddress>,
}

/// Persistence and retrieval of chunks.
///
/// Both operations are idempotent: chunks are content or owner addressed, so
/// retrying a failed call is always safe. Implementations must tolerate
/// concurrent calls and may complete them in any order.
#[async_trait::async_trait]
pub trait ChunkStore: Send + Sync {
    /// Per-request options, such as a deadline or cancellation token.
    type Options: Send + Sync;

    /// Store a chunk.
    async fn put(&self, chunk: StampedChunk, options: &Self::Options) -> Result<PutReceipt>;

    /// Fetch the wire bytes of a chunk.
    ///
    /// Returns [`StoreError::NotFound`] when the store has no such chunk.
    async fn get(&self, address: &SwarmAddress, options: &Self::Options) -> Result<Bytes>;
}
