//! In-memory chunk store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use parking_lot::RwLock;
use pollen_postage::Stamp;
use pollen_primitives::SwarmAddress;
use tracing::trace;

use crate::{ChunkStore, PutReceipt, Result, StampedChunk, StoreError};

#[derive(Debug, Clone)]
struct StoredChunk {
    data: Bytes,
    stamp: Option<Stamp>,
}

/// Simple in-memory chunk store.
///
/// The first put of an address wins; later puts of the same address are
/// accepted and ignored.
#[derive(Debug, Default)]
pub struct MemoryStore {
    chunks: RwLock<HashMap<SwarmAddress, StoredChunk>>,
    require_stamps: bool,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects chunks without a stamp.
    pub fn requiring_stamps() -> Self {
        Self {
            require_stamps: true,
            ..Self::default()
        }
    }

    /// Make every following call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }

    /// Whether a chunk is stored under `address`.
    pub fn contains(&self, address: &SwarmAddress) -> bool {
        self.chunks.read().contains_key(address)
    }

    /// The stamp the chunk at `address` was stored with.
    pub fn stamp(&self, address: &SwarmAddress) -> Option<Stamp> {
        self.chunks.read().get(address).and_then(|c| c.stamp.clone())
    }

    /// Drop a chunk, returning whether it was present.
    pub fn remove(&self, address: &SwarmAddress) -> bool {
        self.chunks.write().remove(address).is_some()
    }

    /// Addresses of all stored chunks, in no particular order.
    pub fn addresses(&self) -> Vec<SwarmAddress> {
        self.chunks.read().keys().copied().collect()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ChunkStore for MemoryStore {
    type Options = ();

    async fn put(&self, chunk: StampedChunk, _options: &()) -> Result<PutReceipt> {
        self.check_available()?;

        if self.require_stamps && chunk.stamp.is_none() {
            return Err(StoreError::Rejected {
                address: chunk.address,
                reason: "missing postage stamp".into(),
            });
        }

        trace!(address = %chunk.address, size = chunk.data.len(), "chunk put");
        self.chunks
            .write()
            .entry(chunk.address)
            .or_insert_with(|| StoredChunk {
                data: chunk.data,
                stamp: chunk.stamp,
            });

        Ok(PutReceipt::default())
    }

    async fn get(&self, address: &SwarmAddress, _options: &()) -> Result<Bytes> {
        self.check_available()?;

        let chunks = self.chunks.read();
        let stored = chunks.get(address).ok_or(StoreError::NotFound(*address))?;
        trace!(%address, "chunk get");
        Ok(stored.data.clone())
    }
}
