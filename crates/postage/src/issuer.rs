//! Stamp issuer trait for tracking bucket utilization.

use bytes::{BufMut, Bytes, BytesMut};
use pollen_primitives::SwarmAddress;

use crate::{BatchId, BucketLayout, StampDigest, StampError, StampIndex};

/// A trait for managing stamp issuance within a batch.
///
/// The stamp issuer tracks which bucket indices have been used and allocates
/// new indices for chunks as they are stamped. Signing is handled separately
/// by a [`Stamper`](crate::Stamper), so the same issuer state can be used with
/// different signers.
pub trait StampIssuer {
    /// Prepares a stamp digest for the given chunk address.
    ///
    /// Calculates the bucket of the chunk, allocates the next index within it
    /// and returns the digest that needs to be signed.
    ///
    /// # Errors
    ///
    /// Returns `StampError::BucketFull` if the bucket has no remaining capacity.
    /// The counters are left untouched in that case.
    fn prepare_stamp(
        &mut self,
        address: &SwarmAddress,
        timestamp: u64,
    ) -> Result<StampDigest, StampError>;

    /// Returns the batch ID that stamps are issued for.
    fn batch_id(&self) -> BatchId;

    /// Returns the bucket geometry of the batch.
    fn layout(&self) -> BucketLayout;

    /// Returns the current utilization of the most-used bucket.
    fn max_bucket_utilization(&self) -> u32;

    /// Returns the utilization of a specific bucket.
    fn bucket_utilization(&self, bucket: u32) -> u32;

    /// Returns the total number of stamps issued.
    fn stamps_issued(&self) -> u64;

    /// Checks if a bucket can accept another chunk.
    fn bucket_has_capacity(&self, bucket: u32) -> bool {
        (bucket as usize) < self.layout().bucket_count()
            && self.bucket_utilization(bucket) < self.layout().bucket_capacity()
    }
}

/// An in-memory stamp issuer holding one counter per bucket.
///
/// The counters can be exported with [`state`](Self::state) and restored with
/// [`from_state`](Self::from_state), so stamping can resume after a restart
/// without reusing an index.
#[derive(Debug, Clone)]
pub struct MemoryIssuer {
    batch_id: BatchId,
    layout: BucketLayout,
    /// Next free index for each bucket.
    bucket_indices: Vec<u32>,
    max_utilization: u32,
    stamps_issued: u64,
}

impl MemoryIssuer {
    /// Creates an issuer with every bucket empty.
    pub fn new(batch_id: BatchId, layout: BucketLayout) -> Self {
        Self {
            batch_id,
            layout,
            bucket_indices: vec![0u32; layout.bucket_count()],
            max_utilization: 0,
            stamps_issued: 0,
        }
    }

    /// Restores an issuer from counters exported by [`state`](Self::state).
    ///
    /// # Errors
    ///
    /// Returns `StampError::InvalidState` if the blob is not `4 * 2^bucket_depth`
    /// bytes or a counter exceeds the bucket capacity.
    pub fn from_state(
        batch_id: BatchId,
        layout: BucketLayout,
        state: &[u8],
    ) -> Result<Self, StampError> {
        if state.len() != layout.bucket_count() * 4 {
            return Err(StampError::InvalidState(
                "state length does not match the bucket count",
            ));
        }

        let capacity = layout.bucket_capacity();
        let bucket_indices = state
            .chunks_exact(4)
            .map(|counter| {
                let counter = u32::from_be_bytes([counter[0], counter[1], counter[2], counter[3]]);
                if counter > capacity {
                    return Err(StampError::InvalidState("counter exceeds bucket capacity"));
                }
                Ok(counter)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let max_utilization = bucket_indices.iter().copied().max().unwrap_or(0);
        let stamps_issued = bucket_indices.iter().map(|&c| u64::from(c)).sum();

        Ok(Self {
            batch_id,
            layout,
            bucket_indices,
            max_utilization,
            stamps_issued,
        })
    }

    /// Exports the counters as big-endian `u32`s, bucket 0 first.
    pub fn state(&self) -> Bytes {
        let mut state = BytesMut::with_capacity(self.bucket_indices.len() * 4);
        for &counter in &self.bucket_indices {
            state.put_u32(counter);
        }
        state.freeze()
    }
}

impl StampIssuer for MemoryIssuer {
    fn prepare_stamp(
        &mut self,
        address: &SwarmAddress,
        timestamp: u64,
    ) -> Result<StampDigest, StampError> {
        let bucket = crate::calculate_bucket(address, self.layout.bucket_depth());
        let capacity = self.layout.bucket_capacity();

        let current_index = self.bucket_indices[bucket as usize];
        if current_index >= capacity {
            return Err(StampError::BucketFull { bucket, capacity });
        }

        self.bucket_indices[bucket as usize] = current_index + 1;
        self.stamps_issued += 1;
        self.max_utilization = self.max_utilization.max(current_index + 1);

        let index = StampIndex::new(bucket, current_index);
        Ok(StampDigest::new(*address, self.batch_id, index, timestamp))
    }

    fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    fn layout(&self) -> BucketLayout {
        self.layout
    }

    fn max_bucket_utilization(&self) -> u32 {
        self.max_utilization
    }

    fn bucket_utilization(&self, bucket: u32) -> u32 {
        self.bucket_indices
            .get(bucket as usize)
            .copied()
            .unwrap_or(0)
    }

    fn stamps_issued(&self) -> u64 {
        self.stamps_issued
    }
}
