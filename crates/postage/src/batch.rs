//! Postage batch geometry.

use alloy_primitives::B256;

use crate::StampError;

/// A 32-byte batch identifier.
pub type BatchId = B256;

/// Bucket depth used by the network for every batch.
pub const DEFAULT_BUCKET_DEPTH: u8 = 16;

/// Largest supported bucket depth. The counter array holds `2^bucket_depth`
/// entries, so this bounds the issuer state at 64 MiB.
pub const MAX_BUCKET_DEPTH: u8 = 24;

/// How a batch divides its `2^depth` slots into collision buckets.
///
/// A batch of depth `d` and bucket depth `b` has `2^b` buckets of `2^(d-b)`
/// slots each. A chunk falls into the bucket named by the first `b` bits of
/// its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BucketLayout {
    depth: u8,
    bucket_depth: u8,
}

impl BucketLayout {
    /// Creates a layout, validating that every bucket holds at least one slot
    /// and that the capacity fits a `u32` counter.
    pub const fn new(depth: u8, bucket_depth: u8) -> Result<Self, StampError> {
        if bucket_depth > MAX_BUCKET_DEPTH || depth <= bucket_depth || depth - bucket_depth > 31 {
            return Err(StampError::InvalidLayout {
                depth,
                bucket_depth,
            });
        }
        Ok(Self {
            depth,
            bucket_depth,
        })
    }

    /// Creates a layout with [`DEFAULT_BUCKET_DEPTH`].
    pub const fn with_depth(depth: u8) -> Result<Self, StampError> {
        Self::new(depth, DEFAULT_BUCKET_DEPTH)
    }

    /// Returns the batch depth.
    ///
    /// The total capacity is 2^depth chunks.
    #[inline]
    pub const fn depth(&self) -> u8 {
        self.depth
    }

    /// Returns the bucket depth.
    #[inline]
    pub const fn bucket_depth(&self) -> u8 {
        self.bucket_depth
    }

    /// Returns the maximum number of chunks per bucket, 2^(depth - bucket_depth).
    #[inline]
    pub const fn bucket_capacity(&self) -> u32 {
        1u32 << (self.depth - self.bucket_depth)
    }

    /// Returns the number of collision buckets, 2^bucket_depth.
    #[inline]
    pub const fn bucket_count(&self) -> usize {
        1usize << self.bucket_depth
    }

    /// Returns the total capacity of the batch, 2^depth.
    #[inline]
    pub const fn total_capacity(&self) -> u64 {
        1u64 << self.depth
    }
}
