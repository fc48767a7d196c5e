//! Binary Merkle Tree hasher implementation
//!
//! This module provides a BMT hasher that uses Keccak256 for computing
//! content-addressed hashes of chunk payloads.

use alloy_primitives::{B256, Keccak256};
use digest::{FixedOutput, FixedOutputReset, OutputSizeUser, Reset, Update};
use generic_array::{GenericArray, typenum::U32};
use std::sync::LazyLock;

use super::constants::*;
use super::error::{BmtError, Result};

/// Pre-computed hashes for zero-filled subtrees at each level.
///
/// Level 0 is the hash of one zero segment pair (64 bytes), every following
/// level hashes two copies of the level below, so the last level is the root
/// of an all-zero 4096 byte body.
static ZERO_HASHES: LazyLock<[B256; ZERO_TREE_LEVELS]> = LazyLock::new(|| {
    let mut hashes = [B256::ZERO; ZERO_TREE_LEVELS];
    hashes[0] = hash_pair(&[0u8; SEGMENT_SIZE], &[0u8; SEGMENT_SIZE]);
    for i in 1..ZERO_TREE_LEVELS {
        hashes[i] = hash_pair(hashes[i - 1].as_slice(), hashes[i - 1].as_slice());
    }
    hashes
});

#[inline(always)]
fn hash_pair(left: &[u8], right: &[u8]) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize()
}

/// Computes the BMT root of a single payload without span.
///
/// The payload is zero-padded to [`MAX_DATA_LENGTH`] bytes; longer payloads are
/// rejected.
///
/// ```
/// use pollen_primitives::bmt_root;
///
/// assert!(bmt_root(&[1, 2, 3]).is_ok());
/// assert!(bmt_root(&[0u8; 4097]).is_err());
/// ```
pub fn bmt_root(payload: &[u8]) -> Result<B256> {
    if payload.len() > MAX_DATA_LENGTH {
        return Err(BmtError::invalid_input_size(MAX_DATA_LENGTH, payload.len()));
    }
    let mut hasher = Hasher::new();
    hasher.update(payload);
    Ok(hasher.root())
}

/// Reusable BMT hasher over a 4096 byte buffer.
///
/// Bytes written past [`MAX_DATA_LENGTH`] are dropped; use [`bmt_root`] when
/// oversized input must be an error.
#[derive(Debug, Clone)]
pub struct Hasher {
    span: u64,
    buffer: [u8; MAX_DATA_LENGTH],
    cursor: usize,
}

impl Default for Hasher {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create an empty hasher with span 0
    #[inline]
    pub const fn new() -> Self {
        Self {
            span: 0,
            buffer: [0u8; MAX_DATA_LENGTH],
            cursor: 0,
        }
    }

    /// Set the span of data to be hashed
    #[inline]
    pub const fn set_span(&mut self, span: u64) {
        self.span = span;
    }

    /// Get the current span
    #[inline(always)]
    pub const fn span(&self) -> u64 {
        self.span
    }

    /// Amount of payload currently buffered
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.cursor
    }

    /// Check if the buffer is empty
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Append payload bytes, truncating at the body size
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        let to_copy = data.len().min(MAX_DATA_LENGTH - self.cursor);
        self.buffer[self.cursor..self.cursor + to_copy].copy_from_slice(&data[..to_copy]);
        self.cursor += to_copy;
    }

    /// Chunk address: `keccak256(span_le || root)`
    #[inline]
    #[must_use]
    pub fn sum(&self) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(self.span.to_le_bytes());
        hasher.update(self.root());
        hasher.finalize()
    }

    /// BMT root of the zero-padded buffer, without the span
    #[must_use]
    pub fn root(&self) -> B256 {
        if self.cursor == 0 {
            return ZERO_HASHES[ZERO_TREE_LEVELS - 1];
        }

        // Hash the smallest power-of-two subtree holding all data, then climb
        // to the full body by pairing with zero subtrees on the right.
        let effective = self
            .cursor
            .next_power_of_two()
            .clamp(SEGMENT_PAIR_LENGTH, MAX_DATA_LENGTH);
        let mut result = self.hash_subtree(0, effective);

        let mut size = effective;
        while size < MAX_DATA_LENGTH {
            result = hash_pair(result.as_slice(), ZERO_HASHES[zero_level(size)].as_slice());
            size *= 2;
        }
        result
    }

    /// Hash the subtree of `length` bytes starting at `offset`.
    ///
    /// `length` is a power of two and at least one segment pair.
    fn hash_subtree(&self, offset: usize, length: usize) -> B256 {
        debug_assert!(length.is_power_of_two() && length >= SEGMENT_PAIR_LENGTH);

        if length == SEGMENT_PAIR_LENGTH {
            let pair = &self.buffer[offset..offset + length];
            return hash_pair(&pair[..SEGMENT_SIZE], &pair[SEGMENT_SIZE..]);
        }

        let half = length / 2;
        let (left, right) = if offset + half >= self.cursor {
            // right half lies entirely in the zero padding
            (self.hash_subtree(offset, half), ZERO_HASHES[zero_level(half)])
        } else {
            rayon::join(
                || self.hash_subtree(offset, half),
                || self.hash_subtree(offset + half, half),
            )
        };

        hash_pair(left.as_slice(), right.as_slice())
    }

    fn reset_internal(&mut self) {
        // Stale bytes past the cursor would leak into the next root.
        self.buffer[..self.cursor].fill(0);
        self.cursor = 0;
        self.span = 0;
    }
}

/// Zero-tree level for a subtree of `length` bytes (64 -> 0, 4096 -> 6).
#[inline(always)]
const fn zero_level(length: usize) -> usize {
    (length / SEGMENT_PAIR_LENGTH).trailing_zeros() as usize
}

impl OutputSizeUser for Hasher {
    type OutputSize = U32;
}

impl Update for Hasher {
    #[inline]
    fn update(&mut self, data: &[u8]) {
        Self::update(self, data);
    }
}

impl Reset for Hasher {
    #[inline]
    fn reset(&mut self) {
        self.reset_internal();
    }
}

impl FixedOutput for Hasher {
    #[inline]
    fn finalize_into(self, out: &mut GenericArray<u8, Self::OutputSize>) {
        out.copy_from_slice(self.sum().as_slice());
    }
}

impl FixedOutputReset for Hasher {
    #[inline]
    fn finalize_into_reset(&mut self, out: &mut GenericArray<u8, Self::OutputSize>) {
        out.copy_from_slice(self.sum().as_slice());
        self.reset_internal();
    }
}

impl digest::HashMarker for Hasher {}

impl std::io::Write for Hasher {
    /// Accepts the bytes that still fit in the buffer.
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let accepted = buf.len().min(MAX_DATA_LENGTH - self.len());
        Self::update(self, &buf[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
