//! Utility functions for postage operations.

use std::time::{SystemTime, UNIX_EPOCH};

use pollen_primitives::SwarmAddress;

/// Calculates which collision bucket a chunk belongs to based on its address.
///
/// The bucket is the first `bucket_depth` bits of the chunk address,
/// interpreted as a big-endian unsigned integer.
///
/// # Example
///
/// ```
/// use pollen_postage::calculate_bucket;
/// use pollen_primitives::SwarmAddress;
///
/// let mut bytes = [0u8; 32];
/// bytes[..2].copy_from_slice(&[0xCB, 0xE5]);
/// assert_eq!(calculate_bucket(&SwarmAddress::new(bytes), 16), 0xCBE5);
/// ```
#[inline]
pub fn calculate_bucket(address: &SwarmAddress, bucket_depth: u8) -> u32 {
    let bytes = address.as_bytes();
    let leading = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    // Zero bucket depth puts everything in bucket 0
    leading
        .checked_shr(32 - u32::from(bucket_depth))
        .unwrap_or(0)
}

/// Nanoseconds since the Unix epoch, the timestamp unit carried in stamps.
///
/// A clock set before the epoch yields 0.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos() as u64)
}
