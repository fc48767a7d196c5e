//! Binary Merkle Tree (BMT) implementation for content addressing.
//!
//! A chunk payload is zero-padded to [`MAX_DATA_LENGTH`] bytes, split into 128
//! segments of 32 bytes and reduced pairwise with keccak256 over seven rounds
//! to a single 32 byte root. The chunk address additionally hashes the
//! little-endian span in front of that root.

mod constants;
mod error;
mod hasher;

pub use constants::{BRANCHES, HASH_SIZE, MAX_DATA_LENGTH, SEGMENT_SIZE, SPAN_SIZE};
pub use error::{BmtError, Result};
pub use hasher::{Hasher, bmt_root};
