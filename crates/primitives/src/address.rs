//! Swarm address implementation
//!
//! A [`SwarmAddress`] is the 32-byte identifier of a chunk, either the BMT
//! address of a content chunk or the `keccak256(id || owner)` address of a
//! single-owner chunk.
//!
//! ## Example Usage
//!
//! ```
//! use pollen_primitives::SwarmAddress;
//!
//! let address: SwarmAddress = "c3d78c959eb23a464619e893358a1d90e467f37c72742985ccc89159350098b4"
//!     .parse()
//!     .unwrap();
//! assert_eq!(address.short(), "c3d78c959eb23a46");
//! ```

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use alloy_primitives::{B256, hex};

use crate::error::{PrimitivesError, Result};

/// A 256-bit address for a chunk in the Swarm network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SwarmAddress(pub B256);

impl SwarmAddress {
    /// Size of an address in bytes.
    pub const LENGTH: usize = 32;

    /// Creates a new SwarmAddress from raw bytes
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(B256::new(bytes))
    }

    /// Returns the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Creates a new address from a slice, checking the length
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != Self::LENGTH {
            return Err(PrimitivesError::InvalidReferenceLength(slice.len()));
        }
        Ok(Self(B256::from_slice(slice)))
    }

    /// Checks if this address is zeros
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Create a new zero-filled address
    pub const fn zero() -> Self {
        Self(B256::ZERO)
    }

    /// First eight bytes in hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_slice()[..8])
    }
}

impl fmt::Display for SwarmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0.as_slice()))
    }
}

impl FromStr for SwarmAddress {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl Deref for SwarmAddress {
    type Target = B256;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<B256> for SwarmAddress {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<[u8; 32]> for SwarmAddress {
    fn from(bytes: [u8; 32]) -> Self {
        Self::new(bytes)
    }
}

impl From<SwarmAddress> for B256 {
    fn from(addr: SwarmAddress) -> Self {
        addr.0
    }
}

impl AsRef<[u8]> for SwarmAddress {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
