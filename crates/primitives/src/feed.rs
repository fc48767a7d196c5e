//! Sequential feed addressing
//!
//! A feed is a series of single-owner chunks published by one owner under one
//! topic. Update `n` lives under the identifier `keccak256(topic || n_be64)`,
//! so a reader who knows owner and topic can compute every update address.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256, Keccak256, hex, keccak256};

use crate::SwarmAddress;
use crate::chunk::soc_address;
use crate::error::{PrimitivesError, Result};

/// A 32 byte feed topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Topic(pub B256);

impl Topic {
    /// Derives a topic from a human readable name.
    pub fn from_string(name: &str) -> Self {
        Self(keccak256(name.as_bytes()))
    }

    /// Reads a 32 byte topic.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(PrimitivesError::InvalidReferenceLength(bytes.len()));
        }
        Ok(Self(B256::from_slice(bytes)))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Topic {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_slice(&hex::decode(s)?)
    }
}

impl From<B256> for Topic {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

/// SOC identifier of update `index` of `topic`.
pub fn feed_identifier(topic: &Topic, index: u64) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(topic.0);
    hasher.update(index.to_be_bytes());
    hasher.finalize()
}

/// Chunk address of update `index` of the feed `(owner, topic)`.
pub fn feed_update_address(owner: &Address, topic: &Topic, index: u64) -> SwarmAddress {
    soc_address(&feed_identifier(topic, index), owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Chunk, SingleOwnerChunk};
    use alloy_signer_local::PrivateKeySigner;

    #[test]
    fn test_identifier_layout() {
        let topic = Topic::from_string("my-website");
        let mut preimage = topic.0.to_vec();
        preimage.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 7]);

        assert_eq!(feed_identifier(&topic, 7), keccak256(&preimage));
        assert_ne!(feed_identifier(&topic, 7), feed_identifier(&topic, 8));
    }

    #[test]
    fn test_topic_text() {
        let topic = Topic::from_string("my-website");
        assert_eq!(topic.to_string().parse::<Topic>().unwrap(), topic);
        assert!("abcd".parse::<Topic>().is_err());
    }

    #[test]
    fn test_update_address_matches_signed_update() {
        let signer = PrivateKeySigner::random();
        let topic = Topic::from_string("news");

        let update =
            SingleOwnerChunk::new(feed_identifier(&topic, 3), b"payload".as_slice(), &signer)
                .unwrap();
        assert_eq!(
            *update.address(),
            feed_update_address(&signer.address(), &topic, 3)
        );
    }
}
