//! The stamp wire form and the digest a batch owner signs.
//!
//! ```text
//! batch_id (32) | bucket (4, BE) | index (4, BE) | timestamp (8, BE) | signature (65)
//! ```

use alloy_primitives::{Address, B256, Keccak256, Signature, U256};
use byteorder::{BigEndian, ByteOrder};
use pollen_primitives::SwarmAddress;

use crate::{BatchId, StampError};

/// Length of an encoded [`Stamp`].
pub const STAMP_SIZE: usize = 113;

/// An encoded [`Stamp`].
pub type StampBytes = [u8; STAMP_SIZE];

const INDEX_OFFSET: usize = 32;
const TIMESTAMP_OFFSET: usize = 40;
const SIGNATURE_OFFSET: usize = 48;

/// Slot of a chunk in its batch: the collision bucket and the position
/// within it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StampIndex {
    bucket: u32,
    index: u32,
}

impl StampIndex {
    /// Slot `index` of `bucket`.
    pub const fn new(bucket: u32, index: u32) -> Self {
        Self { bucket, index }
    }

    /// Bucket selected by the chunk address.
    pub const fn bucket(&self) -> u32 {
        self.bucket
    }

    /// Position within the bucket, counting from 0.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Bucket then position, both big-endian.
    pub const fn to_be_bytes(&self) -> [u8; 8] {
        (((self.bucket as u64) << 32) | self.index as u64).to_be_bytes()
    }

    /// Inverse of [`to_be_bytes`](Self::to_be_bytes).
    pub const fn from_be_bytes(bytes: [u8; 8]) -> Self {
        let packed = u64::from_be_bytes(bytes);
        Self::new((packed >> 32) as u32, packed as u32)
    }
}

impl From<(u32, u32)> for StampIndex {
    fn from((bucket, index): (u32, u32)) -> Self {
        Self::new(bucket, index)
    }
}

/// Proof that a batch pays for a chunk, as attached to the chunk on upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    /// Paying batch.
    pub batch_id: BatchId,
    /// Slot allocated to the chunk.
    pub index: StampIndex,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: u64,
    /// `r || s || v` with `v` in {27, 28}.
    pub signature: [u8; 65],
}

impl Stamp {
    /// Assembles a stamp from its parts.
    pub const fn new(
        batch_id: BatchId,
        index: StampIndex,
        timestamp: u64,
        signature: [u8; 65],
    ) -> Self {
        Self {
            batch_id,
            index,
            timestamp,
            signature,
        }
    }

    /// Encodes the stamp.
    pub fn to_bytes(&self) -> StampBytes {
        let mut out = [0u8; STAMP_SIZE];
        out[..INDEX_OFFSET].copy_from_slice(self.batch_id.as_slice());
        out[INDEX_OFFSET..TIMESTAMP_OFFSET].copy_from_slice(&self.index.to_be_bytes());
        BigEndian::write_u64(&mut out[TIMESTAMP_OFFSET..SIGNATURE_OFFSET], self.timestamp);
        out[SIGNATURE_OFFSET..].copy_from_slice(&self.signature);
        out
    }

    /// Decodes a stamp. Every 113 byte string is a well formed stamp; the
    /// signature is only checked on recovery.
    pub fn from_bytes(bytes: &StampBytes) -> Self {
        let mut index = [0u8; 8];
        index.copy_from_slice(&bytes[INDEX_OFFSET..TIMESTAMP_OFFSET]);
        let mut signature = [0u8; 65];
        signature.copy_from_slice(&bytes[SIGNATURE_OFFSET..]);

        Self {
            batch_id: B256::from_slice(&bytes[..INDEX_OFFSET]),
            index: StampIndex::from_be_bytes(index),
            timestamp: BigEndian::read_u64(&bytes[TIMESTAMP_OFFSET..SIGNATURE_OFFSET]),
            signature,
        }
    }

    /// The digest this stamp signs for the chunk at `address`.
    pub const fn digest(&self, address: SwarmAddress) -> StampDigest {
        StampDigest::new(address, self.batch_id, self.index, self.timestamp)
    }

    /// Recovers the address that stamped the chunk at `address`.
    pub fn recover_issuer(&self, address: SwarmAddress) -> Result<Address, StampError> {
        parse_signature(&self.signature)?
            .recover_address_from_msg(self.digest(address).to_prehash())
            .map_err(|_| StampError::InvalidSignature)
    }
}

impl TryFrom<&[u8]> for Stamp {
    type Error = StampError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: &StampBytes = bytes
            .try_into()
            .map_err(|_| StampError::InvalidData("stamp must be exactly 113 bytes"))?;
        Ok(Self::from_bytes(bytes))
    }
}

impl From<&Stamp> for StampBytes {
    fn from(stamp: &Stamp) -> Self {
        stamp.to_bytes()
    }
}

/// Parses an EIP-191 `r || s || v` signature. Only `v` of 27 or 28 is
/// accepted.
fn parse_signature(bytes: &[u8; 65]) -> Result<Signature, StampError> {
    let odd_y = match bytes[64] {
        27 => false,
        28 => true,
        _ => return Err(StampError::InvalidSignature),
    };
    let r = U256::from_be_slice(&bytes[..32]);
    let s = U256::from_be_slice(&bytes[32..64]);
    Ok(Signature::new(r, s, odd_y))
}

/// Fields covered by a stamp signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampDigest {
    /// Stamped chunk.
    pub chunk_address: SwarmAddress,
    /// Paying batch.
    pub batch_id: BatchId,
    /// Allocated slot.
    pub index: StampIndex,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: u64,
}

impl StampDigest {
    /// Collects the signed fields.
    pub const fn new(
        chunk_address: SwarmAddress,
        batch_id: BatchId,
        index: StampIndex,
        timestamp: u64,
    ) -> Self {
        Self {
            chunk_address,
            batch_id,
            index,
            timestamp,
        }
    }

    /// `keccak256(chunk_address || batch_id || index || timestamp)`, the
    /// message handed to the EIP-191 signer.
    pub fn to_prehash(&self) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(self.chunk_address.as_bytes());
        hasher.update(self.batch_id);
        hasher.update(self.index.to_be_bytes());
        hasher.update(self.timestamp.to_be_bytes());
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, hex};
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    // Stamp issued by bee for chunk 00..02, signed by 8d37…e632.
    const BEE_STAMP: [u8; STAMP_SIZE] = hex!(
        "0000000000000000000000000000000000000000000000000000000000000001"
        "00000000" "00000000" "0000000000000003"
        "496cb9ac06221d39c3f6a7dd3b9c2301c1f923162b90d5443e42023f34ff9089"
        "45b0da1c297190f111b7c6ebc828648ead8f7fce06c0364cb5a833410230c5c0"
        "1c"
    );

    fn chunk_two() -> SwarmAddress {
        let mut address = [0u8; 32];
        address[31] = 2;
        SwarmAddress::new(address)
    }

    proptest! {
        #[test]
        fn proptest_index_bytes(bucket: u32, index: u32) {
            let slot = StampIndex::new(bucket, index);
            let bytes = slot.to_be_bytes();
            prop_assert_eq!(&bytes[..4], &bucket.to_be_bytes());
            prop_assert_eq!(&bytes[4..], &index.to_be_bytes());
            prop_assert_eq!(StampIndex::from_be_bytes(bytes), slot);
        }
    }

    #[test]
    fn test_decode_bee_stamp() {
        let stamp = Stamp::try_from(BEE_STAMP.as_slice()).unwrap();

        assert_eq!(stamp.batch_id, B256::with_last_byte(1));
        assert_eq!(stamp.index, StampIndex::new(0, 0));
        assert_eq!(stamp.timestamp, 3);
        assert_eq!(StampBytes::from(&stamp), BEE_STAMP);
    }

    #[test]
    fn test_recover_bee_stamp() {
        let stamp = Stamp::from_bytes(&BEE_STAMP);

        assert_eq!(
            stamp.digest(chunk_two()).to_prehash(),
            b256!("f4fe8b1b61d3ac2155c07fbfe445599a4119fbd29b1125b5ac0d06964f76ec20")
        );
        assert_eq!(
            stamp.recover_issuer(chunk_two()).unwrap(),
            address!("8d3766440f0d7b949a5e32995d09619a7f86e632")
        );
    }

    #[test]
    fn test_other_chunk_recovers_other_issuer() {
        let stamp = Stamp::from_bytes(&BEE_STAMP);
        let recovered = stamp.recover_issuer(SwarmAddress::new([7; 32])).unwrap();
        assert_ne!(recovered, address!("8d3766440f0d7b949a5e32995d09619a7f86e632"));
    }

    #[test]
    fn test_recovery_byte_must_be_eip191() {
        for v in [0u8, 1, 29] {
            let mut bytes = BEE_STAMP;
            bytes[STAMP_SIZE - 1] = v;
            assert_matches!(
                Stamp::from_bytes(&bytes).recover_issuer(chunk_two()),
                Err(StampError::InvalidSignature)
            );
        }
    }

    #[test]
    fn test_wrong_length() {
        assert_matches!(Stamp::try_from(&BEE_STAMP[..112]), Err(StampError::InvalidData(_)));
        assert_matches!(Stamp::try_from([0u8; 114].as_slice()), Err(StampError::InvalidData(_)));
    }
}
