//! Single-owner chunk implementation
//!
//! A single-owner chunk (SOC) wraps a content-addressed chunk in an
//! `identifier || signature` envelope. The signature is an EIP-191 personal
//! message signature over `keccak256(identifier || cac_address)`, the owner is
//! recovered from it, and the chunk address is `keccak256(identifier || owner)`.

use alloy_primitives::{Address, B256, Keccak256, Signature, U256};
use alloy_signer::SignerSync;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use std::sync::OnceLock;

use crate::bmt::SPAN_SIZE;
use crate::chunk::error::{self, ChunkError};
use crate::error::{PrimitivesError, Result};

use super::bmt_body::BmtBody;
use super::content::ContentChunk;
use super::traits::{BmtChunk, Chunk, ChunkAddress};

const ID_SIZE: usize = std::mem::size_of::<B256>();
const SIGNATURE_SIZE: usize = 65;
const MIN_SOC_SIZE: usize = ID_SIZE + SIGNATURE_SIZE + SPAN_SIZE;

/// Address of the single-owner chunk published by `owner` under `id`.
pub fn soc_address(id: &B256, owner: &Address) -> ChunkAddress {
    let mut hasher = Keccak256::new();
    hasher.update(id);
    hasher.update(owner);
    hasher.finalize().into()
}

/// A single-owner chunk.
#[derive(Debug, Clone)]
pub struct SingleOwnerChunk {
    id: B256,
    signature: Signature,
    body: BmtBody,
    /// Owner recovered from the signature, set on first successful recovery
    owner_cache: OnceLock<Address>,
    address_cache: OnceLock<ChunkAddress>,
}

impl SingleOwnerChunk {
    /// Sign `data` as the payload of a leaf chunk under `id`.
    ///
    /// ```
    /// use alloy_primitives::B256;
    /// use alloy_signer_local::PrivateKeySigner;
    /// use pollen_primitives::SingleOwnerChunk;
    ///
    /// let signer = PrivateKeySigner::random();
    /// let soc = SingleOwnerChunk::new(B256::ZERO, b"foo".as_slice(), &signer).unwrap();
    /// assert_eq!(soc.owner().unwrap(), signer.address());
    /// ```
    #[must_use = "this returns a new chunk without modifying the input"]
    pub fn new(id: B256, data: impl Into<Bytes>, signer: &impl SignerSync) -> Result<Self> {
        Self::sign(id, BmtBody::new(data)?, signer)
    }

    /// Wrap an existing content chunk, signing it under `id`.
    #[must_use = "this returns a new chunk without modifying the input"]
    pub fn from_content(id: B256, chunk: &ContentChunk, signer: &impl SignerSync) -> Result<Self> {
        Self::sign(id, chunk.body().clone(), signer)
    }

    fn sign(id: B256, body: BmtBody, signer: &impl SignerSync) -> Result<Self> {
        let digest = Self::to_sign(&id, &body.hash());
        let signature = signer
            .sign_message_sync(digest.as_slice())
            .map_err(ChunkError::from)?;
        Ok(Self::from_parts(id, signature, body))
    }

    /// Create a SingleOwnerChunk from pre-computed parts.
    #[must_use]
    pub const fn from_parts(id: B256, signature: Signature, body: BmtBody) -> Self {
        Self {
            id,
            signature,
            body,
            owner_cache: OnceLock::new(),
            address_cache: OnceLock::new(),
        }
    }

    /// Decode a chunk the caller expects to be published by `owner`.
    ///
    /// Fails with [`ChunkError::OwnerMismatch`] when the signature recovers
    /// to anyone else.
    pub fn unmarshal(bytes: impl Into<Bytes>, owner: &Address) -> Result<Self> {
        let chunk = Self::try_from(bytes.into())?;
        let actual = chunk.owner()?;
        if actual != *owner {
            return Err(ChunkError::OwnerMismatch {
                expected: *owner,
                actual,
            }
            .into());
        }
        Ok(chunk)
    }

    /// Whether the signature recovers to `owner`.
    pub fn verify_owner(&self, owner: &Address) -> bool {
        self.owner().is_ok_and(|actual| actual == *owner)
    }

    /// Get the owner's address, recovered from the signature.
    ///
    /// # Errors
    ///
    /// Returns `ChunkError::Signature` if the signature recovery fails.
    pub fn owner(&self) -> error::Result<Address> {
        if let Some(addr) = self.owner_cache.get() {
            return Ok(*addr);
        }

        let digest = Self::to_sign(&self.id, &self.body.hash());
        let addr = self.signature.recover_address_from_msg(digest)?;
        let _ = self.owner_cache.set(addr);
        Ok(addr)
    }

    /// `keccak256(id || cac_address)`, the message the owner signs.
    fn to_sign(id: &B256, content_address: &ChunkAddress) -> B256 {
        let mut hasher = Keccak256::new();
        hasher.update(id);
        hasher.update(content_address);
        hasher.finalize()
    }

    /// Get the identifier of this chunk.
    pub const fn id(&self) -> B256 {
        self.id
    }

    /// Get the signature of this chunk.
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Address of the wrapped content chunk.
    pub fn content_address(&self) -> ChunkAddress {
        self.body.hash()
    }

    /// The wrapped span and payload.
    pub const fn body(&self) -> &BmtBody {
        &self.body
    }
}

/// Parses a 65 byte `r || s || v` signature with `v` in {27, 28}.
fn parse_signature(bytes: &[u8]) -> error::Result<Signature> {
    let parity = match bytes[64] {
        27 => false,
        28 => true,
        v => return Err(ChunkError::invalid_format(format!("invalid signature v {v}"))),
    };
    Ok(Signature::new(
        U256::from_be_slice(&bytes[..32]),
        U256::from_be_slice(&bytes[32..64]),
        parity,
    ))
}

impl Chunk for SingleOwnerChunk {
    fn address(&self) -> &ChunkAddress {
        self.address_cache.get_or_init(|| {
            // An unrecoverable signature maps to the zero owner, which then
            // fails every address check.
            let owner = self.owner().unwrap_or(Address::ZERO);
            soc_address(&self.id, &owner)
        })
    }

    fn data(&self) -> &Bytes {
        self.body.data()
    }

    fn to_bytes(&self) -> Bytes {
        let mut bytes = BytesMut::with_capacity(self.size());
        bytes.extend_from_slice(self.id.as_slice());
        bytes.extend_from_slice(&self.signature.as_bytes());
        bytes.put_u64_le(self.body.span());
        bytes.extend_from_slice(self.body.data());
        bytes.freeze()
    }

    fn size(&self) -> usize {
        ID_SIZE + SIGNATURE_SIZE + self.body.size()
    }
}

impl BmtChunk for SingleOwnerChunk {
    fn span(&self) -> u64 {
        self.body.span()
    }
}

impl From<SingleOwnerChunk> for Bytes {
    fn from(chunk: SingleOwnerChunk) -> Self {
        chunk.to_bytes()
    }
}

impl TryFrom<Bytes> for SingleOwnerChunk {
    type Error = PrimitivesError;

    fn try_from(bytes: Bytes) -> Result<Self> {
        if bytes.len() < MIN_SOC_SIZE {
            return Err(ChunkError::invalid_size(
                "insufficient data for single-owner chunk",
                MIN_SOC_SIZE,
                bytes.len(),
            )
            .into());
        }

        let id = B256::from_slice(&bytes[..ID_SIZE]);
        let signature = parse_signature(&bytes[ID_SIZE..ID_SIZE + SIGNATURE_SIZE])?;
        let body = BmtBody::try_from(bytes.slice(ID_SIZE + SIGNATURE_SIZE..))?;

        Ok(Self::from_parts(id, signature, body))
    }
}

impl TryFrom<&[u8]> for SingleOwnerChunk {
    type Error = PrimitivesError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::try_from(Bytes::copy_from_slice(bytes))
    }
}

impl fmt::Display for SingleOwnerChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner() {
            Ok(owner) => write!(
                f,
                "SingleOwnerChunk[id={}, owner={owner}]",
                ChunkAddress::from(self.id).short()
            ),
            Err(_) => write!(
                f,
                "SingleOwnerChunk[id={}, owner=invalid]",
                ChunkAddress::from(self.id).short()
            ),
        }
    }
}

impl PartialEq for SingleOwnerChunk {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.signature == other.signature && self.body == other.body
    }
}

impl Eq for SingleOwnerChunk {}

#[cfg(any(test, feature = "arbitrary"))]
impl<'a> arbitrary::Arbitrary<'a> for SingleOwnerChunk {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let id = B256::arbitrary(u)?;
        let body = BmtBody::arbitrary(u)?;
        let signer = alloy_signer_local::PrivateKeySigner::random();

        Self::sign(id, body, &signer).map_err(|_| arbitrary::Error::IncorrectFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use alloy_primitives::{address, b256, hex};
    use alloy_signer_local::PrivateKeySigner;
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;

    fn get_test_wallet() -> PrivateKeySigner {
        // Test private key corresponding to address 0x8d3766440f0d7b949a5e32995d09619a7f86e632
        let pk = hex!("2c7536e3605d9c16a7a3d7b1898e529396a65c23a3bcbd4012a11cf2731b0fbc");
        PrivateKeySigner::from_slice(&pk).unwrap()
    }

    const EXPECTED_OWNER: Address = address!("8d3766440f0d7b949a5e32995d09619a7f86e632");

    fn get_test_chunk_data() -> Vec<u8> {
        hex!(
            "0000000000000000000000000000000000000000000000000000000000000000\
            5acd384febc133b7b245e5ddc62d82d2cded9182d2716126cd8844509af65a05\
            3deb418208027f548e3e88343af6f84a8772fb3cebc0a1833a0ea7ec0c134831\
            1b0300000000000000666f6f"
        )
        .to_vec()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_chunk_properties(chunk in arb::<SingleOwnerChunk>()) {
            let bytes = chunk.to_bytes();
            prop_assert_eq!(bytes.len(), chunk.size());

            let decoded = SingleOwnerChunk::try_from(bytes).unwrap();
            prop_assert_eq!(chunk.id(), decoded.id());
            prop_assert_eq!(chunk.signature(), decoded.signature());
            prop_assert_eq!(chunk.data(), decoded.data());
            prop_assert_eq!(chunk.owner().unwrap(), decoded.owner().unwrap());
            prop_assert!(decoded.verify(chunk.address()).is_ok());
        }

        #[test]
        fn test_unmarshal_roundtrip(id in arb::<B256>(), data in proptest::collection::vec(any::<u8>(), 0..=4096)) {
            let wallet = get_test_wallet();
            let chunk = SingleOwnerChunk::new(id, data.clone(), &wallet).unwrap();

            let decoded = SingleOwnerChunk::unmarshal(chunk.to_bytes(), &wallet.address()).unwrap();
            prop_assert_eq!(decoded.data(), &data);
            prop_assert_eq!(decoded.owner().unwrap(), wallet.address());
            prop_assert_eq!(decoded.address(), &soc_address(&id, &wallet.address()));
        }

        #[test]
        fn test_tampering_fails_verification(
            id in arb::<B256>(),
            data in proptest::collection::vec(any::<u8>(), 1..=4096),
            position in any::<prop::sample::Index>(),
            mask in 1u8..=255,
        ) {
            let wallet = get_test_wallet();
            let chunk = SingleOwnerChunk::new(id, data, &wallet).unwrap();
            let mut bytes = chunk.to_bytes().to_vec();

            // Anything but the span: identifier, signature or payload
            let editable: Vec<usize> = (0..ID_SIZE + SIGNATURE_SIZE)
                .chain(ID_SIZE + SIGNATURE_SIZE + SPAN_SIZE..bytes.len())
                .collect();
            bytes[editable[position.index(editable.len())]] ^= mask;

            let result = SingleOwnerChunk::unmarshal(bytes.clone(), &wallet.address());
            prop_assert!(result.is_err());

            if let Ok(tampered) = SingleOwnerChunk::try_from(bytes.as_slice()) {
                prop_assert!(!tampered.verify_owner(&wallet.address()));
                prop_assert!(tampered.verify(chunk.address()).is_err());
            }
        }

        #[test]
        fn test_chunk_too_small(data in proptest::collection::vec(any::<u8>(), 0..MIN_SOC_SIZE)) {
            let result = SingleOwnerChunk::try_from(data.as_slice());
            prop_assert!(matches!(result, Err(PrimitivesError::Chunk(ChunkError::InvalidSize { .. }))), "expected InvalidSize error");
        }
    }

    #[test]
    fn test_new_signed() {
        let chunk = SingleOwnerChunk::new(B256::ZERO, b"foo".to_vec(), &get_test_wallet()).unwrap();

        assert_eq!(chunk.id(), B256::ZERO);
        assert_eq!(chunk.data().as_ref(), b"foo");
        assert_eq!(
            chunk.signature().as_bytes(),
            hex!(
                "5acd384febc133b7b245e5ddc62d82d2cded9182d2716126cd8844509af65a053deb418208027f548e3e88343af6f84a8772fb3cebc0a1833a0ea7ec0c1348311b"
            )
        );
        assert_eq!(chunk.owner().unwrap(), EXPECTED_OWNER);
        assert_eq!(chunk.to_bytes().as_ref(), get_test_chunk_data().as_slice());
    }

    #[test]
    fn test_from_content() {
        let wallet = get_test_wallet();
        let cac = ContentChunk::new(b"foo".to_vec()).unwrap();
        let soc = SingleOwnerChunk::from_content(B256::ZERO, &cac, &wallet).unwrap();

        assert_eq!(soc.content_address(), *cac.address());
        assert_eq!(soc.to_bytes().as_ref(), get_test_chunk_data().as_slice());
    }

    #[test]
    fn test_chunk_address() {
        let chunk = SingleOwnerChunk::try_from(get_test_chunk_data().as_slice()).unwrap();

        assert_eq!(chunk.owner().unwrap(), EXPECTED_OWNER);
        assert_eq!(
            chunk.address().as_ref(),
            b256!("9d453ebb73b2fedaaf44ceddcf7a0aa37f3e3d6453fea5841c31f0ea6d61dc85")
        );
        assert_eq!(*chunk.address(), soc_address(&B256::ZERO, &EXPECTED_OWNER));
    }

    #[test]
    fn test_unmarshal_wrong_owner() {
        let stranger = address!("0000000000000000000000000000000000000001");
        let err = SingleOwnerChunk::unmarshal(get_test_chunk_data(), &stranger).unwrap_err();

        assert!(matches!(
            err,
            PrimitivesError::Chunk(ChunkError::OwnerMismatch { expected, actual })
                if expected == stranger && actual == EXPECTED_OWNER
        ));
        assert_eq!(err.kind(), ErrorKind::Verification);
    }

    #[test]
    fn test_invalid_recovery_byte() {
        let mut data = get_test_chunk_data();
        data[ID_SIZE + 64] = 0x1d;

        let err = SingleOwnerChunk::try_from(data.as_slice()).unwrap_err();
        assert!(matches!(err, PrimitivesError::Chunk(ChunkError::InvalidFormat(_))));
    }
}
