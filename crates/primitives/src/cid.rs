//! Swarm content identifiers
//!
//! A Swarm CID is a CIDv1 in multibase base32 form: the prefix `b` followed by
//! the lowercase, unpadded RFC 4648 encoding of
//!
//! ```text
//! 0x01 || varint(codec) || 0x1b (keccak-256) || 0x20 (digest length) || reference
//! ```
//!
//! where the codec distinguishes manifests from feeds.
//!
//! ```
//! use pollen_primitives::{Cid, CidKind};
//!
//! let reference = "c3d78c959eb23a464619e893358a1d90e467f37c72742985ccc89159350098b4"
//!     .parse()
//!     .unwrap();
//! let cid = Cid::new(CidKind::Manifest, reference).encode();
//! assert!(cid.starts_with("bah5acgza"));
//! assert_eq!(Cid::decode(&cid).unwrap().reference, reference);
//! ```

use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use thiserror::Error;

use crate::SwarmAddress;
use crate::error::{PrimitivesError, Result};

const CID_VERSION: u8 = 0x01;
const KECCAK_256: u8 = 0x1b;
const DIGEST_LENGTH: u8 = 0x20;
const MULTIBASE_BASE32: char = 'b';

/// Byte length of an encoded CID: version, two byte codec varint, hash code,
/// digest length and the digest itself.
const ENCODED_LENGTH: usize = 5 + 32;

/// Errors from CID encoding and decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CidError {
    /// Only the base32 lowercase multibase is supported
    #[error("unsupported multibase prefix {0:?}")]
    UnsupportedMultibase(Option<char>),

    /// The base32 payload did not decode
    #[error("invalid base32: {0}")]
    Base32(#[from] data_encoding::DecodeError),

    /// The binary CID has the wrong length
    #[error("invalid CID length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Decoded length
        actual: usize,
    },

    /// Not a CIDv1 with a keccak-256 multihash
    #[error("invalid CID header")]
    InvalidHeader,

    /// The codec is neither the manifest nor the feed codec
    #[error("unknown codec {0:#x}")]
    UnknownCodec(u64),
}

/// What a CID points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CidKind {
    /// A mantaray manifest
    Manifest,
    /// A feed manifest
    Feed,
}

impl CidKind {
    /// Multicodec code
    pub const fn codec(self) -> u64 {
        match self {
            Self::Manifest => 0xfa,
            Self::Feed => 0xfb,
        }
    }

    const fn from_codec(codec: u64) -> Option<Self> {
        match codec {
            0xfa => Some(Self::Manifest),
            0xfb => Some(Self::Feed),
            _ => None,
        }
    }
}

/// A typed Swarm reference in CID form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cid {
    /// What the reference points at
    pub kind: CidKind,
    /// The 32 byte reference
    pub reference: SwarmAddress,
}

impl Cid {
    /// A CID of the given kind.
    pub const fn new(kind: CidKind, reference: SwarmAddress) -> Self {
        Self { kind, reference }
    }

    /// Binary CIDv1 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ENCODED_LENGTH);
        bytes.push(CID_VERSION);
        write_varint(&mut bytes, self.kind.codec());
        bytes.push(KECCAK_256);
        bytes.push(DIGEST_LENGTH);
        bytes.extend_from_slice(self.reference.as_bytes());
        bytes
    }

    /// Multibase base32 text form.
    pub fn encode(&self) -> String {
        let mut text = String::with_capacity(1 + BASE32_NOPAD.encode_len(ENCODED_LENGTH));
        text.push(MULTIBASE_BASE32);
        text.push_str(&BASE32_NOPAD.encode(&self.to_bytes()).to_ascii_lowercase());
        text
    }

    /// Parses the multibase base32 text form.
    pub fn decode(text: &str) -> std::result::Result<Self, CidError> {
        let mut chars = text.chars();
        match chars.next() {
            Some(MULTIBASE_BASE32) => {}
            other => return Err(CidError::UnsupportedMultibase(other)),
        }
        let bytes = BASE32_NOPAD.decode(chars.as_str().to_ascii_uppercase().as_bytes())?;
        Self::from_bytes(&bytes)
    }

    /// Parses binary CIDv1 bytes.
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, CidError> {
        let (&version, rest) = bytes.split_first().ok_or(CidError::InvalidHeader)?;
        if version != CID_VERSION {
            return Err(CidError::InvalidHeader);
        }
        let (codec, rest) = read_varint(rest).ok_or(CidError::InvalidHeader)?;
        let kind = CidKind::from_codec(codec).ok_or(CidError::UnknownCodec(codec))?;

        match rest {
            [KECCAK_256, DIGEST_LENGTH, digest @ ..] if digest.len() == 32 => Ok(Self {
                kind,
                reference: SwarmAddress::new(
                    digest.try_into().map_err(|_| CidError::InvalidHeader)?,
                ),
            }),
            [KECCAK_256, DIGEST_LENGTH, ..] => Err(CidError::InvalidLength {
                expected: ENCODED_LENGTH,
                actual: bytes.len(),
            }),
            _ => Err(CidError::InvalidHeader),
        }
    }
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn read_varint(bytes: &[u8]) -> Option<(u64, &[u8])> {
    let mut value = 0u64;
    for (i, &byte) in bytes.iter().enumerate().take(9) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value, &bytes[i + 1..]));
        }
    }
    None
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Cid {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::decode(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use proptest::prelude::*;

    const REFERENCE: &str = "c3d78c959eb23a464619e893358a1d90e467f37c72742985ccc89159350098b4";
    const MANIFEST_CID: &str = "bah5acgzayplyzfm6wi5emrqz5cjtlcq5sdsgp434oj2ctbomzcivsniatc2a";
    const FEED_CID: &str = "bah5qcgzayplyzfm6wi5emrqz5cjtlcq5sdsgp434oj2ctbomzcivsniatc2a";

    fn reference() -> SwarmAddress {
        REFERENCE.parse().unwrap()
    }

    proptest! {
        #[test]
        fn test_decode_inverts_encode(bytes in any::<[u8; 32]>(), feed in any::<bool>()) {
            let kind = if feed { CidKind::Feed } else { CidKind::Manifest };
            let cid = Cid::new(kind, SwarmAddress::new(bytes));
            let text = cid.encode();

            prop_assert!(text.starts_with('b'));
            prop_assert_eq!(text.to_ascii_lowercase(), text.clone());
            prop_assert_eq!(Cid::decode(&text).unwrap(), cid);
        }
    }

    #[test]
    fn test_known_cids() {
        assert_eq!(Cid::new(CidKind::Manifest, reference()).encode(), MANIFEST_CID);
        assert_eq!(Cid::new(CidKind::Feed, reference()).encode(), FEED_CID);

        let feed: Cid = FEED_CID.parse().unwrap();
        assert_eq!(feed.kind, CidKind::Feed);
        assert_eq!(feed.reference, reference());
    }

    #[test]
    fn test_binary_layout() {
        let bytes = Cid::new(CidKind::Manifest, reference()).to_bytes();
        assert_eq!(bytes.len(), ENCODED_LENGTH);
        assert_eq!(&bytes[..5], &[0x01, 0xfa, 0x01, 0x1b, 0x20]);
    }

    #[test]
    fn test_rejects_other_multibase() {
        assert_eq!(
            Cid::decode(&MANIFEST_CID.replacen('b', "z", 1)),
            Err(CidError::UnsupportedMultibase(Some('z')))
        );
        assert_eq!(Cid::decode(""), Err(CidError::UnsupportedMultibase(None)));
    }

    #[test]
    fn test_rejects_unknown_codec() {
        let mut bytes = Cid::new(CidKind::Manifest, reference()).to_bytes();
        bytes[1] = 0xfc;
        assert_eq!(Cid::from_bytes(&bytes), Err(CidError::UnknownCodec(0xfc)));
    }

    #[test]
    fn test_rejects_truncated() {
        let text = &MANIFEST_CID[..MANIFEST_CID.len() - 8];
        let err = text.parse::<Cid>().unwrap_err();
        assert!(matches!(
            err,
            PrimitivesError::Cid(CidError::InvalidLength { .. } | CidError::Base32(_))
        ));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_rejects_bad_base32() {
        assert!(matches!(Cid::decode("b!!!!"), Err(CidError::Base32(_))));
    }
}
