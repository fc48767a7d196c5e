//! Chunk references
//!
//! A reference points at the root chunk of some content. Plain references are
//! the 32 byte chunk address; encrypted references append the 32 byte
//! decryption key.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{B256, hex};

use crate::SwarmAddress;
use crate::error::{PrimitivesError, Result};

/// A 32 byte plain or 64 byte encrypted reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reference {
    /// Address of an unencrypted root chunk
    Plain(SwarmAddress),
    /// Address of an encrypted root chunk plus its decryption key
    Encrypted {
        /// Address of the encrypted root chunk
        address: SwarmAddress,
        /// Key that decrypts the root chunk
        key: B256,
    },
}

impl Reference {
    /// Length of a plain reference
    pub const PLAIN_LENGTH: usize = 32;
    /// Length of an encrypted reference
    pub const ENCRYPTED_LENGTH: usize = 64;

    /// Parses a 32 or 64 byte reference.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            Self::PLAIN_LENGTH => Ok(Self::Plain(SwarmAddress::from_slice(bytes)?)),
            Self::ENCRYPTED_LENGTH => Ok(Self::Encrypted {
                address: SwarmAddress::from_slice(&bytes[..32])?,
                key: B256::from_slice(&bytes[32..]),
            }),
            len => Err(PrimitivesError::InvalidReferenceLength(len)),
        }
    }

    /// The address of the referenced root chunk.
    pub const fn address(&self) -> &SwarmAddress {
        match self {
            Self::Plain(address) | Self::Encrypted { address, .. } => address,
        }
    }

    /// Encoded length in bytes, 32 or 64.
    pub const fn len(&self) -> usize {
        match self {
            Self::Plain(_) => Self::PLAIN_LENGTH,
            Self::Encrypted { .. } => Self::ENCRYPTED_LENGTH,
        }
    }

    /// References are never empty.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether the reference carries a decryption key.
    pub const fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted { .. })
    }

    /// The raw reference bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            Self::Plain(address) => address.to_vec(),
            Self::Encrypted { address, key } => [address.as_slice(), key.as_slice()].concat(),
        }
    }
}

impl From<SwarmAddress> for Reference {
    fn from(address: SwarmAddress) -> Self {
        Self::Plain(address)
    }
}

impl From<B256> for Reference {
    fn from(address: B256) -> Self {
        Self::Plain(address.into())
    }
}

impl TryFrom<&[u8]> for Reference {
    type Error = PrimitivesError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_slice(bytes)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_vec()))
    }
}

impl FromStr for Reference {
    type Err = PrimitivesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_slice(&hex::decode(s)?)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Reference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Reference {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(any(test, feature = "arbitrary"))]
impl<'a> arbitrary::Arbitrary<'a> for Reference {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let address = SwarmAddress::from(<[u8; 32]>::arbitrary(u)?);
        if bool::arbitrary(u)? {
            Ok(Self::Plain(address))
        } else {
            Ok(Self::Encrypted {
                address,
                key: B256::from(<[u8; 32]>::arbitrary(u)?),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;

    const HELLOWORLD: &str = "c3d78c959eb23a464619e893358a1d90e467f37c72742985ccc89159350098b4";

    proptest! {
        #[test]
        fn test_text_and_bytes_agree(reference in arb::<Reference>()) {
            let text = reference.to_string();
            prop_assert_eq!(text.len(), reference.len() * 2);
            prop_assert_eq!(text.parse::<Reference>().unwrap(), reference);
            prop_assert_eq!(Reference::from_slice(&reference.to_vec()).unwrap(), reference);
        }

        #[test]
        fn test_invalid_lengths(len in 0usize..128) {
            prop_assume!(len != 32 && len != 64);
            let err = Reference::from_slice(&vec![0u8; len]).unwrap_err();
            prop_assert!(matches!(err, PrimitivesError::InvalidReferenceLength(l) if l == len));
            prop_assert_eq!(err.kind(), ErrorKind::Format);
        }
    }

    #[test]
    fn test_plain() {
        let reference: Reference = HELLOWORLD.parse().unwrap();
        assert!(!reference.is_encrypted());
        assert_eq!(reference.len(), 32);
        assert_eq!(reference.to_string(), HELLOWORLD);
        assert_eq!(
            format!("0x{HELLOWORLD}").parse::<Reference>().unwrap(),
            reference
        );
    }

    #[test]
    fn test_encrypted() {
        let text = format!("{HELLOWORLD}{}", "11".repeat(32));
        let reference: Reference = text.parse().unwrap();

        assert!(reference.is_encrypted());
        assert_eq!(reference.address().to_string(), HELLOWORLD);
        assert_eq!(reference.to_string(), text);
    }

    #[test]
    fn test_bad_hex() {
        let err = "zz".parse::<Reference>().unwrap_err();
        assert!(matches!(err, PrimitivesError::Hex(_)));
    }
}
