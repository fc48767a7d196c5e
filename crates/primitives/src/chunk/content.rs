//! Content-addressed chunk implementation
//!
//! A content-addressed chunk (CAC) is addressed by the BMT hash of its span
//! and payload, so identical content always yields the identical address.

use bytes::Bytes;
use std::fmt;

use crate::error::{PrimitivesError, Result};

use super::bmt_body::BmtBody;
use super::traits::{BmtChunk, Chunk, ChunkAddress};

/// A content-addressed chunk.
///
/// This type represents a chunk of data whose address is derived from the hash
/// of its contents. It is immutable once created.
#[derive(Debug, Clone)]
pub struct ContentChunk {
    body: BmtBody,
    address: ChunkAddress,
}

impl ContentChunk {
    /// Create a leaf chunk for at most 4096 bytes of data.
    ///
    /// The span is the data length. Larger input has to go through a file
    /// splitter first.
    ///
    /// ```
    /// use pollen_primitives::{Chunk, ContentChunk};
    ///
    /// let chunk = ContentChunk::new(b"foo".as_slice()).unwrap();
    /// assert_eq!(
    ///     chunk.address().to_string(),
    ///     "2387e8e7d8a48c2a9339c97c1dc3461a9a7aa07e994c5cb8b38fd7c1b3e6ea48"
    /// );
    /// ```
    #[must_use = "this returns a new chunk without modifying the input"]
    pub fn new(data: impl Into<Bytes>) -> Result<Self> {
        Ok(Self::from_body(BmtBody::new(data)?))
    }

    /// Create a chunk with an explicit span.
    ///
    /// Used for the intermediate chunks of a file tree, whose payload is a list
    /// of child references and whose span counts the file bytes beneath them.
    #[must_use = "this returns a new chunk without modifying the input"]
    pub fn from_span_and_payload(span: u64, payload: impl Into<Bytes>) -> Result<Self> {
        Ok(Self::from_body(BmtBody::with_span(span, payload)?))
    }

    /// Create a ContentChunk from a pre-existing BmtBody.
    #[must_use]
    pub fn from_body(body: BmtBody) -> Self {
        let address = body.hash();
        Self { body, address }
    }

    /// The span and payload of this chunk.
    pub const fn body(&self) -> &BmtBody {
        &self.body
    }
}

impl Chunk for ContentChunk {
    fn address(&self) -> &ChunkAddress {
        &self.address
    }

    fn data(&self) -> &Bytes {
        self.body.data()
    }

    fn to_bytes(&self) -> Bytes {
        self.body.clone().into()
    }

    fn size(&self) -> usize {
        self.body.size()
    }
}

impl BmtChunk for ContentChunk {
    fn span(&self) -> u64 {
        self.body.span()
    }
}

impl From<ContentChunk> for Bytes {
    fn from(chunk: ContentChunk) -> Self {
        chunk.body.into()
    }
}

impl TryFrom<Bytes> for ContentChunk {
    type Error = PrimitivesError;

    fn try_from(bytes: Bytes) -> Result<Self> {
        Ok(Self::from_body(BmtBody::try_from(bytes)?))
    }
}

impl TryFrom<&[u8]> for ContentChunk {
    type Error = PrimitivesError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::try_from(Bytes::copy_from_slice(bytes))
    }
}

impl fmt::Display for ContentChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentChunk[{}]", self.address.short())
    }
}

impl PartialEq for ContentChunk {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for ContentChunk {}

#[cfg(any(test, feature = "arbitrary"))]
impl<'a> arbitrary::Arbitrary<'a> for ContentChunk {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::from_body(BmtBody::arbitrary(u)?))
    }
}
