//! BMT body implementation for chunks
//!
//! A BMT body is the `span || payload` pair shared by content-addressed and
//! single-owner chunks.

use bytes::{BufMut, Bytes, BytesMut};
use std::sync::OnceLock;

use crate::SwarmAddress;
use crate::bmt::{Hasher, MAX_DATA_LENGTH, SPAN_SIZE};
use crate::chunk::error::ChunkError;
use crate::error::{PrimitivesError, Result};

/// A BMT body: the span and payload of a chunk.
///
/// For a leaf the span equals the payload length. For an intermediate chunk of
/// a file tree the payload is a list of child references and the span is the
/// number of file bytes beneath it, which is always larger than one chunk.
#[derive(Debug, Clone)]
pub struct BmtBody {
    span: u64,
    data: Bytes,
    cached_hash: OnceLock<SwarmAddress>,
}

impl BmtBody {
    /// Creates a leaf body whose span is the payload length.
    pub fn new(data: impl Into<Bytes>) -> Result<Self> {
        let data = validate_data(data)?;
        Ok(Self::new_unchecked(data.len() as u64, data))
    }

    /// Creates a body with an explicit span.
    ///
    /// A span that fits in one chunk must equal the payload length.
    pub fn with_span(span: u64, data: impl Into<Bytes>) -> Result<Self> {
        let data = validate_data(data)?;
        if span <= MAX_DATA_LENGTH as u64 && data.len() as u64 != span {
            return Err(ChunkError::invalid_size(
                "span does not match data size",
                span as usize,
                data.len(),
            )
            .into());
        }
        Ok(Self::new_unchecked(span, data))
    }

    const fn new_unchecked(span: u64, data: Bytes) -> Self {
        Self {
            span,
            data,
            cached_hash: OnceLock::new(),
        }
    }

    /// Get the span of this body
    pub const fn span(&self) -> u64 {
        self.span
    }

    /// Get the payload of this body
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Get the size of this body on the wire
    pub fn size(&self) -> usize {
        SPAN_SIZE + self.data.len()
    }

    /// The content address: `keccak256(span_le || bmt_root(payload))`
    pub fn hash(&self) -> SwarmAddress {
        *self.cached_hash.get_or_init(|| {
            let mut hasher = Hasher::new();
            hasher.set_span(self.span);
            hasher.update(&self.data);
            hasher.sum().into()
        })
    }
}

fn validate_data(data: impl Into<Bytes>) -> Result<Bytes> {
    let data = data.into();
    if data.len() > MAX_DATA_LENGTH {
        return Err(ChunkError::invalid_size(
            "data exceeds maximum chunk size",
            MAX_DATA_LENGTH,
            data.len(),
        )
        .into());
    }
    Ok(data)
}

impl PartialEq for BmtBody {
    fn eq(&self, other: &Self) -> bool {
        self.span == other.span && self.data == other.data
    }
}

impl Eq for BmtBody {}

impl From<BmtBody> for Bytes {
    fn from(body: BmtBody) -> Self {
        let mut bytes = BytesMut::with_capacity(body.size());
        bytes.put_u64_le(body.span);
        bytes.extend_from_slice(&body.data);
        bytes.freeze()
    }
}

impl TryFrom<Bytes> for BmtBody {
    type Error = PrimitivesError;

    fn try_from(mut buf: Bytes) -> Result<Self> {
        if buf.len() < SPAN_SIZE {
            return Err(
                ChunkError::invalid_size("insufficient data for span", SPAN_SIZE, buf.len()).into(),
            );
        }

        let mut span = [0u8; SPAN_SIZE];
        span.copy_from_slice(&buf.split_to(SPAN_SIZE));
        Self::with_span(u64::from_le_bytes(span), buf)
    }
}

impl TryFrom<&[u8]> for BmtBody {
    type Error = PrimitivesError;

    fn try_from(buf: &[u8]) -> Result<Self> {
        Self::try_from(Bytes::copy_from_slice(buf))
    }
}

#[cfg(any(test, feature = "arbitrary"))]
impl<'a> arbitrary::Arbitrary<'a> for BmtBody {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let data_len: usize = u.int_in_range(0..=MAX_DATA_LENGTH)?;
        let mut buf = vec![0; data_len];
        u.fill_buffer(&mut buf)?;

        // Either a leaf, or an intermediate body spanning more than one chunk
        let span = if bool::arbitrary(u)? {
            data_len as u64
        } else {
            u.int_in_range(MAX_DATA_LENGTH as u64 + 1..=u64::MAX)?
        };

        Ok(Self::new_unchecked(span, Bytes::from(buf)))
    }
}
