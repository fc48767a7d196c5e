//! Chunk types and operations
//!
//! Every chunk travels as `span (8 bytes, little-endian) || payload`. A
//! [`ContentChunk`] is addressed by the BMT hash of that pair; a
//! [`SingleOwnerChunk`] wraps one in `identifier || signature` and is
//! addressed by `keccak256(identifier || owner)`.

mod bmt_body;
mod content;
pub(crate) mod error;
mod single_owner;
mod traits;

pub use bmt_body::BmtBody;
pub use error::ChunkError;
pub use traits::{BmtChunk, Chunk, ChunkAddress};

pub use content::ContentChunk;
pub use single_owner::{SingleOwnerChunk, soc_address};
