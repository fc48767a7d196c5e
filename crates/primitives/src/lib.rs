//! Core primitives for content-addressed storage on Swarm
//!
//! This crate provides the leaf-level building blocks used by every other
//! pollen crate: the binary merkle tree hasher, the chunk wire model, chunk
//! references and their shareable CID form.
//!
//! ## Key Components
//!
//! - **Binary Merkle Tree**: fixed-depth keccak256 reduction of a 4096 byte payload ([`bmt::Hasher`], [`bmt_root`])
//! - **Chunks**: Content-addressed and owner-signed chunks ([`ContentChunk`], [`SingleOwnerChunk`])
//! - **References**: 32 byte plain or 64 byte encrypted chunk references ([`Reference`])
//! - **CIDs**: base32 multiformat encoding of manifest and feed references ([`Cid`])
//! - **Feeds**: identifier and address derivation for sequential feed updates ([`feed`])
//!
//! ## Usage Examples
//!
//! ```
//! use pollen_primitives::{Chunk, ContentChunk, SingleOwnerChunk};
//! use alloy_signer_local::PrivateKeySigner;
//! use alloy_primitives::B256;
//!
//! // Creating content chunks
//! let chunk = ContentChunk::new(b"Hello, world!".as_slice()).unwrap();
//! let address = chunk.address();
//!
//! // Creating signed chunks
//! let wallet = PrivateKeySigner::random();
//! let owner_chunk = SingleOwnerChunk::new(B256::random(), b"Signed data".as_slice(), &wallet).unwrap();
//! assert!(owner_chunk.verify_owner(&wallet.address()));
//! ```

// Re-export dependencies that are part of our public API
pub use bytes;

pub mod address;
pub mod bmt;
pub mod chunk;
pub mod cid;
pub mod error;
pub mod feed;
pub mod reference;

// Re-export core constants
pub use bmt::{MAX_DATA_LENGTH as MAX_CHUNK_SIZE, SPAN_SIZE};

// Re-export core types
pub use address::SwarmAddress;
pub use cid::{Cid, CidKind};
pub use error::{ErrorKind, PrimitivesError, Result};
pub use reference::Reference;

// Core BMT functionality
pub use bmt::{Hasher, bmt_root};

// Core chunk functionality
pub use chunk::{
    BmtBody,
    BmtChunk,
    // Core traits
    Chunk,
    ChunkAddress,

    // Concrete chunk types
    ContentChunk,
    SingleOwnerChunk,
};
