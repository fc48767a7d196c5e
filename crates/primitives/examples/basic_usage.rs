//! Basic usage example for the primitives crate

use bytes::BytesMut;
use pollen_primitives::{
    Chunk, ContentChunk, Result,
    bmt::Hasher,
    cid::{Cid, CidKind},
};

fn main() -> Result<()> {
    // Wire form of a leaf chunk: 8-byte little-endian span, then the payload
    let span: u64 = 1016;
    let mut data = BytesMut::with_capacity(1024);
    data.extend_from_slice(&span.to_le_bytes());
    data.extend_from_slice(&[0u8; 1016]);
    let bytes = data.freeze();

    println!("Hashing payload...");
    let mut hasher = Hasher::new();
    hasher.set_span(span);
    hasher.update(&bytes[8..]);
    let address = hasher.sum();
    println!("Calculated chunk address: {address}");

    let chunk = ContentChunk::try_from(bytes)?;
    println!("Parsed chunk: {chunk}");

    println!("Verifying chunk integrity...");
    chunk.verify(&address.into())?;
    println!("Chunk integrity verified successfully");

    let cid = Cid::new(CidKind::Manifest, *chunk.address());
    println!("As a manifest CID: {cid}");

    Ok(())
}
