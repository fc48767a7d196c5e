//! Stamping and storing a chunk tree.

use futures::future;
use pollen_postage::Stamper;
use pollen_primitives::{Chunk, Reference, SwarmAddress};
use pollen_store::{ChunkStore, PutReceipt, StampedChunk};
use tracing::{debug, trace};

use crate::{RequestLimit, Result, split};

/// Outcome of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadResult {
    /// Reference of the root chunk.
    pub reference: Reference,
    /// History address the store reported for the root, if any.
    pub history_address: Option<SwarmAddress>,
}

/// Stamps a single chunk and hands it to the store.
pub async fn put_chunk<S, T>(
    store: &S,
    stamper: &T,
    chunk: &impl Chunk,
    options: &S::Options,
) -> Result<PutReceipt>
where
    S: ChunkStore + ?Sized,
    T: Stamper + ?Sized,
{
    let envelope = stamper.stamp(chunk.address())?;
    trace!(
        address = %chunk.address(),
        bucket = envelope.index.bucket(),
        index = envelope.index.index(),
        "chunk stamped"
    );

    let stamped = StampedChunk::from_chunk(chunk).with_stamp(envelope.to_stamp());
    Ok(store.put(stamped, options).await?)
}

/// Splits `data`, stamps every chunk and stores it.
///
/// Non-root chunks are put with up to `concurrency` requests in flight; the
/// root is put last, once everything beneath it is stored. The first failure
/// aborts the upload and is returned. Stamps already issued stay consumed.
pub async fn upload<S, T>(
    store: &S,
    stamper: &T,
    data: &[u8],
    options: &S::Options,
    concurrency: usize,
) -> Result<UploadResult>
where
    S: ChunkStore + ?Sized,
    T: Stamper + ?Sized,
{
    upload_with(store, stamper, data, options, &RequestLimit::new(concurrency)).await
}

/// [`upload`] with puts counted against `limit`, which may be shared with
/// other uploads.
pub async fn upload_with<S, T>(
    store: &S,
    stamper: &T,
    data: &[u8],
    options: &S::Options,
    limit: &RequestLimit,
) -> Result<UploadResult>
where
    S: ChunkStore + ?Sized,
    T: Stamper + ?Sized,
{
    let (root, chunks) = split(data)?;
    let children = &chunks[..chunks.len().saturating_sub(1)];

    let pending: Vec<_> = children
        .iter()
        .map(|chunk| put_limited(store, stamper, chunk, options, limit))
        .collect();
    future::try_join_all(pending).await?;

    let receipt = put_limited(store, stamper, &root, options, limit).await?;
    debug!(
        address = %root.address(),
        size = data.len(),
        chunks = chunks.len(),
        "uploaded"
    );

    Ok(UploadResult {
        reference: Reference::Plain(*root.address()),
        history_address: receipt.history_address,
    })
}

async fn put_limited<S, T>(
    store: &S,
    stamper: &T,
    chunk: &impl Chunk,
    options: &S::Options,
    limit: &RequestLimit,
) -> Result<PutReceipt>
where
    S: ChunkStore + ?Sized,
    T: Stamper + ?Sized,
{
    let _permit = limit.acquire().await?;
    put_chunk(store, stamper, chunk, options).await
}
