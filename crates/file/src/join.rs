//! Reassembling data from a chunk tree.

use bytes::{Bytes, BytesMut};
use futures::future::{self, BoxFuture};
use pollen_primitives::{BmtChunk, Chunk, ContentChunk, MAX_CHUNK_SIZE, Reference, SwarmAddress};
use pollen_store::ChunkStore;
use tracing::{debug, trace};

use crate::{FileError, RequestLimit, Result};

/// Fetches a content-addressed chunk and checks it against its address.
pub async fn fetch_chunk<S>(
    store: &S,
    address: &SwarmAddress,
    options: &S::Options,
) -> Result<ContentChunk>
where
    S: ChunkStore + ?Sized,
{
    let bytes = store.get(address, options).await?;
    let chunk = ContentChunk::try_from(bytes)?;
    chunk.verify(address)?;
    Ok(chunk)
}

/// Reassembles the bytes beneath `reference`.
///
/// Chunks whose span exceeds 4096 bytes are intermediate: their payload is a
/// list of child addresses, joined in order. At most `concurrency` chunks of
/// the whole tree are fetched at a time; a value of 0 is treated as 1.
///
/// Store failures are returned as they are and never retried.
pub async fn join<S>(
    store: &S,
    reference: &Reference,
    options: &S::Options,
    concurrency: usize,
) -> Result<Bytes>
where
    S: ChunkStore + ?Sized,
{
    join_with(store, reference, options, &RequestLimit::new(concurrency)).await
}

/// [`join`] with fetches counted against `limit`, which may be shared with
/// other traversals.
pub async fn join_with<S>(
    store: &S,
    reference: &Reference,
    options: &S::Options,
    limit: &RequestLimit,
) -> Result<Bytes>
where
    S: ChunkStore + ?Sized,
{
    let Reference::Plain(address) = reference else {
        return Err(FileError::EncryptedReference(*reference.address()));
    };

    let data = join_chunk(store, *address, options, limit).await?;
    debug!(%address, size = data.len(), "joined");
    Ok(data)
}

fn join_chunk<'a, S>(
    store: &'a S,
    address: SwarmAddress,
    options: &'a S::Options,
    limit: &'a RequestLimit,
) -> BoxFuture<'a, Result<Bytes>>
where
    S: ChunkStore + ?Sized,
{
    Box::pin(async move {
        let chunk = {
            let _permit = limit.acquire().await?;
            fetch_chunk(store, &address, options).await?
        };
        let span = chunk.span();
        trace!(%address, span, "chunk fetched");

        if span <= MAX_CHUNK_SIZE as u64 {
            let actual = chunk.data().len() as u64;
            if actual != span {
                return Err(FileError::SpanMismatch {
                    address,
                    expected: span,
                    actual,
                });
            }
            return Ok(chunk.data().clone());
        }

        let payload = chunk.data();
        if payload.is_empty() || payload.len() % SwarmAddress::LENGTH != 0 {
            return Err(FileError::InvalidIntermediate {
                address,
                len: payload.len(),
            });
        }

        let children = payload
            .chunks_exact(SwarmAddress::LENGTH)
            .map(SwarmAddress::from_slice)
            .collect::<pollen_primitives::Result<Vec<_>>>()?;

        let pending: Vec<_> = children
            .into_iter()
            .map(|child| join_chunk(store, child, options, limit))
            .collect();
        let parts = future::try_join_all(pending).await?;

        let actual: u64 = parts.iter().map(|part| part.len() as u64).sum();
        if actual != span {
            return Err(FileError::SpanMismatch {
                address,
                expected: span,
                actual,
            });
        }

        let mut data = BytesMut::with_capacity(actual as usize);
        for part in parts {
            data.extend_from_slice(&part);
        }
        Ok(data.freeze())
    })
}
