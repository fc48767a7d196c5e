//! Streaming chunk tree.
//!
//! Input is cut into 4096 byte leaves. Every level above the leaves collects
//! up to 128 child references; a full level is wrapped into an intermediate
//! chunk whose payload is the concatenated child addresses and whose span is
//! the number of file bytes beneath it. The wrapped reference moves one level
//! up. At most one leaf and one reference list per level are held in memory.

use bytes::{Bytes, BytesMut};
use pollen_primitives::{Chunk, ChunkAddress, ContentChunk, MAX_CHUNK_SIZE, bmt::BRANCHES};

use crate::Result;

/// A child reference waiting in a level: address and span.
type PendingRef = (ChunkAddress, u64);

/// Builds the chunk tree of a byte stream.
///
/// The sink sees every chunk exactly once, leaves in input order and each
/// intermediate chunk after all of its children. The last chunk it sees is the
/// root.
///
/// ```
/// use pollen_file::ChunkTree;
/// use pollen_primitives::Chunk;
///
/// let mut count = 0;
/// let mut tree = ChunkTree::new(|_| count += 1);
/// tree.append(b"hello").unwrap();
/// tree.append(b"world").unwrap();
/// let root = tree.finalize().unwrap();
///
/// assert_eq!(
///     root.address().to_string(),
///     "c3d78c959eb23a464619e893358a1d90e467f37c72742985ccc89159350098b4"
/// );
/// assert_eq!(count, 1);
/// ```
#[derive(Debug)]
pub struct ChunkTree<F> {
    sink: F,
    leaf: BytesMut,
    /// `levels[i]` holds references to chunks of height `i`, leaves being 0
    levels: Vec<Vec<PendingRef>>,
    last: Option<ContentChunk>,
}

impl<F> ChunkTree<F>
where
    F: FnMut(&ContentChunk),
{
    /// Creates an empty tree reporting chunks to `sink`.
    pub fn new(sink: F) -> Self {
        Self {
            sink,
            leaf: BytesMut::with_capacity(MAX_CHUNK_SIZE),
            levels: Vec::new(),
            last: None,
        }
    }

    /// Appends bytes to the stream.
    pub fn append(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            let take = (MAX_CHUNK_SIZE - self.leaf.len()).min(data.len());
            self.leaf.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.leaf.len() == MAX_CHUNK_SIZE {
                self.flush_leaf()?;
            }
        }
        Ok(())
    }

    /// Finishes the stream and returns the root chunk.
    ///
    /// Empty input produces a single empty leaf.
    pub fn finalize(mut self) -> Result<ContentChunk> {
        if !self.leaf.is_empty() {
            self.flush_leaf()?;
        }

        let mut level = 0;
        while level < self.levels.len() {
            let top = self.levels.iter().rposition(|refs| !refs.is_empty());
            match self.levels[level].len() {
                0 => {}
                1 if top == Some(level) => break,
                // A lone reference moves up unchanged
                1 => {
                    if let Some(pending) = self.levels[level].pop() {
                        self.push(level + 1, pending)?;
                    }
                }
                _ => self.wrap(level)?,
            }
            level += 1;
        }

        // The root is always the chunk emitted last
        match self.last {
            Some(root) => Ok(root),
            None => {
                let empty = ContentChunk::new(Bytes::new())?;
                (self.sink)(&empty);
                Ok(empty)
            }
        }
    }

    fn flush_leaf(&mut self) -> Result<()> {
        let data = self.leaf.split().freeze();
        let span = data.len() as u64;
        let address = self.emit(ContentChunk::new(data)?);
        self.push(0, (address, span))
    }

    fn push(&mut self, level: usize, pending: PendingRef) -> Result<()> {
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(pending);
        if self.levels[level].len() == BRANCHES {
            self.wrap(level)?;
        }
        Ok(())
    }

    fn wrap(&mut self, level: usize) -> Result<()> {
        let refs = std::mem::take(&mut self.levels[level]);
        let span = refs.iter().map(|(_, span)| span).sum();

        let mut payload = BytesMut::with_capacity(refs.len() * ChunkAddress::LENGTH);
        for (address, _) in &refs {
            payload.extend_from_slice(address.as_bytes());
        }

        let chunk = ContentChunk::from_span_and_payload(span, payload.freeze())?;
        let address = self.emit(chunk);
        self.push(level + 1, (address, span))
    }

    fn emit(&mut self, chunk: ContentChunk) -> ChunkAddress {
        (self.sink)(&chunk);
        let address = *chunk.address();
        self.last = Some(chunk);
        address
    }
}

impl<F> std::io::Write for ChunkTree<F>
where
    F: FnMut(&ContentChunk),
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.append(buf).map_err(std::io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Splits `data` into its chunk tree.
///
/// Returns the root and every chunk in emission order, root last.
pub fn split(data: &[u8]) -> Result<(ContentChunk, Vec<ContentChunk>)> {
    let mut chunks = Vec::with_capacity(chunk_count_hint(data.len()));
    let mut tree = ChunkTree::new(|chunk: &ContentChunk| chunks.push(chunk.clone()));
    tree.append(data)?;
    let root = tree.finalize()?;
    Ok((root, chunks))
}

/// Root address of `data` without keeping the chunks.
pub fn root_address(data: &[u8]) -> Result<ChunkAddress> {
    let mut tree = ChunkTree::new(|_: &ContentChunk| {});
    tree.append(data)?;
    Ok(*tree.finalize()?.address())
}

fn chunk_count_hint(len: usize) -> usize {
    let leaves = len.div_ceil(MAX_CHUNK_SIZE).max(1);
    leaves + leaves / (BRANCHES - 1) + 1
}
