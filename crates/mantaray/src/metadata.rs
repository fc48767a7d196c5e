//! Well-known metadata on the `/` node: website documents and feed pointers.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use bytes::Bytes;
use pollen_primitives::feed::{Topic, feed_update_address};
use pollen_primitives::{Chunk, Reference, SingleOwnerChunk};
use pollen_store::{ChunkStore, StoreError};
use tracing::debug;

use crate::{MantarayError, MantarayNode, Metadata, Result};

/// Path of the node carrying manifest-wide metadata.
pub const ROOT_PATH: &str = "/";

/// Document served for the manifest root.
pub const INDEX_DOCUMENT_KEY: &str = "website-index-document";
/// Document served for missing paths.
pub const ERROR_DOCUMENT_KEY: &str = "website-error-document";
/// Owner of the feed the manifest points at.
pub const FEED_OWNER_KEY: &str = "swarm-feed-owner";
/// Topic of the feed the manifest points at.
pub const FEED_TOPIC_KEY: &str = "swarm-feed-topic";
/// Kind of the feed the manifest points at.
pub const FEED_TYPE_KEY: &str = "swarm-feed-type";

/// Index and error documents of a website manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocsMetadata {
    /// Path served for the root.
    pub index_document: Option<String>,
    /// Path served when a lookup fails.
    pub error_document: Option<String>,
}

/// How feed updates are indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FeedType {
    /// Updates at indices 0, 1, 2, …
    #[default]
    Sequence,
    /// Updates placed in time epochs.
    Epoch,
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sequence => "Sequence",
            Self::Epoch => "Epoch",
        })
    }
}

impl FromStr for FeedType {
    type Err = MantarayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Sequence" => Ok(Self::Sequence),
            "Epoch" => Ok(Self::Epoch),
            other => Err(MantarayError::Metadata(format!("unknown feed type {other:?}"))),
        }
    }
}

/// The feed a manifest resolves through instead of a static entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPointer {
    /// Address signing the updates.
    pub owner: Address,
    /// Feed topic.
    pub topic: Topic,
    /// Indexing scheme.
    pub feed_type: FeedType,
}

impl FeedPointer {
    /// A sequential feed pointer.
    pub const fn new(owner: Address, topic: Topic) -> Self {
        Self {
            owner,
            topic,
            feed_type: FeedType::Sequence,
        }
    }

    /// The `/` metadata describing this pointer.
    pub fn to_metadata(&self) -> Metadata {
        Metadata::from([
            (FEED_OWNER_KEY.to_string(), alloy_primitives::hex::encode(self.owner)),
            (FEED_TOPIC_KEY.to_string(), self.topic.to_string()),
            (FEED_TYPE_KEY.to_string(), self.feed_type.to_string()),
        ])
    }
}

/// The latest update found on a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUpdate {
    /// Index of the update.
    pub index: u64,
    /// Payload of the update chunk.
    pub payload: Bytes,
}

impl FeedUpdate {
    /// Reference carried by the update.
    ///
    /// Accepts a bare 32 or 64 byte reference, or one behind an 8 byte
    /// timestamp.
    pub fn reference(&self) -> Option<Reference> {
        match self.payload.len() {
            32 | 64 => Reference::from_slice(&self.payload).ok(),
            40 | 72 => Reference::from_slice(&self.payload[8..]).ok(),
            _ => None,
        }
    }

    /// Big-endian timestamp in front of a timestamped reference.
    pub fn timestamp(&self) -> Option<u64> {
        match self.payload.len() {
            40 | 72 => {
                let mut timestamp = [0u8; 8];
                timestamp.copy_from_slice(&self.payload[..8]);
                Some(u64::from_be_bytes(timestamp))
            }
            _ => None,
        }
    }
}

impl MantarayNode {
    /// A manifest that resolves through `pointer`.
    pub fn from_feed(pointer: &FeedPointer) -> Result<Self> {
        let mut node = Self::new();
        node.add_fork(ROOT_PATH, None, Some(pointer.to_metadata()))?;
        Ok(node)
    }

    /// Metadata of the `/` node.
    pub fn root_metadata(&self) -> Option<&Metadata> {
        self.find(ROOT_PATH)?.metadata()
    }

    /// Index and error documents, empty when the manifest has none.
    pub fn docs_metadata(&self) -> DocsMetadata {
        let Some(metadata) = self.root_metadata() else {
            return DocsMetadata::default();
        };
        DocsMetadata {
            index_document: metadata.get(INDEX_DOCUMENT_KEY).cloned(),
            error_document: metadata.get(ERROR_DOCUMENT_KEY).cloned(),
        }
    }

    /// Sets the website documents on the `/` node, keeping its other metadata.
    ///
    /// A `/` node left with neither metadata nor an entry is removed.
    pub fn set_docs_metadata(&mut self, docs: &DocsMetadata) -> Result<()> {
        let root = self.find(ROOT_PATH);
        let exists = root.is_some();
        let entry = root.and_then(|node| node.entry().copied());
        let mut metadata = root.and_then(|node| node.metadata().cloned()).unwrap_or_default();

        for (key, value) in [
            (INDEX_DOCUMENT_KEY, &docs.index_document),
            (ERROR_DOCUMENT_KEY, &docs.error_document),
        ] {
            match value {
                Some(value) => metadata.insert(key.to_string(), value.clone()),
                None => metadata.remove(key),
            };
        }

        if !metadata.is_empty() {
            return self.add_fork(ROOT_PATH, entry, Some(metadata));
        }
        match (exists, entry) {
            (_, Some(entry)) => self.add_fork(ROOT_PATH, Some(entry), None),
            (true, None) => self.remove_fork(ROOT_PATH),
            (false, None) => Ok(()),
        }
    }

    /// The feed this manifest points at, if any.
    ///
    /// A pointer without a type is sequential.
    pub fn feed_pointer(&self) -> Result<Option<FeedPointer>> {
        let Some(metadata) = self.root_metadata() else {
            return Ok(None);
        };
        let Some(owner) = metadata.get(FEED_OWNER_KEY) else {
            return Ok(None);
        };

        let owner = Address::from_str(owner)
            .map_err(|err| MantarayError::Metadata(format!("feed owner: {err}")))?;
        let topic = metadata
            .get(FEED_TOPIC_KEY)
            .ok_or_else(|| MantarayError::Metadata("feed owner without topic".into()))?;
        let topic = Topic::from_str(topic)
            .map_err(|err| MantarayError::Metadata(format!("feed topic: {err}")))?;
        let feed_type = metadata
            .get(FEED_TYPE_KEY)
            .map(|kind| kind.parse::<FeedType>())
            .transpose()?
            .unwrap_or_default();

        Ok(Some(FeedPointer {
            owner,
            topic,
            feed_type,
        }))
    }

    /// Follows the feed pointer to its latest update.
    ///
    /// Updates are read at indices 0, 1, 2, … until the first one the store
    /// does not have. Every update must be signed by the feed owner. Returns
    /// `None` when the manifest has no feed pointer or the feed no updates.
    pub async fn resolve_feed<S>(
        &self,
        store: &S,
        options: &S::Options,
    ) -> Result<Option<FeedUpdate>>
    where
        S: ChunkStore + ?Sized,
    {
        let Some(pointer) = self.feed_pointer()? else {
            return Ok(None);
        };
        if pointer.feed_type != FeedType::Sequence {
            return Err(MantarayError::Metadata(format!(
                "cannot resolve {} feeds",
                pointer.feed_type
            )));
        }

        let mut latest = None;
        for index in 0u64.. {
            let address = feed_update_address(&pointer.owner, &pointer.topic, index);
            let bytes = match store.get(&address, options).await {
                Ok(bytes) => bytes,
                Err(StoreError::NotFound(_)) => break,
                Err(err) => return Err(err.into()),
            };

            let update = SingleOwnerChunk::unmarshal(bytes, &pointer.owner)?;
            update.verify(&address)?;
            latest = Some(FeedUpdate {
                index,
                payload: update.data().clone(),
            });
        }

        debug!(
            owner = %pointer.owner,
            topic = %pointer.topic,
            index = ?latest.as_ref().map(|update| update.index),
            "feed resolved"
        );
        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, address};
    use assert_matches::assert_matches;

    #[test]
    fn test_docs_metadata() {
        let mut node = MantarayNode::new();
        assert_eq!(node.docs_metadata(), DocsMetadata::default());

        let docs = DocsMetadata {
            index_document: Some("index.html".into()),
            error_document: Some("404.html".into()),
        };
        node.set_docs_metadata(&docs).unwrap();
        assert_eq!(node.docs_metadata(), docs);

        // The node is a value node even without an entry
        let root = node.find(ROOT_PATH).unwrap();
        assert_eq!(root.entry(), None);
        assert_ne!(root.node_type() & crate::node::TYPE_VALUE, 0);

        node.set_docs_metadata(&DocsMetadata {
            index_document: Some("home.html".into()),
            error_document: None,
        })
        .unwrap();
        assert_eq!(node.docs_metadata().index_document.as_deref(), Some("home.html"));
        assert_eq!(node.docs_metadata().error_document, None);
    }

    #[test]
    fn test_clearing_docs_drops_empty_root_fork() {
        let mut node = MantarayNode::new();
        node.set_docs_metadata(&DocsMetadata::default()).unwrap();
        assert_eq!(node, MantarayNode::new());

        node.set_docs_metadata(&DocsMetadata {
            index_document: Some("index.html".into()),
            error_document: None,
        })
        .unwrap();
        node.set_docs_metadata(&DocsMetadata::default()).unwrap();
        assert!(node.find(ROOT_PATH).is_none());
        assert_eq!(node.forks().count(), 0);

        // An entry at `/` outlives its metadata
        let entry = Reference::Plain(pollen_primitives::SwarmAddress::new([7; 32]));
        let metadata = Metadata::from([(INDEX_DOCUMENT_KEY.to_string(), "a.html".to_string())]);
        node.add_fork(ROOT_PATH, Some(entry), Some(metadata)).unwrap();
        node.set_docs_metadata(&DocsMetadata::default()).unwrap();
        let root = node.find(ROOT_PATH).unwrap();
        assert_eq!(root.entry(), Some(&entry));
        assert_eq!(root.metadata(), None);
    }

    #[test]
    fn test_feed_pointer() {
        let pointer = FeedPointer::new(
            address!("8d3766440f0d7b949a5e32995d09619a7f86e632"),
            Topic::from_string("my-site"),
        );
        let node = MantarayNode::from_feed(&pointer).unwrap();

        assert_eq!(node.feed_pointer().unwrap(), Some(pointer));
        assert_eq!(
            node.root_metadata().and_then(|m| m.get(FEED_TYPE_KEY)).map(String::as_str),
            Some("Sequence")
        );
        assert_eq!(MantarayNode::new().feed_pointer().unwrap(), None);
    }

    #[test]
    fn test_feed_pointer_invalid() {
        let mut node = MantarayNode::new();
        let metadata = Metadata::from([(FEED_OWNER_KEY.to_string(), "not hex".to_string())]);
        node.add_fork(ROOT_PATH, None, Some(metadata)).unwrap();
        assert_matches!(node.feed_pointer(), Err(MantarayError::Metadata(_)));

        let mut metadata = FeedPointer::new(Address::ZERO, Topic(B256::ZERO)).to_metadata();
        metadata.insert(FEED_TYPE_KEY.to_string(), "Weekly".to_string());
        node.add_fork(ROOT_PATH, None, Some(metadata)).unwrap();
        assert_matches!(node.feed_pointer(), Err(MantarayError::Metadata(_)));
    }

    #[test]
    fn test_feed_update_reference() {
        let reference = Reference::Plain(pollen_primitives::SwarmAddress::new([3; 32]));

        let bare = FeedUpdate {
            index: 0,
            payload: Bytes::from(reference.to_vec()),
        };
        assert_eq!(bare.reference(), Some(reference));
        assert_eq!(bare.timestamp(), None);

        let mut payload = 1_700_000_000u64.to_be_bytes().to_vec();
        payload.extend_from_slice(&reference.to_vec());
        let timestamped = FeedUpdate {
            index: 1,
            payload: Bytes::from(payload),
        };
        assert_eq!(timestamped.reference(), Some(reference));
        assert_eq!(timestamped.timestamp(), Some(1_700_000_000));

        let other = FeedUpdate {
            index: 2,
            payload: Bytes::from_static(b"hello"),
        };
        assert_eq!(other.reference(), None);
    }
}
