//! Mantaray manifests for Swarm.
//!
//! A manifest maps paths to references. It is a prefix-compressed trie in
//! which every node is stored as a chunk of its own, so a reader only fetches
//! the nodes on the paths it resolves.
//!
//! ```
//! use pollen_mantaray::MantarayNode;
//! use pollen_primitives::{Reference, SwarmAddress};
//!
//! let mut manifest = MantarayNode::new();
//! let reference = Reference::Plain(SwarmAddress::new([1; 32]));
//! manifest.add_fork("index.html", Some(reference), None).unwrap();
//! manifest.add_fork("img/logo.png", Some(reference), None).unwrap();
//!
//! assert_eq!(manifest.lookup("index.html").unwrap(), &reference);
//! assert_eq!(manifest.collect_and_map().unwrap().len(), 2);
//! ```
//!
//! Saving needs a [`ChunkStore`](pollen_store::ChunkStore) and a
//! [`Stamper`](pollen_postage::Stamper); see
//! [`MantarayNode::save_recursively`] and [`MantarayNode::load`].

mod error;
mod marshal;
mod metadata;
mod node;
mod persist;

pub use error::{MantarayError, Result};
pub use marshal::VERSION_HASH;
pub use metadata::{
    DocsMetadata, ERROR_DOCUMENT_KEY, FEED_OWNER_KEY, FEED_TOPIC_KEY, FEED_TYPE_KEY, FeedPointer,
    FeedType, FeedUpdate, INDEX_DOCUMENT_KEY, ROOT_PATH,
};
pub use node::{
    MAX_PREFIX_LENGTH, MantarayNode, Metadata, PATH_SEPARATOR, TYPE_EDGE, TYPE_VALUE,
    TYPE_WITH_METADATA, TYPE_WITH_PATH_SEPARATOR,
};
pub use persist::{DEFAULT_CONCURRENCY, PersistOptions};
