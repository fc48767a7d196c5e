//! Saving and loading a trie through a chunk store.
//!
//! Every node is stored as a file of its own: a node that encodes to more
//! than 4096 bytes becomes a small chunk tree, and its reference is the root
//! of that tree.

use futures::future::{self, BoxFuture};
use pollen_file::{RequestLimit, UploadResult};
use pollen_postage::Stamper;
use pollen_primitives::Reference;
use pollen_store::ChunkStore;
use tracing::{debug, trace};

use crate::{MantarayNode, Result};

/// Default number of store requests in flight during a save or load.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Options for recursive saves and loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOptions {
    /// Store requests in flight at once, across the whole trie and the
    /// chunks of every node. 0 is treated as 1.
    pub concurrency: usize,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl PersistOptions {
    /// Options with the given concurrency.
    pub const fn new(concurrency: usize) -> Self {
        Self { concurrency }
    }

    fn limit(&self) -> RequestLimit {
        RequestLimit::new(self.concurrency)
    }
}

impl MantarayNode {
    /// Stores every changed node, children before parents.
    ///
    /// Nodes untouched since the last save or load keep their reference and
    /// are not stored again. Returns the reference of this node; the history
    /// address is the one the store reported for it, if it was stored in
    /// this call.
    pub async fn save_recursively<S, T>(
        &mut self,
        store: &S,
        stamper: &T,
        options: &S::Options,
        persist: PersistOptions,
    ) -> Result<UploadResult>
    where
        S: ChunkStore + ?Sized,
        T: Stamper + ?Sized,
    {
        let result = self
            .save_node(store, stamper, options, &persist.limit())
            .await?;
        debug!(reference = %result.reference, "manifest saved");
        Ok(result)
    }

    fn save_node<'a, S, T>(
        &'a mut self,
        store: &'a S,
        stamper: &'a T,
        options: &'a S::Options,
        limit: &'a RequestLimit,
    ) -> BoxFuture<'a, Result<UploadResult>>
    where
        S: ChunkStore + ?Sized,
        T: Stamper + ?Sized,
    {
        Box::pin(async move {
            if let Some(reference) = self.self_address {
                return Ok(UploadResult {
                    reference,
                    history_address: None,
                });
            }

            let pending: Vec<_> = self
                .forks
                .values_mut()
                .map(|child| child.save_node(store, stamper, options, limit))
                .collect();
            future::try_join_all(pending).await?;

            let data = self.marshal()?;
            let result = pollen_file::upload_with(store, stamper, &data, options, limit).await?;
            trace!(reference = %result.reference, size = data.len(), "node saved");

            self.self_address = Some(result.reference);
            Ok(result)
        })
    }

    /// Fetches and decodes the node at `reference`, leaving its forks unloaded.
    pub async fn from_reference<S>(
        store: &S,
        reference: &Reference,
        options: &S::Options,
        persist: PersistOptions,
    ) -> Result<Self>
    where
        S: ChunkStore + ?Sized,
    {
        let data = pollen_file::join_with(store, reference, options, &persist.limit()).await?;
        let mut node = Self::unmarshal(&data)?;
        node.self_address = Some(*reference);
        Ok(node)
    }

    /// Fetches the whole trie below `reference`.
    pub async fn load<S>(
        store: &S,
        reference: &Reference,
        options: &S::Options,
        persist: PersistOptions,
    ) -> Result<Self>
    where
        S: ChunkStore + ?Sized,
    {
        let mut node = Self::from_reference(store, reference, options, persist).await?;
        node.load_recursively(store, options, persist).await?;
        Ok(node)
    }

    /// Fetches every unloaded node below this one.
    ///
    /// Nodes are fetched concurrently, in no particular order, with at most
    /// the configured number of store requests in flight for the whole trie.
    pub async fn load_recursively<S>(
        &mut self,
        store: &S,
        options: &S::Options,
        persist: PersistOptions,
    ) -> Result<()>
    where
        S: ChunkStore + ?Sized,
    {
        self.load_node(store, options, &persist.limit()).await?;
        debug!(reference = ?self.self_address, "manifest loaded");
        Ok(())
    }

    fn load_node<'a, S>(
        &'a mut self,
        store: &'a S,
        options: &'a S::Options,
        limit: &'a RequestLimit,
    ) -> BoxFuture<'a, Result<()>>
    where
        S: ChunkStore + ?Sized,
    {
        Box::pin(async move {
            if let (Some(_), Some(reference)) = (self.lazy_flags, self.self_address) {
                let data = pollen_file::join_with(store, &reference, options, limit).await?;
                let loaded = Self::unmarshal(&data)?;
                trace!(%reference, forks = loaded.forks.len(), "node loaded");

                // Prefix and metadata live in the parent and are already known
                self.entry = loaded.entry;
                self.forks = loaded.forks;
                self.obfuscation_key = loaded.obfuscation_key;
                self.lazy_flags = None;
            }

            let pending: Vec<_> = self
                .forks
                .values_mut()
                .map(|child| child.load_node(store, options, limit))
                .collect();
            future::try_join_all(pending).await?;
            Ok(())
        })
    }
}
