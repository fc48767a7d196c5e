//! The in-memory manifest trie.

use std::collections::BTreeMap;

use alloy_primitives::B256;
use pollen_primitives::Reference;

use crate::{MantarayError, Result};

/// Longest prefix a single fork can carry. Longer paths are chained.
pub const MAX_PREFIX_LENGTH: usize = 30;

/// The byte separating path segments.
pub const PATH_SEPARATOR: u8 = b'/';

/// Node type flag: the node terminates a path.
pub const TYPE_VALUE: u8 = 2;
/// Node type flag: the node has forks.
pub const TYPE_EDGE: u8 = 4;
/// Node type flag: the prefix contains a path separator.
pub const TYPE_WITH_PATH_SEPARATOR: u8 = 8;
/// Node type flag: the fork carries metadata.
pub const TYPE_WITH_METADATA: u8 = 16;

/// String metadata attached to a fork, kept in key order.
pub type Metadata = BTreeMap<String, String>;

/// A node of the manifest trie.
///
/// A node owns the prefix of the fork leading to it, an optional entry, and
/// its forks keyed by the first byte of their prefix. Iteration over forks is
/// always in byte order.
///
/// Nodes decoded from a store start out unloaded: only their prefix,
/// metadata and reference are known until
/// [`load_recursively`](Self::load_recursively) fetches them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MantarayNode {
    pub(crate) path: Vec<u8>,
    pub(crate) entry: Option<Reference>,
    pub(crate) metadata: Option<Metadata>,
    pub(crate) forks: BTreeMap<u8, MantarayNode>,
    pub(crate) obfuscation_key: B256,
    /// Reference of the stored node; cleared by every change beneath it.
    pub(crate) self_address: Option<Reference>,
    /// Type flags from the parent's fork table while the node is unloaded.
    pub(crate) lazy_flags: Option<u8>,
}

impl MantarayNode {
    /// An empty root node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key the encoded node is masked with.
    #[must_use]
    pub fn with_obfuscation_key(mut self, key: B256) -> Self {
        self.obfuscation_key = key;
        self.self_address = None;
        self
    }

    /// The key the encoded node is masked with.
    pub const fn obfuscation_key(&self) -> B256 {
        self.obfuscation_key
    }

    /// Prefix of the fork leading to this node. Empty for the root.
    pub fn path(&self) -> &[u8] {
        &self.path
    }

    /// The reference this node resolves to, if it terminates a path.
    pub const fn entry(&self) -> Option<&Reference> {
        self.entry.as_ref()
    }

    /// Metadata stored with the fork leading to this node.
    pub const fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Reference of the node as last saved or loaded.
    pub const fn self_address(&self) -> Option<&Reference> {
        self.self_address.as_ref()
    }

    /// Forks in byte order of their first prefix byte.
    pub fn forks(&self) -> impl Iterator<Item = (u8, &Self)> {
        self.forks.iter().map(|(key, node)| (*key, node))
    }

    /// Whether the entry and forks of this node are resident.
    pub const fn is_loaded(&self) -> bool {
        self.lazy_flags.is_none()
    }

    /// Type flags written into the parent's fork table.
    pub fn node_type(&self) -> u8 {
        let mut flags = match self.lazy_flags {
            Some(flags) => flags & (TYPE_VALUE | TYPE_EDGE),
            None => {
                let mut flags = 0;
                if self.entry.is_some() {
                    flags |= TYPE_VALUE;
                }
                if !self.forks.is_empty() {
                    flags |= TYPE_EDGE;
                }
                flags
            }
        };

        if self.path == [PATH_SEPARATOR] {
            flags |= TYPE_VALUE;
        }
        if self.path.len() > 1 && self.path.contains(&PATH_SEPARATOR) {
            flags |= TYPE_WITH_PATH_SEPARATOR;
        }
        if self.metadata.is_some() {
            flags |= TYPE_WITH_METADATA;
        }
        flags
    }

    /// Maps `path` to `entry`, creating and splitting forks as needed.
    ///
    /// Adding an existing path replaces its entry and metadata. A `None`
    /// entry creates a node that only carries metadata, such as `/` with
    /// the website documents; passing neither is an error.
    pub fn add_fork(
        &mut self,
        path: impl AsRef<[u8]>,
        entry: Option<Reference>,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        let path = path.as_ref();
        if path.is_empty() {
            return Err(MantarayError::EmptyPath);
        }
        if entry.is_none() && metadata.is_none() {
            return Err(MantarayError::Metadata(
                "a fork needs an entry or metadata".into(),
            ));
        }
        self.insert(path, entry, metadata, path)
    }

    fn insert(
        &mut self,
        path: &[u8],
        entry: Option<Reference>,
        metadata: Option<Metadata>,
        full: &[u8],
    ) -> Result<()> {
        self.ensure_loaded(full)?;
        self.self_address = None;

        let key = path[0];
        let Some(child) = self.forks.get_mut(&key) else {
            self.forks.insert(key, Self::chain(path, entry, metadata));
            return Ok(());
        };

        let common = common_prefix(&child.path, path);
        if common == child.path.len() {
            if common == path.len() {
                child.ensure_loaded(full)?;
                child.entry = entry;
                child.metadata = metadata;
                child.self_address = None;
                return Ok(());
            }
            return child.insert(&path[common..], entry, metadata, full);
        }

        // Split the child at the shared prefix; its stored form stays valid
        child.ensure_rebalance(child.path.len() - common, full)?;
        let mut old = std::mem::take(child);
        let tail = old.path.split_off(common);
        let mut branch = Self {
            path: std::mem::replace(&mut old.path, tail),
            ..Self::default()
        };
        old.rebalance();
        branch.forks.insert(old.path[0], old);

        if common == path.len() {
            branch.entry = entry;
            branch.metadata = metadata;
        } else {
            let rest = &path[common..];
            branch.forks.insert(rest[0], Self::chain(rest, entry, metadata));
        }

        *child = branch;
        Ok(())
    }

    /// A fresh node for `path`, chained through entry-less links of
    /// [`MAX_PREFIX_LENGTH`] bytes when the path is longer.
    fn chain(path: &[u8], entry: Option<Reference>, metadata: Option<Metadata>) -> Self {
        if path.len() <= MAX_PREFIX_LENGTH {
            return Self {
                path: path.to_vec(),
                entry,
                metadata,
                ..Self::default()
            };
        }

        let (head, tail) = path.split_at(MAX_PREFIX_LENGTH);
        let mut link = Self {
            path: head.to_vec(),
            ..Self::default()
        };
        link.forks.insert(tail[0], Self::chain(tail, entry, metadata));
        link
    }

    /// Removes the entry and metadata of `path`.
    ///
    /// Nodes left without entry, metadata or forks are dropped, and a node
    /// left linking to a single fork is merged with it up to
    /// [`MAX_PREFIX_LENGTH`] bytes. The trie ends up as if `path` had never
    /// been added. On error the trie is left as it was.
    pub fn remove_fork(&mut self, path: impl AsRef<[u8]>) -> Result<()> {
        let path = path.as_ref();
        if path.is_empty() {
            return Err(MantarayError::EmptyPath);
        }
        self.ensure_loaded(path)?;

        let key = path[0];
        let child = self
            .forks
            .get(&key)
            .ok_or_else(|| MantarayError::path_not_found(path))?;

        // Only the subtree under `key` changes; it is edited as a copy
        let mut scratch = Self::default();
        scratch.forks.insert(key, child.clone());
        scratch.remove(path, path)?;

        self.self_address = None;
        match scratch.forks.remove(&key) {
            Some(child) => self.forks.insert(key, child),
            None => self.forks.remove(&key),
        };
        Ok(())
    }

    fn remove(&mut self, path: &[u8], full: &[u8]) -> Result<()> {
        self.ensure_loaded(full)?;

        let key = path[0];
        let child = self
            .forks
            .get_mut(&key)
            .filter(|child| path.starts_with(&child.path))
            .ok_or_else(|| MantarayError::path_not_found(full))?;

        let rest = &path[child.path.len()..];
        if rest.is_empty() {
            child.ensure_loaded(full)?;
            if child.entry.is_none() && child.metadata.is_none() {
                return Err(MantarayError::path_not_found(full));
            }
            child.entry = None;
            child.metadata = None;
            child.self_address = None;
        } else {
            child.remove(rest, full)?;
        }

        self.self_address = None;
        if child.is_vacant() {
            self.forks.remove(&key);
        } else {
            child.ensure_rebalance(child.path.len(), full)?;
            child.rebalance();
        }
        Ok(())
    }

    fn is_vacant(&self) -> bool {
        self.lazy_flags.is_none()
            && self.entry.is_none()
            && self.metadata.is_none()
            && self.forks.is_empty()
    }

    /// A loaded node that only leads on to a single fork.
    fn is_bare_link(&self) -> bool {
        self.lazy_flags.is_none()
            && self.entry.is_none()
            && self.metadata.is_none()
            && self.forks.len() == 1
    }

    /// Whether the node ends a path someone added.
    const fn is_terminal(&self) -> bool {
        self.metadata.is_some()
            || match self.lazy_flags {
                Some(flags) => flags & TYPE_VALUE != 0,
                None => self.entry.is_some(),
            }
    }

    /// Gives a bare link the shape [`chain`](Self::chain) builds: its prefix
    /// is topped up to [`MAX_PREFIX_LENGTH`] bytes from its only fork, and
    /// the fork is absorbed once nothing of its prefix is left. Repeats down
    /// the chain.
    ///
    /// Forks keep their references: a stored node does not contain the
    /// prefix leading to it. Unloaded nodes are left alone; see
    /// [`ensure_rebalance`](Self::ensure_rebalance).
    fn rebalance(&mut self) {
        if self.path.len() >= MAX_PREFIX_LENGTH || !self.is_bare_link() {
            return;
        }
        let Some((_, mut only)) = self.forks.pop_first() else {
            return;
        };

        let moved = (MAX_PREFIX_LENGTH - self.path.len()).min(only.path.len());
        self.path.extend(only.path.drain(..moved));
        self.self_address = None;

        if only.path.is_empty() {
            only.path = std::mem::take(&mut self.path);
            *self = only;
            self.rebalance();
        } else {
            only.rebalance();
            self.forks.insert(only.path[0], only);
        }
    }

    /// Fails if rebalancing this node, once its prefix is `len` bytes long,
    /// would need a node that is not loaded.
    fn ensure_rebalance(&self, len: usize, full: &[u8]) -> Result<()> {
        if len >= MAX_PREFIX_LENGTH {
            return Ok(());
        }
        if let Some(flags) = self.lazy_flags {
            // Forks without a value may hide a bare link
            let may_link =
                self.metadata.is_none() && flags & TYPE_EDGE != 0 && flags & TYPE_VALUE == 0;
            return if may_link {
                Err(MantarayError::not_loaded(full))
            } else {
                Ok(())
            };
        }
        if !self.is_bare_link() {
            return Ok(());
        }

        match self.forks.values().next() {
            Some(only) => {
                let moved = (MAX_PREFIX_LENGTH - len).min(only.path.len());
                if moved == only.path.len() {
                    only.ensure_rebalance(len + moved, full)
                } else {
                    only.ensure_rebalance(only.path.len() - moved, full)
                }
            }
            None => Ok(()),
        }
    }

    /// The node ending the added path `path`.
    ///
    /// Returns `None` when the path was never added, including paths that
    /// only exist as a shared prefix of others, and when an unloaded node is
    /// in the way. An unloaded node counts as added when its parent marks it
    /// as a value. An empty path yields the node itself.
    pub fn find(&self, path: impl AsRef<[u8]>) -> Option<&Self> {
        let path = path.as_ref();
        let node = self.walk(path, path).ok()?;
        (path.is_empty() || node.is_terminal()).then_some(node)
    }

    /// The entry stored at `path`.
    ///
    /// Unlike [`find`](Self::find) this distinguishes a missing path from one
    /// that runs into an unloaded node.
    pub fn lookup(&self, path: impl AsRef<[u8]>) -> Result<&Reference> {
        let path = path.as_ref();
        let node = self.walk(path, path)?;
        node.ensure_loaded(path)?;
        node.entry
            .as_ref()
            .ok_or_else(|| MantarayError::path_not_found(path))
    }

    fn walk(&self, path: &[u8], full: &[u8]) -> Result<&Self> {
        if path.is_empty() {
            return Ok(self);
        }
        self.ensure_loaded(full)?;

        let child = self
            .forks
            .get(&path[0])
            .filter(|child| path.starts_with(&child.path))
            .ok_or_else(|| MantarayError::path_not_found(full))?;
        child.walk(&path[child.path.len()..], full)
    }

    /// Every node with an entry, with its full path.
    ///
    /// Depth first, each node before its forks, forks in byte order.
    pub fn collect(&self) -> Result<Vec<(Vec<u8>, &Self)>> {
        let mut nodes = Vec::new();
        self.collect_into(&mut Vec::new(), &mut nodes)?;
        Ok(nodes)
    }

    fn collect_into<'a>(
        &'a self,
        prefix: &mut Vec<u8>,
        nodes: &mut Vec<(Vec<u8>, &'a Self)>,
    ) -> Result<()> {
        self.ensure_loaded(prefix)?;

        for child in self.forks.values() {
            let len = prefix.len();
            prefix.extend_from_slice(&child.path);
            child.ensure_loaded(prefix)?;
            if child.entry.is_some() {
                nodes.push((prefix.clone(), child));
            }
            child.collect_into(prefix, nodes)?;
            prefix.truncate(len);
        }
        Ok(())
    }

    /// Full path to entry for every node with an entry.
    ///
    /// Paths that are not valid UTF-8 are converted lossily.
    pub fn collect_and_map(&self) -> Result<BTreeMap<String, Reference>> {
        Ok(self
            .collect()?
            .into_iter()
            .filter_map(|(path, node)| {
                let entry = node.entry?;
                Some((String::from_utf8_lossy(&path).into_owned(), entry))
            })
            .collect())
    }

    /// Whether the trie has the shape a fresh build of its paths gives.
    ///
    /// No node below the root is empty, and every loaded node that only
    /// leads on to a single fork carries a full [`MAX_PREFIX_LENGTH`] prefix.
    pub fn is_compact(&self) -> bool {
        self.forks.values().all(|child| {
            !child.is_vacant()
                && !(child.is_bare_link() && child.path.len() < MAX_PREFIX_LENGTH)
                && child.is_compact()
        })
    }

    pub(crate) fn ensure_loaded(&self, path: &[u8]) -> Result<()> {
        if self.lazy_flags.is_some() {
            return Err(MantarayError::not_loaded(path));
        }
        Ok(())
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pollen_primitives::SwarmAddress;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn reference(byte: u8) -> Reference {
        Reference::Plain(SwarmAddress::new([byte; 32]))
    }

    fn paths(node: &MantarayNode) -> Vec<String> {
        node.collect_and_map().unwrap().into_keys().collect()
    }

    #[test]
    fn test_add_and_find() {
        let mut node = MantarayNode::new();
        node.add_fork("index.html", Some(reference(1)), None).unwrap();
        node.add_fork("img/logo.png", Some(reference(2)), None).unwrap();

        assert_eq!(node.find("index.html").and_then(|n| n.entry()), Some(&reference(1)));
        assert_eq!(node.lookup("img/logo.png").unwrap(), &reference(2));
        assert!(node.find("index").is_none());
        assert!(node.find("index.htmlx").is_none());
        assert_matches!(node.lookup("missing"), Err(MantarayError::PathNotFound(_)));
    }

    #[test]
    fn test_collect_is_byte_ordered() {
        let mut node = MantarayNode::new();
        for (i, path) in ["b", "ab", "a", "c/d", "c"].iter().enumerate() {
            node.add_fork(path, Some(reference(i as u8)), None).unwrap();
        }

        let collected: Vec<Vec<u8>> = node.collect().unwrap().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            collected,
            vec![b"a".to_vec(), b"ab".to_vec(), b"b".to_vec(), b"c".to_vec(), b"c/d".to_vec()]
        );
    }

    #[test]
    fn test_shared_prefix_is_split() {
        let mut node = MantarayNode::new();
        node.add_fork("foo", Some(reference(1)), None).unwrap();
        node.add_fork("fob", Some(reference(2)), None).unwrap();

        let (key, branch) = node.forks().next().unwrap();
        assert_eq!(key, b'f');
        assert_eq!(branch.path(), b"fo");
        assert_eq!(branch.entry(), None);

        let children: Vec<&[u8]> = branch.forks().map(|(_, n)| n.path()).collect();
        assert_eq!(children, vec![b"b".as_slice(), b"o".as_slice()]);
        assert!(node.is_compact());

        // The branch only exists as a shared prefix
        assert!(node.find("fo").is_none());
        assert_matches!(node.lookup("fo"), Err(MantarayError::PathNotFound(_)));
    }

    #[test]
    fn test_fork_needs_entry_or_metadata() {
        let mut node = MantarayNode::new();
        assert_matches!(node.add_fork("a", None, None), Err(MantarayError::Metadata(_)));
        assert_eq!(node, MantarayNode::new());
    }

    #[test]
    fn test_split_inside_chain_matches_fresh_build() {
        let long = format!("bb{}", "x".repeat(MAX_PREFIX_LENGTH));

        let mut long_first = MantarayNode::new();
        long_first.add_fork(&long, Some(reference(1)), None).unwrap();
        long_first.add_fork("bbbb", Some(reference(2)), None).unwrap();

        let mut short_first = MantarayNode::new();
        short_first.add_fork("bbbb", Some(reference(2)), None).unwrap();
        short_first.add_fork(&long, Some(reference(1)), None).unwrap();

        assert_eq!(long_first, short_first);
        assert!(long_first.is_compact());

        let (_, branch) = long_first.forks().next().unwrap();
        assert_eq!(branch.path(), b"bb");
        let children: Vec<&[u8]> = branch.forks().map(|(_, n)| n.path()).collect();
        assert_eq!(children, vec![b"bb".as_slice(), "x".repeat(MAX_PREFIX_LENGTH).as_bytes()]);
    }

    #[test]
    fn test_remove_refills_chain() {
        let long = format!("bb{}", "x".repeat(MAX_PREFIX_LENGTH));

        let mut fresh = MantarayNode::new();
        fresh.add_fork(&long, Some(reference(1)), None).unwrap();

        let mut node = MantarayNode::new();
        node.add_fork("bbbb", Some(reference(2)), None).unwrap();
        node.add_fork(&long, Some(reference(1)), None).unwrap();
        node.remove_fork("bbbb").unwrap();

        assert_eq!(node, fresh);
        let (_, link) = node.forks().next().unwrap();
        assert_eq!(link.path().len(), MAX_PREFIX_LENGTH);
        let (_, leaf) = link.forks().next().unwrap();
        assert_eq!(leaf.path(), b"xx");
    }

    #[test]
    fn test_prefix_of_existing_path() {
        let mut node = MantarayNode::new();
        node.add_fork("foobar", Some(reference(1)), None).unwrap();
        node.add_fork("foo", Some(reference(2)), None).unwrap();

        let foo = node.find("foo").unwrap();
        assert_eq!(foo.entry(), Some(&reference(2)));
        assert_eq!(foo.find("bar").and_then(|n| n.entry()), Some(&reference(1)));
        assert_eq!(paths(&node), vec!["foo", "foobar"]);
    }

    #[test]
    fn test_overwrite() {
        let mut node = MantarayNode::new();
        let meta = Metadata::from([("Content-Type".to_string(), "text/html".to_string())]);
        node.add_fork("a", Some(reference(1)), Some(meta)).unwrap();
        node.add_fork("a", Some(reference(2)), None).unwrap();

        let a = node.find("a").unwrap();
        assert_eq!(a.entry(), Some(&reference(2)));
        assert_eq!(a.metadata(), None);
        assert_eq!(node.forks.len(), 1);
    }

    #[test]
    fn test_empty_path() {
        let mut node = MantarayNode::new();
        assert_matches!(node.add_fork("", Some(reference(1)), None), Err(MantarayError::EmptyPath));
        assert_matches!(node.remove_fork(""), Err(MantarayError::EmptyPath));
    }

    #[test]
    fn test_remove_collapses_prefix() {
        let mut node = MantarayNode::new();
        node.add_fork("foo", Some(reference(1)), None).unwrap();
        node.add_fork("foobar", Some(reference(2)), None).unwrap();

        node.remove_fork("foo").unwrap();

        assert_eq!(node.lookup("foobar").unwrap(), &reference(2));
        assert!(node.find("foo").is_none());
        assert!(node.is_compact());
        let (_, only) = node.forks().next().unwrap();
        assert_eq!(only.path(), b"foobar");
    }

    #[test]
    fn test_remove_restores_previous_shape() {
        let mut before = MantarayNode::new();
        before.add_fork("foo", Some(reference(1)), None).unwrap();

        let mut after = before.clone();
        after.add_fork("fob", Some(reference(2)), None).unwrap();
        after.remove_fork("fob").unwrap();

        assert_eq!(after, before);
    }

    #[test]
    fn test_remove_missing() {
        let mut node = MantarayNode::new();
        node.add_fork("foobar", Some(reference(1)), None).unwrap();

        // "foo" exists only as part of a prefix
        assert_matches!(node.remove_fork("foo"), Err(MantarayError::PathNotFound(p)) if p == "foo");
        assert_matches!(node.remove_fork("x"), Err(MantarayError::PathNotFound(_)));
        assert_eq!(paths(&node), vec!["foobar"]);
    }

    #[test]
    fn test_long_paths_are_chained() {
        let long = "a".repeat(70);
        let mut node = MantarayNode::new();
        node.add_fork(&long, Some(reference(1)), None).unwrap();

        let (_, first) = node.forks().next().unwrap();
        assert_eq!(first.path().len(), MAX_PREFIX_LENGTH);
        assert_eq!(node.lookup(&long).unwrap(), &reference(1));
        assert_eq!(paths(&node), vec![long.clone()]);

        // A diverging path splits inside the chain
        let other = format!("{}b", "a".repeat(35));
        node.add_fork(&other, Some(reference(2)), None).unwrap();
        assert_eq!(node.lookup(&other).unwrap(), &reference(2));
        assert_eq!(node.lookup(&long).unwrap(), &reference(1));

        node.remove_fork(&other).unwrap();
        assert!(node.is_compact());
        assert_eq!(paths(&node), vec![long]);
    }

    #[test]
    fn test_unicode_paths() {
        let mut node = MantarayNode::new();
        node.add_fork("ünïcödé/文件.txt", Some(reference(1)), None).unwrap();
        node.add_fork("ünïcödé/ファイル.txt", Some(reference(2)), None).unwrap();

        assert_eq!(paths(&node), vec!["ünïcödé/ファイル.txt", "ünïcödé/文件.txt"]);
    }

    #[test]
    fn test_node_type() {
        let mut node = MantarayNode::new();
        let meta = Metadata::from([("k".to_string(), "v".to_string())]);
        node.add_fork("/", None, Some(meta)).unwrap();
        node.add_fork("dir/file", Some(reference(1)), None).unwrap();
        node.add_fork("dir/file/more", Some(reference(2)), None).unwrap();

        assert_eq!(node.find("/").unwrap().node_type(), TYPE_VALUE | TYPE_WITH_METADATA);
        assert_eq!(
            node.find("dir/file").unwrap().node_type(),
            TYPE_VALUE | TYPE_EDGE | TYPE_WITH_PATH_SEPARATOR
        );
        assert_eq!(
            node.find("dir/file/more").unwrap().node_type(),
            TYPE_VALUE | TYPE_WITH_PATH_SEPARATOR
        );
    }

    #[test]
    fn test_unloaded_node_blocks_walk() {
        let mut node = MantarayNode::new();
        node.add_fork("abc", Some(reference(1)), None).unwrap();
        if let Some(child) = node.forks.get_mut(&b'a') {
            child.lazy_flags = Some(TYPE_VALUE);
            child.self_address = Some(reference(9));
        }

        assert!(node.find("abc").is_some());
        assert_matches!(node.lookup("abc"), Err(MantarayError::NotLoaded { .. }));
        assert_matches!(node.collect(), Err(MantarayError::NotLoaded { .. }));
        assert_matches!(
            node.add_fork("abc", Some(reference(2)), None),
            Err(MantarayError::NotLoaded { .. })
        );
        // Splitting above an unloaded node leaves it untouched
        node.add_fork("ab", Some(reference(3)), None).unwrap();
        assert_eq!(node.find("abc").and_then(|n| n.self_address()), Some(&reference(9)));
    }

    #[test]
    fn test_unloaded_link_blocks_split() {
        let mut node = MantarayNode::new();
        node.add_fork("abcd", Some(reference(1)), None).unwrap();
        node.add_fork("abce", Some(reference(2)), None).unwrap();
        node.add_fork("a", Some(reference(3)), None).unwrap();
        // "bc" could turn out to be a link that needs refilling
        if let Some(child) = node.forks.get_mut(&b'a').and_then(|a| a.forks.get_mut(&b'b')) {
            child.forks.clear();
            child.lazy_flags = Some(TYPE_EDGE);
            child.self_address = Some(reference(9));
        }
        let before = node.clone();

        assert_matches!(node.add_fork("ab", Some(reference(4)), None), Err(MantarayError::NotLoaded { .. }));
        assert_matches!(node.remove_fork("a"), Err(MantarayError::NotLoaded { .. }));
        assert_eq!(node, before);
    }

    proptest! {
        #[test]
        fn test_add_remove_keeps_mapping(
            paths in proptest::collection::btree_set("[ab/]{1,40}", 1..24),
            removals in proptest::collection::vec(any::<prop::sample::Index>(), 0..12),
        ) {
            let mut node = MantarayNode::new();
            let mut expected = BTreeMap::new();
            for (i, path) in paths.iter().enumerate() {
                let entry = reference(i as u8);
                node.add_fork(path, Some(entry), None).unwrap();
                expected.insert(path.clone(), entry);
            }
            prop_assert_eq!(&node.collect_and_map().unwrap(), &expected);

            let paths: Vec<&String> = paths.iter().collect();
            let mut removed = BTreeSet::new();
            for index in removals {
                let path = paths[index.index(paths.len())];
                if removed.insert(path.clone()) {
                    node.remove_fork(path).unwrap();
                    expected.remove(path);
                }
            }

            prop_assert_eq!(&node.collect_and_map().unwrap(), &expected);
            prop_assert!(node.is_compact());

            let mut fresh = MantarayNode::new();
            for (path, entry) in expected.iter().rev() {
                fresh.add_fork(path, Some(*entry), None).unwrap();
            }
            prop_assert_eq!(node, fresh);
        }
    }
}
