use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{instrument, trace};

use super::ByteStore;
use crate::path::NodePath;
use crate::{ByteDescriptor, CacheEntry, Depth, Error, LocalNode};

/// An in-memory [ByteStore], living as long as the session that created it.
///
/// Clones share the same underlying data.
#[derive(Clone, Default)]
pub struct SessionByteStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    /// Never contains [CacheEntry::Unknown], unknown nodes have no entry.
    entries: HashMap<LocalNode, CacheEntry>,

    /// Maps a parent path to the children with an entry in `entries`.
    /// Buckets are dropped as soon as they become empty.
    members: HashMap<NodePath, BTreeSet<LocalNode>>,

    disposed: bool,
}

impl Inner {
    fn check_usable(&self) -> Result<(), Error> {
        if self.disposed {
            return Err(Error::StorageError(
                "byte store has been disposed".to_string(),
            ));
        }
        Ok(())
    }

    /// Stores the entry, and adds the node to its parent's bucket.
    /// Returns true if the stored entry changed.
    /// Keys compare by path only, so the stored node is replaced as well, to
    /// pick up a changed kind.
    fn put(&mut self, node: &LocalNode, entry: CacheEntry) -> bool {
        let (kind_changed, entry_changed) = match self.entries.get_key_value(node) {
            Some((stored, stored_entry)) => {
                (stored.kind() != node.kind(), stored_entry != &entry)
            }
            None => (true, true),
        };
        if !kind_changed && !entry_changed {
            return false;
        }

        self.entries.remove(node);
        self.entries.insert(node.clone(), entry);
        if let Some(parent) = node.parent_path() {
            self.members.entry(parent).or_default().replace(node.clone());
        }

        entry_changed
    }

    fn remove(&mut self, node: &LocalNode, depth: Depth) -> bool {
        let mut removed = false;

        // Children can have entries even if their parent has none, so always
        // look at the bucket.
        if depth != Depth::Zero {
            let children: Vec<LocalNode> = self
                .members
                .get(node.path())
                .map(|children| children.iter().cloned().collect())
                .unwrap_or_default();

            for child in children {
                removed |= self.remove(&child, depth.for_children());
            }
        }

        if self.entries.remove(node).is_some() {
            if let Some(parent) = node.parent_path() {
                if let Some(bucket) = self.members.get_mut(&parent) {
                    bucket.remove(node);
                    if bucket.is_empty() {
                        self.members.remove(&parent);
                    }
                }
            }
            removed = true;
        }

        removed
    }
}

impl ByteStore for SessionByteStore {
    fn get_bytes(&self, node: &LocalNode) -> Result<Option<ByteDescriptor>, Error> {
        let inner = self.inner.read();
        inner.check_usable()?;

        Ok(inner.entries.get(node).and_then(|e| e.bytes()).cloned())
    }

    fn is_known(&self, node: &LocalNode) -> Result<bool, Error> {
        let inner = self.inner.read();
        inner.check_usable()?;

        Ok(inner.entries.contains_key(node))
    }

    #[instrument(skip_all, fields(node = %node, bytes = %bytes), level = "trace")]
    fn set_bytes(&self, node: &LocalNode, bytes: ByteDescriptor) -> Result<bool, Error> {
        let mut inner = self.inner.write();
        inner.check_usable()?;

        Ok(inner.put(node, CacheEntry::Present(bytes)))
    }

    #[instrument(skip_all, fields(node = %node), level = "trace")]
    fn set_absent(&self, node: &LocalNode) -> Result<bool, Error> {
        let mut inner = self.inner.write();
        inner.check_usable()?;

        Ok(inner.put(node, CacheEntry::Absent))
    }

    #[instrument(skip_all, fields(node = %node), level = "trace")]
    fn remove(&self, node: &LocalNode, depth: Depth) -> Result<bool, Error> {
        let mut inner = self.inner.write();
        inner.check_usable()?;

        Ok(inner.remove(node, depth))
    }

    fn members(&self, node: &LocalNode) -> Result<Vec<LocalNode>, Error> {
        let inner = self.inner.read();
        inner.check_usable()?;

        Ok(inner
            .members
            .get(node.path())
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn dispose(&self) -> Result<(), Error> {
        let mut inner = self.inner.write();
        trace!(entries = inner.entries.len(), "disposing session byte store");

        inner.entries.clear();
        inner.members.clear();
        inner.disposed = true;

        Ok(())
    }

    fn entry(&self, node: &LocalNode) -> Result<CacheEntry, Error> {
        let inner = self.inner.read();
        inner.check_usable()?;

        Ok(inner.entries.get(node).cloned().unwrap_or_default())
    }
}

/// Configuration for a [SessionByteStore].
/// There is nothing to configure, it only exists so session stores can be
/// described in store configs.
#[derive(serde::Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionByteStoreConfig {}

impl TryFrom<url::Url> for SessionByteStoreConfig {
    type Error = Error;
    fn try_from(url: url::Url) -> Result<Self, Self::Error> {
        // memory doesn't support host or path in the URL.
        if url.has_host() || !url.path().is_empty() {
            return Err(Error::InvalidRequest("invalid url".to_string()));
        }
        Ok(SessionByteStoreConfig {})
    }
}

impl SessionByteStoreConfig {
    pub fn build(&self) -> SessionByteStore {
        SessionByteStore::default()
    }
}
