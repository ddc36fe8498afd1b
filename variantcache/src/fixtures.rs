//! In-memory collaborators and constants, to exercise the cache without a
//! real namespace or remote side.
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::path::NodePath;
use crate::provider::{BytesExtractor, NamespaceProvider, RemoteProvider, VariantHandle};
use crate::{ByteDescriptor, Depth, Error, LocalNode, NodeKind};

lazy_static! {
    pub static ref REV_A: ByteDescriptor = vec![0x00, 0x00, 0x00, 0x01].into();
    pub static ref REV_B: ByteDescriptor = vec![0x00, 0x00, 0x00, 0x02].into();
    pub static ref REV_C: ByteDescriptor = vec![0x00, 0x00, 0x00, 0x03].into();
    pub static ref REV_EMPTY: ByteDescriptor = Vec::new().into();
}

/// Parses `path` into a container node. Panics on invalid paths.
pub fn node(path: &str) -> LocalNode {
    LocalNode::container(path).expect("invalid fixture path")
}

/// Parses `path` into a leaf node. Panics on invalid paths.
pub fn leaf(path: &str) -> LocalNode {
    LocalNode::leaf(path).expect("invalid fixture path")
}

#[derive(Clone, Debug)]
struct NamespaceEntry {
    node: LocalNode,
    phantom: bool,
}

#[derive(Default)]
struct NamespaceState {
    nodes: BTreeMap<NodePath, NamespaceEntry>,
    closed: HashSet<NodePath>,
    failing: HashSet<NodePath>,
}

/// A local namespace kept in memory.
/// The namespace root always exists. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryNamespace {
    inner: Arc<RwLock<NamespaceState>>,
}

impl MemoryNamespace {
    fn add(&self, node: LocalNode, phantom: bool) -> LocalNode {
        self.inner.write().nodes.insert(
            node.path().clone(),
            NamespaceEntry {
                node: node.clone(),
                phantom,
            },
        );
        node
    }

    pub fn add_container(&self, path: &str) -> LocalNode {
        self.add(node(path), false)
    }

    pub fn add_leaf(&self, path: &str) -> LocalNode {
        self.add(leaf(path), false)
    }

    /// Adds a node that doesn't exist, but is still tracked.
    pub fn add_phantom(&self, path: &str, kind: NodeKind) -> LocalNode {
        self.add(LocalNode::new(path.parse().expect("invalid fixture path"), kind), true)
    }

    /// Removes the node at `path` and everything below it.
    pub fn remove(&self, path: &str) {
        let path: NodePath = path.parse().expect("invalid fixture path");
        self.inner.write().nodes.retain(|p, _| !p.starts_with(&path));
    }

    /// Makes the top-level container at `path` inaccessible.
    pub fn close(&self, path: &str) {
        self.inner
            .write()
            .closed
            .insert(path.parse().expect("invalid fixture path"));
    }

    /// Makes listing the children of `path` fail.
    pub fn fail_children(&self, path: &str) {
        self.inner
            .write()
            .failing
            .insert(path.parse().expect("invalid fixture path"));
    }
}

#[async_trait]
impl NamespaceProvider for MemoryNamespace {
    fn exists(&self, node: &LocalNode) -> bool {
        node.path().is_root()
            || self
                .inner
                .read()
                .nodes
                .get(node.path())
                .is_some_and(|e| !e.phantom)
    }

    fn is_phantom(&self, node: &LocalNode) -> bool {
        self.inner
            .read()
            .nodes
            .get(node.path())
            .is_some_and(|e| e.phantom)
    }

    fn is_accessible(&self, container: &LocalNode) -> bool {
        !self.inner.read().closed.contains(container.path())
    }

    async fn children(&self, node: &LocalNode) -> Result<Vec<LocalNode>, Error> {
        let state = self.inner.read();
        if state.failing.contains(node.path()) {
            return Err(Error::ProviderFailure(format!(
                "unable to list children of {}",
                node
            )));
        }

        Ok(state
            .nodes
            .values()
            .filter(|e| e.node.parent_path().as_ref() == Some(node.path()))
            .map(|e| e.node.clone())
            .collect())
    }
}

/// A variant served by [MemoryRemote].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryVariant {
    path: NodePath,
    name: String,
    container: bool,
    revision: ByteDescriptor,
}

impl MemoryVariant {
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn revision(&self) -> &ByteDescriptor {
        &self.revision
    }
}

impl VariantHandle for MemoryVariant {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_container(&self) -> bool {
        self.container
    }
}

#[derive(Default)]
struct RemoteState {
    variants: BTreeMap<NodePath, MemoryVariant>,
    failing: HashSet<NodePath>,
}

/// A remote side kept in memory, keyed by path.
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<RwLock<RemoteState>>,
    fetches: Arc<AtomicUsize>,
}

impl MemoryRemote {
    fn put(&self, path: &str, container: bool, revision: ByteDescriptor) {
        let path: NodePath = path.parse().expect("invalid fixture path");
        let name = path.file_name().unwrap_or_default().to_string();
        self.inner.write().variants.insert(
            path.clone(),
            MemoryVariant {
                path,
                name,
                container,
                revision,
            },
        );
    }

    pub fn put_container(&self, path: &str, revision: &ByteDescriptor) {
        self.put(path, true, revision.clone())
    }

    pub fn put_leaf(&self, path: &str, revision: &ByteDescriptor) {
        self.put(path, false, revision.clone())
    }

    /// Removes the variant at `path` and everything below it.
    pub fn remove(&self, path: &str) {
        let path: NodePath = path.parse().expect("invalid fixture path");
        self.inner
            .write()
            .variants
            .retain(|p, _| !p.starts_with(&path));
    }

    /// Makes fetching the variant at `path`, or its members, fail.
    pub fn fail(&self, path: &str) {
        self.inner
            .write()
            .failing
            .insert(path.parse().expect("invalid fixture path"));
    }

    /// Number of fetch_variant and fetch_members calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check(&self, path: &NodePath) -> Result<(), Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.inner.read().failing.contains(path) {
            return Err(Error::ProviderFailure(format!(
                "remote unavailable for {}",
                path
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteProvider for MemoryRemote {
    type Variant = MemoryVariant;

    async fn fetch_variant(
        &self,
        node: &LocalNode,
        _depth: Depth,
    ) -> Result<Option<MemoryVariant>, Error> {
        self.check(node.path())?;
        Ok(self.inner.read().variants.get(node.path()).cloned())
    }

    async fn fetch_members(&self, variant: &MemoryVariant) -> Result<Vec<MemoryVariant>, Error> {
        self.check(&variant.path)?;
        Ok(self
            .inner
            .read()
            .variants
            .values()
            .filter(|v| v.path.parent().as_ref() == Some(&variant.path))
            .cloned()
            .collect())
    }
}

/// Uses the revision of a [MemoryVariant] as its bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct RevisionBytes;

impl BytesExtractor<MemoryVariant> for RevisionBytes {
    fn bytes_of(&self, variant: &MemoryVariant) -> Result<ByteDescriptor, Error> {
        Ok(variant.revision.clone())
    }
}
