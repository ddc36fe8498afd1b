//! Collaborators the cache calls out to.
//!
//! The cache itself never looks at the local namespace or talks to the
//! version-providing system. These traits describe what it needs from them.
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{ByteDescriptor, Depth, Error, LocalNode};

/// Provides a view onto the local namespace.
#[async_trait]
pub trait NamespaceProvider: Send + Sync {
    /// Whether the node exists locally.
    fn exists(&self, node: &LocalNode) -> bool;

    /// Whether the node is a phantom: it doesn't exist, but the namespace
    /// still tracks it (e.g. a deleted file with outgoing changes).
    fn is_phantom(&self, node: &LocalNode) -> bool;

    /// Whether the given top-level container can be accessed.
    /// Refreshes below an inaccessible container are skipped.
    fn is_accessible(&self, container: &LocalNode) -> bool;

    /// Lists the local children of the node, including phantoms.
    /// Leaves and nodes that don't exist have no children.
    async fn children(&self, node: &LocalNode) -> Result<Vec<LocalNode>, Error>;
}

/// The variant of a node as seen by the remote side.
pub trait VariantHandle: Send + Sync {
    fn name(&self) -> &str;
    fn is_container(&self) -> bool;
}

/// Fetches variants from the remote side.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    type Variant: VariantHandle + 'static;

    /// Fetches the variant for the node, or Ok(None) if the remote side has
    /// no variant for it.
    /// `depth` is a hint, implementations may use it to prefetch descendants.
    async fn fetch_variant(
        &self,
        node: &LocalNode,
        depth: Depth,
    ) -> Result<Option<Self::Variant>, Error>;

    /// Fetches the children of a variant.
    async fn fetch_members(&self, variant: &Self::Variant) -> Result<Vec<Self::Variant>, Error>;
}

/// Derives the bytes to cache from a variant.
pub trait BytesExtractor<V>: Send + Sync {
    fn bytes_of(&self, variant: &V) -> Result<ByteDescriptor, Error>;
}

impl<V, F> BytesExtractor<V> for F
where
    F: Fn(&V) -> ByteDescriptor + Send + Sync,
{
    fn bytes_of(&self, variant: &V) -> Result<ByteDescriptor, Error> {
        Ok(self(variant))
    }
}

/// Decides whether `remote` is a later revision on the same line of descent
/// as `base`.
/// Implementations must be deterministic and free of side effects. They're
/// only called with two different descriptors.
pub trait DescentPredicate: Send + Sync {
    fn is_descendant(&self, node: &LocalNode, base: &ByteDescriptor, remote: &ByteDescriptor)
        -> bool;
}

impl<F> DescentPredicate for F
where
    F: Fn(&LocalNode, &ByteDescriptor, &ByteDescriptor) -> bool + Send + Sync,
{
    fn is_descendant(
        &self,
        node: &LocalNode,
        base: &ByteDescriptor,
        remote: &ByteDescriptor,
    ) -> bool {
        self(node, base, remote)
    }
}

/// Signals that an operation should be aborted.
pub trait Cancellation: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

impl Cancellation for CancellationToken {
    fn is_cancelled(&self) -> bool {
        CancellationToken::is_cancelled(self)
    }
}

/// A [Cancellation] that never fires.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Holds a lock on a subtree. The lock is released when this is dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    _inner: Box<dyn Send>,
}

impl LockGuard {
    pub fn new<T: Send + 'static>(inner: T) -> Self {
        Self {
            _inner: Box::new(inner),
        }
    }
}

/// Hands out exclusive locks on subtrees of the local namespace.
/// Acquisitions for overlapping subtrees must serialize.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Waits until the subtree rooted at `node` can be locked exclusively.
    async fn acquire(&self, node: &LocalNode) -> Result<LockGuard, Error>;
}
