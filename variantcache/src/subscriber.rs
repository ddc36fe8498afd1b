use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use crate::provider::{Cancellation, NamespaceProvider};
use crate::refresh::VariantTree;
use crate::{ByteDescriptor, Depth, Error, LocalNode, NodeKind};

/// Capacity of the change notification channel. Slow receivers lag behind
/// and miss the oldest notifications.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// What the local namespace says about a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalState {
    pub exists: bool,
    pub phantom: bool,
    pub kind: NodeKind,
}

/// The local, base and remote view of a single node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncInfo {
    pub node: LocalNode,
    pub local: LocalState,
    /// Only populated for three-way comparisons.
    pub base: Option<ByteDescriptor>,
    pub remote: Option<ByteDescriptor>,
}

/// Turns a [SyncInfo] into a classification, e.g. in sync, outgoing or
/// conflicting.
pub trait SyncComparator: Send + Sync {
    type Kind;

    /// Whether the comparison considers the base.
    fn is_three_way(&self) -> bool;

    fn compare(&self, info: &SyncInfo) -> Self::Kind;
}

/// Sent to subscribers whenever a refresh changed cached entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncChange {
    pub nodes: Vec<LocalNode>,
}

/// Exposes the sync state of the nodes below a set of roots, backed by a
/// remote [VariantTree] and, for three-way comparisons, a base one.
pub struct SyncSubscriber<N, C> {
    roots: Vec<LocalNode>,
    namespace: N,
    comparator: C,
    base: Option<Arc<dyn VariantTree>>,
    remote: Arc<dyn VariantTree>,
    changes: broadcast::Sender<SyncChange>,
}

impl<N, C> SyncSubscriber<N, C>
where
    N: NamespaceProvider,
    C: SyncComparator,
{
    pub fn new(
        roots: Vec<LocalNode>,
        namespace: N,
        comparator: C,
        remote: Arc<dyn VariantTree>,
        base: Option<Arc<dyn VariantTree>>,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            roots,
            namespace,
            comparator,
            base,
            remote,
            changes,
        }
    }

    pub fn roots(&self) -> &[LocalNode] {
        &self.roots
    }

    /// Whether the node is one of the roots, or lies below one.
    pub fn is_supervised(&self, node: &LocalNode) -> bool {
        self.roots
            .iter()
            .any(|root| node.path().starts_with(root.path()))
    }

    /// Returns a receiver for change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncChange> {
        self.changes.subscribe()
    }

    /// The base tree, if the comparison is three-way.
    fn base_tree(&self) -> Option<&Arc<dyn VariantTree>> {
        if self.comparator.is_three_way() {
            self.base.as_ref()
        } else {
            None
        }
    }

    /// Refreshes `roots` in the base tree (if three-way) and the remote tree,
    /// and notifies subscribers about the changes of every root.
    ///
    /// A root failing doesn't stop the remaining roots from being refreshed.
    /// Returns the changes of all roots, or [Error::RootsFailed] if any of
    /// them failed. Cancellation aborts the whole call.
    #[instrument(skip_all, fields(roots = roots.len(), ?depth))]
    pub async fn refresh(
        &self,
        roots: &[LocalNode],
        depth: Depth,
        cancel: &dyn Cancellation,
    ) -> Result<Vec<LocalNode>, Error> {
        let mut changed = Vec::new();
        let mut failures = Vec::new();

        for root in roots {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            match self.refresh_one(root, depth, cancel).await {
                Ok(root_changes) => changed.extend(root_changes),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!(root = %root, err = %e, "failed to refresh root");
                    failures.push((root.clone(), e));
                }
            }
        }

        if !failures.is_empty() {
            return Err(Error::RootsFailed { changed, failures });
        }
        Ok(changed)
    }

    async fn refresh_one(
        &self,
        root: &LocalNode,
        depth: Depth,
        cancel: &dyn Cancellation,
    ) -> Result<Vec<LocalNode>, Error> {
        let mut changes = Vec::new();
        if let Some(base) = self.base_tree() {
            changes.extend(base.refresh_root(root, depth, cancel).await?);
        }
        changes.extend(self.remote.refresh_root(root, depth, cancel).await?);

        // A node changing in both trees is reported once.
        let mut seen = HashSet::new();
        changes.retain(|node| seen.insert(node.clone()));

        self.notify(&changes);
        Ok(changes)
    }

    fn notify(&self, nodes: &[LocalNode]) {
        if nodes.is_empty() {
            return;
        }

        debug!(changed = nodes.len(), "notifying subscribers");
        // No receivers is fine.
        let _ = self.changes.send(SyncChange {
            nodes: nodes.to_vec(),
        });
    }

    /// Returns the local, base and remote view of the node, or Ok(None) if
    /// the node isn't supervised.
    ///
    /// Trees whose store can't answer for the node are refreshed for it
    /// first, at depth zero. A store layered over a base (such as a
    /// [crate::bytestore::DescendantTree]) answers from the base for nodes it
    /// holds no divergence for, so those are not refetched.
    #[instrument(skip(self, node, cancel), fields(node = %node))]
    pub async fn sync_info(
        &self,
        node: &LocalNode,
        cancel: &dyn Cancellation,
    ) -> Result<Option<SyncInfo>, Error> {
        if !self.is_supervised(node) {
            return Ok(None);
        }

        let mut changes = Vec::new();
        if let Some(base) = self.base_tree() {
            if !base.store().entry(node)?.is_known() {
                changes.extend(base.refresh_root(node, Depth::Zero, cancel).await?);
            }
        }
        if !self.remote.store().entry(node)?.is_known() {
            changes.extend(
                self.remote
                    .refresh_root(node, Depth::Zero, cancel)
                    .await?,
            );
        }
        self.notify(&changes);

        let base = match self.base_tree() {
            Some(base) => base.store().get_bytes(node)?,
            None => None,
        };

        Ok(Some(SyncInfo {
            node: node.clone(),
            local: LocalState {
                exists: self.namespace.exists(node),
                phantom: self.namespace.is_phantom(node),
                kind: node.kind(),
            },
            base,
            remote: self.remote.store().get_bytes(node)?,
        }))
    }

    /// Classifies the node with the comparator, or returns Ok(None) if the
    /// node isn't supervised.
    pub async fn classify(
        &self,
        node: &LocalNode,
        cancel: &dyn Cancellation,
    ) -> Result<Option<C::Kind>, Error> {
        Ok(self
            .sync_info(node, cancel)
            .await?
            .map(|info| self.comparator.compare(&info)))
    }

    /// Lists the children of a node: its local children (including
    /// phantoms), and the children the remote and base tree have entries for.
    /// Nodes that don't exist locally and have no known remote variant are
    /// left out.
    pub async fn members(&self, node: &LocalNode) -> Result<Vec<LocalNode>, Error> {
        if !node.is_container() {
            return Ok(vec![]);
        }

        // local nodes go first, so their kind wins over stored ones.
        let mut candidates: BTreeSet<LocalNode> =
            self.namespace.children(node).await?.into_iter().collect();
        candidates.extend(self.remote.members(node)?);
        if let Some(base) = self.base_tree() {
            candidates.extend(base.members(node)?);
        }

        let mut members = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !self.namespace.exists(&candidate) && !self.remote.store().is_known(&candidate)? {
                continue;
            }
            members.push(candidate);
        }

        Ok(members)
    }
}
