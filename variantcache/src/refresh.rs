use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, instrument, trace, warn};

use crate::bytestore::ByteStore;
use crate::provider::{
    BytesExtractor, Cancellation, LockManager, NamespaceProvider, RemoteProvider, VariantHandle,
};
use crate::{Depth, Error, LocalNode, NodeKind};

/// A tree of remote variants, cached in a [ByteStore].
#[async_trait]
pub trait VariantTree: Send + Sync {
    /// The store holding the cached bytes.
    fn store(&self) -> &Arc<dyn ByteStore>;

    /// Refreshes the subtree below `root` up to `depth`, returning the nodes
    /// whose entry changed.
    async fn refresh_root(
        &self,
        root: &LocalNode,
        depth: Depth,
        cancel: &dyn Cancellation,
    ) -> Result<Vec<LocalNode>, Error>;

    /// Whether the store holds bytes for the node.
    fn has_variant(&self, node: &LocalNode) -> Result<bool, Error> {
        Ok(self.store().get_bytes(node)?.is_some())
    }

    /// Drops the cached entries for the node and, depending on depth, its
    /// descendants.
    fn flush_variants(&self, node: &LocalNode, depth: Depth) -> Result<bool, Error> {
        self.store().remove(node, depth)
    }

    /// The children of the node the store has an entry for.
    fn members(&self, node: &LocalNode) -> Result<Vec<LocalNode>, Error> {
        self.store().members(node)
    }
}

/// Keeps a [ByteStore] in sync with the remote side.
///
/// A refresh walks the local namespace and the remote tree in lockstep,
/// writes the bytes of every remote variant it encounters to the store,
/// marks nodes without a remote variant as absent, and drops entries for
/// nodes the remote side doesn't report anymore.
pub struct RefreshEngine<N, R, X> {
    store: Arc<dyn ByteStore>,
    namespace: N,
    remote: R,
    extractor: X,
    locks: Arc<dyn LockManager>,
}

/// A child of a node, as seen locally and remotely, joined by name.
struct MergedChild<V> {
    local: Option<LocalNode>,
    remote: Option<V>,
}

impl<V> Default for MergedChild<V> {
    fn default() -> Self {
        Self {
            local: None,
            remote: None,
        }
    }
}

impl<N, R, X> RefreshEngine<N, R, X>
where
    N: NamespaceProvider,
    R: RemoteProvider,
    X: BytesExtractor<R::Variant>,
{
    pub fn new(
        store: Arc<dyn ByteStore>,
        namespace: N,
        remote: R,
        extractor: X,
        locks: Arc<dyn LockManager>,
    ) -> Self {
        Self {
            store,
            namespace,
            remote,
            extractor,
            locks,
        }
    }

    /// Refreshes all `roots` up to `depth`, one after the other, and returns
    /// the nodes whose entry changed.
    ///
    /// A root failing doesn't stop the remaining roots from being refreshed.
    /// If any root failed, [Error::RootsFailed] is returned, carrying the
    /// changes of the other roots. Cancellation aborts the whole call.
    ///
    /// Changes are concatenated per root. If roots overlap, a node may be
    /// reported more than once.
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
            match self.refresh_root(root, depth, cancel).await {
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

        debug!(changed = changed.len(), "refresh done");
        Ok(changed)
    }

    /// Refreshes a single root up to `depth`, while holding the lock for its
    /// subtree.
    /// Roots inside an inaccessible top-level container are skipped.
    #[instrument(skip(self, root, cancel), fields(root = %root))]
    pub async fn refresh_root(
        &self,
        root: &LocalNode,
        depth: Depth,
        cancel: &dyn Cancellation,
    ) -> Result<Vec<LocalNode>, Error> {
        // Released when dropped, on every return path.
        let _guard = self.locks.acquire(root).await?;

        if let Some(container) = root.top_level() {
            if !self.namespace.is_accessible(&container) {
                debug!(container = %container, "container not accessible, skipping");
                return Ok(vec![]);
            }
        }

        let variant = self.remote.fetch_variant(root, depth).await?;

        let mut changed = Vec::new();
        self.diff(root.clone(), variant, depth, cancel, &mut changed)
            .await?;

        Ok(changed)
    }

    /// Updates the entry of `local` from `remote`, and then recurses into the
    /// merged children, if depth allows.
    fn diff<'a>(
        &'a self,
        local: LocalNode,
        remote: Option<R::Variant>,
        depth: Depth,
        cancel: &'a dyn Cancellation,
        changed: &'a mut Vec<LocalNode>,
    ) -> BoxFuture<'a, Result<(), Error>> {
        async move {
            // Children are independent of the node's own entry, so capturing
            // them before it's written is fine.
            let previously_cached = self.store.members(&local)?;

            let node_changed = match &remote {
                None => self.store.set_absent(&local)?,
                Some(variant) => {
                    let bytes = self.extractor.bytes_of(variant)?;
                    self.store.set_bytes(&local, bytes)?
                }
            };
            if node_changed {
                trace!(node = %local, "entry changed");
                changed.push(local.clone());
            }

            if depth == Depth::Zero {
                return Ok(());
            }

            let children = self.merged_children(&local, remote.as_ref()).await?;
            let seen: HashSet<LocalNode> = children.iter().map(|(l, _)| l.clone()).collect();

            for (child, child_remote) in children {
                if cancel.is_cancelled() {
                    debug!(node = %local, "refresh cancelled");
                    return Err(Error::Cancelled);
                }

                self.diff(child, child_remote, depth.for_children(), cancel, changed)
                    .await?;
            }

            // Purge entries of children the remote side doesn't report anymore.
            for stale in previously_cached {
                if !seen.contains(&stale) {
                    trace!(node = %stale, "purging stale entry");
                    self.store.remove(&stale, Depth::Infinite)?;
                    changed.push(stale);
                }
            }

            Ok(())
        }
        .boxed()
    }

    /// Joins the local and remote children of a node by their name.
    /// Remote-only children get a local node synthesized, which fails if
    /// `local` is a leaf. Those children are skipped.
    async fn merged_children(
        &self,
        local: &LocalNode,
        remote: Option<&R::Variant>,
    ) -> Result<Vec<(LocalNode, Option<R::Variant>)>, Error> {
        let local_children = self.namespace.children(local).await?;
        let remote_children = match remote {
            Some(variant) => self.remote.fetch_members(variant).await?,
            None => vec![],
        };

        let mut merged: BTreeMap<String, MergedChild<R::Variant>> = BTreeMap::new();
        for child in local_children {
            let name = child.name().to_owned();
            merged.entry(name).or_default().local = Some(child);
        }
        for child in remote_children {
            let name = child.name().to_owned();
            merged.entry(name).or_default().remote = Some(child);
        }

        let mut children = Vec::with_capacity(merged.len());
        for (name, entry) in merged {
            let child = match (entry.local, &entry.remote) {
                (Some(child), _) => child,
                (None, Some(variant)) => {
                    let kind = if variant.is_container() {
                        NodeKind::Container
                    } else {
                        NodeKind::Leaf
                    };

                    match local.child(&name, kind) {
                        Ok(child) => child,
                        Err(e) => {
                            warn!(parent = %local, name = %name, err = %e, "skipping remote child");
                            continue;
                        }
                    }
                }
                // Entries are only created for a local or remote child.
                (None, None) => continue,
            };

            children.push((child, entry.remote));
        }

        Ok(children)
    }
}

#[async_trait]
impl<N, R, X> VariantTree for RefreshEngine<N, R, X>
where
    N: NamespaceProvider,
    R: RemoteProvider,
    X: BytesExtractor<R::Variant>,
{
    fn store(&self) -> &Arc<dyn ByteStore> {
        &self.store
    }

    async fn refresh_root(
        &self,
        root: &LocalNode,
        depth: Depth,
        cancel: &dyn Cancellation,
    ) -> Result<Vec<LocalNode>, Error> {
        RefreshEngine::refresh_root(self, root, depth, cancel).await
    }
}
