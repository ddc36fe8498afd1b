use tracing::{instrument, trace};

use super::ByteStore;
use crate::provider::DescentPredicate;
use crate::{ByteDescriptor, Depth, Error, LocalNode};

/// A [ByteStore] layered on top of a base store.
///
/// Reads prefer `base`, unless `remote` knows the node to be absent, or holds
/// a revision that descends from the one in `base`. Writes only go to
/// `remote`, and only if they differ from what's in `base`.
/// So `remote` only holds the divergence from `base`.
///
/// Members, knowledge about absence and removal are all served by `remote`.
/// `base` is never written to, and not disposed along with this store, as it
/// usually outlives it.
pub struct DescendantTree<B, R, P> {
    base: B,
    remote: R,
    predicate: P,
}

impl<B, R, P> DescendantTree<B, R, P> {
    pub fn new(base: B, remote: R, predicate: P) -> Self {
        Self {
            base,
            remote,
            predicate,
        }
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }
}

impl<B, R, P> ByteStore for DescendantTree<B, R, P>
where
    B: ByteStore,
    R: ByteStore,
    P: DescentPredicate,
{
    fn get_bytes(&self, node: &LocalNode) -> Result<Option<ByteDescriptor>, Error> {
        let base_bytes = match self.base.get_bytes(node)? {
            // Without base bytes, remote is all we have.
            None => return self.remote.get_bytes(node),
            Some(base_bytes) => base_bytes,
        };

        match self.remote.get_bytes(node)? {
            None => {
                if self.remote.is_known(node)? {
                    // deleted remotely, don't fall back to base.
                    Ok(None)
                } else {
                    Ok(Some(base_bytes))
                }
            }
            Some(remote_bytes) => {
                if remote_bytes != base_bytes
                    && self
                        .predicate
                        .is_descendant(node, &base_bytes, &remote_bytes)
                {
                    Ok(Some(remote_bytes))
                } else {
                    trace!(node = %node, "remote bytes don't descend from base, using base");
                    Ok(Some(base_bytes))
                }
            }
        }
    }

    fn is_known(&self, node: &LocalNode) -> Result<bool, Error> {
        self.remote.is_known(node)
    }

    #[instrument(skip_all, fields(node = %node, bytes = %bytes), level = "trace")]
    fn set_bytes(&self, node: &LocalNode, bytes: ByteDescriptor) -> Result<bool, Error> {
        if self.base.get_bytes(node)?.as_ref() == Some(&bytes) {
            // No divergence from base, drop what remote has so base is used.
            trace!("bytes equal base, collapsing");
            return self.remote.remove(node, Depth::Zero);
        }

        self.remote.set_bytes(node, bytes)
    }

    fn set_absent(&self, node: &LocalNode) -> Result<bool, Error> {
        self.remote.set_absent(node)
    }

    fn remove(&self, node: &LocalNode, depth: Depth) -> Result<bool, Error> {
        self.remote.remove(node, depth)
    }

    fn members(&self, node: &LocalNode) -> Result<Vec<LocalNode>, Error> {
        self.remote.members(node)
    }

    fn dispose(&self) -> Result<(), Error> {
        self.remote.dispose()
    }
}
