use crate::{ByteDescriptor, CacheEntry, Depth, Error, LocalNode};

mod descendant;
mod from_addr;
mod memory;

#[cfg(test)]
pub mod tests;

pub use self::descendant::DescendantTree;
pub use self::from_addr::{from_addr, ByteStoreConfig};
pub use self::memory::{SessionByteStore, SessionByteStoreConfig};

/// The base trait all byte stores need to implement.
///
/// A byte store maps [LocalNode]s to a [CacheEntry]: it either knows nothing
/// about a node, knows that the node has no remote variant, or holds the
/// [ByteDescriptor] of the variant last seen.
///
/// Next to the entries it keeps an index of which children of a node it has
/// an entry for. A node is listed in [ByteStore::members] of its parent
/// if and only if it has an entry.
pub trait ByteStore: Send + Sync {
    /// Returns the bytes stored for the node.
    /// In case the node is unknown or known to be absent, Ok(None) is
    /// returned, use [ByteStore::is_known] to tell these apart.
    fn get_bytes(&self, node: &LocalNode) -> Result<Option<ByteDescriptor>, Error>;

    /// Returns whether the store has an entry for the node, which is the case
    /// for both present and absent variants.
    fn is_known(&self, node: &LocalNode) -> Result<bool, Error>;

    /// Stores the bytes for the node.
    /// Returns true if this changed what's stored, which includes the first
    /// write for a previously unknown node.
    fn set_bytes(&self, node: &LocalNode, bytes: ByteDescriptor) -> Result<bool, Error>;

    /// Records that the node has no remote variant.
    /// Returns true if this changed what's stored.
    fn set_absent(&self, node: &LocalNode) -> Result<bool, Error>;

    /// Removes the entry of the node, and, depending on `depth`, the entries
    /// of its descendants. Returns true if any entry was removed.
    fn remove(&self, node: &LocalNode, depth: Depth) -> Result<bool, Error>;

    /// Lists the children of the node this store has an entry for.
    fn members(&self, node: &LocalNode) -> Result<Vec<LocalNode>, Error>;

    /// Releases all resources held by the store.
    /// The store must not be used afterwards.
    fn dispose(&self) -> Result<(), Error>;

    /// Returns the full entry of the node.
    fn entry(&self, node: &LocalNode) -> Result<CacheEntry, Error> {
        Ok(match self.get_bytes(node)? {
            Some(bytes) => CacheEntry::Present(bytes),
            None if self.is_known(node)? => CacheEntry::Absent,
            None => CacheEntry::Unknown,
        })
    }
}

impl<A> ByteStore for A
where
    A: AsRef<dyn ByteStore> + Send + Sync,
{
    fn get_bytes(&self, node: &LocalNode) -> Result<Option<ByteDescriptor>, Error> {
        self.as_ref().get_bytes(node)
    }

    fn is_known(&self, node: &LocalNode) -> Result<bool, Error> {
        self.as_ref().is_known(node)
    }

    fn set_bytes(&self, node: &LocalNode, bytes: ByteDescriptor) -> Result<bool, Error> {
        self.as_ref().set_bytes(node, bytes)
    }

    fn set_absent(&self, node: &LocalNode) -> Result<bool, Error> {
        self.as_ref().set_absent(node)
    }

    fn remove(&self, node: &LocalNode, depth: Depth) -> Result<bool, Error> {
        self.as_ref().remove(node, depth)
    }

    fn members(&self, node: &LocalNode) -> Result<Vec<LocalNode>, Error> {
        self.as_ref().members(node)
    }

    fn dispose(&self) -> Result<(), Error> {
        self.as_ref().dispose()
    }

    fn entry(&self, node: &LocalNode) -> Result<CacheEntry, Error> {
        self.as_ref().entry(node)
    }
}
