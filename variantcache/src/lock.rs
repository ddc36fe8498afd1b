use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, RwLock as AsyncRwLock};
use tracing::{instrument, trace};

use crate::path::NodePath;
use crate::provider::{LockGuard, LockManager};
use crate::{Error, LocalNode};

/// A [LockManager] handing out one lock per top-level container.
///
/// Locking the namespace root excludes everybody else. Locking anything
/// below it excludes everybody locking in the same top-level container, but
/// lets different top-level containers proceed concurrently.
/// Locks are not reentrant.
#[derive(Clone, Default)]
pub struct SubtreeLocks {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    namespace: Arc<AsyncRwLock<()>>,
    top_level: Mutex<HashMap<NodePath, Arc<AsyncMutex<()>>>>,
}

impl SubtreeLocks {
    /// Returns the lock for a top-level container.
    /// Locks nobody holds or waits for are only referenced by the map, and are
    /// dropped on the way.
    fn top_level_lock(&self, path: NodePath) -> Arc<AsyncMutex<()>> {
        let mut locks = self.inner.top_level.lock();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(path).or_default().clone()
    }
}

#[async_trait]
impl LockManager for SubtreeLocks {
    #[instrument(skip_all, fields(node = %node), level = "trace")]
    async fn acquire(&self, node: &LocalNode) -> Result<LockGuard, Error> {
        match node.path().top_level() {
            None => {
                let guard = self.inner.namespace.clone().write_owned().await;
                trace!("acquired namespace lock");
                Ok(LockGuard::new(guard))
            }
            Some(top_level) => {
                let namespace = self.inner.namespace.clone().read_owned().await;
                let subtree = self.top_level_lock(top_level).lock_owned().await;
                trace!("acquired subtree lock");
                Ok(LockGuard::new((subtree, namespace)))
            }
        }
    }
}
