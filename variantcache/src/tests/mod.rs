use std::sync::Arc;

use crate::bytestore::{ByteStore, SessionByteStore};
use crate::fixtures::{MemoryNamespace, MemoryRemote, RevisionBytes, REV_A, REV_B};
use crate::lock::SubtreeLocks;
use crate::refresh::RefreshEngine;


type Engine = RefreshEngine<MemoryNamespace, MemoryRemote, RevisionBytes>;

/// A namespace, a remote side and an engine refreshing a session store from
/// it.
struct Harness {
    namespace: MemoryNamespace,
    remote: MemoryRemote,
    store: Arc<dyn ByteStore>,
    engine: Engine,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(Arc::new(SessionByteStore::default()))
    }

    fn with_store(store: Arc<dyn ByteStore>) -> Self {
        let namespace = MemoryNamespace::default();
        let remote = MemoryRemote::default();
        let engine = RefreshEngine::new(
            store.clone(),
            namespace.clone(),
            remote.clone(),
            RevisionBytes,
            Arc::new(SubtreeLocks::default()),
        );

        Self {
            namespace,
            remote,
            store,
            engine,
        }
    }

    /// Populates both sides with the same project:
    ///
    /// ```text
    /// p/
    /// ├── README
    /// └── src/
    ///     └── a.rs
    /// ```
    fn with_project() -> Self {
        let h = Self::new();

        h.namespace.add_container("p");
        h.namespace.add_leaf("p/README");
        h.namespace.add_container("p/src");
        h.namespace.add_leaf("p/src/a.rs");

        h.remote.put_container("p", &REV_A);
        h.remote.put_leaf("p/README", &REV_B);
        h.remote.put_container("p/src", &REV_A);
        h.remote.put_leaf("p/src/a.rs", &REV_A);

        h
    }
}
