//! This contains test scenarios that a given [ByteStore] needs to pass.
//! We use [rstest] and [rstest_reuse] to provide all stores we want to test
//! against, and then apply this template to all test functions.

use rstest::*;
use rstest_reuse::{self, *};

use super::{ByteStore, DescendantTree, SessionByteStore};
use crate::bytestore;
use crate::fixtures::{leaf, node, REV_A, REV_B, REV_EMPTY};
use crate::{ByteDescriptor, CacheEntry, Depth, LocalNode};

/// A descendant tree over an empty base behaves like its remote store.
fn descendant_tree() -> impl ByteStore {
    DescendantTree::new(
        SessionByteStore::default(),
        SessionByteStore::default(),
        |_: &LocalNode, _: &ByteDescriptor, _: &ByteDescriptor| true,
    )
}

/// This produces a template, which will be applied to all individual test functions.
/// See https://github.com/la10736/rstest/issues/130#issuecomment-968864832
#[template]
#[rstest]
#[case::session(SessionByteStore::default())]
#[case::memory(bytestore::from_addr("memory://").unwrap())]
#[case::descendant(descendant_tree())]
pub fn byte_stores(#[case] store: impl ByteStore) {}

/// Checks that a node is listed in its parent's members iff it's known.
fn assert_adjacency(store: &impl ByteStore, nodes: &[LocalNode]) {
    for n in nodes {
        let parent = LocalNode::new(n.parent_path().expect("must have parent"), n.kind());
        let listed = store.members(&parent).unwrap().contains(n);
        assert_eq!(
            store.is_known(n).unwrap(),
            listed,
            "adjacency mismatch for {}",
            n
        );
    }
}

/// Ensures a node that was never written to is unknown.
#[apply(byte_stores)]
fn test_unknown(store: impl ByteStore) {
    assert!(!store.is_known(&node("p/a")).unwrap());
    assert_eq!(None, store.get_bytes(&node("p/a")).unwrap());
    assert_eq!(CacheEntry::Unknown, store.entry(&node("p/a")).unwrap());
    assert!(store.members(&node("p")).unwrap().is_empty());
}

/// Ensures set_bytes reports whether it changed anything.
#[apply(byte_stores)]
fn test_set_bytes(store: impl ByteStore) {
    assert!(store.set_bytes(&leaf("p/a"), REV_A.clone()).unwrap());
    assert!(!store.set_bytes(&leaf("p/a"), REV_A.clone()).unwrap());
    assert!(store.set_bytes(&leaf("p/a"), REV_B.clone()).unwrap());

    assert!(store.is_known(&leaf("p/a")).unwrap());
    assert_eq!(Some(REV_B.clone()), store.get_bytes(&leaf("p/a")).unwrap());
    assert_eq!(
        CacheEntry::Present(REV_B.clone()),
        store.entry(&leaf("p/a")).unwrap()
    );
}

/// Ensures absent and unknown nodes can be told apart.
#[apply(byte_stores)]
fn test_absent(store: impl ByteStore) {
    assert!(store.set_absent(&leaf("p/a")).unwrap());
    assert!(!store.set_absent(&leaf("p/a")).unwrap());

    assert!(store.is_known(&leaf("p/a")).unwrap());
    assert_eq!(None, store.get_bytes(&leaf("p/a")).unwrap());
    assert_eq!(CacheEntry::Absent, store.entry(&leaf("p/a")).unwrap());

    // present again
    assert!(store.set_bytes(&leaf("p/a"), REV_A.clone()).unwrap());
    // and gone again
    assert!(store.set_absent(&leaf("p/a")).unwrap());
    assert_eq!(CacheEntry::Absent, store.entry(&leaf("p/a")).unwrap());
}

/// Ensures an empty descriptor is stored as such, and not confused with
/// absence.
#[apply(byte_stores)]
fn test_empty_descriptor(store: impl ByteStore) {
    assert!(store.set_bytes(&leaf("p/a"), REV_EMPTY.clone()).unwrap());
    assert_eq!(Some(REV_EMPTY.clone()), store.get_bytes(&leaf("p/a")).unwrap());

    assert!(store.set_absent(&leaf("p/a")).unwrap());
    assert_eq!(None, store.get_bytes(&leaf("p/a")).unwrap());
}

/// Ensures members lists exactly the known children.
#[apply(byte_stores)]
fn test_members(store: impl ByteStore) {
    store.set_bytes(&leaf("p/b"), REV_A.clone()).unwrap();
    store.set_absent(&node("p/c")).unwrap();
    store.set_bytes(&leaf("p/c/d"), REV_A.clone()).unwrap();

    assert_eq!(
        vec![leaf("p/b"), node("p/c")],
        store.members(&node("p")).unwrap()
    );
    assert_eq!(vec![leaf("p/c/d")], store.members(&node("p/c")).unwrap());
    // p itself has no entry, it's not listed below the root.
    assert!(store.members(&LocalNode::root()).unwrap().is_empty());
}

/// Ensures removal honors depth.
#[apply(byte_stores)]
fn test_remove_depth(store: impl ByteStore) {
    let all = [node("p/a"), leaf("p/a/x"), node("p/a/y"), leaf("p/a/y/z")];
    let populate = |store: &dyn ByteStore| {
        for n in &all {
            store.set_bytes(n, REV_A.clone()).unwrap();
        }
    };

    populate(&store);
    assert!(store.remove(&node("p/a"), Depth::Zero).unwrap());
    assert!(!store.is_known(&node("p/a")).unwrap());
    assert!(store.is_known(&leaf("p/a/x")).unwrap());
    assert_adjacency(&store, &all);

    populate(&store);
    assert!(store.remove(&node("p/a"), Depth::One).unwrap());
    assert!(!store.is_known(&leaf("p/a/x")).unwrap());
    assert!(!store.is_known(&node("p/a/y")).unwrap());
    assert!(store.is_known(&leaf("p/a/y/z")).unwrap());
    assert_adjacency(&store, &all);

    populate(&store);
    assert!(store.remove(&node("p/a"), Depth::Infinite).unwrap());
    for n in &all {
        assert!(!store.is_known(n).unwrap());
    }
    assert_adjacency(&store, &all);

    // nothing left to remove
    assert!(!store.remove(&node("p/a"), Depth::Infinite).unwrap());
}

/// Ensures descendants are removed even if the node itself has no entry.
#[apply(byte_stores)]
fn test_remove_below_unknown(store: impl ByteStore) {
    store.set_bytes(&leaf("p/a/x"), REV_A.clone()).unwrap();

    assert!(store.remove(&node("p/a"), Depth::One).unwrap());
    assert!(!store.is_known(&leaf("p/a/x")).unwrap());
}

/// Ensures the adjacency index follows every mutation.
#[apply(byte_stores)]
fn test_adjacency_invariant(store: impl ByteStore) {
    let all = [node("p/a"), leaf("p/a/x"), leaf("p/b"), leaf("q/c")];

    store.set_bytes(&all[0], REV_A.clone()).unwrap();
    store.set_absent(&all[1]).unwrap();
    store.set_bytes(&all[2], REV_B.clone()).unwrap();
    assert_adjacency(&store, &all);

    store.remove(&all[2], Depth::Zero).unwrap();
    store.set_bytes(&all[3], REV_A.clone()).unwrap();
    assert_adjacency(&store, &all);

    store.set_absent(&all[2]).unwrap();
    store.remove(&all[0], Depth::Infinite).unwrap();
    assert_adjacency(&store, &all);
}

/// Ensures a disposed store refuses to be used.
#[apply(byte_stores)]
fn test_dispose(store: impl ByteStore) {
    store.set_bytes(&leaf("p/a"), REV_A.clone()).unwrap();
    store.dispose().expect("must dispose");

    store
        .get_bytes(&leaf("p/a"))
        .expect_err("must fail after dispose");
    store
        .is_known(&leaf("p/a"))
        .expect_err("must fail after dispose");
    store
        .set_bytes(&leaf("p/a"), REV_B.clone())
        .expect_err("must fail after dispose");
}
