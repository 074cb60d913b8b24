//! Integration tests for entity ids and allocation

use strata_foundation::{Entity, EntityAllocator};

#[test]
fn allocator_never_issues_null() {
    let mut alloc = EntityAllocator::new();
    for _ in 0..100 {
        assert!(!alloc.allocate().is_null());
    }
    assert_eq!(alloc.issued(), 100);
}

#[test]
fn allocator_is_monotonic() {
    let mut alloc = EntityAllocator::new();
    let first = alloc.allocate();
    let second = alloc.allocate();
    assert!(second > first);
    assert_eq!(alloc.peek().index(), second.index() + 1);
}

#[test]
fn entities_are_hashable_and_ordered() {
    use std::collections::{BTreeSet, HashSet};

    let ids = [3, 1, 2, 1].map(Entity::from_raw);
    let hashed: HashSet<_> = ids.iter().copied().collect();
    let sorted: BTreeSet<_> = ids.iter().copied().collect();

    assert_eq!(hashed.len(), 3);
    assert_eq!(
        sorted.into_iter().collect::<Vec<_>>(),
        [1, 2, 3].map(Entity::from_raw).to_vec()
    );
}
