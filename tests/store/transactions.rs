//! Integration tests for transactions, isolation, and change delivery

use reckon_foundation::{ErrorKind, Fact, Resource};
use reckon_store::{
    ChangeListener, FactChange, FactPattern, FactStore, IsolationLevel, MemoryStore, Transaction,
};

fn iri(s: &str) -> Resource {
    Resource::iri(format!("http://example.org/{s}"))
}

#[derive(Default)]
struct Collect {
    added: Vec<Fact>,
    removed: Vec<Fact>,
}

impl ChangeListener for Collect {
    fn fact_added(&mut self, fact: &Fact) {
        self.added.push(fact.clone());
    }

    fn fact_removed(&mut self, fact: &Fact) {
        self.removed.push(fact.clone());
    }
}

// =============================================================================
// Visibility
// =============================================================================

#[test]
fn commit_publishes_writes() {
    let store = MemoryStore::new();
    let mut txn = store.begin(IsolationLevel::Snapshot).unwrap();
    txn.add(Fact::new(iri("r"), iri("a"), 1_i64)).unwrap();
    txn.add_derived(Fact::new(iri("r"), iri("area"), 1_i64)).unwrap();
    assert!(store.facts(&FactPattern::any()).unwrap().is_empty());

    store.commit(txn).unwrap();
    assert_eq!(store.asserted_len(), 1);
    assert_eq!(store.derived_len(), 1);
    assert_eq!(store.version(), 1);
}

#[test]
fn snapshots_do_not_see_later_commits() {
    let store = MemoryStore::new();
    let reader = store.begin(IsolationLevel::Snapshot).unwrap();

    let mut writer = store.begin(IsolationLevel::Snapshot).unwrap();
    writer.add(Fact::new(iri("r"), iri("a"), 1_i64)).unwrap();
    store.commit(writer).unwrap();

    assert!(reader.facts(&FactPattern::any()).unwrap().is_empty());
}

#[test]
fn serializable_conflicts_are_rejected() {
    let store = MemoryStore::new();
    let first = store.begin(IsolationLevel::Serializable).unwrap();
    let mut second = store.begin(IsolationLevel::Serializable).unwrap();
    second.add(Fact::new(iri("r"), iri("a"), 1_i64)).unwrap();
    store.commit(second).unwrap();

    let err = store.commit(first).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TransactionConflict(_)));
}

#[test]
fn isolation_levels_are_ordered() {
    assert!(IsolationLevel::Serializable > IsolationLevel::Snapshot);
    assert!(IsolationLevel::ReadCommitted.is_compatible_with(IsolationLevel::ReadUncommitted));
    assert_eq!(
        IsolationLevel::compatible(IsolationLevel::ReadCommitted, &[IsolationLevel::Serializable, IsolationLevel::Snapshot]),
        Some(IsolationLevel::Snapshot)
    );
    assert_eq!(
        IsolationLevel::compatible(IsolationLevel::Serializable, &[IsolationLevel::Snapshot]),
        None
    );
}

// =============================================================================
// Change Delivery
// =============================================================================

#[test]
fn drained_changes_replay_to_listeners() {
    let store = MemoryStore::with_facts([Fact::new(iri("r"), iri("a"), 1_i64)]);
    let mut txn = store.begin(IsolationLevel::Snapshot).unwrap();
    txn.add(Fact::new(iri("r"), iri("b"), 2_i64)).unwrap();
    assert_eq!(txn.remove(&FactPattern::about(&iri("r"), &iri("a"))).unwrap(), 1);
    txn.add_derived(Fact::new(iri("r"), iri("area"), 2_i64)).unwrap();

    let changes = txn.drain_changes();
    assert_eq!(changes.len(), 2);
    assert!(matches!(changes[0], FactChange::Added(_)));

    let mut collect = Collect::default();
    for change in &changes {
        change.deliver(&mut collect);
    }
    assert_eq!(collect.added, vec![Fact::new(iri("r"), iri("b"), 2_i64)]);
    assert_eq!(collect.removed, vec![Fact::new(iri("r"), iri("a"), 1_i64)]);
    assert!(txn.drain_changes().is_empty());
}
