//! In-memory fact store.
//!
//! Committed state lives behind a `RwLock` as two persistent graphs, one for
//! asserted and one for derived facts. `begin` clones both in O(1); a
//! transaction reads its snapshot plus its own writes and records an
//! operation log. `commit` replays that log onto the latest committed state
//! under the write lock, so writers are serialized.

use parking_lot::RwLock;
use reckon_foundation::{Error, ErrorKind, Fact, Result};

use crate::change::FactChange;
use crate::graph::FactGraph;
use crate::isolation::IsolationLevel;
use crate::pattern::FactPattern;
use crate::store::{FactStore, Transaction};

const SUPPORTED_LEVELS: [IsolationLevel; 2] =
    [IsolationLevel::Snapshot, IsolationLevel::Serializable];

#[derive(Clone, Debug, Default)]
struct Committed {
    asserted: FactGraph,
    derived: FactGraph,
    version: u64,
}

/// Thread-safe in-memory [`FactStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Committed>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given asserted facts.
    #[must_use]
    pub fn with_facts(facts: impl IntoIterator<Item = Fact>) -> Self {
        Self {
            state: RwLock::new(Committed {
                asserted: facts.into_iter().collect(),
                derived: FactGraph::new(),
                version: 0,
            }),
        }
    }

    /// Returns the number of commits that changed state.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    /// Returns the number of committed asserted facts.
    #[must_use]
    pub fn asserted_len(&self) -> usize {
        self.state.read().asserted.len()
    }

    /// Returns the number of committed derived facts.
    #[must_use]
    pub fn derived_len(&self) -> usize {
        self.state.read().derived.len()
    }
}

impl FactStore for MemoryStore {
    type Transaction = MemoryTransaction;

    fn supported_isolation_levels(&self) -> &[IsolationLevel] {
        &SUPPORTED_LEVELS
    }

    fn default_isolation_level(&self) -> IsolationLevel {
        IsolationLevel::Snapshot
    }

    fn begin(&self, level: IsolationLevel) -> Result<MemoryTransaction> {
        let level = IsolationLevel::compatible(level, &SUPPORTED_LEVELS).ok_or_else(|| {
            Error::new(ErrorKind::IsolationLevelUnsupported(level.to_string()))
        })?;
        let state = self.state.read();
        tracing::trace!(level = %level, version = state.version, "transaction started");
        Ok(MemoryTransaction {
            level,
            base_version: state.version,
            asserted: state.asserted.clone(),
            derived: state.derived.clone(),
            ops: Vec::new(),
            changes: Vec::new(),
        })
    }

    fn commit(&self, txn: MemoryTransaction) -> Result<()> {
        let mut state = self.state.write();
        if txn.level == IsolationLevel::Serializable && state.version != txn.base_version {
            return Err(Error::new(ErrorKind::TransactionConflict(format!(
                "store advanced from version {} to {}",
                txn.base_version, state.version
            ))));
        }
        if txn.ops.is_empty() {
            return Ok(());
        }
        let op_count = txn.ops.len();
        for op in txn.ops {
            match op {
                Op::AddAsserted(fact) => {
                    state.asserted.insert(fact);
                }
                Op::RemoveAsserted(fact) => {
                    state.asserted.remove(&fact);
                }
                Op::AddDerived(fact) => {
                    state.derived.insert(fact);
                }
                Op::RemoveDerived(fact) => {
                    state.derived.remove(&fact);
                }
            }
        }
        state.version += 1;
        tracing::debug!(
            version = state.version,
            operations = op_count,
            "transaction committed"
        );
        Ok(())
    }

    fn rollback(&self, txn: MemoryTransaction) {
        tracing::trace!(operations = txn.ops.len(), "transaction rolled back");
    }

    fn facts(&self, pattern: &FactPattern) -> Result<Vec<Fact>> {
        let state = self.state.read();
        Ok(query(&state.asserted, &state.derived, pattern))
    }
}

#[derive(Clone, Debug)]
enum Op {
    AddAsserted(Fact),
    RemoveAsserted(Fact),
    AddDerived(Fact),
    RemoveDerived(Fact),
}

/// Transaction over a [`MemoryStore`] snapshot.
#[derive(Debug)]
pub struct MemoryTransaction {
    level: IsolationLevel,
    base_version: u64,
    asserted: FactGraph,
    derived: FactGraph,
    ops: Vec<Op>,
    changes: Vec<FactChange>,
}

impl MemoryTransaction {
    /// Returns true if the transaction has made no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Transaction for MemoryTransaction {
    fn isolation_level(&self) -> IsolationLevel {
        self.level
    }

    fn facts(&self, pattern: &FactPattern) -> Result<Vec<Fact>> {
        Ok(query(&self.asserted, &self.derived, pattern))
    }

    fn contains(&self, pattern: &FactPattern) -> Result<bool> {
        Ok((pattern.origin.includes_asserted() && self.asserted.any_matching(pattern))
            || (pattern.origin.includes_derived() && self.derived.any_matching(pattern)))
    }

    fn add(&mut self, fact: Fact) -> Result<()> {
        if self.asserted.insert(fact.clone()) {
            self.ops.push(Op::AddAsserted(fact.clone()));
            self.changes.push(FactChange::Added(fact));
        }
        Ok(())
    }

    fn remove(&mut self, pattern: &FactPattern) -> Result<usize> {
        let removed = self.asserted.remove_matching(pattern);
        for fact in &removed {
            self.ops.push(Op::RemoveAsserted(fact.clone()));
            self.changes.push(FactChange::Removed(fact.clone()));
        }
        Ok(removed.len())
    }

    fn add_derived(&mut self, fact: Fact) -> Result<()> {
        if self.derived.insert(fact.clone()) {
            self.ops.push(Op::AddDerived(fact));
        }
        Ok(())
    }

    fn remove_derived(&mut self, pattern: &FactPattern) -> Result<usize> {
        let removed = self.derived.remove_matching(pattern);
        let count = removed.len();
        self.ops.extend(removed.into_iter().map(Op::RemoveDerived));
        Ok(count)
    }

    fn drain_changes(&mut self) -> Vec<FactChange> {
        std::mem::take(&mut self.changes)
    }
}

/// Queries both graphs, reporting a fact held in both only once.
fn query(asserted: &FactGraph, derived: &FactGraph, pattern: &FactPattern) -> Vec<Fact> {
    let mut facts = if pattern.origin.includes_asserted() {
        asserted.matching(pattern)
    } else {
        Vec::new()
    };
    if pattern.origin.includes_derived() {
        let check_duplicates = !facts.is_empty();
        facts.extend(
            derived
                .matching(pattern)
                .into_iter()
                .filter(|fact| !check_duplicates || !asserted.contains(fact)),
        );
    }
    facts
}
