//! Entity-level dependency edges.
//!
//! When evaluating a property of `from` reads a property of `to`, the edge is
//! stored as the derived fact `to math:usedBy from`, in the graph `to`'s
//! results are written to. Incremental passes follow these edges to find
//! what a change affects.

use dashmap::DashSet;
use reckon_foundation::vocab::{self, math};
use reckon_foundation::{Fact, Resource, Result, Term};
use reckon_store::{FactPattern, Transaction};

/// Records and queries `math:usedBy` edges.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    recorded: DashSet<(Resource, Resource)>,
}

impl DependencyTracker {
    /// Creates a tracker with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets which edges were written during the previous pass.
    pub fn begin_pass(&self) {
        self.recorded.clear();
    }

    /// Records that `from` reads `to`. Returns true if a fact was written.
    ///
    /// Self-edges and edges already written this pass are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge cannot be written.
    pub fn record(
        &self,
        txn: &mut dyn Transaction,
        from: &Resource,
        to: &Resource,
        context: Option<Resource>,
    ) -> Result<bool> {
        if from == to || !self.recorded.insert((to.clone(), from.clone())) {
            return Ok(false);
        }
        txn.add_derived(Fact::new(to.clone(), used_by(), from.clone()).in_context(context))?;
        Ok(true)
    }

    /// Returns the entities whose evaluation read `entity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn dependents(&self, txn: &dyn Transaction, entity: &Resource) -> Result<Vec<Resource>> {
        let mut found = Vec::new();
        for fact in txn.facts(&FactPattern::about(entity, &used_by()).derived())? {
            if let Term::Resource(dependent) = fact.object {
                if !found.contains(&dependent) {
                    found.push(dependent);
                }
            }
        }
        Ok(found)
    }

    /// Removes every edge into `entity`, so its next evaluation records
    /// fresh ones. Returns the number of facts removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the edges cannot be removed.
    pub fn remove_incoming(&self, txn: &mut dyn Transaction, entity: &Resource) -> Result<usize> {
        let pattern = FactPattern::any()
            .with_predicate(used_by())
            .with_object(entity.clone())
            .derived();
        self.recorded.retain(|(_, from)| from != entity);
        txn.remove_derived(&pattern)
    }

    /// Removes every edge. Returns the number of facts removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the edges cannot be removed.
    pub fn remove_all(&self, txn: &mut dyn Transaction) -> Result<usize> {
        self.recorded.clear();
        txn.remove_derived(&FactPattern::any().with_predicate(used_by()).derived())
    }
}

fn used_by() -> Resource {
    vocab::resource(math::USED_BY)
}
