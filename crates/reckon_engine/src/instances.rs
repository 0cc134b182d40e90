//! Auxiliary instances created by `new` expressions.
//!
//! Ownership is stored as the derived fact `entity math:owns instance`, so a
//! later pass can retract the instances even after the in-memory registry
//! was cleared.

use dashmap::DashMap;
use reckon_expr::PathEntry;
use reckon_foundation::vocab::{self, math, rdf};
use reckon_foundation::{Fact, Resource, Result, Term, Value, content_id};
use reckon_store::{FactPattern, Transaction};

/// Tracks the instances each (entity, property) pair created.
///
/// An instance lives exactly as long as the result of the pair that created
/// it; re-evaluating or retracting the pair retracts its instances.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    owned: DashMap<PathEntry, Vec<Resource>>,
}

impl InstanceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an instance of `class` owned by `owner`, writing its type,
    /// field facts and ownership edge as derived data in `context`.
    ///
    /// The identifier is derived from the owner and the number of instances
    /// it created before, so re-evaluation yields the same node.
    ///
    /// # Errors
    ///
    /// Returns an error if a field value cannot be stored as a fact.
    pub fn create(
        &self,
        txn: &mut dyn Transaction,
        owner: &PathEntry,
        class: &Resource,
        fields: Vec<(Resource, Value)>,
        context: Option<&Resource>,
    ) -> Result<Resource> {
        let ordinal = self.owned.get(owner).map_or(0, |owned| owned.len());
        let instance = Resource::blank(format!(
            "instance-{}",
            content_id([owner.entity.to_string(), owner.property.to_string(), ordinal.to_string()])
        ));

        let ctx = context.cloned();
        txn.add_derived(Fact::new(instance.clone(), vocab::resource(rdf::TYPE), class.clone()).in_context(ctx.clone()))?;
        for (property, value) in fields {
            let values = match value {
                Value::List(items) => items.into_iter().collect(),
                single => vec![single],
            };
            for value in values {
                txn.add_derived(Fact::new(instance.clone(), property.clone(), value.to_term()?).in_context(ctx.clone()))?;
            }
        }
        txn.add_derived(Fact::new(owner.entity.clone(), owns(), instance.clone()).in_context(ctx))?;

        tracing::trace!(owner = %owner, class = %class, instance = %instance, "created instance");
        self.owned.entry(owner.clone()).or_default().push(instance.clone());
        Ok(instance)
    }

    /// Retracts every instance `entity` owns in the store, together with
    /// the instances those own in turn. Returns the number of facts removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance facts cannot be removed.
    pub fn retract(&self, txn: &mut dyn Transaction, entity: &Resource) -> Result<usize> {
        self.owned.retain(|owner, _| &owner.entity != entity);
        self.retract_owned(txn, entity)
    }

    fn retract_owned(&self, txn: &mut dyn Transaction, owner: &Resource) -> Result<usize> {
        let edges = FactPattern::about(owner, &owns()).derived();
        let instances = owned_instances(&*txn, &edges)?;
        let mut removed = txn.remove_derived(&edges)?;
        for instance in instances {
            self.owned.retain(|key, _| key.entity != instance);
            removed += self.retract_owned(txn, &instance)?;
            removed += txn.remove_derived(&FactPattern::any().with_subject(instance).derived())?;
        }
        Ok(removed)
    }

    /// Retracts every instance recorded in the store. Returns the number of
    /// facts removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance facts cannot be removed.
    pub fn retract_all(&self, txn: &mut dyn Transaction) -> Result<usize> {
        self.owned.clear();
        let edges = FactPattern::any().with_predicate(owns()).derived();
        let instances = owned_instances(&*txn, &edges)?;
        let mut removed = txn.remove_derived(&edges)?;
        for instance in instances {
            removed += txn.remove_derived(&FactPattern::any().with_subject(instance).derived())?;
        }
        Ok(removed)
    }

    /// Forgets every instance without touching the store.
    pub fn clear(&self) {
        self.owned.clear();
    }

    /// Returns the number of instances created since the registry was last
    /// cleared and not yet retracted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owned.iter().map(|e| e.value().len()).sum()
    }

    /// Returns true if no instance is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn owns() -> Resource {
    vocab::resource(math::OWNS)
}

fn owned_instances(txn: &dyn Transaction, edges: &FactPattern) -> Result<Vec<Resource>> {
    let mut found = Vec::new();
    for fact in txn.facts(edges)? {
        if let Term::Resource(instance) = fact.object {
            if !found.contains(&instance) {
                found.push(instance);
            }
        }
    }
    Ok(found)
}
