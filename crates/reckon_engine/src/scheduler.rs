//! Scheduling of materialization passes.
//!
//! A pass runs inside the committing transaction, after its asserted changes
//! are known and before they become visible. The first pass, and every pass
//! when incremental evaluation is off, is full: every derived fact is
//! recomputed. Later passes are incremental and only touch the entities a
//! change can affect:
//!
//! 1. Collect the changed entities, the instances of classes whose
//!    constraints changed, and everything that transitively reads them
//!    through `math:usedBy` edges.
//! 2. Retract the derived facts, memoized results, instances and incoming
//!    edges of that closure.
//! 3. Re-evaluate each member of the closure in every graph that types it.
//!
//! Every member is retracted before any is re-evaluated, so no evaluation
//! reads a stale result of another member.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use reckon_foundation::vocab::{self, rdfs, rules, sh};
use reckon_foundation::{Resource, Result, Term};
use reckon_store::{FactChange, FactPattern, Transaction};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::change::{ChangeSet, ChangeTracker};
use crate::config::MaterializerConfig;
use crate::constraint::ConstraintResolver;
use crate::dataset::{Dataset, DatasetResolver};
use crate::dependency::DependencyTracker;
use crate::derived::Evaluator;
use crate::instances::InstanceRegistry;
use crate::types::ResourceTypeCache;
use crate::value_cache::ValueCache;

// =============================================================================
// Pass Report
// =============================================================================

/// How a pass chose what to evaluate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PassKind {
    /// Every constrained entity.
    Full,
    /// Only the entities a change can affect.
    Incremental,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Incremental => write!(f, "incremental"),
        }
    }
}

/// What one pass did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PassReport {
    /// Full or incremental.
    pub kind: PassKind,
    /// Entities scheduled for evaluation.
    pub affected: usize,
    /// Pairs whose expression ran.
    pub evaluated: usize,
    /// Derived facts removed before re-evaluation.
    pub retracted: usize,
    /// Pairs whose expression produced an error.
    pub errors: usize,
}

impl PassReport {
    fn new(kind: PassKind) -> Self {
        Self {
            kind,
            affected: 0,
            evaluated: 0,
            retracted: 0,
            errors: 0,
        }
    }
}

// =============================================================================
// Materializer
// =============================================================================

/// Owns the caches shared by every connection and runs passes.
///
/// Passes are serialized; caches are safe to read from any thread.
#[derive(Debug)]
pub struct Materializer {
    config: MaterializerConfig,
    pub(crate) constraints: ConstraintResolver,
    pub(crate) types: ResourceTypeCache,
    pub(crate) datasets: DatasetResolver,
    pub(crate) values: ValueCache,
    pub(crate) dependencies: DependencyTracker,
    pub(crate) instances: InstanceRegistry,
    pass: Mutex<()>,
    in_pass: AtomicBool,
    initial_done: AtomicBool,
    passes: AtomicU64,
}

/// Marks a pass as running until dropped.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new(MaterializerConfig::default())
    }
}

impl Materializer {
    /// Creates a materializer with empty caches.
    #[must_use]
    pub fn new(config: MaterializerConfig) -> Self {
        Self {
            constraints: ConstraintResolver::new(config.class_ordering.clone()),
            types: ResourceTypeCache::new(config.class_ordering.clone()),
            datasets: DatasetResolver::new(),
            values: ValueCache::new(),
            dependencies: DependencyTracker::new(),
            instances: InstanceRegistry::new(),
            pass: Mutex::new(()),
            in_pass: AtomicBool::new(false),
            initial_done: AtomicBool::new(false),
            passes: AtomicU64::new(0),
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &MaterializerConfig {
        &self.config
    }

    /// Creates a listener collecting the changes of one transaction.
    #[must_use]
    pub fn tracker(&self) -> ChangeTracker<'_> {
        ChangeTracker::new(&self.types, &self.in_pass)
    }

    /// Returns true while a pass runs.
    #[must_use]
    pub fn is_in_pass(&self) -> bool {
        self.in_pass.load(Ordering::Acquire)
    }

    /// Returns the number of completed passes.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    /// Returns the number of memoized results.
    #[must_use]
    pub fn cached_values(&self) -> usize {
        self.values.len()
    }

    /// Drops every cache. The next pass is full.
    pub fn invalidate_all(&self) {
        self.values.clear();
        self.types.clear();
        self.constraints.invalidate();
        self.datasets.clear();
        self.instances.clear();
        self.initial_done.store(false, Ordering::Release);
        tracing::debug!("materializer caches invalidated");
    }

    /// Runs one pass over `txn` for the given changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails. The transaction is then left
    /// partially materialized and should be rolled back.
    pub fn run(&self, txn: &mut dyn Transaction, changes: &ChangeSet) -> Result<PassReport> {
        let _lock = self.pass.lock();
        let _guard = PassGuard::enter(&self.in_pass);
        self.dependencies.begin_pass();

        let schema_changed = !changes.schema_changes().is_empty();
        if schema_changed || changes.prefixes_changed() || changes.imports_changed() {
            self.constraints.invalidate();
        }
        if changes.imports_changed() {
            self.datasets.clear();
        }

        let full = !self.config.incremental
            || !self.initial_done.load(Ordering::Acquire)
            || changes.prefixes_changed()
            || changes.imports_changed();
        let report = if full {
            self.full_pass(txn, changes)?
        } else {
            self.incremental_pass(txn, changes)?
        };

        self.initial_done.store(true, Ordering::Release);
        self.passes.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            kind = %report.kind,
            affected = report.affected,
            evaluated = report.evaluated,
            retracted = report.retracted,
            errors = report.errors,
            "materialization pass finished"
        );
        Ok(report)
    }

    // =========================================================================
    // Full Pass
    // =========================================================================

    fn full_pass(&self, txn: &mut dyn Transaction, changes: &ChangeSet) -> Result<PassReport> {
        let mut report = PassReport::new(PassKind::Full);
        self.values.clear();

        for property in computed_properties(&*txn, changes.schema_changes())? {
            report.retracted += txn.remove_derived(&FactPattern::any().with_predicate(property).derived())?;
        }
        report.retracted += self.dependencies.remove_all(txn)?;
        report.retracted += self.instances.retract_all(txn)?;

        let targets = ConstraintResolver::targets(&*txn)?;
        report.affected = targets.iter().map(|(entity, _)| entity).collect::<HashSet<_>>().len();
        tracing::debug!(targets = targets.len(), "full pass scheduled");

        let mut evaluator = Evaluator::new(self, txn);
        for (entity, context) in &targets {
            evaluator.evaluate_in(entity, context.as_ref())?;
        }
        let stats = evaluator.stats();
        report.evaluated = stats.evaluated;
        report.errors = stats.errors;
        Ok(report)
    }

    // =========================================================================
    // Incremental Pass
    // =========================================================================

    fn incremental_pass(&self, txn: &mut dyn Transaction, changes: &ChangeSet) -> Result<PassReport> {
        let mut report = PassReport::new(PassKind::Incremental);
        let closure = self.affected_closure(&*txn, changes)?;
        report.affected = closure.len();
        if closure.is_empty() {
            return Ok(report);
        }

        for entity in &closure {
            self.values.invalidate(entity);
            // Ownership edges are derived facts of the entity itself.
            report.retracted += self.instances.retract(txn, entity)?;
            report.retracted += txn.remove_derived(&FactPattern::any().with_subject(entity.clone()).derived())?;
            report.retracted += self.dependencies.remove_incoming(txn, entity)?;
        }

        let mut evaluator = Evaluator::new(self, txn);
        for entity in &closure {
            evaluator.evaluate_entity(entity)?;
        }
        let stats = evaluator.stats();
        report.evaluated = stats.evaluated;
        report.errors = stats.errors;
        Ok(report)
    }

    /// Returns every entity a change can affect, seeds first.
    fn affected_closure(&self, txn: &dyn Transaction, changes: &ChangeSet) -> Result<IndexSet<Resource>> {
        let mut closure = IndexSet::new();

        for class in affected_classes(txn, changes.schema_changes())? {
            for (instance, _) in ConstraintResolver::instances(txn, &class)? {
                if closure.insert(instance.clone()) {
                    tracing::debug!(entity = %instance, class = %class, "scheduled by schema change");
                }
            }
        }

        for entity in changes.entities() {
            if closure.contains(entity) {
                continue;
            }
            let info = self.types.get(txn, entity)?;
            let constrained = !self
                .constraints
                .constrained_properties(txn, &info, &Dataset::unrestricted())?
                .is_empty();
            let materialized = txn.contains(&FactPattern::any().with_subject(entity.clone()).derived())?;
            if constrained || materialized {
                tracing::debug!(entity = %entity, "scheduled by change");
                closure.insert(entity.clone());
            }
        }

        let mut queue: VecDeque<Resource> = closure.iter().cloned().collect();
        while let Some(entity) = queue.pop_front() {
            for dependent in self.dependencies.dependents(txn, &entity)? {
                if closure.insert(dependent.clone()) {
                    tracing::debug!(entity = %dependent, via = %entity, "scheduled by dependency");
                    queue.push_back(dependent);
                }
            }
        }
        Ok(closure)
    }
}

// =============================================================================
// Schema Changes
// =============================================================================

/// Every property named by an `rules:onProperty` fact, including those
/// the transaction removed.
fn computed_properties(txn: &dyn Transaction, removed: &[FactChange]) -> Result<IndexSet<Resource>> {
    let pattern = FactPattern::any()
        .with_predicate(vocab::resource(rules::ON_PROPERTY))
        .asserted();
    Ok(txn
        .facts(&pattern)?
        .into_iter()
        .chain(removed.iter().map(|change| change.fact().clone()))
        .filter(|fact| fact.predicate.as_iri() == Some(rules::ON_PROPERTY))
        .filter_map(|fact| match fact.object {
            Term::Resource(property @ Resource::Iri(_)) => Some(property),
            _ => None,
        })
        .collect())
}

/// Schema facts as they are now, together with the facts the transaction
/// removed, so that both old and new declarations count.
struct SchemaView<'a> {
    txn: &'a dyn Transaction,
    changes: &'a [FactChange],
}

impl SchemaView<'_> {
    fn objects(&self, subject: &Resource, predicate: &str) -> Result<Vec<Resource>> {
        let mut found = IndexSet::new();
        for change in self.changes {
            let fact = change.fact();
            if &fact.subject == subject && fact.predicate.as_iri() == Some(predicate) {
                if let Term::Resource(object) = &fact.object {
                    found.insert(object.clone());
                }
            }
        }
        let pattern = FactPattern::about(subject, &vocab::resource(predicate)).asserted();
        for fact in self.txn.facts(&pattern)? {
            if let Term::Resource(object) = fact.object {
                found.insert(object);
            }
        }
        Ok(found.into_iter().collect())
    }

    fn subjects(&self, predicate: &str, object: &Resource) -> Result<Vec<Resource>> {
        let mut found = IndexSet::new();
        for change in self.changes {
            let fact = change.fact();
            if fact.predicate.as_iri() == Some(predicate) && fact.object.as_resource() == Some(object) {
                found.insert(fact.subject.clone());
            }
        }
        let pattern = FactPattern::any()
            .with_predicate(vocab::resource(predicate))
            .with_object(object.clone())
            .asserted();
        found.extend(self.txn.facts(&pattern)?.into_iter().map(|f| f.subject));
        Ok(found.into_iter().collect())
    }

    /// Properties constrained on `class`, old or new, own or inherited.
    fn properties(
        &self,
        class: &Resource,
        memo: &mut IndexMap<Resource, Vec<Resource>>,
        visiting: &mut HashSet<Resource>,
    ) -> Result<Vec<Resource>> {
        if let Some(properties) = memo.get(class) {
            return Ok(properties.clone());
        }
        if !visiting.insert(class.clone()) {
            return Ok(Vec::new());
        }

        let mut properties = IndexSet::new();
        for node in self.objects(class, rules::CONSTRAINT)? {
            for property in self.objects(&node, rules::ON_PROPERTY)? {
                if property.is_iri() {
                    properties.insert(property);
                }
            }
        }
        for superclass in self.objects(class, rdfs::SUB_CLASS_OF)? {
            properties.extend(self.properties(&superclass, memo, visiting)?);
        }

        visiting.remove(class);
        let properties: Vec<Resource> = properties.into_iter().collect();
        memo.insert(class.clone(), properties.clone());
        Ok(properties)
    }
}

/// Classes whose instances a schema change affects.
///
/// Seeds are classes whose constraint links changed, classes owning a
/// constraint node whose property or expression changed, and subjects of
/// changed `rdfs:subClassOf` facts. Subclasses of every seed are affected
/// too. Classes with no constrained property, old or new, are dropped.
fn affected_classes(txn: &dyn Transaction, changes: &[FactChange]) -> Result<Vec<Resource>> {
    if changes.is_empty() {
        return Ok(Vec::new());
    }
    let view = SchemaView { txn, changes };

    let mut seeds = IndexSet::new();
    for change in changes {
        let fact = change.fact();
        match fact.predicate.as_iri() {
            Some(rules::CONSTRAINT | rdfs::SUB_CLASS_OF) => {
                seeds.insert(fact.subject.clone());
            }
            Some(rules::ON_PROPERTY | rules::EXPRESSION_STRING | sh::PREFIXES) => {
                seeds.extend(view.subjects(rules::CONSTRAINT, &fact.subject)?);
            }
            _ => {}
        }
    }

    let mut memo = IndexMap::new();
    let mut affected = IndexSet::new();
    let mut queue: VecDeque<Resource> = seeds.into_iter().collect();
    while let Some(class) = queue.pop_front() {
        if !affected.insert(class.clone()) {
            continue;
        }
        for subclass in view.subjects(rdfs::SUB_CLASS_OF, &class)? {
            queue.push_back(subclass);
        }
    }

    let mut classes = Vec::new();
    for class in affected {
        if !view.properties(&class, &mut memo, &mut HashSet::new())?.is_empty() {
            classes.push(class);
        }
    }
    tracing::debug!(classes = classes.len(), "schema change affects classes");
    Ok(classes)
}
