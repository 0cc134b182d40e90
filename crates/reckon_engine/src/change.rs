//! Collecting what a transaction changed.

use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexSet;
use reckon_foundation::vocab::{owl, rdf, rdfs, rules, sh};
use reckon_foundation::{Fact, Resource};
use reckon_store::{ChangeListener, FactChange};

use crate::types::ResourceTypeCache;

/// Predicates whose facts declare constraints or the class hierarchy.
const SCHEMA_PREDICATES: [&str; 5] = [
    rules::CONSTRAINT,
    rules::ON_PROPERTY,
    rules::EXPRESSION_STRING,
    sh::PREFIXES,
    rdfs::SUB_CLASS_OF,
];

/// Predicates whose facts declare prefixes for expressions. A declaration
/// node may be shared by any number of constraints.
const PREFIX_PREDICATES: [&str; 3] = [sh::DECLARE, sh::PREFIX, sh::NAMESPACE];

/// The asserted changes of one transaction, as the scheduler needs them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
    entities: IndexSet<Resource>,
    schema: Vec<FactChange>,
    imports_changed: bool,
    prefixes_changed: bool,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.schema.is_empty() && !self.imports_changed && !self.prefixes_changed
    }

    /// Returns the subjects of changed facts, in first-changed order.
    pub fn entities(&self) -> impl Iterator<Item = &Resource> {
        self.entities.iter()
    }

    /// Returns the changes to constraint declarations and the class hierarchy.
    #[must_use]
    pub fn schema_changes(&self) -> &[FactChange] {
        &self.schema
    }

    /// Returns true if `owl:imports` facts changed.
    #[must_use]
    pub fn imports_changed(&self) -> bool {
        self.imports_changed
    }

    /// Returns true if prefix declarations changed.
    #[must_use]
    pub fn prefixes_changed(&self) -> bool {
        self.prefixes_changed
    }

    /// Records one change.
    pub fn record(&mut self, change: &FactChange) {
        let fact = change.fact();
        self.entities.insert(fact.subject.clone());

        let predicate = fact.predicate.as_iri().unwrap_or_default();
        if SCHEMA_PREDICATES.contains(&predicate) {
            self.schema.push(change.clone());
        } else if PREFIX_PREDICATES.contains(&predicate) {
            self.prefixes_changed = true;
        } else if predicate == owl::IMPORTS {
            self.imports_changed = true;
        }
    }
}

/// Listener turning store change events into a [`ChangeSet`].
///
/// Type changes invalidate the entity's cached types right away, so the
/// scheduler sees the new types. Events arriving while a pass runs are the
/// pass's own writes and are ignored.
#[derive(Debug)]
pub struct ChangeTracker<'m> {
    types: &'m ResourceTypeCache,
    in_pass: &'m AtomicBool,
    changes: ChangeSet,
}

impl<'m> ChangeTracker<'m> {
    /// Creates a tracker that invalidates `types`.
    #[must_use]
    pub fn new(types: &'m ResourceTypeCache, in_pass: &'m AtomicBool) -> Self {
        Self {
            types,
            in_pass,
            changes: ChangeSet::default(),
        }
    }

    /// Returns the collected changes.
    #[must_use]
    pub fn into_changes(self) -> ChangeSet {
        self.changes
    }

    fn observe(&mut self, change: &FactChange) {
        if self.in_pass.load(Ordering::Acquire) {
            return;
        }
        let fact = change.fact();
        if fact.predicate.as_iri() == Some(rdf::TYPE) {
            self.types.invalidate(&fact.subject);
        }
        self.changes.record(change);
    }
}

impl ChangeListener for ChangeTracker<'_> {
    fn fact_added(&mut self, fact: &Fact) {
        self.observe(&FactChange::Added(fact.clone()));
    }

    fn fact_removed(&mut self, fact: &Fact) {
        self.observe(&FactChange::Removed(fact.clone()));
    }
}
