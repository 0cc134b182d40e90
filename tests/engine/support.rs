//! Shared fixtures for engine and integration tests.

#![allow(dead_code)]

use reckon_engine::{MaterializerConfig, MaterializingConnection, MaterializingStore, PassReport};
use reckon_expr::RuleDocument;
use reckon_foundation::vocab::{self, owl, rdf};
use reckon_foundation::{Fact, Resource, Term};
use reckon_store::{FactPattern, MemoryStore};

pub type Store = MaterializingStore<MemoryStore>;

pub fn iri(s: &str) -> Resource {
    Resource::iri(format!("http://example.org/{s}"))
}

pub fn typed(entity: &str, class: &str) -> Fact {
    Fact::new(iri(entity), vocab::resource(rdf::TYPE), iri(class))
}

pub fn value(entity: &str, property: &str, v: impl Into<Term>) -> Fact {
    Fact::new(iri(entity), iri(property), v)
}

pub fn link(entity: &str, property: &str, target: &str) -> Fact {
    Fact::new(iri(entity), iri(property), iri(target))
}

pub fn imports(graph: &str, imported: &str) -> Fact {
    Fact::new(iri(graph), vocab::resource(owl::IMPORTS), iri(imported)).in_context(Some(iri(graph)))
}

/// Parses constraint lines under the `http://example.org/` default prefix.
pub fn rules(body: &str) -> RuleDocument {
    RuleDocument::parse(&format!("prefix : <http://example.org/>\n{body}")).unwrap()
}

pub fn store() -> Store {
    MaterializingStore::new(MemoryStore::new())
}

pub fn full_only_store() -> Store {
    MaterializingStore::with_config(MemoryStore::new(), MaterializerConfig::full_only())
}

/// Runs `edit` in one transaction and commits it.
pub fn commit(store: &Store, edit: impl FnOnce(&mut MaterializingConnection<'_, MemoryStore>)) -> PassReport {
    let mut conn = store.connection();
    conn.begin().unwrap();
    edit(&mut conn);
    conn.commit().unwrap()
}

/// Loads `rules` in the default graph together with `facts`.
pub fn setup(store: &Store, rules: &RuleDocument, facts: Vec<Fact>) -> PassReport {
    commit(store, |conn| {
        conn.load_rules(rules, None).unwrap();
        for fact in facts {
            conn.add(fact).unwrap();
        }
    })
}

/// Replaces every asserted value of `entity`'s `property`.
pub fn set(conn: &mut MaterializingConnection<'_, MemoryStore>, entity: &str, property: &str, v: impl Into<Term>) {
    conn.remove(&FactPattern::about(&iri(entity), &iri(property)))
        .unwrap();
    conn.add(value(entity, property, v)).unwrap();
}

/// Committed derived objects of `entity`'s `property`, in store order.
pub fn derived(store: &Store, entity: &str, property: &str) -> Vec<Term> {
    store
        .facts(&FactPattern::about(&iri(entity), &iri(property)).derived())
        .unwrap()
        .into_iter()
        .map(|f| f.object)
        .collect()
}

/// The single committed derived value of `entity`'s `property`.
pub fn derived_one(store: &Store, entity: &str, property: &str) -> Option<Term> {
    let values = derived(store, entity, property);
    assert!(values.len() <= 1, "{entity} {property} has {} derived values", values.len());
    values.into_iter().next()
}

/// Every committed derived fact.
pub fn all_derived(store: &Store) -> Vec<Fact> {
    let mut facts = store.facts(&FactPattern::any().derived()).unwrap();
    facts.sort();
    facts
}
