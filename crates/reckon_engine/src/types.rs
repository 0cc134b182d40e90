//! Per-entity type information.

use std::sync::Arc;

use dashmap::DashMap;
use reckon_foundation::vocab::{self, rdf};
use reckon_foundation::{Resource, Result, Term};
use reckon_store::{FactPattern, Transaction};

use crate::ranking::ClassOrdering;

/// The asserted types of an entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Direct types, most specific first.
    pub types: Vec<Resource>,
    /// Graphs holding the type facts, in first-seen order.
    pub contexts: Vec<Option<Resource>>,
}

impl ResourceInfo {
    /// Returns true if the entity has no asserted type.
    #[must_use]
    pub fn is_untyped(&self) -> bool {
        self.types.is_empty()
    }
}

/// Lazily loaded [`ResourceInfo`] per entity.
#[derive(Debug)]
pub struct ResourceTypeCache {
    ordering: ClassOrdering,
    entries: DashMap<Resource, Arc<ResourceInfo>>,
}

impl ResourceTypeCache {
    /// Creates an empty cache that sorts types with `ordering`.
    #[must_use]
    pub fn new(ordering: ClassOrdering) -> Self {
        Self {
            ordering,
            entries: DashMap::new(),
        }
    }

    /// Returns the type information of `entity`, loading it on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if the type facts cannot be read.
    pub fn get(&self, txn: &dyn Transaction, entity: &Resource) -> Result<Arc<ResourceInfo>> {
        if let Some(info) = self.entries.get(entity) {
            return Ok(Arc::clone(info.value()));
        }

        let pattern = FactPattern::about(entity, &vocab::resource(rdf::TYPE)).asserted();
        let mut info = ResourceInfo::default();
        for fact in txn.facts(&pattern)? {
            let Term::Resource(class) = fact.object else {
                continue;
            };
            if !info.types.contains(&class) {
                info.types.push(class);
            }
            if !info.contexts.contains(&fact.context) {
                info.contexts.push(fact.context);
            }
        }
        self.ordering.sort(&mut info.types);

        let info = Arc::new(info);
        self.entries.insert(entity.clone(), Arc::clone(&info));
        Ok(info)
    }

    /// Drops the cached entry of `entity`.
    pub fn invalidate(&self, entity: &Resource) {
        self.entries.remove(entity);
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns the number of cached entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
