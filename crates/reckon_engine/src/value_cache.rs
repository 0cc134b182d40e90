//! Memoized evaluation results.

use std::collections::HashMap;

use dashmap::DashMap;
use reckon_expr::EvalResult;
use reckon_foundation::Resource;

type Slots = HashMap<(Option<Resource>, Resource), EvalResult>;

/// Results of successful evaluations, by entity, write context and property.
///
/// Entries are dropped per entity, so invalidating an entity forgets every
/// property computed on it in every context.
#[derive(Debug, Default)]
pub struct ValueCache {
    entities: DashMap<Resource, Slots>,
}

impl ValueCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the memoized result readable from `read_contexts`.
    ///
    /// An empty slice reads the unrestricted slot. Otherwise the first
    /// context holding a result wins.
    #[must_use]
    pub fn get(&self, entity: &Resource, property: &Resource, read_contexts: &[Resource]) -> Option<EvalResult> {
        let slots = self.entities.get(entity)?;
        if read_contexts.is_empty() {
            return slots.get(&(None, property.clone())).cloned();
        }
        read_contexts
            .iter()
            .find_map(|ctx| slots.get(&(Some(ctx.clone()), property.clone())))
            .cloned()
    }

    /// Returns true if a result is stored in exactly this slot.
    #[must_use]
    pub fn contains(&self, entity: &Resource, context: Option<&Resource>, property: &Resource) -> bool {
        self.entities
            .get(entity)
            .is_some_and(|slots| slots.contains_key(&(context.cloned(), property.clone())))
    }

    /// Stores a result.
    pub fn put(&self, entity: &Resource, context: Option<Resource>, property: &Resource, result: EvalResult) {
        self.entities
            .entry(entity.clone())
            .or_default()
            .insert((context, property.clone()), result);
    }

    /// Drops one result.
    pub fn remove(&self, entity: &Resource, context: Option<&Resource>, property: &Resource) {
        if let Some(mut slots) = self.entities.get_mut(entity) {
            slots.remove(&(context.cloned(), property.clone()));
        }
    }

    /// Drops every result computed on `entity`.
    pub fn invalidate(&self, entity: &Resource) {
        self.entities.remove(entity);
    }

    /// Drops everything.
    pub fn clear(&self) {
        self.entities.clear();
    }

    /// Returns the number of stored results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.iter().map(|e| e.value().len()).sum()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
