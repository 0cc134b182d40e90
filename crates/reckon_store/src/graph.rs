//! Indexed fact sets with structural sharing.
//!
//! A `FactGraph` keeps every fact once plus subject, predicate and object
//! indexes. All collections are persistent, so cloning a graph is O(1) and a
//! transaction can work on its own copy without blocking readers.

use im::{OrdMap, OrdSet};
use reckon_foundation::{Fact, Resource, Term};

use crate::pattern::FactPattern;

/// An indexed set of facts.
#[derive(Clone, Debug, Default)]
pub struct FactGraph {
    facts: OrdSet<Fact>,
    by_subject: OrdMap<Resource, OrdSet<Fact>>,
    by_predicate: OrdMap<Resource, OrdSet<Fact>>,
    by_object: OrdMap<Term, OrdSet<Fact>>,
}

impl FactGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns true if the graph holds no facts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Returns true if the graph holds exactly this fact.
    #[must_use]
    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts.contains(fact)
    }

    /// Iterates over all facts in order.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    /// Inserts a fact. Returns true if it was not already present.
    pub fn insert(&mut self, fact: Fact) -> bool {
        if self.facts.contains(&fact) {
            return false;
        }
        index_insert(&mut self.by_subject, fact.subject.clone(), &fact);
        index_insert(&mut self.by_predicate, fact.predicate.clone(), &fact);
        index_insert(&mut self.by_object, fact.object.clone(), &fact);
        self.facts.insert(fact);
        true
    }

    /// Removes a fact. Returns true if it was present.
    pub fn remove(&mut self, fact: &Fact) -> bool {
        if self.facts.remove(fact).is_none() {
            return false;
        }
        index_remove(&mut self.by_subject, &fact.subject, fact);
        index_remove(&mut self.by_predicate, &fact.predicate, fact);
        index_remove(&mut self.by_object, &fact.object, fact);
        true
    }

    /// Returns every fact matching the pattern's positions and contexts.
    #[must_use]
    pub fn matching(&self, pattern: &FactPattern) -> Vec<Fact> {
        self.candidates(pattern)
            .filter(|fact| pattern.matches(fact))
            .cloned()
            .collect()
    }

    /// Returns true if any fact matches the pattern.
    #[must_use]
    pub fn any_matching(&self, pattern: &FactPattern) -> bool {
        self.candidates(pattern).any(|fact| pattern.matches(fact))
    }

    /// Removes and returns every fact matching the pattern.
    pub fn remove_matching(&mut self, pattern: &FactPattern) -> Vec<Fact> {
        let removed = self.matching(pattern);
        for fact in &removed {
            self.remove(fact);
        }
        removed
    }

    /// Picks the smallest index that covers the pattern.
    fn candidates<'a>(&'a self, pattern: &FactPattern) -> Box<dyn Iterator<Item = &'a Fact> + 'a> {
        let mut best: Option<&'a OrdSet<Fact>> = None;
        let empty = || Box::new(std::iter::empty()) as Box<dyn Iterator<Item = &'a Fact> + 'a>;

        if let Some(subject) = &pattern.subject {
            match self.by_subject.get(subject) {
                Some(set) => best = Some(set),
                None => return empty(),
            }
        }
        if let Some(object) = &pattern.object {
            match self.by_object.get(object) {
                Some(set) => {
                    if best.is_none_or(|b| set.len() < b.len()) {
                        best = Some(set);
                    }
                }
                None => return empty(),
            }
        }
        if let Some(predicate) = &pattern.predicate {
            match self.by_predicate.get(predicate) {
                Some(set) => {
                    if best.is_none_or(|b| set.len() < b.len()) {
                        best = Some(set);
                    }
                }
                None => return empty(),
            }
        }

        match best {
            Some(set) => Box::new(set.iter()),
            None => Box::new(self.facts.iter()),
        }
    }
}

fn index_insert<K: Ord + Clone>(index: &mut OrdMap<K, OrdSet<Fact>>, key: K, fact: &Fact) {
    let mut set = index.get(&key).cloned().unwrap_or_default();
    set.insert(fact.clone());
    index.insert(key, set);
}

fn index_remove<K: Ord + Clone>(index: &mut OrdMap<K, OrdSet<Fact>>, key: &K, fact: &Fact) {
    if let Some(set) = index.get(key) {
        let mut set = set.clone();
        set.remove(fact);
        if set.is_empty() {
            index.remove(key);
        } else {
            index.insert(key.clone(), set);
        }
    }
}

impl FromIterator<Fact> for FactGraph {
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        let mut graph = Self::new();
        for fact in iter {
            graph.insert(fact);
        }
        graph
    }
}
