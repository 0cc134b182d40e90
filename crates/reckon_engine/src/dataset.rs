//! Import closures of graphs.
//!
//! Evaluation for an entity typed in graph `g` sees `g` and every graph `g`
//! imports, transitively, through `owl:imports` facts stated inside the
//! importing graph.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use reckon_foundation::vocab::{self, owl};
use reckon_foundation::{Resource, Result, Term};
use reckon_store::{ContextFilter, FactPattern, Transaction};

use crate::cache::ShardedLru;
use crate::config::DATASET_CACHE_CAPACITY;

/// The graphs visible to one evaluation.
///
/// An empty dataset is unrestricted: every graph is visible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    contexts: Vec<Resource>,
}

impl Dataset {
    /// Creates a dataset that sees every graph.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Creates a dataset over the given graphs, root first.
    #[must_use]
    pub fn new(contexts: Vec<Resource>) -> Self {
        Self { contexts }
    }

    /// Returns true if every graph is visible.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Returns the graph the closure was computed from.
    #[must_use]
    pub fn root(&self) -> Option<&Resource> {
        self.contexts.first()
    }

    /// Returns the visible graphs in discovery order.
    #[must_use]
    pub fn contexts(&self) -> &[Resource] {
        &self.contexts
    }

    /// Returns true if facts in `context` are visible.
    #[must_use]
    pub fn allows(&self, context: Option<&Resource>) -> bool {
        self.is_unrestricted() || context.is_some_and(|c| self.contexts.contains(c))
    }

    /// Returns the context filter restricting queries to this dataset.
    #[must_use]
    pub fn view(&self) -> ContextFilter {
        if self.is_unrestricted() {
            ContextFilter::Any
        } else {
            ContextFilter::Only(self.contexts.iter().cloned().map(Some).collect())
        }
    }
}

/// Computes and caches [`Dataset`]s by root graph.
#[derive(Debug)]
pub struct DatasetResolver {
    cache: ShardedLru<Resource, Arc<Dataset>>,
    unrestricted: Arc<Dataset>,
}

impl Default for DatasetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetResolver {
    /// Creates a resolver with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: ShardedLru::new(DATASET_CACHE_CAPACITY),
            unrestricted: Arc::new(Dataset::unrestricted()),
        }
    }

    /// Returns the dataset rooted at `root`. No root means unrestricted.
    ///
    /// # Errors
    ///
    /// Returns an error if the import facts cannot be read.
    pub fn resolve(&self, txn: &dyn Transaction, root: Option<&Resource>) -> Result<Arc<Dataset>> {
        let Some(root) = root else {
            return Ok(Arc::clone(&self.unrestricted));
        };
        self.cache
            .try_get_or_insert_with(root.clone(), || Self::closure(txn, root).map(Arc::new))
    }

    fn closure(txn: &dyn Transaction, root: &Resource) -> Result<Dataset> {
        let imports = vocab::resource(owl::IMPORTS);
        let mut contexts = Vec::new();
        let mut seen = HashSet::from([root.clone()]);
        let mut queue = VecDeque::from([root.clone()]);

        while let Some(current) = queue.pop_front() {
            let pattern = FactPattern::about(&current, &imports)
                .in_context(Some(current.clone()))
                .asserted();
            for fact in txn.facts(&pattern)? {
                if let Term::Resource(imported @ Resource::Iri(_)) = fact.object {
                    if seen.insert(imported.clone()) {
                        queue.push_back(imported);
                    }
                }
            }
            contexts.push(current);
        }

        tracing::debug!(root = %root, graphs = contexts.len(), "resolved dataset");
        Ok(Dataset::new(contexts))
    }

    /// Drops every cached closure.
    pub fn clear(&self) {
        self.cache.clear();
    }
}
