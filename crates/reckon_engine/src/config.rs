//! Configuration for the materializer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ranking::ClassOrdering;

/// Bound on cached import closures.
pub const DATASET_CACHE_CAPACITY: usize = 10_000;

/// Bound on cached parsed expressions.
pub const EXPRESSION_CACHE_CAPACITY: usize = 10_000;

/// Configuration for the materializer.
///
/// Fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MaterializerConfig {
    /// Re-evaluate only affected entities after the first pass.
    ///
    /// When false every commit runs a full pass.
    pub incremental: bool,

    /// Order in which an entity's classes are searched for constraints.
    pub class_ordering: ClassOrdering,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            incremental: true,
            class_ordering: ClassOrdering::default(),
        }
    }
}

impl MaterializerConfig {
    /// Creates a configuration that runs a full pass on every commit.
    #[must_use]
    pub fn full_only() -> Self {
        Self {
            incremental: false,
            ..Self::default()
        }
    }

    /// Builder method to enable or disable incremental passes.
    #[must_use]
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    /// Builder method to set the class ordering.
    #[must_use]
    pub fn with_class_ordering(mut self, ordering: ClassOrdering) -> Self {
        self.class_ordering = ordering;
        self
    }
}
