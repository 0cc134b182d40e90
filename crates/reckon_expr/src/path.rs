//! The stack of (entity, property) pairs under evaluation.

use std::fmt;

use reckon_foundation::Resource;

/// One (entity, property) pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathEntry {
    /// The entity whose property is computed.
    pub entity: Resource,
    /// The computed property.
    pub property: Resource,
}

impl PathEntry {
    /// Creates a pair.
    #[must_use]
    pub const fn new(entity: Resource, property: Resource) -> Self {
        Self { entity, property }
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.entity, self.property)
    }
}

/// The active chain of pairs on one evaluation call tree.
///
/// Owned by a single evaluator; never shared between concurrent evaluations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvaluationPath {
    entries: Vec<PathEntry>,
}

impl EvaluationPath {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a pair entered by evaluation.
    pub fn push(&mut self, entry: PathEntry) {
        self.entries.push(entry);
    }

    /// Pops the innermost pair.
    pub fn pop(&mut self) -> Option<PathEntry> {
        self.entries.pop()
    }

    /// Returns the innermost pair.
    #[must_use]
    pub fn top(&self) -> Option<&PathEntry> {
        self.entries.last()
    }

    /// Returns true if the pair is already being evaluated.
    #[must_use]
    pub fn contains(&self, entry: &PathEntry) -> bool {
        self.entries.contains(entry)
    }

    /// Returns the number of pairs on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no evaluation is in progress.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates from the outermost pair to the innermost.
    pub fn iter(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.iter()
    }
}
