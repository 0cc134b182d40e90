//! Ordering of classes by how specific they are.
//!
//! An entity usually has several types, and a class several superclasses.
//! Constraints are looked up in that order, so the first class that declares
//! a constraint for a property wins. Classes from standard vocabularies are
//! the least specific and go last; blank node classes go after everything.

use std::cmp::Ordering;

use reckon_foundation::Resource;
use reckon_foundation::vocab::{owl, rdf, rdfs, xsd};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ranks classes by namespace.
///
/// Namespaces are listed from most standard to least. A class in the
/// namespace at position `i` has rank `i`; any other IRI ranks after all of
/// them. Higher ranks sort first; ties are broken by IRI.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassOrdering {
    namespaces: Vec<String>,
}

impl Default for ClassOrdering {
    fn default() -> Self {
        Self::new([xsd::NS, rdf::NS, rdfs::NS, owl::NS])
    }
}

impl ClassOrdering {
    /// Creates an ordering from namespaces listed most standard first.
    #[must_use]
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends a namespace, less standard than those already listed.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    /// Returns the ranked namespaces.
    #[must_use]
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Returns the rank of an IRI's namespace.
    #[must_use]
    pub fn rank(&self, class: &Resource) -> usize {
        class
            .namespace()
            .and_then(|ns| self.namespaces.iter().position(|known| known == ns))
            .unwrap_or(self.namespaces.len() + 1)
    }

    /// Compares two classes; the more specific one is `Less`.
    #[must_use]
    pub fn compare(&self, a: &Resource, b: &Resource) -> Ordering {
        match (a.is_iri(), b.is_iri()) {
            (false, false) => a.cmp(b),
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (true, true) => self
                .rank(b)
                .cmp(&self.rank(a))
                .then_with(|| a.cmp(b)),
        }
    }

    /// Sorts classes, most specific first.
    pub fn sort(&self, classes: &mut [Resource]) {
        classes.sort_by(|a, b| self.compare(a, b));
    }
}
