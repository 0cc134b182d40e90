//! Opaque identifiers for graph nodes.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a graph node.
///
/// Resources are either IRIs or blank nodes. Equality is by value and cloning
/// is O(1).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Resource {
    /// A globally named node.
    Iri(Arc<str>),
    /// An anonymous node, local to the store.
    Blank(Arc<str>),
}

impl Resource {
    /// Creates an IRI resource.
    #[must_use]
    pub fn iri(iri: impl AsRef<str>) -> Self {
        Self::Iri(Arc::from(iri.as_ref()))
    }

    /// Creates a blank node resource.
    #[must_use]
    pub fn blank(id: impl AsRef<str>) -> Self {
        Self::Blank(Arc::from(id.as_ref()))
    }

    /// Returns true if this is an IRI.
    #[must_use]
    pub const fn is_iri(&self) -> bool {
        matches!(self, Self::Iri(_))
    }

    /// Returns true if this is a blank node.
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    /// Returns the IRI text, if this is an IRI.
    #[must_use]
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            Self::Blank(_) => None,
        }
    }

    /// Returns the namespace part of an IRI.
    ///
    /// The namespace ends with the last `#`, `/` or `:`. Blank nodes have no namespace.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        let iri = self.as_iri()?;
        let split = split_index(iri);
        Some(&iri[..split])
    }

    /// Returns the local name part of an IRI, or the blank node id.
    #[must_use]
    pub fn local_name(&self) -> &str {
        match self {
            Self::Iri(iri) => &iri[split_index(iri)..],
            Self::Blank(id) => id,
        }
    }
}

fn split_index(iri: &str) -> usize {
    iri.rfind(['#', '/', ':']).map_or(0, |i| i + 1)
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::Blank(id) => write!(f, "_:{id}"),
        }
    }
}
