//! Subject/predicate/object/context assertions.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::literal::Term;
use crate::resource::Resource;

/// A single assertion in the store.
///
/// `context` names the graph the fact belongs to; `None` is the default graph.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fact {
    /// The node the fact is about.
    pub subject: Resource,
    /// The property.
    pub predicate: Resource,
    /// The value.
    pub object: Term,
    /// The graph containing this fact.
    pub context: Option<Resource>,
}

impl Fact {
    /// Creates a fact in the default graph.
    #[must_use]
    pub fn new(subject: Resource, predicate: Resource, object: impl Into<Term>) -> Self {
        Self {
            subject,
            predicate,
            object: object.into(),
            context: None,
        }
    }

    /// Places this fact in the given graph.
    #[must_use]
    pub fn in_context(mut self, context: Option<Resource>) -> Self {
        self.context = context;
        self
    }
}

impl fmt::Debug for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if let Some(ctx) = &self.context {
            write!(f, " {ctx}")?;
        }
        Ok(())
    }
}
