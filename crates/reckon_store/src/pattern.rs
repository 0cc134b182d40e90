//! Fact patterns for store queries.

use reckon_foundation::{Fact, Resource, Term};

/// Restricts which graphs a pattern matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ContextFilter {
    /// Facts in any graph, including the default graph.
    #[default]
    Any,
    /// Facts in one of the listed graphs. `None` is the default graph.
    Only(Vec<Option<Resource>>),
}

impl ContextFilter {
    /// Returns true if a fact in `context` passes this filter.
    #[must_use]
    pub fn matches(&self, context: Option<&Resource>) -> bool {
        match self {
            Self::Any => true,
            Self::Only(contexts) => contexts.iter().any(|c| c.as_ref() == context),
        }
    }
}

/// Restricts a pattern to asserted facts, derived facts, or both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OriginFilter {
    /// Both asserted and derived facts.
    #[default]
    Any,
    /// User data only.
    Asserted,
    /// Engine-produced facts only.
    Derived,
}

impl OriginFilter {
    /// Returns true if asserted facts pass this filter.
    #[must_use]
    pub const fn includes_asserted(self) -> bool {
        matches!(self, Self::Any | Self::Asserted)
    }

    /// Returns true if derived facts pass this filter.
    #[must_use]
    pub const fn includes_derived(self) -> bool {
        matches!(self, Self::Any | Self::Derived)
    }
}

/// A query over facts. Unset positions match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FactPattern {
    /// Required subject.
    pub subject: Option<Resource>,
    /// Required predicate.
    pub predicate: Option<Resource>,
    /// Required object.
    pub object: Option<Term>,
    /// Graphs to search.
    pub contexts: ContextFilter,
    /// Asserted, derived, or both.
    pub origin: OriginFilter,
}

impl FactPattern {
    /// Creates a pattern that matches every fact.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Creates a pattern with the given subject and predicate.
    #[must_use]
    pub fn about(subject: &Resource, predicate: &Resource) -> Self {
        Self::any()
            .with_subject(subject.clone())
            .with_predicate(predicate.clone())
    }

    /// Creates a pattern matching exactly `fact` in its own graph.
    #[must_use]
    pub fn exact(fact: &Fact) -> Self {
        Self::about(&fact.subject, &fact.predicate)
            .with_object(fact.object.clone())
            .in_context(fact.context.clone())
    }

    /// Requires the given subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Resource) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Requires the given predicate.
    #[must_use]
    pub fn with_predicate(mut self, predicate: Resource) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Requires the given object.
    #[must_use]
    pub fn with_object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Restricts the pattern to the given graphs.
    #[must_use]
    pub fn in_contexts(mut self, contexts: Vec<Option<Resource>>) -> Self {
        self.contexts = ContextFilter::Only(contexts);
        self
    }

    /// Restricts the pattern to a single graph.
    #[must_use]
    pub fn in_context(self, context: Option<Resource>) -> Self {
        self.in_contexts(vec![context])
    }

    /// Matches asserted facts only.
    #[must_use]
    pub fn asserted(mut self) -> Self {
        self.origin = OriginFilter::Asserted;
        self
    }

    /// Matches derived facts only.
    #[must_use]
    pub fn derived(mut self) -> Self {
        self.origin = OriginFilter::Derived;
        self
    }

    /// Returns true if `fact` matches every position of this pattern.
    ///
    /// Origin is not checked here; stores apply it when choosing which
    /// facts to search.
    #[must_use]
    pub fn matches(&self, fact: &Fact) -> bool {
        self.subject.as_ref().is_none_or(|s| *s == fact.subject)
            && self.predicate.as_ref().is_none_or(|p| *p == fact.predicate)
            && self.object.as_ref().is_none_or(|o| *o == fact.object)
            && self.contexts.matches(fact.context.as_ref())
    }
}
