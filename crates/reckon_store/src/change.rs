//! Change notifications delivered before commit.

use reckon_foundation::Fact;

/// An asserted fact added or removed by a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactChange {
    /// The fact was added.
    Added(Fact),
    /// The fact was removed.
    Removed(Fact),
}

impl FactChange {
    /// Returns the changed fact.
    #[must_use]
    pub const fn fact(&self) -> &Fact {
        match self {
            Self::Added(fact) | Self::Removed(fact) => fact,
        }
    }

    /// Returns true for additions.
    #[must_use]
    pub const fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }

    /// Delivers this change to a listener.
    pub fn deliver(&self, listener: &mut dyn ChangeListener) {
        match self {
            Self::Added(fact) => listener.fact_added(fact),
            Self::Removed(fact) => listener.fact_removed(fact),
        }
    }
}

/// Receives the asserted changes of a transaction.
pub trait ChangeListener {
    /// Called for each asserted fact added.
    fn fact_added(&mut self, fact: &Fact);

    /// Called for each asserted fact removed.
    fn fact_removed(&mut self, fact: &Fact);
}
