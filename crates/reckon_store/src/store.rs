//! Fact store adapter interface.

use reckon_foundation::{Fact, Result};

use crate::change::FactChange;
use crate::isolation::IsolationLevel;
use crate::pattern::FactPattern;

/// An open transaction against a [`FactStore`].
///
/// Reads observe the transaction's own writes. The trait is object safe so
/// the engine can work against `&mut dyn Transaction`.
pub trait Transaction: Send {
    /// Returns the level the transaction runs at.
    fn isolation_level(&self) -> IsolationLevel;

    /// Returns every fact matching the pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn facts(&self, pattern: &FactPattern) -> Result<Vec<Fact>>;

    /// Returns true if any fact matches the pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn contains(&self, pattern: &FactPattern) -> Result<bool> {
        Ok(!self.facts(pattern)?.is_empty())
    }

    /// Adds an asserted fact.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    fn add(&mut self, fact: Fact) -> Result<()>;

    /// Removes asserted facts matching the pattern. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    fn remove(&mut self, pattern: &FactPattern) -> Result<usize>;

    /// Adds a derived fact.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    fn add_derived(&mut self, fact: Fact) -> Result<()>;

    /// Removes derived facts matching the pattern. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    fn remove_derived(&mut self, pattern: &FactPattern) -> Result<usize>;

    /// Takes the asserted changes made since the last call, in order.
    ///
    /// Derived writes are never reported.
    fn drain_changes(&mut self) -> Vec<FactChange>;
}

/// A transactional store of asserted and derived facts.
pub trait FactStore: Send + Sync {
    /// Transaction type handed out by [`FactStore::begin`].
    type Transaction: Transaction;

    /// Levels this store can run transactions at.
    fn supported_isolation_levels(&self) -> &[IsolationLevel];

    /// Level used when the caller does not ask for one.
    fn default_isolation_level(&self) -> IsolationLevel;

    /// Starts a transaction at the weakest supported level compatible with `level`.
    ///
    /// # Errors
    ///
    /// Returns [`reckon_foundation::ErrorKind::IsolationLevelUnsupported`] if no
    /// supported level is compatible.
    fn begin(&self, level: IsolationLevel) -> Result<Self::Transaction>;

    /// Makes a transaction's writes visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit conflicts or the store fails.
    fn commit(&self, txn: Self::Transaction) -> Result<()>;

    /// Discards a transaction's writes.
    fn rollback(&self, txn: Self::Transaction);

    /// Queries committed state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn facts(&self, pattern: &FactPattern) -> Result<Vec<Fact>>;
}
