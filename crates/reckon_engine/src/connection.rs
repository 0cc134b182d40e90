//! Store wrapper that materializes derived facts on commit.

use std::sync::Arc;

use parking_lot::Mutex;
use reckon_expr::RuleDocument;
use reckon_foundation::{Error, ErrorKind, Fact, Resource, Result};
use reckon_store::{FactChange, FactPattern, FactStore, IsolationLevel, Transaction};

use crate::config::MaterializerConfig;
use crate::scheduler::{Materializer, PassReport};

/// Weakest isolation level a materializing transaction may use.
///
/// Passes read the transaction's own writes and must not see uncommitted
/// writes of others.
pub const MINIMUM_ISOLATION: IsolationLevel = IsolationLevel::ReadCommitted;

/// A [`FactStore`] whose commits keep derived facts up to date.
#[derive(Debug)]
pub struct MaterializingStore<S: FactStore> {
    store: S,
    materializer: Arc<Materializer>,
    supported: Vec<IsolationLevel>,
    commit_lock: Mutex<()>,
}

impl<S: FactStore> MaterializingStore<S> {
    /// Wraps `store` with the default configuration.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_config(store, MaterializerConfig::default())
    }

    /// Wraps `store` with the given configuration.
    #[must_use]
    pub fn with_config(store: S, config: MaterializerConfig) -> Self {
        let supported = store
            .supported_isolation_levels()
            .iter()
            .copied()
            .filter(|level| *level >= MINIMUM_ISOLATION)
            .collect();
        Self {
            store,
            materializer: Arc::new(Materializer::new(config)),
            supported,
            commit_lock: Mutex::new(()),
        }
    }

    /// Returns the wrapped store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the shared materializer.
    #[must_use]
    pub fn materializer(&self) -> &Arc<Materializer> {
        &self.materializer
    }

    /// Returns the supported isolation levels: those of the wrapped store
    /// at least as strong as [`MINIMUM_ISOLATION`].
    #[must_use]
    pub fn supported_isolation_levels(&self) -> &[IsolationLevel] {
        &self.supported
    }

    /// Returns the wrapped store's default level, raised to the weakest
    /// supported level if it is too weak.
    #[must_use]
    pub fn default_isolation_level(&self) -> IsolationLevel {
        let level = self.store.default_isolation_level();
        if level >= MINIMUM_ISOLATION {
            level
        } else {
            IsolationLevel::compatible(MINIMUM_ISOLATION, &self.supported).unwrap_or(level)
        }
    }

    /// Opens a connection with no active transaction.
    #[must_use]
    pub fn connection(&self) -> MaterializingConnection<'_, S> {
        MaterializingConnection { owner: self, txn: None }
    }

    /// Returns committed facts matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn facts(&self, pattern: &FactPattern) -> Result<Vec<Fact>> {
        self.store.facts(pattern)
    }

    /// Replays the asserted writes of `txn` on a new transaction over the
    /// latest committed state. Call with the commit lock held.
    fn rebase(&self, mut txn: S::Transaction) -> Result<S::Transaction> {
        let level = txn.isolation_level();
        let changes = txn.drain_changes();
        self.store.rollback(txn);

        let mut fresh = self.store.begin(level)?;
        if let Err(e) = replay(&mut fresh, changes) {
            self.store.rollback(fresh);
            return Err(e);
        }
        tracing::trace!(level = %level, "transaction rebased onto latest state");
        Ok(fresh)
    }
}

fn replay(txn: &mut dyn Transaction, changes: Vec<FactChange>) -> Result<()> {
    for change in changes {
        match change {
            FactChange::Added(fact) => txn.add(fact)?,
            FactChange::Removed(fact) => {
                txn.remove(&FactPattern::exact(&fact).asserted())?;
            }
        }
    }
    Ok(())
}

/// A session over a [`MaterializingStore`] holding at most one transaction.
///
/// Dropping a connection rolls back its active transaction.
pub struct MaterializingConnection<'s, S: FactStore> {
    owner: &'s MaterializingStore<S>,
    txn: Option<S::Transaction>,
}

impl<S: FactStore> MaterializingConnection<'_, S> {
    /// Starts a transaction at the store's default isolation level.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction is already active.
    pub fn begin(&mut self) -> Result<()> {
        self.begin_with(self.owner.default_isolation_level())
    }

    /// Starts a transaction at `level`, or the weakest stronger level the
    /// store supports.
    ///
    /// # Errors
    ///
    /// Returns `TransactionState` if a transaction is already active, and
    /// `IsolationLevelUnsupported` if `level` is weaker than
    /// [`MINIMUM_ISOLATION`] or no supported level is compatible.
    pub fn begin_with(&mut self, level: IsolationLevel) -> Result<()> {
        if self.txn.is_some() {
            return Err(Error::transaction_state("transaction already active"));
        }
        if level < MINIMUM_ISOLATION {
            return Err(Error::new(ErrorKind::IsolationLevelUnsupported(format!(
                "{level} (materialization needs at least {MINIMUM_ISOLATION})"
            ))));
        }
        let compatible = IsolationLevel::compatible(level, &self.owner.supported)
            .ok_or_else(|| Error::new(ErrorKind::IsolationLevelUnsupported(level.to_string())))?;
        self.txn = Some(self.owner.store.begin(compatible)?);
        tracing::trace!(requested = %level, level = %compatible, "materializing transaction started");
        Ok(())
    }

    /// Returns true if a transaction is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.txn.is_some()
    }

    /// Returns the isolation level of the active transaction.
    #[must_use]
    pub fn isolation_level(&self) -> Option<IsolationLevel> {
        self.txn.as_ref().map(Transaction::isolation_level)
    }

    fn active(&mut self) -> Result<&mut S::Transaction> {
        self.txn
            .as_mut()
            .ok_or_else(|| Error::transaction_state("no active transaction"))
    }

    /// Asserts a fact.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is active or the store fails.
    pub fn add(&mut self, fact: Fact) -> Result<()> {
        self.active()?.add(fact)
    }

    /// Retracts asserted facts matching `pattern`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is active or the store fails.
    pub fn remove(&mut self, pattern: &FactPattern) -> Result<usize> {
        self.active()?.remove(pattern)
    }

    /// Asserts the constraint declarations of a rules document in `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is active or the store fails.
    pub fn load_rules(&mut self, rules: &RuleDocument, context: Option<&Resource>) -> Result<()> {
        let txn = self.active()?;
        for fact in rules.to_facts(context) {
            txn.add(fact)?;
        }
        Ok(())
    }

    /// Returns facts matching `pattern`: those visible to the active
    /// transaction, or committed facts when none is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn facts(&self, pattern: &FactPattern) -> Result<Vec<Fact>> {
        match &self.txn {
            Some(txn) => txn.facts(pattern),
            None => self.owner.store.facts(pattern),
        }
    }

    /// Materializes the transaction's changes and commits.
    ///
    /// Below [`IsolationLevel::Serializable`] the writes are first replayed
    /// over the latest committed state, so the pass sees every earlier
    /// commit. Serializable transactions keep their snapshot and fail with
    /// `TransactionConflict` if the store moved on.
    ///
    /// If the pass or the commit fails the transaction is gone, the store is
    /// unchanged, and every cache is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is active, the pass fails, or the
    /// store rejects the commit.
    pub fn commit(&mut self) -> Result<PassReport> {
        let txn = self
            .txn
            .take()
            .ok_or_else(|| Error::transaction_state("no active transaction"))?;
        let owner = self.owner;
        let materializer = &owner.materializer;
        let _serial = owner.commit_lock.lock();

        let mut txn = if txn.isolation_level() < IsolationLevel::Serializable {
            owner.rebase(txn)?
        } else {
            txn
        };

        let mut tracker = materializer.tracker();
        for change in txn.drain_changes() {
            change.deliver(&mut tracker);
        }
        let changes = tracker.into_changes();

        let report = match materializer.run(&mut txn, &changes) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "materialization failed, rolling back");
                owner.store.rollback(txn);
                materializer.invalidate_all();
                return Err(e);
            }
        };
        if let Err(e) = owner.store.commit(txn) {
            tracing::warn!(error = %e, "commit failed after materialization");
            materializer.invalidate_all();
            return Err(e);
        }
        Ok(report)
    }

    /// Discards the active transaction, if any.
    pub fn rollback(&mut self) {
        if let Some(txn) = self.txn.take() {
            self.owner.store.rollback(txn);
        }
    }
}

impl<S: FactStore> Drop for MaterializingConnection<'_, S> {
    fn drop(&mut self) {
        self.rollback();
    }
}
