//! Evaluation of constrained properties against a transaction.
//!
//! [`Evaluator`] implements the interpreter's hooks: it resolves constraints
//! through the caches, reads stored data within the current dataset, writes
//! successful results back as derived facts, and records dependency edges.

use std::mem;
use std::sync::Arc;

use reckon_expr::{EvalHooks, EvalResult, EvaluationPath, Expr, PathEntry, walk_property};
use reckon_foundation::{Error, ErrorKind, Fact, Resource, Result, Value};
use reckon_store::{FactPattern, Transaction};

use crate::constraint::Constraint;
use crate::dataset::Dataset;
use crate::scheduler::Materializer;

/// Counters for one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    /// Pairs whose expression ran.
    pub evaluated: usize,
    /// Pairs whose expression produced an error.
    pub errors: usize,
}

/// Evaluates pairs within one transaction and dataset.
pub struct Evaluator<'a> {
    engine: &'a Materializer,
    txn: &'a mut dyn Transaction,
    dataset: Arc<Dataset>,
    path: EvaluationPath,
    stats: EvaluationStats,
    fault: Option<Error>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator over an unrestricted dataset.
    pub fn new(engine: &'a Materializer, txn: &'a mut dyn Transaction) -> Self {
        Self {
            engine,
            txn,
            dataset: Arc::new(Dataset::unrestricted()),
            path: EvaluationPath::new(),
            stats: EvaluationStats::default(),
            fault: None,
        }
    }

    /// Returns the counters so far.
    #[must_use]
    pub fn stats(&self) -> EvaluationStats {
        self.stats
    }

    /// Returns the current dataset.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Switches to the dataset rooted at `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if the import closure cannot be read.
    pub fn enter_context(&mut self, context: Option<&Resource>) -> Result<()> {
        self.dataset = self.engine.datasets.resolve(&*self.txn, context)?;
        Ok(())
    }

    /// Returns the properties constrained for `entity` in the current dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if types or constraints cannot be read.
    pub fn constrained_properties(&self, entity: &Resource) -> Result<Vec<Resource>> {
        let info = self.engine.types.get(&*self.txn, entity)?;
        self.engine
            .constraints
            .constrained_properties(&*self.txn, &info, &self.dataset)
    }

    /// Evaluates every constrained property of `entity` in every graph that
    /// types it.
    ///
    /// # Errors
    ///
    /// Returns the first store failure. Evaluation errors are not failures.
    pub fn evaluate_entity(&mut self, entity: &Resource) -> Result<()> {
        let info = self.engine.types.get(&*self.txn, entity)?;
        for context in &info.contexts {
            self.evaluate_in(entity, context.as_ref())?;
        }
        Ok(())
    }

    /// Evaluates every constrained property of `entity` in the dataset
    /// rooted at `context`.
    ///
    /// # Errors
    ///
    /// Returns the first store failure. Evaluation errors are not failures.
    pub fn evaluate_in(&mut self, entity: &Resource, context: Option<&Resource>) -> Result<()> {
        self.enter_context(context)?;
        for property in self.constrained_properties(entity)? {
            self.evaluate_root(entity, &property);
            self.check()?;
        }
        Ok(())
    }

    /// Evaluates one pair on a fresh path.
    pub fn evaluate_root(&mut self, entity: &Resource, property: &Resource) -> EvalResult {
        let saved = mem::take(&mut self.path);
        let result = self.evaluate(entity, property);
        self.path = saved;
        result
    }

    /// Returns the first store failure met inside a hook, if any.
    ///
    /// # Errors
    ///
    /// Returns the recorded failure and clears it.
    pub fn check(&mut self) -> Result<()> {
        self.fault.take().map_or(Ok(()), Err)
    }

    fn fail(&mut self, error: Error) {
        tracing::debug!(error = %error, "store failure during evaluation");
        self.fault.get_or_insert(error);
    }

    fn resolve(&self, entity: &Resource, property: &Resource) -> Result<Option<Constraint>> {
        let info = self.engine.types.get(&*self.txn, entity)?;
        self.engine
            .constraints
            .resolve(&*self.txn, &info, property, &self.dataset)
    }

    /// Graph the results of `entity` are written to: the first graph typing
    /// it that the dataset sees, or the default graph when unrestricted.
    fn write_context(&self, entity: &Resource) -> Result<Option<Resource>> {
        if self.dataset.is_unrestricted() {
            return Ok(None);
        }
        let info = self.engine.types.get(&*self.txn, entity)?;
        Ok(info
            .contexts
            .iter()
            .flatten()
            .find(|c| self.dataset.allows(Some(c)))
            .cloned())
    }

    /// Writes every value of a successful result and memoizes it.
    ///
    /// A value with no fact form turns the result into an error.
    fn write_back(&mut self, entity: &Resource, property: &Resource, result: EvalResult) -> Result<EvalResult> {
        let Ok(values) = result.values() else {
            return Ok(result);
        };
        let terms = match values.iter().map(Value::to_term).collect::<Result<Vec<_>>>() {
            Ok(terms) => terms,
            Err(e) => return Ok(EvalResult::error(e)),
        };

        let context = self.write_context(entity)?;
        for term in terms {
            self.txn
                .add_derived(Fact::new(entity.clone(), property.clone(), term).in_context(context.clone()))?;
        }
        self.engine.values.put(entity, context, property, result.clone());
        Ok(result)
    }

    fn record_edge(&mut self, from: &PathEntry, to: &PathEntry) -> Result<()> {
        let context = self.write_context(&to.entity)?;
        if self
            .engine
            .dependencies
            .record(&mut *self.txn, &from.entity, &to.entity, context)?
        {
            tracing::trace!(from = %from, to = %to, "recorded dependency");
        }
        Ok(())
    }
}

impl EvalHooks for Evaluator<'_> {
    fn path(&mut self) -> &mut EvaluationPath {
        &mut self.path
    }

    fn constraint_for(&mut self, entity: &Resource, property: &Resource) -> Option<Arc<Expr>> {
        match self.resolve(entity, property) {
            Ok(constraint) => constraint.map(|c| c.expression),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    fn stored_values(&mut self, entity: &Resource, property: &Resource) -> Result<Vec<Value>> {
        let mut pattern = FactPattern::about(entity, property);
        pattern.contexts = self.dataset.view();
        let mut values = Vec::new();
        for fact in self.txn.facts(&pattern)? {
            let value = Value::from_term(&fact.object);
            if !values.contains(&value) {
                values.push(value);
            }
        }
        Ok(values)
    }

    fn cached_result(&mut self, entity: &Resource, property: &Resource) -> Option<EvalResult> {
        self.engine.values.get(entity, property, self.dataset.contexts())
    }

    fn create_instance(&mut self, class: &Resource, fields: Vec<(Resource, Value)>) -> Result<Resource> {
        let owner = self.path.top().cloned().ok_or_else(|| {
            Error::new(ErrorKind::Internal("instance created outside an evaluation".to_string()))
        })?;
        let context = self.write_context(&owner.entity)?;
        self.engine
            .instances
            .create(&mut *self.txn, &owner, class, fields, context.as_ref())
    }

    fn record_dependency(&mut self, from: &PathEntry, to: &PathEntry) {
        if from.entity == to.entity {
            return;
        }
        if let Err(e) = self.record_edge(from, to) {
            self.fail(e);
        }
    }

    fn evaluate(&mut self, entity: &Resource, property: &Resource) -> EvalResult {
        let target = PathEntry::new(entity.clone(), property.clone());
        let memoized = self.cached_result(entity, property).is_some();
        if memoized || self.path.contains(&target) {
            return walk_property(self, entity, property);
        }

        let result = walk_property(self, entity, property);
        match self.resolve(entity, property) {
            Ok(Some(_)) => {}
            Ok(None) => return result,
            Err(e) => {
                self.fail(e);
                return result;
            }
        }

        self.stats.evaluated += 1;
        let result = match self.write_back(entity, property, result) {
            Ok(result) => result,
            Err(e) => {
                self.fail(e.clone());
                EvalResult::error(e)
            }
        };
        if let Some(error) = result.as_error() {
            self.stats.errors += 1;
            tracing::warn!(entity = %entity, property = %property, error = %error, "evaluation failed");
        } else {
            tracing::trace!(entity = %entity, property = %property, "materialized");
        }
        result
    }
}
