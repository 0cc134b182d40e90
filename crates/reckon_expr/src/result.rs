//! Results of property evaluation.

use std::sync::Arc;

use reckon_foundation::{Error, Value};

/// Outcome of evaluating one (entity, property) pair.
///
/// Ordinary evaluation failures are values, not aborts.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalResult {
    /// Exactly one value.
    Single(Value),
    /// Zero or more values.
    Multiple(Vec<Value>),
    /// Evaluation failed.
    Error(Arc<Error>),
}

impl EvalResult {
    /// Wraps a computed value. Lists become [`EvalResult::Multiple`].
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::List(items) => Self::Multiple(items.into_iter().collect()),
            other => Self::Single(other),
        }
    }

    /// Wraps stored values. One value becomes [`EvalResult::Single`].
    #[must_use]
    pub fn from_values(mut values: Vec<Value>) -> Self {
        if values.len() == 1 {
            if let Some(value) = values.pop() {
                return Self::Single(value);
            }
        }
        Self::Multiple(values)
    }

    /// Wraps a failure.
    #[must_use]
    pub fn error(error: Error) -> Self {
        Self::Error(Arc::new(error))
    }

    /// Returns true if evaluation failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Returns the failure, if any.
    #[must_use]
    pub const fn as_error(&self) -> Option<&Arc<Error>> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the value of a single result.
    #[must_use]
    pub const fn single(&self) -> Option<&Value> {
        match self {
            Self::Single(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the values as a list.
    ///
    /// # Errors
    ///
    /// Returns the failure of an error result.
    pub fn values(&self) -> Result<Vec<Value>, Arc<Error>> {
        match self {
            Self::Single(v) => Ok(vec![v.clone()]),
            Self::Multiple(vs) => Ok(vs.clone()),
            Self::Error(e) => Err(Arc::clone(e)),
        }
    }

    /// Consumes the result, returning its values.
    ///
    /// # Errors
    ///
    /// Returns the failure of an error result.
    pub fn into_values(self) -> Result<Vec<Value>, Arc<Error>> {
        match self {
            Self::Single(v) => Ok(vec![v]),
            Self::Multiple(vs) => Ok(vs),
            Self::Error(e) => Err(e),
        }
    }
}

impl From<reckon_foundation::Result<Value>> for EvalResult {
    fn from(result: reckon_foundation::Result<Value>) -> Self {
        match result {
            Ok(value) => Self::from_value(value),
            Err(e) => Self::error(e),
        }
    }
}
