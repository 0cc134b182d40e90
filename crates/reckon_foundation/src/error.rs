//! Error types for the Reckon system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::resource::Resource;
use crate::value::ValueKind;

/// Result type alias for Reckon operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Reckon operations.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: ValueKind, actual: ValueKind) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates a parse error at the given position.
    #[must_use]
    pub fn parse(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::ParseError {
            message: message.into(),
            line,
            column,
        })
    }

    /// Creates an error for a property that has no value to compute with.
    #[must_use]
    pub fn missing_value(entity: &Resource, property: &Resource) -> Self {
        Self::new(ErrorKind::MissingValue {
            entity: entity.to_string(),
            property: property.to_string(),
        })
    }

    /// Creates a cycle error for a pair that is already being evaluated.
    #[must_use]
    pub fn cycle(entity: &Resource, property: &Resource) -> Self {
        Self::new(ErrorKind::CycleDetected {
            entity: entity.to_string(),
            property: property.to_string(),
        })
    }

    /// Wraps the failure of a nested evaluation.
    #[must_use]
    pub fn dependency(entity: &Resource, property: &Resource, cause: Arc<Error>) -> Self {
        Self::new(ErrorKind::DependencyFailed {
            entity: entity.to_string(),
            property: property.to_string(),
            cause,
        })
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(function: impl Into<String>, expected: impl Into<String>, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch {
            function: function.into(),
            expected: expected.into(),
            actual,
        })
    }

    /// Creates a store error.
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Store(message.into()))
    }

    /// Creates an invalid transaction state error.
    #[must_use]
    pub fn transaction_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransactionState(message.into()))
    }

    /// Returns true if this is a parse error.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self.kind, ErrorKind::ParseError { .. })
    }

    /// Returns the innermost cause of a chain of dependency failures.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match &self.kind {
            ErrorKind::DependencyFailed { cause, .. } => cause.root_cause(),
            _ => self,
        }
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ErrorKind {
    /// Type mismatch during evaluation.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: ValueKind,
        /// The actual type encountered.
        actual: ValueKind,
    },

    /// Parse error in expression or rules text.
    #[error("parse error at {line}:{column}: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// A property read as a single operand has no value.
    #[error("missing value: {property} on {entity}")]
    MissingValue {
        /// The entity that was read.
        entity: String,
        /// The property that had no value.
        property: String,
    },

    /// Function name is not known to the interpreter.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments to function.
    #[error("arity mismatch in {function}: expected {expected}, got {actual}")]
    ArityMismatch {
        /// The function that was called.
        function: String,
        /// Description of expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// Variable referenced outside of any binding lambda.
    #[error("unbound variable: ${0}")]
    UnboundVariable(String),

    /// Short name uses a prefix with no declaration.
    #[error("undeclared prefix: {0}")]
    UndeclaredPrefix(String),

    /// Expression is well formed but cannot be evaluated as written.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed.
    #[error("integer overflow")]
    Overflow,

    /// A pair re-entered its own evaluation.
    #[error("cycle detected while evaluating {property} on {entity}")]
    CycleDetected {
        /// The entity whose evaluation re-entered.
        entity: String,
        /// The property whose evaluation re-entered.
        property: String,
    },

    /// A nested evaluation failed.
    #[error("evaluation of {property} on {entity} failed: {cause}")]
    DependencyFailed {
        /// The entity of the failed nested evaluation.
        entity: String,
        /// The property of the failed nested evaluation.
        property: String,
        /// The underlying failure.
        #[source]
        cause: Arc<Error>,
    },

    /// Value cannot be represented as a fact object.
    #[error("value cannot be stored as a fact: {0}")]
    NotConvertible(String),

    /// Requested isolation level has no compatible supported level.
    #[error("isolation level {0} is not supported")]
    IsolationLevelUnsupported(String),

    /// Operation is not valid in the current transaction state.
    #[error("invalid transaction state: {0}")]
    TransactionState(String),

    /// Another transaction committed conflicting changes first.
    #[error("transaction conflict: {0}")]
    TransactionConflict(String),

    /// Fact store failure.
    #[error("store error: {0}")]
    Store(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// Source text or constraint that failed.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<usize>,
    /// Column number in source.
    pub column: Option<usize>,
    /// Chain of (entity, property) evaluations that led here.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
