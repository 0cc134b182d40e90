//! Incremental constraint evaluation and derived-fact materialization for Reckon.
//!
//! This crate provides:
//! - [`ConstraintResolver`] - Constraint lookup with class inheritance and graph scoping
//! - [`DatasetResolver`] - `owl:imports` closures of graphs
//! - [`Evaluator`] - Evaluation hooks with memoization, write-back and dependency recording
//! - [`Materializer`] - Full and incremental materialization passes
//! - [`MaterializingStore`] - A store wrapper that materializes on commit

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod cache;
mod change;
mod config;
mod connection;
mod constraint;
mod dataset;
mod dependency;
mod derived;
mod instances;
mod ranking;
mod scheduler;
mod types;
mod value_cache;

pub use cache::ShardedLru;
pub use change::{ChangeSet, ChangeTracker};
pub use config::{DATASET_CACHE_CAPACITY, EXPRESSION_CACHE_CAPACITY, MaterializerConfig};
pub use connection::{MINIMUM_ISOLATION, MaterializingConnection, MaterializingStore};
pub use constraint::{Constraint, ConstraintResolver};
pub use dataset::{Dataset, DatasetResolver};
pub use dependency::DependencyTracker;
pub use derived::{EvaluationStats, Evaluator};
pub use instances::InstanceRegistry;
pub use ranking::ClassOrdering;
pub use scheduler::{Materializer, PassKind, PassReport};
pub use types::{ResourceInfo, ResourceTypeCache};
pub use value_cache::ValueCache;
