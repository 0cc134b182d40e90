//! Transactional, context-partitioned fact store for Reckon.
//!
//! This crate provides:
//! - [`FactPattern`] - Pattern queries over subject, predicate, object, context and origin
//! - [`IsolationLevel`] - Ordered transaction isolation levels
//! - [`FactStore`] and [`Transaction`] - The store adapter interface
//! - [`FactChange`] and [`ChangeListener`] - Pre-commit change notification
//! - [`MemoryStore`] - In-memory store with persistent snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod change;
mod graph;
mod isolation;
mod memory;
mod pattern;
mod store;

pub use change::{ChangeListener, FactChange};
pub use graph::FactGraph;
pub use isolation::IsolationLevel;
pub use memory::{MemoryStore, MemoryTransaction};
pub use pattern::{ContextFilter, FactPattern, OriginFilter};
pub use store::{FactStore, Transaction};
