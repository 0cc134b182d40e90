//! Reckon - Incremental constraint evaluation over a fact store
//!
//! This crate re-exports all layers of the Reckon system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: reckon_engine     - Constraint resolution, evaluation, materialization passes
//! Layer 2: reckon_expr       - Expression lexer, parser, interpreter, rules documents
//! Layer 1: reckon_store      - Transactional, context-partitioned fact store
//! Layer 0: reckon_foundation - Core types (Resource, Fact, Value, Error)
//! ```

pub use reckon_engine as engine;
pub use reckon_expr as expr;
pub use reckon_foundation as foundation;
pub use reckon_store as store;
