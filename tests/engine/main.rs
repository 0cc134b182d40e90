//! Integration tests for Layer 3: Engine
//!
//! Tests for materialization through a store wrapper: full and incremental
//! passes, graph scoping, isolation, and failure handling.

mod incremental;
mod materialization;
mod support;
