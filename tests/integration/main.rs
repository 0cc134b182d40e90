//! Integration tests: Full workflows
//!
//! Tests that exercise several layers together: rules documents loaded
//! through connections, long edit sequences, and agreement between
//! incremental and full materialization.

mod equivalence;
mod rectangles;
#[path = "../engine/support.rs"]
mod support;
