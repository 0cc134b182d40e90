//! Integration tests for Layer 2: Expressions
//!
//! Tests for parsing, evaluation through hooks, and rules documents.

mod evaluation;
mod parsing;
