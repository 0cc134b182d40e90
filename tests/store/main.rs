//! Integration tests for Layer 1: Store
//!
//! Tests for fact patterns, transactions, isolation, and change delivery.

mod transactions;
