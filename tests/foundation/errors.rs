//! Integration tests for Error types
//!
//! Tests error construction, display, and dependency chains.

use std::sync::Arc;

use reckon_foundation::{Error, ErrorKind, Resource, ValueKind};

fn iri(s: &str) -> Resource {
    Resource::iri(format!("http://example.org/{s}"))
}

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_type_mismatch() {
    let err = Error::type_mismatch(ValueKind::Number, ValueKind::String);
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("string"));
}

#[test]
fn error_parse_position() {
    let err = Error::parse("unexpected token", 3, 7);
    assert!(err.is_parse_error());
    let msg = format!("{err}");
    assert!(msg.contains("3:7"));
    assert!(msg.contains("unexpected token"));
}

#[test]
fn error_cycle_names_the_pair() {
    let err = Error::cycle(&iri("a"), &iri("p"));
    assert!(matches!(err.kind, ErrorKind::CycleDetected { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("http://example.org/a"));
    assert!(msg.contains("http://example.org/p"));
}

#[test]
fn error_missing_value() {
    let err = Error::missing_value(&iri("r"), &iri("a"));
    assert!(matches!(err.kind, ErrorKind::MissingValue { .. }));
}

// =============================================================================
// Dependency Chains
// =============================================================================

#[test]
fn root_cause_unwraps_dependency_failures() {
    let inner = Error::new(ErrorKind::DivisionByZero);
    let middle = Error::dependency(&iri("b"), &iri("p"), Arc::new(inner.clone()));
    let outer = Error::dependency(&iri("a"), &iri("p"), Arc::new(middle));
    assert_eq!(outer.root_cause(), &inner);
    assert!(format!("{outer}").contains("division by zero"));
}

#[test]
fn root_cause_of_plain_error_is_itself() {
    let err = Error::store("disk full");
    assert_eq!(err.root_cause(), &err);
}
