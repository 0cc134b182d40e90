//! Integration tests for Value

use reckon_foundation::{ErrorKind, Literal, Resource, Term, Value, ValueKind};

#[test]
fn value_kinds() {
    assert_eq!(Value::Int(1).kind(), ValueKind::Int);
    assert_eq!(Value::Float(1.0).kind(), ValueKind::Float);
    assert_eq!(Value::string("s").kind(), ValueKind::String);
    assert_eq!(Value::list([Value::Int(1)]).kind(), ValueKind::List);
    assert_eq!(Value::Resource(Resource::blank("b")).kind(), ValueKind::Resource);
}

#[test]
fn numbers_widen_to_float() {
    assert_eq!(Value::Int(2).as_number(), Some(2.0));
    assert_eq!(Value::Float(2.5).as_number(), Some(2.5));
    assert_eq!(Value::Bool(true).as_number(), None);
}

#[test]
fn terms_round_trip_through_values() {
    let terms = [
        Term::from(7_i64),
        Term::from(1.5),
        Term::from(true),
        Term::from("text"),
        Term::from(Resource::iri("http://example.org/r")),
    ];
    for term in terms {
        assert_eq!(Value::from_term(&term).to_term().unwrap(), term);
    }
}

#[test]
fn lists_have_no_fact_form() {
    let err = Value::list([Value::Int(1), Value::Int(2)]).to_term().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotConvertible(_)));
}

#[test]
fn string_values_become_string_literals() {
    let term = Value::string("abc").to_term().unwrap();
    assert_eq!(term, Term::Literal(Literal::string("abc")));
}
