//! Integration tests for the expression parser

use reckon_expr::{BinaryOp, Expr, Namespaces, parse, parse_or_invalid};
use reckon_foundation::{ErrorKind, Resource, Value};

fn namespaces() -> Namespaces {
    Namespaces::new()
        .with_prefix("", "http://example.org/")
        .with_prefix("ex", "http://example.org/ex#")
}

#[test]
fn names_resolve_at_parse_time() {
    let expr = parse("@a * @ex:b", &namespaces()).unwrap();
    let Expr::Binary { op, left, right } = expr else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinaryOp::Mul);
    assert!(matches!(
        *left,
        Expr::Property { ref property, subject: None, all: false }
            if *property == Resource::iri("http://example.org/a")
    ));
    assert!(matches!(
        *right,
        Expr::Property { ref property, .. } if *property == Resource::iri("http://example.org/ex#b")
    ));
}

#[test]
fn full_iris_need_no_prefix() {
    let expr = parse("@<http://other.org/p>", &Namespaces::new()).unwrap();
    assert!(matches!(
        expr,
        Expr::Property { ref property, .. } if *property == Resource::iri("http://other.org/p")
    ));
}

#[test]
fn undeclared_prefixes_fail() {
    let err = parse("@nope:p", &namespaces()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UndeclaredPrefix(_)) || err.is_parse_error());
}

#[test]
fn precedence_and_literals() {
    let expr = parse("1 + 2 * 3", &namespaces()).unwrap();
    let Expr::Binary { op, right, .. } = expr else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));

    assert_eq!(parse("2.5", &namespaces()).unwrap(), Expr::Literal(Value::Float(2.5)));
    assert_eq!(parse("\"x\"", &namespaces()).unwrap(), Expr::Literal(Value::string("x")));
}

#[test]
fn lambdas_and_new() {
    assert!(matches!(
        parse("sum(@@items, $i -> @price($i))", &namespaces()).unwrap(),
        Expr::Call { .. }
    ));
    assert!(matches!(
        parse("new :Point { :x: 1, :y: 2 }", &namespaces()).unwrap(),
        Expr::New { ref fields, .. } if fields.len() == 2
    ));
}

#[test]
fn invalid_text_becomes_an_invalid_node() {
    let expr = parse_or_invalid("@a * * @b", &namespaces());
    assert!(expr.is_invalid());
    assert!(!parse_or_invalid("@a * @b", &namespaces()).is_invalid());
}
