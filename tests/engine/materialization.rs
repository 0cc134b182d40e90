//! Tests for materialization on commit

use reckon_engine::PassKind;
use reckon_foundation::vocab::{self, rdf, rdfs};
use reckon_foundation::{Fact, Literal, Term};
use reckon_store::FactPattern;

use crate::support::*;

const RECTANGLES: &str = "\
constraint :Rectangle :area = @:a * @:b
constraint :Rectangles :area = sum(@@:rects, $r -> @:area($r))
";

// =============================================================================
// Single Entities
// =============================================================================

#[test]
fn rectangle_area_is_derived_on_commit() {
    let store = store();
    let report = setup(
        &store,
        &rules(RECTANGLES),
        vec![typed("r", "Rectangle"), value("r", "a", 3_i64), value("r", "b", 4_i64)],
    );

    assert_eq!(report.kind, PassKind::Full);
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.errors, 0);
    assert_eq!(derived_one(&store, "r", "area"), Some(Term::from(12_i64)));

    // Inputs stay asserted, the result is derived only.
    assert!(store
        .facts(&FactPattern::about(&iri("r"), &iri("area")).asserted())
        .unwrap()
        .is_empty());
}

#[test]
fn commit_without_changes_is_idempotent() {
    let store = store();
    setup(
        &store,
        &rules(RECTANGLES),
        vec![typed("r", "Rectangle"), value("r", "a", 3_i64), value("r", "b", 4_i64)],
    );
    let before = all_derived(&store);

    let report = commit(&store, |_| {});
    assert_eq!(report.kind, PassKind::Incremental);
    assert_eq!(report.affected, 0);
    assert_eq!(all_derived(&store), before);
}

#[test]
fn aggregate_over_a_collection() {
    let store = store();
    let mut facts = vec![typed("all", "Rectangles")];
    for i in 1..=9_i64 {
        let rect = format!("rect{i}");
        facts.push(typed(&rect, "Rectangle"));
        facts.push(value(&rect, "a", i));
        facts.push(value(&rect, "b", 2 * i));
        facts.push(link("all", "rects", &rect));
    }
    setup(&store, &rules(RECTANGLES), facts);

    assert_eq!(derived_one(&store, "all", "area"), Some(Term::from(570_i64)));
    assert_eq!(derived_one(&store, "rect9", "area"), Some(Term::from(162_i64)));
}

#[test]
fn floats_mix_with_integers() {
    let store = store();
    setup(
        &store,
        &rules("constraint :Circle :area = 3.5 * @:r * @:r"),
        vec![typed("c", "Circle"), value("c", "r", 2_i64)],
    );
    assert_eq!(derived_one(&store, "c", "area"), Some(Term::from(14.0)));
}

// =============================================================================
// Inheritance
// =============================================================================

#[test]
fn subclass_instances_inherit_constraints() {
    let store = store();
    let doc = rules(
        "constraint :Rectangle :area = @:a * @:b\nconstraint :Square :b = @:a",
    );
    setup(
        &store,
        &doc,
        vec![
            Fact::new(iri("Square"), vocab::resource(rdfs::SUB_CLASS_OF), iri("Rectangle")),
            typed("s", "Square"),
            value("s", "a", 5_i64),
        ],
    );

    assert_eq!(derived_one(&store, "s", "b"), Some(Term::from(5_i64)));
    assert_eq!(derived_one(&store, "s", "area"), Some(Term::from(25_i64)));
}

#[test]
fn subclass_constraint_shadows_superclass() {
    let store = store();
    let doc = rules(
        "constraint :Shape :label = \"shape\"\nconstraint :Circle :label = \"circle\"",
    );
    setup(
        &store,
        &doc,
        vec![
            Fact::new(iri("Circle"), vocab::resource(rdfs::SUB_CLASS_OF), iri("Shape")),
            typed("c", "Circle"),
            typed("s", "Shape"),
        ],
    );

    assert_eq!(derived(&store, "c", "label"), vec![Term::from(Literal::string("circle"))]);
    assert_eq!(derived(&store, "s", "label"), vec![Term::from(Literal::string("shape"))]);
}

// =============================================================================
// Results
// =============================================================================

#[test]
fn every_value_of_a_list_result_is_written() {
    let store = store();
    setup(
        &store,
        &rules("constraint :Bag :doubled = map(@@:items, $i -> $i * 2)"),
        vec![
            typed("bag", "Bag"),
            value("bag", "items", 1_i64),
            value("bag", "items", 2_i64),
            value("bag", "items", 3_i64),
        ],
    );

    let mut doubled: Vec<i64> = derived(&store, "bag", "doubled")
        .iter()
        .filter_map(|t| t.as_literal().and_then(Literal::as_int))
        .collect();
    doubled.sort_unstable();
    assert_eq!(doubled, vec![2, 4, 6]);
}

#[test]
fn new_creates_a_typed_instance() {
    let store = store();
    setup(
        &store,
        &rules("constraint :Rectangle :corner = new :Point { :x: @:a, :y: @:b }"),
        vec![typed("r", "Rectangle"), value("r", "a", 3_i64), value("r", "b", 4_i64)],
    );

    let corner = derived_one(&store, "r", "corner").unwrap();
    let corner = corner.as_resource().unwrap().clone();
    assert!(corner.is_blank());

    let types = store
        .facts(&FactPattern::about(&corner, &vocab::resource(rdf::TYPE)).derived())
        .unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].object, Term::from(iri("Point")));

    let x = store.facts(&FactPattern::about(&corner, &iri("x"))).unwrap();
    assert_eq!(x.len(), 1);
    assert_eq!(x[0].object, Term::from(3_i64));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn a_failing_entity_does_not_block_others() {
    let store = store();
    let doc = rules("constraint :Rectangle :area = @:a * @:b\nconstraint :Broken :ratio = @:a / 0");
    let report = setup(
        &store,
        &doc,
        vec![
            typed("r", "Rectangle"),
            value("r", "a", 3_i64),
            value("r", "b", 4_i64),
            typed("x", "Broken"),
            value("x", "a", 1_i64),
        ],
    );

    assert_eq!(report.errors, 1);
    assert_eq!(report.evaluated, 2);
    assert_eq!(derived_one(&store, "r", "area"), Some(Term::from(12_i64)));
    assert!(derived(&store, "x", "ratio").is_empty());
}

#[test]
fn missing_input_writes_nothing() {
    let store = store();
    let report = setup(
        &store,
        &rules(RECTANGLES),
        vec![typed("r", "Rectangle"), value("r", "a", 3_i64)],
    );
    assert_eq!(report.errors, 1);
    assert!(derived(&store, "r", "area").is_empty());
}

#[test]
fn malformed_expression_fails_only_its_constraint() {
    let store = store();
    let doc = rules("constraint :Rectangle :area = @:a *\nconstraint :Rectangle :perimeter = 2 * (@:a + @:b)");
    let report = setup(
        &store,
        &doc,
        vec![typed("r", "Rectangle"), value("r", "a", 3_i64), value("r", "b", 4_i64)],
    );

    assert_eq!(report.errors, 1);
    assert!(derived(&store, "r", "area").is_empty());
    assert_eq!(derived_one(&store, "r", "perimeter"), Some(Term::from(14_i64)));
}

#[test]
fn cycles_are_reported_and_not_written() {
    let store = store();
    let report = setup(
        &store,
        &rules("constraint :Node :p = @:p(@:next) + 1"),
        vec![
            typed("a", "Node"),
            typed("b", "Node"),
            link("a", "next", "b"),
            link("b", "next", "a"),
        ],
    );

    assert!(report.errors >= 2);
    assert!(derived(&store, "a", "p").is_empty());
    assert!(derived(&store, "b", "p").is_empty());
}
