//! Tests for incremental re-materialization

use reckon_engine::PassKind;
use reckon_foundation::vocab::{self, math, rdf, rules as rules_vocab};
use reckon_foundation::{Fact, Literal, Term};
use reckon_store::FactPattern;

use crate::support::*;

const CHAIN: &str = "\
constraint :Root :p = @:base
constraint :Link :p = @:p(@:prev) + 1
";

fn chain(store: &Store) {
    setup(
        store,
        &rules(CHAIN),
        vec![
            typed("A", "Root"),
            value("A", "base", 1_i64),
            typed("B", "Link"),
            link("B", "prev", "A"),
            typed("C", "Link"),
            link("C", "prev", "B"),
        ],
    );
}

// =============================================================================
// Propagation
// =============================================================================

#[test]
fn changes_propagate_transitively() {
    let store = store();
    chain(&store);
    assert_eq!(derived_one(&store, "C", "p"), Some(Term::from(3_i64)));

    let report = commit(&store, |conn| set(conn, "A", "base", 10_i64));
    assert_eq!(report.kind, PassKind::Incremental);
    assert_eq!(report.affected, 3);
    assert_eq!(derived_one(&store, "A", "p"), Some(Term::from(10_i64)));
    assert_eq!(derived_one(&store, "B", "p"), Some(Term::from(11_i64)));
    assert_eq!(derived_one(&store, "C", "p"), Some(Term::from(12_i64)));
}

#[test]
fn dependency_edges_are_stored() {
    let store = store();
    chain(&store);

    let used_by = vocab::resource(math::USED_BY);
    let edges = store
        .facts(&FactPattern::any().with_predicate(used_by.clone()).derived())
        .unwrap();
    assert_eq!(edges.len(), 2);
    assert!(edges.contains(&Fact::new(iri("A"), used_by.clone(), iri("B"))));
    assert!(edges.contains(&Fact::new(iri("B"), used_by, iri("C"))));
}

#[test]
fn unrelated_entities_are_not_touched() {
    let store = store();
    chain(&store);
    commit(&store, |conn| {
        conn.add(typed("Z", "Root")).unwrap();
        conn.add(value("Z", "base", 7_i64)).unwrap();
    });

    let report = commit(&store, |conn| set(conn, "Z", "base", 8_i64));
    assert_eq!(report.affected, 1);
    assert_eq!(report.evaluated, 1);
    assert_eq!(derived_one(&store, "Z", "p"), Some(Term::from(8_i64)));
    assert_eq!(derived_one(&store, "C", "p"), Some(Term::from(3_i64)));
}

#[test]
fn relinking_moves_the_dependency() {
    let store = store();
    chain(&store);

    commit(&store, |conn| {
        conn.remove(&FactPattern::about(&iri("C"), &iri("prev"))).unwrap();
        conn.add(link("C", "prev", "A")).unwrap();
    });
    assert_eq!(derived_one(&store, "C", "p"), Some(Term::from(2_i64)));

    let used_by = vocab::resource(math::USED_BY);
    assert!(store
        .facts(&FactPattern::about(&iri("B"), &used_by).derived())
        .unwrap()
        .is_empty());

    // B no longer feeds C.
    let report = commit(&store, |conn| {
        conn.add(value("B", "note", "unrelated")).unwrap();
    });
    assert_eq!(report.affected, 1);
    assert_eq!(derived_one(&store, "C", "p"), Some(Term::from(2_i64)));
}

#[test]
fn removing_a_type_retracts_results() {
    let store = store();
    chain(&store);

    let report = commit(&store, |conn| {
        conn.remove(&FactPattern::about(&iri("C"), &vocab::resource(rdf::TYPE)))
            .unwrap();
    });
    assert_eq!(report.kind, PassKind::Incremental);
    assert!(derived(&store, "C", "p").is_empty());
    assert_eq!(derived_one(&store, "B", "p"), Some(Term::from(2_i64)));
}

#[test]
fn adding_a_type_materializes() {
    let store = store();
    chain(&store);
    commit(&store, |conn| {
        conn.add(link("D", "prev", "C")).unwrap();
    });
    assert!(derived(&store, "D", "p").is_empty());

    commit(&store, |conn| conn.add(typed("D", "Link")).unwrap());
    assert_eq!(derived_one(&store, "D", "p"), Some(Term::from(4_i64)));
}

#[test]
fn recovers_after_an_error() {
    let store = store();
    setup(
        &store,
        &rules("constraint :Rectangle :area = @:a * @:b"),
        vec![typed("r", "Rectangle"), value("r", "a", 3_i64)],
    );
    assert!(derived(&store, "r", "area").is_empty());

    let report = commit(&store, |conn| conn.add(value("r", "b", 5_i64)).unwrap());
    assert_eq!(report.errors, 0);
    assert_eq!(derived_one(&store, "r", "area"), Some(Term::from(15_i64)));
}

#[test]
fn instances_are_replaced_not_accumulated() {
    let store = store();
    setup(
        &store,
        &rules("constraint :Rectangle :corner = new :Point { :x: @:a }"),
        vec![typed("r", "Rectangle"), value("r", "a", 3_i64)],
    );

    commit(&store, |conn| set(conn, "r", "a", 4_i64));
    commit(&store, |conn| set(conn, "r", "a", 5_i64));

    let xs = store
        .facts(&FactPattern::any().with_predicate(iri("x")).derived())
        .unwrap();
    assert_eq!(xs.len(), 1);
    assert_eq!(xs[0].object, Term::from(5_i64));
    let points = store
        .facts(
            &FactPattern::any()
                .with_predicate(vocab::resource(rdf::TYPE))
                .with_object(iri("Point"))
                .derived(),
        )
        .unwrap();
    assert_eq!(points.len(), 1);
}

#[test]
fn instances_from_before_a_cache_reset_are_retracted() {
    let store = store();
    setup(
        &store,
        &rules("constraint :Rectangle :corner = new :Point { :x: @:a }"),
        vec![typed("r", "Rectangle"), value("r", "a", 3_i64)],
    );
    let owns = FactPattern::about(&iri("r"), &vocab::resource(math::OWNS)).derived();
    assert_eq!(store.facts(&owns).unwrap().len(), 1);

    store.materializer().invalidate_all();
    commit(&store, |conn| set(conn, "r", "a", 4_i64));

    let xs: Vec<Term> = store
        .facts(&FactPattern::any().with_predicate(iri("x")).derived())
        .unwrap()
        .into_iter()
        .map(|f| f.object)
        .collect();
    assert_eq!(xs, vec![Term::from(4_i64)]);
    assert_eq!(store.facts(&owns).unwrap().len(), 1);
}

// =============================================================================
// Schema Changes
// =============================================================================

#[test]
fn adding_a_constraint_materializes_existing_instances() {
    let store = store();
    setup(
        &store,
        &rules("constraint :Rectangle :area = @:a * @:b"),
        vec![typed("r", "Rectangle"), value("r", "a", 3_i64), value("r", "b", 4_i64)],
    );

    // Same prefixes, so the declaration facts are unchanged.
    let report = commit(&store, |conn| {
        conn.load_rules(&rules("constraint :Rectangle :perimeter = 2 * (@:a + @:b)"), None)
            .unwrap();
    });
    assert_eq!(report.kind, PassKind::Incremental);
    assert_eq!(derived_one(&store, "r", "perimeter"), Some(Term::from(14_i64)));
    assert_eq!(derived_one(&store, "r", "area"), Some(Term::from(12_i64)));
}

#[test]
fn removing_a_constraint_leaves_no_residue() {
    let store = store();
    setup(
        &store,
        &rules("constraint :Rectangle :area = @:a * @:b"),
        vec![
            Fact::new(iri("Square"), vocab::resource(vocab::rdfs::SUB_CLASS_OF), iri("Rectangle")),
            typed("r", "Rectangle"),
            value("r", "a", 3_i64),
            value("r", "b", 4_i64),
            typed("s", "Square"),
            value("s", "a", 2_i64),
            value("s", "b", 2_i64),
        ],
    );
    assert_eq!(derived_one(&store, "s", "area"), Some(Term::from(4_i64)));

    let report = commit(&store, |conn| {
        conn.remove(
            &FactPattern::any()
                .with_subject(iri("Rectangle"))
                .with_predicate(vocab::resource(rules_vocab::CONSTRAINT)),
        )
        .unwrap();
    });
    assert_eq!(report.kind, PassKind::Incremental);
    assert_eq!(report.affected, 2);
    assert!(all_derived(&store).is_empty());
}

#[test]
fn editing_an_expression_reevaluates_its_class() {
    let store = store();
    setup(
        &store,
        &rules("constraint :Rectangle :area = @:a * @:b"),
        vec![
            typed("r", "Rectangle"),
            value("r", "a", 3_i64),
            value("r", "b", 4_i64),
            typed("z", "Other"),
        ],
    );

    let node = store
        .facts(&FactPattern::about(&iri("Rectangle"), &vocab::resource(rules_vocab::CONSTRAINT)))
        .unwrap()[0]
        .object
        .as_resource()
        .unwrap()
        .clone();
    let expression = vocab::resource(rules_vocab::EXPRESSION_STRING);

    let report = commit(&store, |conn| {
        conn.remove(&FactPattern::about(&node, &expression)).unwrap();
        conn.add(Fact::new(node.clone(), expression.clone(), Literal::string("@:a + @:b")))
            .unwrap();
    });
    assert_eq!(report.kind, PassKind::Incremental);
    assert_eq!(report.affected, 1);
    assert_eq!(derived_one(&store, "r", "area"), Some(Term::from(7_i64)));
}

#[test]
fn full_only_mode_matches_incremental_results() {
    let incremental = store();
    let full = full_only_store();
    for store in [&incremental, &full] {
        chain(store);
        commit(store, |conn| set(conn, "A", "base", 5_i64));
        commit(store, |conn| conn.add(typed("D", "Link")).unwrap());
        commit(store, |conn| conn.add(link("D", "prev", "C")).unwrap());
    }

    assert_eq!(
        commit(&full, |_| {}).kind,
        PassKind::Full
    );
    assert_eq!(derived_one(&full, "D", "p"), Some(Term::from(8_i64)));
    assert_eq!(all_derived(&incremental), all_derived(&full));
}
