//! Incremental materialization agrees with recomputing from scratch
//!
//! Random edit sequences run against an incremental store and a full-only
//! store. Afterwards both must hold the same derived facts as a fresh store
//! loaded with the final asserted facts.

use proptest::prelude::*;

use reckon_foundation::vocab::{self, rdf, rules as rules_vocab};
use reckon_foundation::{Fact, Literal};
use reckon_store::FactPattern;

use crate::support::*;

const RECTANGLES: usize = 5;

const DOCUMENT: &str = "\
constraint :Rectangle :area = @:a * @:b
constraint :Rectangles :area = sum(@@:rects, $r -> @:area($r))
constraint :Report :total = @:area(:all) * 2
";

#[derive(Clone, Debug)]
enum Edit {
    SetA(usize, i64),
    SetB(usize, i64),
    Link(usize),
    Unlink(usize),
    Untype(usize),
    Retype(usize),
    SwapExpression(bool),
}

fn edit() -> impl Strategy<Value = Edit> {
    let index = 0..RECTANGLES;
    prop_oneof![
        3 => (index.clone(), -20..20_i64).prop_map(|(i, v)| Edit::SetA(i, v)),
        2 => (index.clone(), 1..10_i64).prop_map(|(i, v)| Edit::SetB(i, v)),
        1 => index.clone().prop_map(Edit::Link),
        1 => index.clone().prop_map(Edit::Unlink),
        1 => index.clone().prop_map(Edit::Untype),
        1 => index.prop_map(Edit::Retype),
        1 => any::<bool>().prop_map(Edit::SwapExpression),
    ]
}

fn rect(i: usize) -> String {
    format!("rect{i}")
}

fn initial_facts() -> Vec<Fact> {
    let mut facts = vec![typed("all", "Rectangles"), typed("report", "Report")];
    for i in 0..RECTANGLES {
        let side = i64::try_from(i).unwrap() + 1;
        facts.push(typed(&rect(i), "Rectangle"));
        facts.push(value(&rect(i), "a", side));
        facts.push(value(&rect(i), "b", 2_i64));
        facts.push(link("all", "rects", &rect(i)));
    }
    facts
}

fn apply(store: &Store, edit: &Edit) {
    commit(store, |conn| match edit {
        Edit::SetA(i, v) => set(conn, &rect(*i), "a", *v),
        Edit::SetB(i, v) => set(conn, &rect(*i), "b", *v),
        Edit::Link(i) => conn.add(link("all", "rects", &rect(*i))).unwrap(),
        Edit::Unlink(i) => {
            conn.remove(&FactPattern::about(&iri("all"), &iri("rects")).with_object(iri(&rect(*i))))
                .unwrap();
        }
        Edit::Untype(i) => {
            conn.remove(&FactPattern::about(&iri(&rect(*i)), &vocab::resource(rdf::TYPE)))
                .unwrap();
        }
        Edit::Retype(i) => conn.add(typed(&rect(*i), "Rectangle")).unwrap(),
        Edit::SwapExpression(sum) => {
            let expression = vocab::resource(rules_vocab::EXPRESSION_STRING);
            let nodes = conn
                .facts(&FactPattern::about(&iri("Rectangle"), &vocab::resource(rules_vocab::CONSTRAINT)))
                .unwrap();
            let node = nodes[0].object.as_resource().unwrap().clone();
            let text = if *sum { "@:a + @:b" } else { "@:a * @:b" };
            conn.remove(&FactPattern::about(&node, &expression)).unwrap();
            conn.add(Fact::new(node, expression, Literal::string(text))).unwrap();
        }
    });
}

/// A fresh store materialized once over `store`'s asserted facts.
fn recomputed(store: &Store) -> Store {
    let fresh = full_only_store();
    let asserted = store.facts(&FactPattern::any().asserted()).unwrap();
    commit(&fresh, |conn| {
        for fact in asserted {
            conn.add(fact).unwrap();
        }
    });
    fresh
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn incremental_matches_full(edits in prop::collection::vec(edit(), 1..12)) {
        let incremental = store();
        let full = full_only_store();
        for store in [&incremental, &full] {
            setup(store, &rules(DOCUMENT), initial_facts());
        }

        for edit in &edits {
            apply(&incremental, edit);
            apply(&full, edit);
        }

        let expected = all_derived(&recomputed(&incremental));
        prop_assert_eq!(&all_derived(&incremental), &expected);
        prop_assert_eq!(&all_derived(&full), &expected);
    }
}

#[test]
fn long_random_walk_stays_consistent() {
    let incremental = store();
    setup(&incremental, &rules(DOCUMENT), initial_facts());

    let edits = [
        Edit::SetA(0, 7),
        Edit::Unlink(1),
        Edit::Untype(2),
        Edit::SwapExpression(true),
        Edit::SetB(2, 3),
        Edit::Retype(2),
        Edit::Link(1),
        Edit::SwapExpression(false),
        Edit::SetA(4, -2),
    ];
    for edit in &edits {
        apply(&incremental, edit);
        assert_eq!(all_derived(&incremental), all_derived(&recomputed(&incremental)));
    }
    // rect areas 14, 4, 9, 8, -4 and the report doubles their sum.
    assert_eq!(derived_one(&incremental, "report", "total"), Some(62_i64.into()));
}
