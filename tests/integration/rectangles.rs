//! End-to-end workflow over a collection of rectangles

use reckon_engine::PassKind;
use reckon_expr::RuleDocument;
use reckon_foundation::Term;
use reckon_store::FactPattern;

use crate::support::*;

const DOCUMENT: &str = "\
# Areas of rectangles and of collections of them.
prefix : <http://example.org/>

constraint :Rectangle :area = @:a * @:b
constraint :Rectangles :area =
    sum(@@:rects,
        $r -> @:area($r))
constraint :Rectangles :largest = max(@@:rects, $r -> @:area($r))
";

fn add_rectangles(store: &Store, range: std::ops::RangeInclusive<i64>) -> reckon_engine::PassReport {
    commit(store, |conn| {
        for i in range {
            let rect = format!("rect{i}");
            conn.add(typed(&rect, "Rectangle")).unwrap();
            conn.add(value(&rect, "a", i)).unwrap();
            conn.add(value(&rect, "b", 2 * i)).unwrap();
            conn.add(link("all", "rects", &rect)).unwrap();
        }
    })
}

fn loaded() -> Store {
    let store = store();
    let doc = RuleDocument::parse(DOCUMENT).unwrap();
    commit(&store, |conn| {
        conn.load_rules(&doc, None).unwrap();
        conn.add(typed("all", "Rectangles")).unwrap();
    });
    store
}

#[test]
fn collection_totals_follow_edits() {
    let store = loaded();

    add_rectangles(&store, 1..=4);
    assert_eq!(derived_one(&store, "all", "area"), Some(Term::from(60_i64)));

    let report = add_rectangles(&store, 5..=9);
    assert_eq!(report.kind, PassKind::Incremental);
    assert_eq!(derived_one(&store, "all", "area"), Some(Term::from(570_i64)));
    assert_eq!(derived_one(&store, "all", "largest"), Some(Term::from(162_i64)));

    commit(&store, |conn| {
        for i in 1..=9_i64 {
            set(conn, &format!("rect{i}"), "a", 2 * i);
        }
    });
    assert_eq!(derived_one(&store, "all", "area"), Some(Term::from(1140_i64)));

    commit(&store, |conn| {
        conn.remove(&FactPattern::about(&iri("all"), &iri("rects")).with_object(iri("rect9")))
            .unwrap();
    });
    assert_eq!(derived_one(&store, "all", "area"), Some(Term::from(816_i64)));
    assert_eq!(derived_one(&store, "all", "largest"), Some(Term::from(256_i64)));
    // rect9 keeps its own area.
    assert_eq!(derived_one(&store, "rect9", "area"), Some(Term::from(324_i64)));
}

#[test]
fn a_single_edit_touches_only_its_readers() {
    let store = loaded();
    add_rectangles(&store, 1..=9);

    let report = commit(&store, |conn| set(conn, "rect3", "b", 1_i64));
    assert_eq!(report.kind, PassKind::Incremental);
    assert_eq!(report.affected, 2);
    assert_eq!(derived_one(&store, "rect3", "area"), Some(Term::from(3_i64)));
    assert_eq!(derived_one(&store, "all", "area"), Some(Term::from(555_i64)));
}

#[test]
fn repeated_commits_are_idempotent() {
    let store = loaded();
    add_rectangles(&store, 1..=5);
    let before = all_derived(&store);

    for _ in 0..3 {
        commit(&store, |_| {});
    }
    // Reloading the same document asserts nothing new.
    let doc = RuleDocument::parse(DOCUMENT).unwrap();
    let report = commit(&store, |conn| conn.load_rules(&doc, None).unwrap());
    assert_eq!(report.affected, 0);
    assert_eq!(all_derived(&store), before);
}

#[test]
fn derived_facts_never_shadow_user_data() {
    let store = loaded();
    add_rectangles(&store, 1..=2);
    commit(&store, |conn| conn.add(value("rect1", "area", 99_i64)).unwrap());

    let asserted = store
        .facts(&FactPattern::about(&iri("rect1"), &iri("area")).asserted())
        .unwrap();
    assert_eq!(asserted.len(), 1);
    assert_eq!(asserted[0].object, Term::from(99_i64));
    assert_eq!(derived_one(&store, "rect1", "area"), Some(Term::from(2_i64)));
}
