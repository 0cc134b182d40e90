//! Integration tests for evaluation through hooks
//!
//! A small in-memory hooks implementation stands in for the engine.

use std::collections::HashMap;
use std::sync::Arc;

use reckon_expr::{
    EvalHooks, EvalResult, EvaluationPath, Expr, Namespaces, PathEntry, parse_or_invalid,
};
use reckon_foundation::{ErrorKind, Resource, Result, Value};

fn iri(s: &str) -> Resource {
    Resource::iri(format!("http://example.org/{s}"))
}

#[derive(Default)]
struct Hooks {
    path: EvaluationPath,
    stored: HashMap<(Resource, Resource), Vec<Value>>,
    constraints: HashMap<(Resource, Resource), Arc<Expr>>,
    edges: Vec<(PathEntry, PathEntry)>,
    memo: HashMap<(Resource, Resource), EvalResult>,
    evaluations: usize,
}

impl Hooks {
    fn store(&mut self, entity: &str, property: &str, values: Vec<Value>) -> &mut Self {
        self.stored.insert((iri(entity), iri(property)), values);
        self
    }

    fn constrain(&mut self, entity: &str, property: &str, text: &str) -> &mut Self {
        let ns = Namespaces::new().with_prefix("", "http://example.org/");
        self.constraints
            .insert((iri(entity), iri(property)), Arc::new(parse_or_invalid(text, &ns)));
        self
    }

    fn eval(&mut self, entity: &str, property: &str) -> EvalResult {
        self.evaluate(&iri(entity), &iri(property))
    }
}

impl EvalHooks for Hooks {
    fn path(&mut self) -> &mut EvaluationPath {
        &mut self.path
    }

    fn constraint_for(&mut self, entity: &Resource, property: &Resource) -> Option<Arc<Expr>> {
        self.constraints.get(&(entity.clone(), property.clone())).cloned()
    }

    fn stored_values(&mut self, entity: &Resource, property: &Resource) -> Result<Vec<Value>> {
        Ok(self
            .stored
            .get(&(entity.clone(), property.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn cached_result(&mut self, entity: &Resource, property: &Resource) -> Option<EvalResult> {
        self.memo.get(&(entity.clone(), property.clone())).cloned()
    }

    fn create_instance(&mut self, _class: &Resource, _fields: Vec<(Resource, Value)>) -> Result<Resource> {
        Ok(Resource::blank("instance"))
    }

    fn record_dependency(&mut self, from: &PathEntry, to: &PathEntry) {
        self.edges.push((from.clone(), to.clone()));
    }

    fn evaluate(&mut self, entity: &Resource, property: &Resource) -> EvalResult {
        let constrained = self.constraint_for(entity, property).is_some();
        let fresh = self.cached_result(entity, property).is_none();
        let result = reckon_expr::walk_property(self, entity, property);
        if constrained && fresh && !result.is_error() {
            self.evaluations += 1;
            self.memo.insert((entity.clone(), property.clone()), result.clone());
        }
        result
    }
}

// =============================================================================
// Property Reads
// =============================================================================

#[test]
fn rectangle_area() {
    let mut hooks = Hooks::default();
    hooks
        .store("r", "a", vec![Value::Int(3)])
        .store("r", "b", vec![Value::Int(4)])
        .constrain("r", "area", "@a * @b");
    assert_eq!(hooks.eval("r", "area"), EvalResult::Single(Value::Int(12)));
    assert!(hooks.path.is_empty());
}

#[test]
fn sum_over_collection() {
    let mut hooks = Hooks::default();
    let mut rects = Vec::new();
    for i in 1..=4_i64 {
        let name = format!("rect{i}");
        hooks
            .store(&name, "a", vec![Value::Int(i)])
            .store(&name, "b", vec![Value::Int(2 * i)])
            .constrain(&name, "area", "@a * @b");
        rects.push(Value::Resource(iri(&name)));
    }
    hooks
        .store("all", "rects", rects)
        .constrain("all", "area", "sum(@@rects, $r -> @area($r))");

    // 2 * (1 + 4 + 9 + 16)
    assert_eq!(hooks.eval("all", "area"), EvalResult::Single(Value::Int(60)));
    assert_eq!(hooks.evaluations, 5);
    assert_eq!(
        hooks
            .edges
            .iter()
            .filter(|(from, to)| from.entity == iri("all") && to.property == iri("area"))
            .count(),
        4
    );
}

#[test]
fn memoized_pairs_are_not_recomputed() {
    let mut hooks = Hooks::default();
    hooks
        .store("r", "a", vec![Value::Int(2)])
        .constrain("r", "double", "@a * 2")
        .constrain("r", "quad", "@double + @double");
    assert_eq!(hooks.eval("r", "quad"), EvalResult::Single(Value::Int(8)));
    assert_eq!(hooks.evaluations, 2);
}

#[test]
fn multi_valued_reads() {
    let mut hooks = Hooks::default();
    hooks.store("r", "tags", vec![Value::Int(1), Value::Int(2)]);
    assert_eq!(
        hooks.eval("r", "tags"),
        EvalResult::Multiple(vec![Value::Int(1), Value::Int(2)])
    );
    hooks.constrain("r", "count", "count(@@tags)");
    assert_eq!(hooks.eval("r", "count"), EvalResult::Single(Value::Int(2)));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn cycles_are_errors_and_leave_the_path_empty() {
    let mut hooks = Hooks::default();
    hooks
        .constrain("a", "p", "@p(:b) + 1")
        .constrain("b", "p", "@p(:a) + 1");
    let result = hooks.eval("a", "p");
    let error = result.as_error().expect("cycle should fail");
    assert!(matches!(error.root_cause().kind, ErrorKind::CycleDetected { .. }));
    assert!(hooks.path.is_empty());
}

#[test]
fn missing_operands_fail() {
    let mut hooks = Hooks::default();
    hooks.constrain("r", "area", "@a * @b");
    let result = hooks.eval("r", "area");
    assert!(matches!(
        result.as_error().map(|e| &e.root_cause().kind),
        Some(ErrorKind::MissingValue { .. })
    ));
}

#[test]
fn dependency_failures_wrap_the_cause() {
    let mut hooks = Hooks::default();
    hooks
        .store("r", "a", vec![Value::Int(1)])
        .constrain("r", "bad", "@a / 0")
        .constrain("r", "uses", "@bad + 1");
    let result = hooks.eval("r", "uses");
    let error = result.as_error().expect("should fail");
    assert!(matches!(error.kind, ErrorKind::DependencyFailed { .. }));
    assert_eq!(error.root_cause().kind, ErrorKind::DivisionByZero);
}

#[test]
fn invalid_expressions_surface_when_evaluated() {
    let mut hooks = Hooks::default();
    hooks.constrain("r", "area", "@a * * @b");
    assert!(hooks.eval("r", "area").is_error());
}
