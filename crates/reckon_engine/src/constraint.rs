//! Constraint resolution with class inheritance.
//!
//! Constraints are declared with facts:
//!
//! ```text
//! Class      rules:constraint       _:c
//! _:c        rules:onProperty       property
//! _:c        rules:expressionString "@a * @b"
//! _:c        sh:prefixes            decls      (optional)
//! decls      sh:declare             _:d        (also via owl:imports)
//! _:d        sh:prefix "" ; sh:namespace "http://example.org/"
//! ```
//!
//! The graph holding the `rules:constraint` fact is the constraint's
//! defining graph. A class's constraints are its own, followed by those of
//! its minimal direct superclasses in class order, so an own constraint for
//! a property shadows an inherited one.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexSet;
use reckon_expr::{Expr, Namespaces, parse_or_invalid};
use reckon_foundation::vocab::{self, owl, rdf, rdfs, rules, sh};
use reckon_foundation::{Error, ErrorKind, Resource, Result, Term};
use reckon_store::{FactPattern, Transaction};

use crate::cache::ShardedLru;
use crate::config::EXPRESSION_CACHE_CAPACITY;
use crate::dataset::Dataset;
use crate::ranking::ClassOrdering;
use crate::types::ResourceInfo;

// =============================================================================
// Constraint
// =============================================================================

/// A property computed by an expression on instances of a class.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// Class declaring the constraint.
    pub class: Resource,
    /// The computed property.
    pub property: Resource,
    /// The parsed expression; a parse failure is an [`Expr::Invalid`].
    pub expression: Arc<Expr>,
    /// Graph the declaration lives in; `None` for the default graph.
    pub graph: Option<Resource>,
}

impl Constraint {
    /// Returns true if the declaration is visible in `dataset`.
    ///
    /// Constraints in the default graph are visible everywhere.
    #[must_use]
    pub fn is_visible_in(&self, dataset: &Dataset) -> bool {
        self.graph.is_none() || dataset.allows(self.graph.as_ref())
    }
}

// =============================================================================
// Constraint Resolver
// =============================================================================

/// Resolves and caches the constraints of classes.
#[derive(Debug)]
pub struct ConstraintResolver {
    ordering: ClassOrdering,
    by_class: DashMap<Resource, Arc<Vec<Constraint>>>,
    expressions: ShardedLru<(String, Namespaces), Arc<Expr>>,
}

impl ConstraintResolver {
    /// Creates a resolver that orders superclasses with `ordering`.
    #[must_use]
    pub fn new(ordering: ClassOrdering) -> Self {
        Self {
            ordering,
            by_class: DashMap::new(),
            expressions: ShardedLru::new(EXPRESSION_CACHE_CAPACITY),
        }
    }

    /// Returns the constraint computing `property` for an entity with the
    /// given types, if one is visible in `dataset`.
    ///
    /// Types are searched in order; the first matching constraint wins.
    ///
    /// # Errors
    ///
    /// Returns an error if schema facts cannot be read.
    pub fn resolve(
        &self,
        txn: &dyn Transaction,
        info: &ResourceInfo,
        property: &Resource,
        dataset: &Dataset,
    ) -> Result<Option<Constraint>> {
        for class in &info.types {
            let constraints = self.constraints_of_class(txn, class)?;
            if let Some(found) = constraints
                .iter()
                .find(|c| &c.property == property && c.is_visible_in(dataset))
            {
                return Ok(Some(found.clone()));
            }
        }
        Ok(None)
    }

    /// Returns every property constrained for an entity with the given types,
    /// in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns an error if schema facts cannot be read.
    pub fn constrained_properties(
        &self,
        txn: &dyn Transaction,
        info: &ResourceInfo,
        dataset: &Dataset,
    ) -> Result<Vec<Resource>> {
        let mut properties = IndexSet::new();
        for class in &info.types {
            for constraint in self.constraints_of_class(txn, class)?.iter() {
                if constraint.is_visible_in(dataset) {
                    properties.insert(constraint.property.clone());
                }
            }
        }
        Ok(properties.into_iter().collect())
    }

    /// Returns the own and inherited constraints of `class`.
    ///
    /// # Errors
    ///
    /// Returns an error if schema facts cannot be read.
    pub fn constraints_of_class(
        &self,
        txn: &dyn Transaction,
        class: &Resource,
    ) -> Result<Arc<Vec<Constraint>>> {
        self.load(txn, class, &mut Vec::new())
    }

    fn load(
        &self,
        txn: &dyn Transaction,
        class: &Resource,
        visiting: &mut Vec<Resource>,
    ) -> Result<Arc<Vec<Constraint>>> {
        if let Some(cached) = self.by_class.get(class).map(|e| Arc::clone(e.value())) {
            return Ok(cached);
        }
        // a subclass cycle is cut at the first repeated class
        if visiting.contains(class) {
            return Ok(Arc::default());
        }

        visiting.push(class.clone());
        let mut constraints = self.declared(txn, class)?;
        for superclass in self.direct_superclasses(txn, class)? {
            constraints.extend(self.load(txn, &superclass, visiting)?.iter().cloned());
        }
        visiting.pop();

        tracing::trace!(class = %class, constraints = constraints.len(), "resolved class constraints");
        let constraints = Arc::new(constraints);
        self.by_class.insert(class.clone(), Arc::clone(&constraints));
        Ok(constraints)
    }

    /// Reads the constraints declared directly on `class`.
    fn declared(&self, txn: &dyn Transaction, class: &Resource) -> Result<Vec<Constraint>> {
        let links = FactPattern::about(class, &vocab::resource(rules::CONSTRAINT)).asserted();
        let on_property = vocab::resource(rules::ON_PROPERTY);

        let mut seen = HashSet::new();
        let mut constraints = Vec::new();
        for link in txn.facts(&links)? {
            let Term::Resource(node) = link.object else {
                continue;
            };
            for property in resources(txn, &node, &on_property)? {
                if !property.is_iri() || !seen.insert((node.clone(), property.clone())) {
                    continue;
                }
                constraints.push(Constraint {
                    class: class.clone(),
                    property,
                    expression: self.expression(txn, &node, link.context.as_ref())?,
                    graph: link.context.clone(),
                });
            }
        }
        Ok(constraints)
    }

    /// Parses the expression of a constraint node, read from its defining graph.
    fn expression(
        &self,
        txn: &dyn Transaction,
        node: &Resource,
        graph: Option<&Resource>,
    ) -> Result<Arc<Expr>> {
        let mut pattern = FactPattern::about(node, &vocab::resource(rules::EXPRESSION_STRING)).asserted();
        if let Some(graph) = graph {
            pattern = pattern.in_context(Some(graph.clone()));
        }
        let text = txn
            .facts(&pattern)?
            .into_iter()
            .find_map(|fact| literal_text(&fact.object));
        let Some(text) = text else {
            return Ok(Arc::new(Expr::Invalid(Arc::new(Error::new(
                ErrorKind::InvalidExpression(format!("constraint {node} has no expression string")),
            )))));
        };

        let namespaces = prefixes(txn, node)?;
        let key = (text.clone(), namespaces.clone());
        Ok(self.expressions.get_or_insert_with(key, || {
            let expr = parse_or_invalid(&text, &namespaces);
            if let Expr::Invalid(error) = &expr {
                tracing::warn!(constraint = %node, error = %error, "constraint expression does not parse");
            }
            Arc::new(expr)
        }))
    }

    /// Returns the minimal direct superclasses of `class`, in class order.
    ///
    /// Excludes the class itself, `owl:Restriction`s, and any superclass
    /// implied by another direct superclass.
    ///
    /// # Errors
    ///
    /// Returns an error if schema facts cannot be read.
    pub fn direct_superclasses(&self, txn: &dyn Transaction, class: &Resource) -> Result<Vec<Resource>> {
        let sub_class_of = vocab::resource(rdfs::SUB_CLASS_OF);
        let rdf_type = vocab::resource(rdf::TYPE);
        let restriction = vocab::resource(owl::RESTRICTION);

        let all: Vec<Resource> = resources(txn, class, &sub_class_of)?
            .into_iter()
            .filter(|s| s != class)
            .collect();

        let mut direct = Vec::new();
        for superclass in &all {
            if direct.contains(superclass)
                || txn.contains(&FactPattern::about(superclass, &rdf_type).with_object(restriction.clone()))?
            {
                continue;
            }
            let mut implied = false;
            for other in all.iter().filter(|o| *o != superclass) {
                if txn.contains(
                    &FactPattern::about(other, &sub_class_of)
                        .with_object(superclass.clone())
                        .asserted(),
                )? {
                    implied = true;
                    break;
                }
            }
            if !implied {
                direct.push(superclass.clone());
            }
        }
        self.ordering.sort(&mut direct);
        Ok(direct)
    }

    /// Returns `class` and all of its transitive subclasses.
    ///
    /// # Errors
    ///
    /// Returns an error if schema facts cannot be read.
    pub fn subclasses(txn: &dyn Transaction, class: &Resource) -> Result<Vec<Resource>> {
        let sub_class_of = vocab::resource(rdfs::SUB_CLASS_OF);
        let mut found = IndexSet::from([class.clone()]);
        let mut queue = VecDeque::from([class.clone()]);
        while let Some(current) = queue.pop_front() {
            let pattern = FactPattern::any()
                .with_predicate(sub_class_of.clone())
                .with_object(current)
                .asserted();
            for fact in txn.facts(&pattern)? {
                if found.insert(fact.subject.clone()) {
                    queue.push_back(fact.subject);
                }
            }
        }
        Ok(found.into_iter().collect())
    }

    /// Returns the direct instances of `class` with the graphs typing them.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn instances(txn: &dyn Transaction, class: &Resource) -> Result<Vec<(Resource, Option<Resource>)>> {
        let pattern = FactPattern::any()
            .with_predicate(vocab::resource(rdf::TYPE))
            .with_object(class.clone())
            .asserted();
        Ok(txn
            .facts(&pattern)?
            .into_iter()
            .map(|fact| (fact.subject, fact.context))
            .collect())
    }

    /// Returns every (instance, typing graph) pair whose instance has a
    /// constrained class among its types or their superclasses.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn targets(txn: &dyn Transaction) -> Result<IndexSet<(Resource, Option<Resource>)>> {
        let links = FactPattern::any()
            .with_predicate(vocab::resource(rules::CONSTRAINT))
            .asserted();
        let classes: IndexSet<Resource> = txn.facts(&links)?.into_iter().map(|f| f.subject).collect();

        let mut seen_classes = HashSet::new();
        let mut targets = IndexSet::new();
        for class in &classes {
            for subclass in Self::subclasses(txn, class)? {
                if seen_classes.insert(subclass.clone()) {
                    targets.extend(Self::instances(txn, &subclass)?);
                }
            }
        }
        Ok(targets)
    }

    /// Drops every cached class. Parsed expressions stay cached.
    pub fn invalidate(&self) {
        self.by_class.clear();
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Collects the prefix declarations reachable through `sh:prefixes`,
/// following `owl:imports` from each declaration node.
fn prefixes(txn: &dyn Transaction, node: &Resource) -> Result<Namespaces> {
    let declare = vocab::resource(sh::DECLARE);
    let prefix = vocab::resource(sh::PREFIX);
    let namespace = vocab::resource(sh::NAMESPACE);
    let imports = vocab::resource(owl::IMPORTS);

    let mut namespaces = Namespaces::new();
    let start = resources(txn, node, &vocab::resource(sh::PREFIXES))?;
    let mut seen: HashSet<Resource> = start.iter().cloned().collect();
    let mut queue = VecDeque::from(start);

    while let Some(current) = queue.pop_front() {
        for declaration in resources(txn, &current, &declare)? {
            let name = objects(txn, &declaration, &prefix)?.iter().find_map(literal_text);
            let ns = objects(txn, &declaration, &namespace)?
                .iter()
                .find_map(|term| match term {
                    Term::Resource(r) => r.as_iri().map(str::to_string),
                    Term::Literal(_) => literal_text(term),
                });
            if let (Some(name), Some(ns)) = (name, ns) {
                if namespaces.get(&name).is_none() {
                    namespaces.insert(name, ns);
                }
            }
        }
        for imported in resources(txn, &current, &imports)? {
            if seen.insert(imported.clone()) {
                queue.push_back(imported);
            }
        }
    }
    Ok(namespaces)
}

fn objects(txn: &dyn Transaction, subject: &Resource, predicate: &Resource) -> Result<Vec<Term>> {
    let pattern = FactPattern::about(subject, predicate).asserted();
    Ok(txn.facts(&pattern)?.into_iter().map(|f| f.object).collect())
}

/// Distinct resource objects of `subject predicate ?o`.
fn resources(txn: &dyn Transaction, subject: &Resource, predicate: &Resource) -> Result<Vec<Resource>> {
    let found: IndexSet<Resource> = objects(txn, subject, predicate)?
        .into_iter()
        .filter_map(|term| match term {
            Term::Resource(r) => Some(r),
            Term::Literal(_) => None,
        })
        .collect();
    Ok(found.into_iter().collect())
}

fn literal_text(term: &Term) -> Option<String> {
    term.as_literal().and_then(|l| l.as_str()).map(str::to_string)
}
