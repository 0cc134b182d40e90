//! Textual rules documents.
//!
//! ```text
//! # rectangles
//! prefix : <http://example.org/vocab#>
//! prefix ex: <http://example.org/>
//! constraint ex:Rectangle area = @a * @b
//! constraint ex:Rectangles area =
//!     sum(@@rects, $r -> @area($r))
//! ```
//!
//! A statement starts at column 1. Indented lines continue the expression of
//! the preceding `constraint`. Lines starting with `#` are comments.

use reckon_foundation::vocab::{rdf, rules, sh};
use reckon_foundation::{Error, Fact, Literal, Resource, Result, Term, content_id};

use crate::namespaces::Namespaces;

/// One `constraint` statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    /// Class whose instances get the property.
    pub class: Resource,
    /// The computed property.
    pub property: Resource,
    /// Expression text, parsed later with the document's prefixes.
    pub expression: String,
    /// Line the statement starts on.
    pub line: u32,
}

/// A parsed rules document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleDocument {
    /// Prefixes declared in the document.
    pub prefixes: Namespaces,
    /// Constraints in document order.
    pub rules: Vec<Rule>,
}

impl RuleDocument {
    /// Parses a rules document.
    ///
    /// Expressions are kept as text; a malformed expression is not an error
    /// here and surfaces when the constraint is evaluated.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed statements or undeclared prefixes
    /// in class and property names.
    pub fn parse(text: &str) -> Result<Self> {
        let mut doc = Self::default();
        for (index, raw) in text.lines().enumerate() {
            let line = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if raw.starts_with(char::is_whitespace) {
                let Some(rule) = doc.rules.last_mut() else {
                    return Err(Error::parse("continuation line without a constraint", line, 1));
                };
                if !rule.expression.is_empty() {
                    rule.expression.push(' ');
                }
                rule.expression.push_str(trimmed);
                continue;
            }

            if let Some(rest) = keyword(trimmed, "prefix") {
                let (prefix, namespace) = parse_prefix(rest)
                    .ok_or_else(|| Error::parse("expected `prefix name: <namespace>`", line, 1))?;
                doc.prefixes.insert(prefix, namespace);
            } else if let Some(rest) = keyword(trimmed, "constraint") {
                let rule = doc.parse_constraint(rest, line)?;
                doc.rules.push(rule);
            } else {
                return Err(Error::parse(
                    format!("expected `prefix` or `constraint`, found `{trimmed}`"),
                    line,
                    1,
                ));
            }
        }

        if let Some(rule) = doc.rules.iter().find(|r| r.expression.is_empty()) {
            return Err(Error::parse("constraint has no expression", rule.line, 1));
        }
        Ok(doc)
    }

    fn parse_constraint(&self, rest: &str, line: u32) -> Result<Rule> {
        let malformed = || Error::parse("expected `constraint Class property = expression`", line, 1);
        let (class, rest) = split_word(rest).ok_or_else(malformed)?;
        let (property, rest) = split_word(rest).ok_or_else(malformed)?;
        let expression = rest.strip_prefix('=').ok_or_else(malformed)?.trim();

        let resolve = |name: &str| {
            self.prefixes
                .resolve_term(name)
                .map_err(|e| Error::parse(e.kind.to_string(), line, 1))
        };
        Ok(Rule {
            class: resolve(class)?,
            property: resolve(property)?,
            expression: expression.to_string(),
            line,
        })
    }

    /// Encodes the document as constraint declaration facts in `context`.
    ///
    /// Each rule becomes a constraint node linked from its class. When the
    /// document declares prefixes, every constraint node points at one shared
    /// prefix declaration node. Node identifiers are derived from content, so
    /// loading the same document twice yields the same facts.
    #[must_use]
    pub fn to_facts(&self, context: Option<&Resource>) -> Vec<Fact> {
        let ctx = context.cloned();
        let fact = |s: &Resource, p: &str, o: Term| {
            Fact::new(s.clone(), Resource::iri(p), o).in_context(ctx.clone())
        };
        let mut facts = Vec::new();

        let declarations = (!self.prefixes.is_empty()).then(|| {
            let node = Resource::blank(format!(
                "prefixes-{}",
                content_id(self.prefixes.iter().flat_map(|(prefix, namespace)| [prefix, namespace]))
            ));
            for (prefix, namespace) in self.prefixes.iter() {
                let decl = Resource::blank(format!("declare-{}", content_id([prefix, namespace])));
                facts.push(fact(&node, sh::DECLARE, decl.clone().into()));
                facts.push(fact(&decl, sh::PREFIX, Literal::string(prefix).into()));
                facts.push(fact(&decl, sh::NAMESPACE, Literal::string(namespace).into()));
            }
            node
        });

        for rule in &self.rules {
            let node = Resource::blank(format!(
                "constraint-{}",
                content_id([rule.class.to_string(), rule.property.to_string(), rule.expression.clone()])
            ));
            facts.push(fact(&rule.class, rules::CONSTRAINT, node.clone().into()));
            facts.push(fact(
                &node,
                rdf::TYPE,
                Resource::iri(rules::CONSTRAINT_CLASS).into(),
            ));
            facts.push(fact(&node, rules::ON_PROPERTY, rule.property.clone().into()));
            facts.push(fact(
                &node,
                rules::EXPRESSION_STRING,
                Literal::string(&rule.expression).into(),
            ));
            if let Some(declarations) = &declarations {
                facts.push(fact(&node, sh::PREFIXES, declarations.clone().into()));
            }
        }
        facts
    }
}

fn keyword<'a>(line: &'a str, word: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(word)?;
    rest.starts_with(char::is_whitespace).then(|| rest.trim_start())
}

fn split_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace)?;
    Some((&text[..end], text[end..].trim_start()))
}

fn parse_prefix(rest: &str) -> Option<(&str, &str)> {
    let (prefix, namespace) = rest.split_once(':')?;
    let prefix = prefix.trim();
    if prefix.contains(char::is_whitespace) {
        return None;
    }
    let namespace = namespace.trim().strip_prefix('<')?.strip_suffix('>')?;
    Some((prefix, namespace))
}
