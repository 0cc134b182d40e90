//! Prefix declarations for short names.

use std::collections::BTreeMap;
use std::fmt;

use reckon_foundation::{Error, ErrorKind, Resource, Result};

/// Maps prefixes to namespace IRIs.
///
/// The empty prefix is the default namespace, used by `:local` and by bare
/// `local` names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Namespaces {
    prefixes: BTreeMap<String, String>,
}

impl Namespaces {
    /// Creates an empty set of declarations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.insert(prefix, namespace);
        self
    }

    /// Adds or replaces a declaration.
    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Adds the declarations of `other` whose prefixes are not declared here.
    pub fn extend_missing(&mut self, other: &Namespaces) {
        for (prefix, namespace) in &other.prefixes {
            self.prefixes
                .entry(prefix.clone())
                .or_insert_with(|| namespace.clone());
        }
    }

    /// Returns the namespace bound to `prefix`.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Returns true if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Iterates over `(prefix, namespace)` pairs in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, n)| (p.as_str(), n.as_str()))
    }

    /// Resolves `prefix:local`, `:local` or `local` to an IRI.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UndeclaredPrefix`] if the prefix has no declaration.
    pub fn resolve(&self, name: &str) -> Result<Resource> {
        let (prefix, local) = name.split_once(':').unwrap_or(("", name));
        let namespace = self
            .get(prefix)
            .ok_or_else(|| Error::new(ErrorKind::UndeclaredPrefix(prefix.to_string())))?;
        Ok(Resource::iri(format!("{namespace}{local}")))
    }

    /// Resolves a short name, or a full IRI written as `<iri>`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UndeclaredPrefix`] if a short name's prefix has no
    /// declaration.
    pub fn resolve_term(&self, text: &str) -> Result<Resource> {
        match text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            Some(iri) => Ok(Resource::iri(iri)),
            None => self.resolve(text),
        }
    }
}

impl fmt::Display for Namespaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (prefix, namespace) in &self.prefixes {
            writeln!(f, "prefix {prefix}: <{namespace}>")?;
        }
        Ok(())
    }
}

impl<P: Into<String>, N: Into<String>> FromIterator<(P, N)> for Namespaces {
    fn from_iter<I: IntoIterator<Item = (P, N)>>(iter: I) -> Self {
        let mut namespaces = Self::new();
        for (prefix, namespace) in iter {
            namespaces.insert(prefix, namespace);
        }
        namespaces
    }
}
