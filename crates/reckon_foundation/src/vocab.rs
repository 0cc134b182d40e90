//! Well-known IRIs.
//!
//! Constants are plain `&'static str` so they can be used in `const`
//! contexts; [`resource`] turns one into a [`Resource`].

use crate::resource::Resource;

/// Creates a resource for a vocabulary constant.
#[must_use]
pub fn resource(iri: &str) -> Resource {
    Resource::iri(iri)
}

/// XML Schema datatypes.
pub mod xsd {
    /// Namespace.
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";
    /// `xsd:boolean`
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    /// `xsd:integer`
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// `xsd:double`
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    /// `xsd:string`
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
}

/// RDF core vocabulary.
pub mod rdf {
    /// Namespace.
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// `rdf:type`
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

/// RDF Schema vocabulary.
pub mod rdfs {
    /// Namespace.
    pub const NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    /// `rdfs:subClassOf`
    pub const SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
}

/// OWL vocabulary.
pub mod owl {
    /// Namespace.
    pub const NS: &str = "http://www.w3.org/2002/07/owl#";
    /// `owl:imports`
    pub const IMPORTS: &str = "http://www.w3.org/2002/07/owl#imports";
    /// `owl:Restriction`
    pub const RESTRICTION: &str = "http://www.w3.org/2002/07/owl#Restriction";
}

/// SHACL prefix declarations.
pub mod sh {
    /// Namespace.
    pub const NS: &str = "http://www.w3.org/ns/shacl#";
    /// `sh:prefixes`
    pub const PREFIXES: &str = "http://www.w3.org/ns/shacl#prefixes";
    /// `sh:declare`
    pub const DECLARE: &str = "http://www.w3.org/ns/shacl#declare";
    /// `sh:prefix`
    pub const PREFIX: &str = "http://www.w3.org/ns/shacl#prefix";
    /// `sh:namespace`
    pub const NAMESPACE: &str = "http://www.w3.org/ns/shacl#namespace";
}

/// Constraint rules vocabulary.
pub mod rules {
    /// Namespace.
    pub const NS: &str = "http://numerateweb.org/vocab/math/rules#";
    /// Links a class to one of its constraint nodes.
    pub const CONSTRAINT: &str = "http://numerateweb.org/vocab/math/rules#constraint";
    /// Links a constraint node to the property it computes.
    pub const ON_PROPERTY: &str = "http://numerateweb.org/vocab/math/rules#onProperty";
    /// Links a constraint node to its expression text.
    pub const EXPRESSION_STRING: &str =
        "http://numerateweb.org/vocab/math/rules#expressionString";
    /// Type of constraint nodes.
    pub const CONSTRAINT_CLASS: &str = "http://numerateweb.org/vocab/math/rules#Constraint";
}

/// Dependency and ownership tracking.
pub mod math {
    /// `<read entity> usedBy <reading entity>`, written as a derived fact.
    pub const USED_BY: &str = "math:usedBy";
    /// `<entity> owns <instance>` for instances created while computing a
    /// property of the entity, written as a derived fact.
    pub const OWNS: &str = "math:owns";
}
