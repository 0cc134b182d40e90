//! Core identifiers, literals, facts, values, and errors for Reckon.
//!
//! This crate provides:
//! - [`Resource`] - Opaque graph node identifiers (IRIs and blank nodes)
//! - [`Literal`] and [`Term`] - Typed literals and fact objects
//! - [`Fact`] - Subject/predicate/object/context assertions
//! - [`Value`] - The value type expressions compute with
//! - [`Error`] - Rich error types with context
//! - [`vocab`] - Well-known IRIs
//! - [`content_id`] - Stable identifiers for generated nodes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod digest;
mod error;
mod fact;
mod literal;
mod resource;
mod value;
pub mod vocab;

pub use digest::content_id;
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use fact::Fact;
pub use literal::{Literal, Term};
pub use resource::Resource;
pub use value::{Value, ValueKind, ValueList};
