//! Constraint expression language for Reckon.
//!
//! This crate provides:
//! - [`Lexer`] and [`Parser`] - Infix expression syntax with prefixed names
//! - [`Expr`] - The expression tree
//! - [`Namespaces`] - Prefix declarations used to resolve short names
//! - [`EvaluationPath`] - The explicit stack of pairs being evaluated
//! - [`EvalHooks`] and [`walk_property`] - The evaluation protocol the engine plugs into
//! - [`RuleDocument`] - Parser for textual rules files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod ast;
mod interpreter;
mod lexer;
mod namespaces;
mod parser;
mod path;
mod result;
mod rules;
mod token;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use interpreter::{EvalHooks, evaluate_expr, walk_property};
pub use lexer::Lexer;
pub use namespaces::Namespaces;
pub use parser::{Parser, parse, parse_or_invalid};
pub use path::{EvaluationPath, PathEntry};
pub use result::EvalResult;
pub use rules::{Rule, RuleDocument};
pub use token::{Span, Token, TokenKind};
