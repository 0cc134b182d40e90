//! Expression tree for constraint expressions.

use std::fmt;
use std::sync::Arc;

use reckon_foundation::{Error, Resource, Value};

/// A parsed constraint expression.
///
/// Names are already resolved to IRIs, so a tree does not depend on the
/// prefix declarations it was parsed with.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Constant value.
    Literal(Value),
    /// Reference to a node, like `ex:Rectangle` or `<http://...>`.
    Name(Resource),
    /// Lambda parameter reference like `$r`.
    Var(Arc<str>),
    /// Property read: `@p`, `@p(e)`, `@@p` or `@@p(e)`.
    Property {
        /// The property to read.
        property: Resource,
        /// Entity to read from; `None` reads the entity being computed.
        subject: Option<Box<Expr>>,
        /// `@@` form: all values as a list.
        all: bool,
    },
    /// Prefix operator.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// Infix operator.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Function call like `sum(@@items)`.
    Call {
        /// Function name.
        function: Arc<str>,
        /// Arguments in order.
        args: Vec<Expr>,
    },
    /// `$x -> body`, only valid as a function argument.
    Lambda {
        /// Parameter name.
        param: Arc<str>,
        /// Body evaluated with the parameter bound.
        body: Box<Expr>,
    },
    /// List literal like `[1, 2]`.
    List(Vec<Expr>),
    /// `new Class { p: expr, ... }`
    New {
        /// Type of the created instance.
        class: Resource,
        /// Property values of the created instance.
        fields: Vec<(Resource, Expr)>,
    },
    /// Expression text that failed to parse. Evaluates to the stored error.
    Invalid(Arc<Error>),
}

impl Expr {
    /// Returns true if this is the parse-failure sentinel.
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Collects every property read anywhere in this expression.
    #[must_use]
    pub fn referenced_properties(&self) -> Vec<Resource> {
        let mut out = Vec::new();
        self.collect_properties(&mut out);
        out
    }

    fn collect_properties(&self, out: &mut Vec<Resource>) {
        match self {
            Self::Property {
                property, subject, ..
            } => {
                if !out.contains(property) {
                    out.push(property.clone());
                }
                if let Some(subject) = subject {
                    subject.collect_properties(out);
                }
            }
            Self::Unary { operand, .. } => operand.collect_properties(out),
            Self::Binary { left, right, .. } => {
                left.collect_properties(out);
                right.collect_properties(out);
            }
            Self::Call { args, .. } | Self::List(args) => {
                for arg in args {
                    arg.collect_properties(out);
                }
            }
            Self::Lambda { body, .. } => body.collect_properties(out),
            Self::New { fields, .. } => {
                for (_, value) in fields {
                    value.collect_properties(out);
                }
            }
            Self::Literal(_) | Self::Name(_) | Self::Var(_) | Self::Invalid(_) => {}
        }
    }
}

/// Prefix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `not`
    Not,
}

/// Infix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `^`
    Pow,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `and`
    And,
    /// `or`
    Or,
}

impl BinaryOp {
    /// Returns the operator as written.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Pow => "^",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
