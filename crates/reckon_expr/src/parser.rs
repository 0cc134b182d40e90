//! Parser for constraint expressions.
//!
//! Precedence climbing over the token stream, loosest first: `or`, `and`,
//! comparisons, `+ -`, `* / %`, prefix `-`/`not`, then right-associative `^`.

use std::sync::Arc;

use reckon_foundation::{Error, ErrorContext, Resource, Result, Value};

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::lexer::Lexer;
use crate::namespaces::Namespaces;
use crate::token::{Token, TokenKind};

/// Parses expression text, resolving short names with `namespaces`.
///
/// # Errors
///
/// Returns a parse error if the text is malformed or uses an undeclared prefix.
pub fn parse(source: &str, namespaces: &Namespaces) -> Result<Expr> {
    Parser::new(source, namespaces).parse()
}

/// Parses expression text, turning a failure into [`Expr::Invalid`].
#[must_use]
pub fn parse_or_invalid(source: &str, namespaces: &Namespaces) -> Expr {
    parse(source, namespaces).unwrap_or_else(|e| Expr::Invalid(Arc::new(e)))
}

/// Parser for constraint expression text.
pub struct Parser<'src, 'ns> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// Source text (for error messages).
    source: &'src str,
    /// Declarations used to resolve short names.
    namespaces: &'ns Namespaces,
}

impl<'src, 'ns> Parser<'src, 'ns> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str, namespaces: &'ns Namespaces) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            source,
            namespaces,
        }
    }

    /// Parses a complete expression; trailing tokens are an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be parsed.
    pub fn parse(&mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected("end of input"));
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        while let Some((op, precedence)) = binary_op(&self.current.kind) {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;
        if self.current.kind != TokenKind::Caret {
            return Ok(base);
        }
        self.advance();
        let exponent = self.parse_unary()?;
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(base),
            right: Box::new(exponent),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let literal = match &self.current.kind {
            TokenKind::Int(n) => Some(Value::Int(*n)),
            TokenKind::Float(x) => Some(Value::Float(*x)),
            TokenKind::String(s) => Some(Value::string(s)),
            TokenKind::True => Some(Value::Bool(true)),
            TokenKind::False => Some(Value::Bool(false)),
            _ => None,
        };
        if let Some(value) = literal {
            self.advance();
            return Ok(Expr::Literal(value));
        }

        match self.current.kind.clone() {
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_separated(&TokenKind::RBracket, Self::parse_expr)?;
                Ok(Expr::List(items))
            }
            TokenKind::At | TokenKind::AtAt => self.parse_property(),
            TokenKind::Var(name) => {
                self.advance();
                if self.current.kind == TokenKind::Arrow {
                    self.advance();
                    let body = self.parse_expr()?;
                    Ok(Expr::Lambda {
                        param: name.into(),
                        body: Box::new(body),
                    })
                } else {
                    Ok(Expr::Var(name.into()))
                }
            }
            TokenKind::Name(name) if !name.contains(':') && self.peek_is_call() => {
                self.advance();
                self.advance(); // '('
                let args = self.parse_separated(&TokenKind::RParen, Self::parse_expr)?;
                Ok(Expr::Call {
                    function: name.into(),
                    args,
                })
            }
            TokenKind::Name(_) | TokenKind::Iri(_) => Ok(Expr::Name(self.parse_name()?)),
            TokenKind::New => self.parse_new(),
            TokenKind::Error(msg) => Err(self.error(&msg)),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Parses `@p`, `@p(e)`, `@@p` or `@@p(e)`.
    fn parse_property(&mut self) -> Result<Expr> {
        let all = self.current.kind == TokenKind::AtAt;
        self.advance();
        let property = self.parse_name()?;
        let subject = if self.current.kind == TokenKind::LParen {
            self.advance();
            let subject = self.parse_expr()?;
            self.expect(&TokenKind::RParen)?;
            Some(Box::new(subject))
        } else {
            None
        };
        Ok(Expr::Property {
            property,
            subject,
            all,
        })
    }

    /// Parses `new Class { p: expr, ... }`.
    fn parse_new(&mut self) -> Result<Expr> {
        self.advance(); // 'new'
        let class = self.parse_name()?;
        self.expect(&TokenKind::LBrace)?;
        let fields = self.parse_separated(&TokenKind::RBrace, |p| {
            let property = p.parse_name()?;
            p.expect(&TokenKind::Colon)?;
            let value = p.parse_expr()?;
            Ok((property, value))
        })?;
        Ok(Expr::New { class, fields })
    }

    /// Parses a comma-separated sequence up to and including `close`.
    fn parse_separated<T>(
        &mut self,
        close: &TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        if self.current.kind == *close {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(item(self)?);
            if self.current.kind == TokenKind::Comma {
                self.advance();
            } else {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn parse_name(&mut self) -> Result<Resource> {
        let resolved = match &self.current.kind {
            TokenKind::Name(name) => self
                .namespaces
                .resolve(name)
                .map_err(|e| self.error(&e.kind.to_string()))?,
            TokenKind::Iri(iri) => Resource::iri(iri),
            _ => return Err(self.unexpected("a name")),
        };
        self.advance();
        Ok(resolved)
    }

    fn peek_is_call(&self) -> bool {
        let rest = &self.source[self.current.span.end..];
        rest.trim_start().starts_with('(')
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.current.kind == *kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&kind.name()))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        match &self.current.kind {
            TokenKind::Error(msg) => self.error(msg),
            found => self.error(&format!("expected {expected}, found {}", found.name())),
        }
    }

    fn error(&self, message: &str) -> Error {
        let span = self.current.span;
        Error::parse(message, span.line, span.column).with_context(
            ErrorContext::new()
                .with_source(self.source)
                .with_position(span.line as usize, span.column as usize),
        )
    }
}

fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::Or => (BinaryOp::Or, 1),
        TokenKind::And => (BinaryOp::And, 2),
        TokenKind::EqEq => (BinaryOp::Eq, 3),
        TokenKind::NotEq => (BinaryOp::Ne, 3),
        TokenKind::Lt => (BinaryOp::Lt, 3),
        TokenKind::Le => (BinaryOp::Le, 3),
        TokenKind::Gt => (BinaryOp::Gt, 3),
        TokenKind::Ge => (BinaryOp::Ge, 3),
        TokenKind::Plus => (BinaryOp::Add, 4),
        TokenKind::Minus => (BinaryOp::Sub, 4),
        TokenKind::Star => (BinaryOp::Mul, 5),
        TokenKind::Slash => (BinaryOp::Div, 5),
        TokenKind::Percent => (BinaryOp::Rem, 5),
        _ => return None,
    })
}
