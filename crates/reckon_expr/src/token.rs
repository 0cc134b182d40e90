//! Token types for constraint expressions.

/// A span of source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset where this span starts.
    pub start: usize,
    /// Byte offset where this span ends (exclusive).
    pub end: usize,
    /// 1-based line number where this span starts.
    pub line: u32,
    /// 1-based column number where this span starts.
    pub column: u32,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Returns the text this span covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token types for constraint expressions.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal like `42`
    Int(i64),
    /// Decimal literal like `2.5` or `1e3`
    Float(f64),
    /// String literal like `"hello"`
    String(String),
    /// `true`
    True,
    /// `false`
    False,

    // Names
    /// Short name like `area`, `ex:area` or `:area`
    Name(String),
    /// Full IRI like `<http://example.org/area>`
    Iri(String),
    /// Variable like `$r`
    Var(String),

    // Keywords
    /// `and`
    And,
    /// `or`
    Or,
    /// `not`
    Not,
    /// `new`
    New,

    // Property access
    /// `@`
    At,
    /// `@@`
    AtAt,

    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `->`
    Arrow,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `^`
    Caret,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,

    /// End of input.
    Eof,
    /// Lexical error.
    Error(String),
}

impl TokenKind {
    /// Returns a short human-readable name for error messages.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Int(n) => format!("integer {n}"),
            Self::Float(x) => format!("number {x}"),
            Self::String(_) => "string".into(),
            Self::True => "'true'".into(),
            Self::False => "'false'".into(),
            Self::Name(name) => format!("name '{name}'"),
            Self::Iri(iri) => format!("<{iri}>"),
            Self::Var(name) => format!("variable ${name}"),
            Self::And => "'and'".into(),
            Self::Or => "'or'".into(),
            Self::Not => "'not'".into(),
            Self::New => "'new'".into(),
            Self::At => "'@'".into(),
            Self::AtAt => "'@@'".into(),
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
            Self::LBracket => "'['".into(),
            Self::RBracket => "']'".into(),
            Self::LBrace => "'{'".into(),
            Self::RBrace => "'}'".into(),
            Self::Comma => "','".into(),
            Self::Colon => "':'".into(),
            Self::Arrow => "'->'".into(),
            Self::Plus => "'+'".into(),
            Self::Minus => "'-'".into(),
            Self::Star => "'*'".into(),
            Self::Slash => "'/'".into(),
            Self::Percent => "'%'".into(),
            Self::Caret => "'^'".into(),
            Self::EqEq => "'=='".into(),
            Self::NotEq => "'!='".into(),
            Self::Lt => "'<'".into(),
            Self::Le => "'<='".into(),
            Self::Gt => "'>'".into(),
            Self::Ge => "'>='".into(),
            Self::Eof => "end of input".into(),
            Self::Error(msg) => msg.clone(),
        }
    }
}
