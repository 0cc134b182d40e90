//! Lexer for constraint expressions.
//!
//! The lexer converts expression text into a stream of tokens.

use crate::token::{Span, Token, TokenKind};

/// Lexer for constraint expression text.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            ',' => self.single(TokenKind::Comma),
            '+' => self.single(TokenKind::Plus),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '%' => self.single(TokenKind::Percent),
            '^' => self.single(TokenKind::Caret),
            '-' => self.pair('>', TokenKind::Arrow, TokenKind::Minus),
            '>' => self.pair('=', TokenKind::Ge, TokenKind::Gt),
            '@' => self.pair('@', TokenKind::AtAt, TokenKind::At),
            '=' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Error("expected '==' for comparison".into())
                }
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    TokenKind::Error("expected '!=' (use 'not' for negation)".into())
                }
            }
            '<' => self.scan_angle(),
            '"' => self.scan_string(),
            '$' => self.scan_variable(),
            ':' => {
                if self.peek_char_n(1).is_some_and(is_name_start) {
                    self.advance();
                    let local = self.scan_name_text();
                    TokenKind::Name(format!(":{local}"))
                } else {
                    self.single(TokenKind::Colon)
                }
            }
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_name_start(c) => self.scan_name(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens, ending with `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Consumes one character, and a second if it equals `next`.
    fn pair(&mut self, next: char, double: TokenKind, single: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some(next) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Scans `<`, `<=` or a full IRI in angle brackets.
    ///
    /// `<` starts an IRI only when a `>` follows with no whitespace in
    /// between and the enclosed text contains a `:`.
    fn scan_angle(&mut self) -> TokenKind {
        let body = &self.rest[1..];
        if let Some(end) = body.find(|c: char| c == '>' || c == '<' || c.is_whitespace()) {
            let candidate = &body[..end];
            if body[end..].starts_with('>') && !candidate.is_empty() && candidate.contains(':') {
                let iri = candidate.to_string();
                // '<', the IRI, '>'
                for _ in 0..iri.chars().count() + 2 {
                    self.advance();
                }
                return TokenKind::Iri(iri);
            }
        }
        self.pair('=', TokenKind::Le, TokenKind::Lt)
    }

    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // consume opening '"'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(c) => {
                            return TokenKind::Error(format!("invalid escape sequence: \\{c}"));
                        }
                        None => {
                            return TokenKind::Error(
                                "unexpected end of input in string escape".into(),
                            );
                        }
                    };
                    self.advance();
                    text.push(escaped);
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => return TokenKind::Error("unterminated string literal".into()),
            }
        }
        TokenKind::String(text)
    }

    fn scan_variable(&mut self) -> TokenKind {
        self.advance(); // consume '$'
        if !self.peek_char().is_some_and(is_name_start) {
            return TokenKind::Error("expected variable name after '$'".into());
        }
        TokenKind::Var(self.scan_name_text())
    }

    /// Scans an integer or decimal, with optional fraction and exponent.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        let mut is_float = false;

        self.skip_digits();
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let exponent_follows = match self.peek_char_n(1) {
                Some('+' | '-') => self.peek_char_n(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_follows {
                is_float = true;
                self.advance();
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let text = &self.source[start..self.position];
        if is_float {
            match text.parse::<f64>() {
                Ok(n) => TokenKind::Float(n),
                Err(e) => TokenKind::Error(format!("invalid number: {e}")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(e) => TokenKind::Error(format!("invalid integer: {e}")),
            }
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Scans a name or keyword. `prefix:local` is a single name.
    fn scan_name(&mut self) -> TokenKind {
        let mut name = self.scan_name_text();
        if self.peek_char() == Some(':') && self.peek_char_n(1).is_some_and(is_name_start) {
            self.advance();
            name.push(':');
            name.push_str(&self.scan_name_text());
            return TokenKind::Name(name);
        }
        match name.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "new" => TokenKind::New,
            _ => TokenKind::Name(name),
        }
    }

    fn scan_name_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if is_name_char(c) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        text
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
