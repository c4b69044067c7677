//! Dialect-parameterized lexing.
//!
//! `tokenize` is total: it never fails, whatever the input. Lexing is
//! delegated to the sqlparser tokenizer configured with the engine's
//! dialect, which gives us each engine's quoting rules (double-quoted
//! identifiers for SQLite/PostgreSQL, backticks for MySQL, brackets for
//! SQL Server), string-literal escape rules, and comment styles (`--`,
//! `/* */`, and `#` on MySQL) without a hand-rolled lexer. When the
//! tokenizer rejects the input, the longest lexable prefix is kept and the
//! remainder becomes a single `Unknown` token, so downstream stages fail
//! closed instead of crashing.

use sqlparser::tokenizer::{
    Token as RawToken, TokenWithSpan, Tokenizer, TokenizerError, Whitespace,
};

use crate::dialect::Dialect;

/// Coarse lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Literal,
    Punctuation,
    Comment,
    Whitespace,
    /// Input the lexer could not recognize. Downstream stages treat the
    /// containing statement as unparseable.
    Unknown,
}

/// A line/column position, 1-based, as reported by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u64,
    pub column: u64,
}

/// Source region covered by a token or statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Smallest span covering both inputs.
    pub fn union(self, other: Span) -> Span {
        let min = |a: Position, b: Position| {
            if (b.line, b.column) < (a.line, a.column) {
                b
            } else {
                a
            }
        };
        let max = |a: Position, b: Position| {
            if (b.line, b.column) > (a.line, a.column) {
                b
            } else {
                a
            }
        };
        Span {
            start: min(self.start, other.start),
            end: max(self.end, other.end),
        }
    }
}

/// One lexed token. Produced transiently per parse call; not retained.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Original text, quote style preserved.
    pub text: String,
    pub span: Span,
    /// Underlying lexer token, used by the parser for keyword checks.
    pub(crate) raw: RawToken,
}

impl Token {
    /// Whitespace and comments are kept in the stream for spans and
    /// diagnostics but carry no structure.
    pub fn is_significant(&self) -> bool {
        !matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Comment
        )
    }

    pub(crate) fn word(&self) -> Option<&sqlparser::tokenizer::Word> {
        match &self.raw {
            RawToken::Word(w) => Some(w),
            _ => None,
        }
    }

    /// The unquoted word value, only for unquoted words (a quoted
    /// identifier is never treated as a keyword).
    pub(crate) fn unquoted_word(&self) -> Option<&str> {
        match &self.raw {
            RawToken::Word(w) if w.quote_style.is_none() => Some(&w.value),
            _ => None,
        }
    }
}

/// Lex `text` under the given dialect. Total: malformed input degrades to
/// an `Unknown` tail token rather than an error.
pub fn tokenize(text: &str, dialect: Dialect) -> Vec<Token> {
    match try_tokenize(text, dialect) {
        Ok(tokens) => tokens,
        Err(err) => {
            let offset = byte_offset(text, err.location.line, err.location.column);
            let mut tokens = try_tokenize(&text[..offset], dialect).unwrap_or_default();
            let start = Position {
                line: err.location.line,
                column: err.location.column,
            };
            let rest = &text[offset..];
            tokens.push(Token {
                kind: TokenKind::Unknown,
                text: rest.to_string(),
                span: Span {
                    start,
                    end: end_position(start, rest),
                },
                raw: RawToken::EOF,
            });
            tokens
        }
    }
}

fn try_tokenize(text: &str, dialect: Dialect) -> Result<Vec<Token>, TokenizerError> {
    let lexer_dialect = dialect.tokenizer_dialect();
    let raw = Tokenizer::new(lexer_dialect.as_ref(), text).tokenize_with_location()?;
    Ok(raw
        .into_iter()
        .filter(|t| !matches!(t.token, RawToken::EOF))
        .map(wrap)
        .collect())
}

fn wrap(t: TokenWithSpan) -> Token {
    let kind = classify(&t.token);
    let text = t.token.to_string();
    let span = Span {
        start: Position {
            line: t.span.start.line,
            column: t.span.start.column,
        },
        end: Position {
            line: t.span.end.line,
            column: t.span.end.column,
        },
    };
    Token {
        kind,
        text,
        span,
        raw: t.token,
    }
}

fn classify(token: &RawToken) -> TokenKind {
    use sqlparser::keywords::Keyword;

    match token {
        RawToken::Word(w) => {
            if w.quote_style.is_some() || w.keyword == Keyword::NoKeyword {
                TokenKind::Identifier
            } else {
                TokenKind::Keyword
            }
        }
        RawToken::Number(..)
        | RawToken::SingleQuotedString(_)
        | RawToken::DoubleQuotedString(_)
        | RawToken::NationalStringLiteral(_)
        | RawToken::EscapedStringLiteral(_)
        | RawToken::HexStringLiteral(_)
        | RawToken::Placeholder(_) => TokenKind::Literal,
        RawToken::Whitespace(ws) => match ws {
            Whitespace::SingleLineComment { .. } | Whitespace::MultiLineComment(_) => {
                TokenKind::Comment
            }
            _ => TokenKind::Whitespace,
        },
        RawToken::EOF => TokenKind::Whitespace,
        _ => TokenKind::Punctuation,
    }
}

/// Byte offset of a 1-based line/column position; clamped to the text.
fn byte_offset(text: &str, line: u64, column: u64) -> usize {
    let mut current_line = 1u64;
    let mut current_column = 1u64;
    for (i, ch) in text.char_indices() {
        if current_line == line && current_column == column {
            return i;
        }
        if ch == '\n' {
            current_line += 1;
            current_column = 1;
        } else {
            current_column += 1;
        }
    }
    text.len()
}

fn end_position(start: Position, text: &str) -> Position {
    let mut line = start.line;
    let mut column = start.column;
    for ch in text.chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    Position { line, column }
}
