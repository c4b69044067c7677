//! Token cursor with the navigation helpers shared by the splitter and
//! the structural parser.

use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::Token as RawToken;

use crate::tokenizer::Token;

/// Read-only cursor over a lexed token slice.
pub(crate) struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    #[inline]
    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    #[inline]
    pub(crate) fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Jump to an absolute token index (used to hop over a balanced group).
    #[inline]
    pub(crate) fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    /// Skip whitespace and comment tokens.
    pub(crate) fn skip_trivia(&mut self) {
        while let Some(token) = self.current() {
            if token.is_significant() {
                break;
            }
            self.advance();
        }
    }

    /// Check if the current token is a specific keyword (unquoted words
    /// only; a quoted identifier never matches).
    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        match self.current().and_then(|t| t.word()) {
            Some(w) => w.quote_style.is_none() && w.keyword == keyword,
            None => false,
        }
    }

    /// Check if the current token is an unquoted word matching
    /// case-insensitively. Useful for dialect vocabulary sqlparser does
    /// not model as a keyword (`EXEC`, `PRAGMA`, ...).
    pub(crate) fn check_word_ci(&self, word: &str) -> bool {
        match self.current().and_then(|t| t.unquoted_word()) {
            Some(value) => value.eq_ignore_ascii_case(word),
            None => false,
        }
    }

    /// Check the current token's type by discriminant, ignoring any inner
    /// value (`check_token(&RawToken::LParen)` matches any left paren).
    pub(crate) fn check_token(&self, expected: &RawToken) -> bool {
        match self.current() {
            Some(token) => {
                std::mem::discriminant(&token.raw) == std::mem::discriminant(expected)
            }
            None => false,
        }
    }

    /// Parse an identifier or unquoted word, returning its bare value.
    pub(crate) fn parse_identifier(&mut self) -> Option<String> {
        let word = self.current()?.word()?;
        let value = word.value.clone();
        self.advance();
        Some(value)
    }

    /// Parse a dotted object name (`name`, `schema.name`, or
    /// `catalog.schema.name`), returning the parts in source order.
    pub(crate) fn parse_object_name(&mut self) -> Option<Vec<String>> {
        let mut parts = vec![self.parse_identifier()?];
        loop {
            self.skip_trivia();
            if !self.check_token(&RawToken::Period) {
                break;
            }
            self.advance();
            self.skip_trivia();
            match self.parse_identifier() {
                Some(part) => parts.push(part),
                None => break,
            }
        }
        Some(parts)
    }
}
