//! Top-level statement splitting.
//!
//! A batch splits on `;` at parenthesis depth zero. String literals,
//! quoted identifiers, and comments are already atomic tokens, so a
//! terminator inside them can never leak out; terminators inside balanced
//! parentheses (nested procedure bodies, subqueries) stay with their
//! statement. Segments containing only trivia are dropped; empty input
//! is an empty batch, not an error.

use sqlparser::tokenizer::Token as RawToken;

use crate::tokenizer::Token;

/// Split a lexed batch into per-statement token slices. Statement
/// terminators are consumed, not included in the slices.
pub(crate) fn split_statements(tokens: &[Token]) -> Vec<&[Token]> {
    let mut statements = Vec::new();
    let mut depth: i64 = 0;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        match &token.raw {
            RawToken::LParen => depth += 1,
            RawToken::RParen => depth -= 1,
            RawToken::SemiColon if depth <= 0 => {
                push_segment(&mut statements, &tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_segment(&mut statements, &tokens[start..]);

    statements
}

fn push_segment<'a>(statements: &mut Vec<&'a [Token]>, segment: &'a [Token]) {
    if segment.iter().any(|t| t.is_significant()) {
        statements.push(segment);
    }
}
