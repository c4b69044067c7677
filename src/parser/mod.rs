//! Statement splitting and shallow structural parsing.
//!
//! `parse` turns a lexed batch into an ordered sequence of [`StatementNode`]s:
//! one per top-level statement, each with a kind, the objects it references,
//! and recursively parsed nested statements (CTE bodies, derived tables,
//! `EXISTS`/`IN` subqueries, `EXPLAIN` targets). The tree is only as deep as
//! safety classification needs; it is not an AST for execution.
//!
//! Parsing is total. A statement that cannot be understood structurally
//! (unbalanced parentheses, truncated input, unlexable bytes) becomes a
//! single node of kind `Unknown` covering its span. Failure is data, so
//! classification stays a pure function downstream.

mod cursor;
mod splitter;
pub mod statement;

pub use statement::{ObjectKind, SchemaRef, StatementKind, StatementNode};

use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::Token as RawToken;

use crate::dialect::grammar;
use crate::dialect::Dialect;
use crate::tokenizer::{Span, Token, TokenKind};
use cursor::TokenCursor;

/// Parse a lexed batch into top-level statement nodes. Empty or blank input
/// yields an empty sequence, not an error.
pub fn parse(tokens: &[Token], dialect: Dialect) -> Vec<StatementNode> {
    splitter::split_statements(tokens)
        .into_iter()
        .map(|segment| parse_statement(segment, dialect))
        .collect()
}

fn parse_statement(tokens: &[Token], dialect: Dialect) -> StatementNode {
    let span = statement_span(tokens);
    let text = statement_text(tokens);

    if tokens.iter().any(|t| t.kind == TokenKind::Unknown) || !parens_balanced(tokens) {
        return StatementNode {
            kind: StatementKind::Unknown,
            objects: Vec::new(),
            nested: Vec::new(),
            span,
            text,
        };
    }

    let kind = detect_kind(tokens, dialect);

    if kind == StatementKind::Explain {
        return parse_explain(tokens, dialect, span, text);
    }

    let mut objects = Vec::new();
    let mut nested = Vec::new();
    collect(tokens, dialect, &mut objects, &mut nested);

    StatementNode {
        kind,
        objects,
        nested,
        span,
        text,
    }
}

/// Determine a statement's kind from its leading keyword, resolving `WITH`
/// prologues by their terminal clause: a read-looking prefix does not
/// guarantee a read-only effect.
fn detect_kind(tokens: &[Token], dialect: Dialect) -> StatementKind {
    let mut cursor = TokenCursor::new(tokens);
    cursor.skip_trivia();
    let Some(word) = cursor.current().and_then(|t| t.unquoted_word()) else {
        return StatementKind::Unknown;
    };
    if word.eq_ignore_ascii_case("WITH") {
        return resolve_cte_terminal(tokens, dialect);
    }
    grammar::statement_kind(dialect, word).unwrap_or(StatementKind::Unknown)
}

/// Walk past the CTE definition list (`name AS (...), ...`) and resolve the
/// statement kind from the clause that follows it.
fn resolve_cte_terminal(tokens: &[Token], dialect: Dialect) -> StatementKind {
    let mut cursor = TokenCursor::new(tokens);
    cursor.skip_trivia();
    cursor.advance(); // WITH
    cursor.skip_trivia();
    if cursor.check_keyword(Keyword::RECURSIVE) {
        cursor.advance();
        cursor.skip_trivia();
    }

    let mut depth = 0i64;
    let mut found_as = false;
    while let Some(token) = cursor.current() {
        match &token.raw {
            RawToken::LParen => {
                depth += 1;
                cursor.advance();
            }
            RawToken::RParen => {
                if depth > 0 {
                    depth -= 1;
                }
                cursor.advance();
                if depth == 0 && found_as {
                    cursor.skip_trivia();
                    if cursor.check_token(&RawToken::Comma) {
                        // Another CTE definition follows.
                        cursor.advance();
                        cursor.skip_trivia();
                        found_as = false;
                        continue;
                    }
                    let terminal = cursor
                        .current()
                        .and_then(|t| t.unquoted_word())
                        .and_then(|w| grammar::statement_kind(dialect, w));
                    return match terminal {
                        Some(kind) if grammar::is_cte_terminal(dialect, kind) => kind,
                        _ => StatementKind::Unknown,
                    };
                }
            }
            RawToken::Word(w) if w.keyword == Keyword::AS && depth == 0 => {
                found_as = true;
                cursor.advance();
            }
            _ => cursor.advance(),
        }
    }
    StatementKind::Unknown
}

/// `EXPLAIN [QUERY PLAN | ANALYZE | VERBOSE] <stmt>`: the target parses as a
/// nested statement so a write under EXPLAIN is still visible.
fn parse_explain(tokens: &[Token], dialect: Dialect, span: Span, text: String) -> StatementNode {
    let mut cursor = TokenCursor::new(tokens);
    cursor.skip_trivia();
    cursor.advance(); // EXPLAIN
    loop {
        cursor.skip_trivia();
        // MySQL: EXPLAIN FORMAT=JSON <stmt>; the value after `=` is consumed
        // with the modifier.
        if cursor.check_token(&RawToken::Eq) {
            cursor.advance();
            cursor.skip_trivia();
            cursor.advance();
            continue;
        }
        let modifier = cursor
            .current()
            .and_then(|t| t.unquoted_word())
            .map(|w| {
                ["QUERY", "PLAN", "ANALYZE", "VERBOSE", "FORMAT"]
                    .iter()
                    .any(|m| w.eq_ignore_ascii_case(m))
            })
            .unwrap_or(false);
        if !modifier {
            break;
        }
        cursor.advance();
    }
    // PostgreSQL option list: EXPLAIN (ANALYZE, BUFFERS) <stmt>. A group is
    // the option list when it opens with an option word or with anything that
    // does not start a statement; the option check runs first because some
    // option words (`ANALYZE`) collide with statement vocabulary.
    if cursor.check_token(&RawToken::LParen) {
        let open = cursor.pos();
        let close = matching_paren(tokens, open);
        let inner = &tokens[open + 1..close];
        if explain_option_list(inner) || leading_kind(inner, dialect).is_none() {
            cursor.seek(close + 1);
            cursor.skip_trivia();
        }
    }

    let rest = &tokens[cursor.pos()..];
    let nested = if rest.iter().any(|t| t.is_significant()) {
        vec![parse_statement(rest, dialect)]
    } else {
        Vec::new()
    };
    StatementNode {
        kind: StatementKind::Explain,
        objects: Vec::new(),
        nested,
        span,
        text,
    }
}

/// Words that may open an `EXPLAIN (...)` option list.
const EXPLAIN_OPTION_WORDS: &[&str] = &[
    "ANALYZE",
    "VERBOSE",
    "COSTS",
    "SETTINGS",
    "GENERIC_PLAN",
    "BUFFERS",
    "WAL",
    "TIMING",
    "SUMMARY",
    "MEMORY",
    "SERIALIZE",
    "FORMAT",
];

fn explain_option_list(tokens: &[Token]) -> bool {
    let mut cursor = TokenCursor::new(tokens);
    cursor.skip_trivia();
    match cursor.current().and_then(|t| t.unquoted_word()) {
        Some(word) => EXPLAIN_OPTION_WORDS
            .iter()
            .any(|o| word.eq_ignore_ascii_case(o)),
        None => false,
    }
}

/// Single pass over a statement's tokens collecting referenced objects and
/// recursively parsing nested statements out of parenthesized groups.
fn collect(
    tokens: &[Token],
    dialect: Dialect,
    objects: &mut Vec<SchemaRef>,
    nested: &mut Vec<StatementNode>,
) {
    let mut cursor = TokenCursor::new(tokens);
    loop {
        cursor.skip_trivia();
        if cursor.is_at_end() {
            break;
        }

        if cursor.check_token(&RawToken::LParen) {
            let open = cursor.pos();
            let close = matching_paren(tokens, open);
            let inner = &tokens[open + 1..close];
            if leading_kind(inner, dialect).is_some() {
                nested.push(parse_statement(inner, dialect));
            } else {
                // Not a statement (column list, join group, option list):
                // references and deeper subqueries inside it belong to us.
                collect(inner, dialect, objects, nested);
            }
            cursor.seek(close + 1);
            continue;
        }

        if cursor.check_keyword(Keyword::FROM)
            || cursor.check_keyword(Keyword::JOIN)
            || cursor.check_keyword(Keyword::USING)
        {
            cursor.advance();
            push_object_ref(&mut cursor, objects, true);
            continue;
        }
        if cursor.check_keyword(Keyword::INTO) || cursor.check_keyword(Keyword::UPDATE) {
            cursor.advance();
            push_object_ref(&mut cursor, objects, false);
            continue;
        }
        if cursor.check_keyword(Keyword::TRUNCATE) {
            cursor.advance();
            cursor.skip_trivia();
            if cursor.check_keyword(Keyword::TABLE) {
                cursor.advance();
            }
            push_object_ref(&mut cursor, objects, false);
            continue;
        }
        if cursor.check_keyword(Keyword::CALL)
            || cursor.check_keyword(Keyword::EXECUTE)
            || cursor.check_word_ci("EXEC")
        {
            cursor.advance();
            cursor.skip_trivia();
            if let Some(parts) = cursor.parse_object_name() {
                objects.push(make_ref(parts, ObjectKind::Procedure));
            }
            continue;
        }

        cursor.advance();
    }
}

/// Parse an object name at the cursor into a `SchemaRef`. In FROM positions a
/// name immediately followed by `(` is a table-valued function call.
fn push_object_ref(cursor: &mut TokenCursor, objects: &mut Vec<SchemaRef>, from_position: bool) {
    cursor.skip_trivia();
    if cursor.check_token(&RawToken::LParen) {
        // Derived table or join group; the group loop in `collect` owns it.
        return;
    }
    if cursor.check_keyword(Keyword::LATERAL) {
        cursor.advance();
        cursor.skip_trivia();
    }
    // MERGE's `WHEN MATCHED THEN UPDATE SET ...` has no target after UPDATE.
    if cursor.check_keyword(Keyword::SET) {
        return;
    }
    let Some(parts) = cursor.parse_object_name() else {
        return;
    };
    let kind = if from_position && cursor.check_token(&RawToken::LParen) {
        ObjectKind::Function
    } else {
        ObjectKind::Table
    };
    objects.push(make_ref(parts, kind));
}

fn make_ref(mut parts: Vec<String>, kind: ObjectKind) -> SchemaRef {
    let object = parts.pop().unwrap_or_default();
    let schema = parts.pop();
    let catalog = parts.pop();
    SchemaRef {
        catalog,
        schema,
        object,
        kind,
    }
}

/// Kind a token slice would parse to if treated as a statement, or `None`
/// when it does not start one. Used to tell subquery groups from plain
/// parenthesized expressions.
fn leading_kind(tokens: &[Token], dialect: Dialect) -> Option<StatementKind> {
    let mut cursor = TokenCursor::new(tokens);
    cursor.skip_trivia();
    let word = cursor.current()?.unquoted_word()?;
    if word.eq_ignore_ascii_case("WITH") {
        return Some(StatementKind::Select);
    }
    grammar::statement_kind(dialect, word)
}

fn matching_paren(tokens: &[Token], open: usize) -> usize {
    let mut depth = 0i64;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match &token.raw {
            RawToken::LParen => depth += 1,
            RawToken::RParen => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
    }
    tokens.len()
}

fn parens_balanced(tokens: &[Token]) -> bool {
    let mut depth = 0i64;
    for token in tokens {
        match &token.raw {
            RawToken::LParen => depth += 1,
            RawToken::RParen => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn statement_span(tokens: &[Token]) -> Span {
    tokens
        .iter()
        .map(|t| t.span)
        .reduce(Span::union)
        .unwrap_or_default()
}

fn statement_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<String>()
        .trim()
        .to_string()
}
