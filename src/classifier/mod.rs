//! Safety classification of parsed statements.
//!
//! `classify` walks the structural tree and decides Allow or Deny per
//! top-level statement. It is a pure function of the statement sequence and
//! the schema snapshot: it never consults live data, never performs I/O, and
//! never fails; the absence of an Allow verdict is the only failure signal,
//! always explained in user terms.
//!
//! The policy deliberately favors false rejection over any false acceptance.
//! A batch with more than one top-level statement is denied outright, even
//! when every statement alone would pass, which closes the
//! trailing-payload injection path (`SELECT 1; DROP TABLE x`).

use rayon::prelude::*;

use crate::parser::{ObjectKind, StatementKind, StatementNode};
use crate::schema::CanonicalSchema;

/// Why a statement was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    WriteOperation,
    Ddl,
    ProcedureCall,
    AmbiguousConstruct,
    MultiStatementBatchBlocked,
    SyntaxUnrecognized,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::WriteOperation => "WriteOperation",
            DenyReason::Ddl => "DDL",
            DenyReason::ProcedureCall => "ProcedureCall",
            DenyReason::AmbiguousConstruct => "AmbiguousConstruct",
            DenyReason::MultiStatementBatchBlocked => "MultiStatementBatchBlocked",
            DenyReason::SyntaxUnrecognized => "SyntaxUnrecognized",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allow, or Deny with the policy reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allow,
    Deny(DenyReason),
}

impl Outcome {
    pub fn is_allow(&self) -> bool {
        matches!(self, Outcome::Allow)
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Outcome::Allow => None,
            Outcome::Deny(reason) => Some(*reason),
        }
    }
}

/// One verdict per top-level statement in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationVerdict {
    /// Index of the statement within its batch.
    pub statement_index: usize,
    pub outcome: Outcome,
    /// User-facing explanation, never a raw engine error.
    pub explanation: String,
}

/// Classify every top-level statement of a parsed batch.
///
/// The schema snapshot, when present, is consulted only to resolve object
/// references for the explanations; an unresolved reference never blocks a
/// statement whose kind is unambiguous.
pub fn classify(
    statements: &[StatementNode],
    schema: Option<&CanonicalSchema>,
) -> Vec<ClassificationVerdict> {
    if statements.len() > 1 {
        let explanation = format!(
            "batch contains {} statements; multi-statement batches are blocked, \
             run one statement at a time",
            statements.len()
        );
        return statements
            .iter()
            .enumerate()
            .map(|(i, _)| ClassificationVerdict {
                statement_index: i,
                outcome: Outcome::Deny(DenyReason::MultiStatementBatchBlocked),
                explanation: explanation.clone(),
            })
            .collect();
    }

    statements
        .iter()
        .enumerate()
        .map(|(i, node)| classify_statement(i, node, schema))
        .collect()
}

/// Whether a batch may be handed to the execution collaborator: every
/// verdict must allow.
pub fn batch_allowed(verdicts: &[ClassificationVerdict]) -> bool {
    verdicts.iter().all(|v| v.outcome.is_allow())
}

/// Below this many batches, sequential classification beats the fan-out
/// overhead.
const PARALLEL_THRESHOLD: usize = 8;

/// Classify many independent batches. Classification is pure and CPU-bound,
/// so larger workloads fan out across the rayon pool.
pub fn classify_batches(
    batches: &[Vec<StatementNode>],
    schema: Option<&CanonicalSchema>,
) -> Vec<Vec<ClassificationVerdict>> {
    if batches.len() >= PARALLEL_THRESHOLD {
        batches.par_iter().map(|b| classify(b, schema)).collect()
    } else {
        batches.iter().map(|b| classify(b, schema)).collect()
    }
}

fn classify_statement(
    index: usize,
    node: &StatementNode,
    schema: Option<&CanonicalSchema>,
) -> ClassificationVerdict {
    match first_denial(node, schema) {
        Some((reason, explanation)) => ClassificationVerdict {
            statement_index: index,
            outcome: Outcome::Deny(reason),
            explanation,
        },
        None => ClassificationVerdict {
            statement_index: index,
            outcome: Outcome::Allow,
            explanation: allow_explanation(node),
        },
    }
}

/// Depth-first search for the first denying construct. A statement is Deny
/// if any descendant is Deny; the reason and highlighted clause come from
/// the denying node itself.
fn first_denial(
    node: &StatementNode,
    schema: Option<&CanonicalSchema>,
) -> Option<(DenyReason, String)> {
    if let Some(denial) = kind_denial(node, schema) {
        return Some(denial);
    }
    node.nested
        .iter()
        .find_map(|child| first_denial(child, schema))
}

fn kind_denial(
    node: &StatementNode,
    schema: Option<&CanonicalSchema>,
) -> Option<(DenyReason, String)> {
    let clause = clause_snippet(&node.text);
    match node.kind {
        StatementKind::Select | StatementKind::Explain => None,
        StatementKind::Insert | StatementKind::Update | StatementKind::Delete
        | StatementKind::Merge => Some((
            DenyReason::WriteOperation,
            format!("{} modifies table data: {clause}", node.kind.as_str()),
        )),
        StatementKind::Create | StatementKind::Alter | StatementKind::Drop
        | StatementKind::Truncate => Some((
            DenyReason::Ddl,
            format!(
                "{} changes the database schema: {clause}",
                node.kind.as_str()
            ),
        )),
        StatementKind::Call => Some((DenyReason::ProcedureCall, call_explanation(node, schema))),
        StatementKind::TransactionControl => Some((
            DenyReason::AmbiguousConstruct,
            format!(
                "the workbench manages transactions and session state itself; \
                 not allowed in a query: {clause}"
            ),
        )),
        StatementKind::Unknown => Some((
            DenyReason::SyntaxUnrecognized,
            format!("statement could not be recognized as a read-only query: {clause}"),
        )),
    }
}

/// Procedure bodies cannot be statically proven read-only, so every call is
/// denied; schema resolution only sharpens the message.
fn call_explanation(node: &StatementNode, schema: Option<&CanonicalSchema>) -> String {
    let target = node
        .objects
        .iter()
        .find(|r| r.kind == ObjectKind::Procedure);
    match target {
        Some(r) => {
            let resolved = schema
                .and_then(|s| s.get(&r.qualified_name()))
                .map(|t| format!(" ('{}' names a table, not a procedure)", t.qualified_name()))
                .unwrap_or_default();
            format!(
                "procedure call '{}' cannot be proven read-only{resolved}",
                r.qualified_name()
            )
        }
        None => "procedure calls cannot be proven read-only".to_string(),
    }
}

fn allow_explanation(node: &StatementNode) -> String {
    match node.kind {
        StatementKind::Explain => "read-only EXPLAIN".to_string(),
        _ => {
            let tables = node.referenced_tables();
            if tables.is_empty() {
                "read-only query".to_string()
            } else {
                let names: Vec<_> = tables.iter().map(|r| r.qualified_name()).collect();
                format!("read-only query over {}", names.join(", "))
            }
        }
    }
}

/// First non-comment line of the statement, truncated, for the user-facing
/// explanation.
fn clause_snippet(text: &str) -> String {
    const MAX: usize = 72;
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("--") && !l.starts_with('#'))
        .unwrap_or_default();
    if line.len() <= MAX {
        line.to_string()
    } else {
        let cut = line
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(MAX);
        format!("{}...", &line[..cut])
    }
}
