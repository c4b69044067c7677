//! Structural statement tree types.
//!
//! The parser produces a shallow tree sufficient for safety classification:
//! statement kind, referenced objects, and recursively parsed nested
//! statements. It is deliberately not an AST for execution.

use crate::tokenizer::Span;

/// Closed enumeration of statement kinds the workbench recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Create,
    Alter,
    Drop,
    Truncate,
    /// Stored procedure invocation (`CALL`, `EXEC`, `EXECUTE`, `DO`, ...).
    Call,
    /// Transaction and session control (`BEGIN`, `COMMIT`, `SET`, `USE`,
    /// `PRAGMA`, ...). The workbench owns session state, not the user text.
    TransactionControl,
    Explain,
    /// Vocabulary or structure the parser could not recognize.
    Unknown,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Merge => "MERGE",
            StatementKind::Create => "CREATE",
            StatementKind::Alter => "ALTER",
            StatementKind::Drop => "DROP",
            StatementKind::Truncate => "TRUNCATE",
            StatementKind::Call => "procedure call",
            StatementKind::TransactionControl => "transaction/session control",
            StatementKind::Explain => "EXPLAIN",
            StatementKind::Unknown => "unrecognized statement",
        }
    }
}

/// What a referenced name is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    /// Table-valued function in a FROM position.
    Function,
    Procedure,
}

/// A possibly partially-qualified object reference extracted from a
/// statement. Resolution against the canonical schema is best-effort;
/// an unresolved reference never blocks classification on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRef {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub object: String,
    pub kind: ObjectKind,
}

impl SchemaRef {
    pub fn table(object: impl Into<String>) -> Self {
        SchemaRef {
            catalog: None,
            schema: None,
            object: object.into(),
            kind: ObjectKind::Table,
        }
    }

    /// Dotted display form, e.g. `main.users` or `users`.
    pub fn qualified_name(&self) -> String {
        let mut parts = Vec::new();
        if let Some(c) = &self.catalog {
            parts.push(c.as_str());
        }
        if let Some(s) = &self.schema {
            parts.push(s.as_str());
        }
        parts.push(self.object.as_str());
        parts.join(".")
    }
}

/// One parsed statement: kind, referenced objects, nested statements
/// (CTE bodies, derived tables, subqueries), and the raw span it covers.
#[derive(Debug, Clone)]
pub struct StatementNode {
    pub kind: StatementKind,
    pub objects: Vec<SchemaRef>,
    pub nested: Vec<StatementNode>,
    pub span: Span,
    /// Raw statement text, quote styles preserved, trimmed.
    pub text: String,
}

impl StatementNode {
    /// Depth-first walk over this node and every nested statement.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a StatementNode)) {
        visit(self);
        for child in &self.nested {
            child.walk(visit);
        }
    }

    /// All table references in this statement and its descendants, in
    /// source order.
    pub fn referenced_tables(&self) -> Vec<&SchemaRef> {
        let mut out = Vec::new();
        self.walk(&mut |node| {
            out.extend(
                node.objects
                    .iter()
                    .filter(|r| r.kind == ObjectKind::Table),
            );
        });
        out
    }
}
