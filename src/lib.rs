//! sql-workbench: read-only safety engine for a SQL exploration workbench
//!
//! This library is the hard core of a local SQL workbench: a dialect-aware
//! analyzer that classifies arbitrary, possibly malformed or multi-statement
//! SQL text as safe-to-execute or rejected, plus a unified schema model that
//! normalizes four catalog formats (SQLite, PostgreSQL, MySQL, SQL Server)
//! into one canonical representation shared by the schema browser, the
//! value search, and the query builder.
//!
//! The static pipeline is tokenize -> parse -> classify; all three stages
//! are total, pure, and CPU-bound. Catalog introspection and value sampling
//! talk to the database through the [`connect::QueryConnection`] seam and
//! are expected to run in sessions the collaborator opened read-only: a
//! second enforcement layer beneath the classifier, not a substitute for it.

pub mod classifier;
pub mod connect;
pub mod dialect;
pub mod error;
pub mod parser;
pub mod schema;
pub mod search;
pub mod tokenizer;

pub use classifier::{batch_allowed, classify, ClassificationVerdict, DenyReason, Outcome};
pub use dialect::Dialect;
pub use error::WorkbenchError;
pub use parser::{StatementKind, StatementNode};
pub use schema::CanonicalSchema;

/// Everything the static pipeline produced for one batch of SQL text.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub statements: Vec<StatementNode>,
    /// One verdict per top-level statement.
    pub verdicts: Vec<ClassificationVerdict>,
}

impl BatchReport {
    /// Whether the batch may be handed to the execution collaborator.
    pub fn allowed(&self) -> bool {
        classifier::batch_allowed(&self.verdicts)
    }

    /// Require an all-Allow batch, surfacing the first denial as a typed
    /// error for callers that need one.
    pub fn ensure_allowed(&self) -> Result<(), WorkbenchError> {
        let denial = self.verdicts.iter().find_map(|v| match v.outcome {
            Outcome::Deny(reason) => Some((reason, v.explanation.clone())),
            Outcome::Allow => None,
        });
        match denial {
            Some((reason, detail)) => Err(WorkbenchError::ClassificationDenied { reason, detail }),
            None => Ok(()),
        }
    }
}

/// Run one batch through the full static pipeline. Never fails: malformed
/// input surfaces as `Unknown` statements with denying verdicts.
///
/// The schema snapshot is optional; classification of unambiguous
/// statements does not require one.
pub fn check_batch(sql: &str, dialect: Dialect, schema: Option<&CanonicalSchema>) -> BatchReport {
    let tokens = tokenizer::tokenize(sql, dialect);
    let statements = parser::parse(&tokens, dialect);
    let verdicts = classifier::classify(&statements, schema);
    BatchReport {
        statements,
        verdicts,
    }
}
