//! Error types for sql-workbench
//!
//! The taxonomy is deliberately small: malformed input and exhausted search
//! budgets are represented as data (an `Unknown` statement node, a partial
//! ranking), not errors, and the classifier never throws: a missing Allow
//! verdict is its only failure signal. What remains here are the outcomes
//! that genuinely abort an operation.

use thiserror::Error;

use crate::classifier::DenyReason;
use crate::connect::SessionError;

/// Errors surfaced by the workbench core.
#[derive(Error, Debug)]
pub enum WorkbenchError {
    /// A batch failed safety classification. Raised only by callers that
    /// need an error value (the CLI); `classify` itself returns verdicts.
    #[error("query blocked ({reason}): {detail}")]
    ClassificationDenied { reason: DenyReason, detail: String },

    /// The catalog could not be read at all (dead connection). Callers keep
    /// showing the last-known snapshot, marked stale.
    #[error("schema introspection unavailable: {0}")]
    IntrospectionUnavailable(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}
