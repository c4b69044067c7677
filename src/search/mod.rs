//! Logic-by-example value search.
//!
//! Given a handful of example literals ("where does `ALFKI` live?"), rank
//! the schema's columns by how many of the examples show up among a bounded
//! sample of each column's distinct values. Only columns whose canonical
//! type is compatible with an example's inferred type are probed, and every
//! probe is a read-only `SELECT DISTINCT ... LIMIT k` under the caller's
//! budget. Exhausting the budget mid-scan degrades to a partial ranking,
//! never an error.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::connect::{QueryConnection, SessionError};
use crate::dialect::Dialect;
use crate::schema::{CanonicalSchema, CanonicalType, ColumnModel, TableModel};

/// Inferred shape of one example literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleType {
    Integer,
    Real,
    Boolean,
    DateTime,
    Text,
}

static INTEGER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("integer pattern"));
static REAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.\d*|\.\d+|\d+[eE][+-]?\d+)$").expect("real pattern"));
static DATETIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([ T]\d{2}:\d{2}(:\d{2}(\.\d+)?)?)?$")
        .expect("datetime pattern")
});

/// Infer the type of one example literal from its text shape.
pub fn infer_example_type(example: &str) -> ExampleType {
    let trimmed = example.trim();
    if INTEGER_PATTERN.is_match(trimmed) {
        ExampleType::Integer
    } else if REAL_PATTERN.is_match(trimmed) {
        ExampleType::Real
    } else if DATETIME_PATTERN.is_match(trimmed) {
        ExampleType::DateTime
    } else if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        ExampleType::Boolean
    } else {
        ExampleType::Text
    }
}

/// Whether a column of the given canonical type could plausibly hold a
/// value of the inferred example type. Text columns can hold anything
/// rendered; numeric examples also match wider numeric columns.
fn compatible(example: ExampleType, column: CanonicalType) -> bool {
    match example {
        ExampleType::Integer => matches!(
            column,
            CanonicalType::Integer | CanonicalType::Real | CanonicalType::Text
        ),
        ExampleType::Real => matches!(column, CanonicalType::Real | CanonicalType::Text),
        ExampleType::Boolean => matches!(column, CanonicalType::Boolean | CanonicalType::Text),
        ExampleType::DateTime => matches!(column, CanonicalType::DateTime | CanonicalType::Text),
        ExampleType::Text => column == CanonicalType::Text,
    }
}

/// Caller-supplied resource bounds for one search.
#[derive(Debug, Clone)]
pub struct SearchBudget {
    /// Distinct values sampled per column.
    pub sample_rows: u32,
    /// Columns probed before the search stops with a partial ranking.
    pub max_columns: usize,
    /// Per-probe statement timeout handed to the collaborator.
    pub timeout: Option<Duration>,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            sample_rows: 1000,
            max_columns: 64,
            timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// One ranked candidate: this column's sampled values matched `matched` of
/// the examples.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMatch {
    pub table: String,
    pub column: String,
    /// Fraction of the examples found among the sampled values.
    pub confidence: f64,
    pub matched: usize,
    /// Primary-key or single-column-unique membership; identifying columns
    /// rank above equal-confidence non-identifying ones.
    pub identifying: bool,
}

/// Ranked matches plus how the scan ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    /// Best match first.
    pub matches: Vec<ColumnMatch>,
    pub columns_probed: usize,
    /// True when candidate columns remained after the budget ran out or the
    /// connection went away; the ranking covers only what was probed.
    pub budget_exhausted: bool,
}

/// Rank candidate columns for a set of example values.
pub fn search(
    examples: &[String],
    schema: &CanonicalSchema,
    dialect: Dialect,
    budget: &SearchBudget,
    connection: &dyn QueryConnection,
) -> SearchOutcome {
    let examples: Vec<(&str, ExampleType)> = examples
        .iter()
        .map(|e| (e.trim(), infer_example_type(e)))
        .filter(|(e, _)| !e.is_empty())
        .collect();
    if examples.is_empty() {
        return SearchOutcome::default();
    }

    let mut outcome = SearchOutcome::default();
    let mut candidates = candidate_columns(schema, &examples);

    for (table, column) in candidates.by_ref() {
        if outcome.columns_probed >= budget.max_columns {
            outcome.budget_exhausted = true;
            break;
        }
        let sql = dialect.limited_distinct(
            &dialect.quote_ident(&column.name),
            &quote_table(dialect, table),
            budget.sample_rows,
        );
        let rows = match connection.run(&sql, budget.timeout) {
            Ok(rows) => rows,
            Err(SessionError::ConnectionLost(message)) => {
                warn!(error = %message, "connection lost mid-search; returning partial ranking");
                outcome.budget_exhausted = true;
                break;
            }
            Err(err) => {
                warn!(
                    table = %table.qualified_name(),
                    column = %column.name,
                    error = %err,
                    "skipping column probe"
                );
                outcome.columns_probed += 1;
                continue;
            }
        };
        outcome.columns_probed += 1;

        let sampled: Vec<String> = rows
            .iter()
            .filter_map(|row| row.first().and_then(|v| v.render()))
            .collect();
        let matched = examples
            .iter()
            .filter(|(example, _)| {
                sampled.iter().any(|v| v.eq_ignore_ascii_case(example))
            })
            .count();
        if matched == 0 {
            continue;
        }
        outcome.matches.push(ColumnMatch {
            table: table.qualified_name(),
            column: column.name.clone(),
            confidence: matched as f64 / examples.len() as f64,
            matched,
            identifying: table.is_identifying_column(&column.name),
        });
    }

    if candidates.next().is_some() {
        outcome.budget_exhausted = true;
    }

    // Highest confidence first; identifying columns win ties, then name
    // order keeps the ranking deterministic.
    outcome.matches.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.identifying.cmp(&a.identifying))
            .then_with(|| a.table.cmp(&b.table))
            .then_with(|| a.column.cmp(&b.column))
    });
    outcome
}

/// Columns whose canonical type is compatible with at least one example, in
/// schema order.
fn candidate_columns<'a>(
    schema: &'a CanonicalSchema,
    examples: &'a [(&'a str, ExampleType)],
) -> impl Iterator<Item = (&'a TableModel, &'a ColumnModel)> + 'a {
    schema.tables().flat_map(move |table| {
        table.columns.iter().filter_map(move |column| {
            let usable = examples
                .iter()
                .any(|(_, inferred)| compatible(*inferred, column.canonical_type));
            usable.then_some((table, column))
        })
    })
}

fn quote_table(dialect: Dialect, table: &TableModel) -> String {
    match &table.schema {
        Some(s) => format!(
            "{}.{}",
            dialect.quote_ident(s),
            dialect.quote_ident(&table.name)
        ),
        None => dialect.quote_ident(&table.name),
    }
}
