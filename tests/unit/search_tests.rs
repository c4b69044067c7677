//! Logic-by-example tests over the fake collaborator.

use pretty_assertions::assert_eq;

use sql_workbench::schema::Introspector;
use sql_workbench::search::{search, SearchBudget};
use sql_workbench::Dialect;

use crate::common::FakeDatabase;

fn run_search(examples: &[&str], budget: &SearchBudget) -> sql_workbench::search::SearchOutcome {
    let database = FakeDatabase::customers_and_orders();
    let schema = Introspector::default()
        .introspect(&FakeDatabase::descriptor(), &database)
        .unwrap()
        .schema;
    let examples: Vec<String> = examples.iter().map(|e| e.to_string()).collect();
    search(&examples, &schema, Dialect::Sqlite, budget, &database)
}

#[test]
fn test_examples_locate_their_column() {
    let outcome = run_search(&["ALFKI", "BERGS"], &SearchBudget::default());
    assert!(!outcome.budget_exhausted);
    let best = &outcome.matches[0];
    assert_eq!(best.table, "customers");
    assert_eq!(best.column, "code");
    assert_eq!(best.confidence, 1.0);
}

#[test]
fn test_primary_key_membership_breaks_ties() {
    // ALFKI appears in both customers.code (pk) and orders.customer_code;
    // the identifying column must rank first.
    let outcome = run_search(&["ALFKI"], &SearchBudget::default());
    let full_confidence: Vec<_> = outcome
        .matches
        .iter()
        .filter(|m| m.confidence == 1.0)
        .collect();
    assert!(full_confidence.len() >= 2);
    assert!(full_confidence[0].identifying);
    assert_eq!(full_confidence[0].column, "code");
}

#[test]
fn test_ranking_never_exceeds_columns_probed() {
    for budget in [
        SearchBudget::default(),
        SearchBudget {
            max_columns: 1,
            ..SearchBudget::default()
        },
        SearchBudget {
            max_columns: 0,
            ..SearchBudget::default()
        },
    ] {
        let outcome = run_search(&["ALFKI", "Berlin"], &budget);
        assert!(
            outcome.matches.len() <= outcome.columns_probed,
            "ranking longer than probe count under budget {budget:?}"
        );
    }
}

#[test]
fn test_exhausted_budget_is_partial_not_error() {
    let outcome = run_search(
        &["ALFKI"],
        &SearchBudget {
            max_columns: 1,
            ..SearchBudget::default()
        },
    );
    assert!(outcome.budget_exhausted);
    assert_eq!(outcome.columns_probed, 1);
}

#[test]
fn test_numeric_examples_find_numeric_columns() {
    let outcome = run_search(&["19.99"], &SearchBudget::default());
    let best = &outcome.matches[0];
    assert_eq!(best.table, "orders");
    assert_eq!(best.column, "total");
}

#[test]
fn test_unmatched_examples_rank_nothing() {
    let outcome = run_search(&["no-such-value-anywhere"], &SearchBudget::default());
    assert!(outcome.matches.is_empty());
    assert!(outcome.columns_probed > 0, "text columns were still probed");
}
