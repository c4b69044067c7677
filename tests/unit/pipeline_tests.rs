//! Tests for the full static pipeline: tokenize, parse, classify.

use pretty_assertions::assert_eq;

use sql_workbench::{check_batch, DenyReason, Dialect, Outcome, StatementKind, WorkbenchError};

// ============================================================================
// Batch shape
// ============================================================================

#[test]
fn test_empty_input_yields_empty_batch() {
    let report = check_batch("", Dialect::Postgres, None);
    assert!(report.statements.is_empty());
    assert!(report.verdicts.is_empty());
    assert!(report.allowed(), "empty batch is trivially executable");
}

#[test]
fn test_one_verdict_per_top_level_statement() {
    for sql in [
        "SELECT 1",
        "SELECT 1; SELECT 2",
        "SELECT 1; DROP TABLE t; SELECT 3",
        "-- comment\nSELECT 1;",
    ] {
        for dialect in Dialect::ALL {
            let report = check_batch(sql, dialect, None);
            assert_eq!(
                report.verdicts.len(),
                report.statements.len(),
                "{sql} on {dialect}"
            );
        }
    }
}

#[test]
fn test_pipeline_is_deterministic() {
    let sql = "WITH r AS (SELECT * FROM t) SELECT * FROM r WHERE x IN (SELECT y FROM u)";
    let first = check_batch(sql, Dialect::MySql, None);
    let second = check_batch(sql, Dialect::MySql, None);
    assert_eq!(first.verdicts, second.verdicts);
}

// ============================================================================
// Safety properties
// ============================================================================

#[test]
fn test_pure_read_passes() {
    let report = check_batch(
        "SELECT id, name FROM users WHERE id = 1",
        Dialect::Sqlite,
        None,
    );
    assert!(report.allowed());
    assert_eq!(report.verdicts[0].outcome, Outcome::Allow);
}

#[test]
fn test_injection_guard_blocks_trailing_payload() {
    let report = check_batch("SELECT * FROM t; DROP TABLE t", Dialect::Postgres, None);
    assert!(!report.allowed());
    assert_eq!(report.statements.len(), 2);
    for verdict in &report.verdicts {
        assert_eq!(
            verdict.outcome,
            Outcome::Deny(DenyReason::MultiStatementBatchBlocked)
        );
    }
}

#[test]
fn test_nested_write_guard() {
    let report = check_batch(
        "WITH x AS (DELETE FROM t RETURNING *) SELECT * FROM x",
        Dialect::Postgres,
        None,
    );
    assert!(!report.allowed());
    assert_eq!(
        report.verdicts[0].outcome,
        Outcome::Deny(DenyReason::WriteOperation)
    );
}

#[test]
fn test_ensure_allowed_surfaces_the_first_denial() {
    assert!(check_batch("SELECT 1", Dialect::Sqlite, None)
        .ensure_allowed()
        .is_ok());

    let err = check_batch("DELETE FROM t", Dialect::Sqlite, None)
        .ensure_allowed()
        .unwrap_err();
    match err {
        WorkbenchError::ClassificationDenied { reason, detail } => {
            assert_eq!(reason, DenyReason::WriteOperation);
            assert!(detail.contains("DELETE"), "{detail}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unresolvable_procedure_call_denied() {
    let report = check_batch("EXEC rename_all_tables", Dialect::SqlServer, None);
    assert_eq!(
        report.verdicts[0].outcome,
        Outcome::Deny(DenyReason::ProcedureCall)
    );
}

#[test]
fn test_malformed_input_fails_closed() {
    for sql in ["SELECT * FROM t WHERE (", "SELECT 'unterminated", "@#%!"] {
        let report = check_batch(sql, Dialect::Sqlite, None);
        assert!(!report.allowed(), "{sql}");
        assert_eq!(report.statements[0].kind, StatementKind::Unknown, "{sql}");
        assert_eq!(
            report.verdicts[0].outcome,
            Outcome::Deny(DenyReason::SyntaxUnrecognized),
            "{sql}"
        );
    }
}

// ============================================================================
// Dialect-specific lexing feeds equivalent trees
// ============================================================================

#[test]
fn test_identifier_quoting_styles_classify_identically() {
    let cases = [
        ("SELECT \"id\" FROM \"T\"", Dialect::Postgres),
        ("SELECT \"id\" FROM \"T\"", Dialect::Sqlite),
        ("SELECT `id` FROM `T`", Dialect::MySql),
        ("SELECT [id] FROM [T]", Dialect::SqlServer),
    ];
    for (sql, dialect) in cases {
        let report = check_batch(sql, dialect, None);
        assert!(report.allowed(), "{sql} on {dialect}");
        assert_eq!(report.statements[0].kind, StatementKind::Select);
        assert_eq!(report.statements[0].objects[0].object, "T");
    }
}

#[test]
fn test_dialect_vocabulary_is_scoped() {
    // SHOW is a read on MySQL but unrecognized on SQLite.
    assert!(check_batch("SHOW TABLES", Dialect::MySql, None).allowed());
    assert!(!check_batch("SHOW TABLES", Dialect::Sqlite, None).allowed());
}

#[test]
fn test_comments_do_not_affect_classification() {
    let report = check_batch(
        "-- leading note\nSELECT 1 /* inline */ + 2 # not a comment here\n",
        Dialect::Postgres,
        None,
    );
    // '#' is not a PostgreSQL comment; the statement still parses because
    // the lexer treats it as an operator.
    assert_eq!(report.statements.len(), 1);
}

#[test]
fn test_explain_allowed_for_reads_denied_for_writes() {
    assert!(check_batch("EXPLAIN SELECT 1", Dialect::Postgres, None).allowed());
    assert!(!check_batch("EXPLAIN UPDATE t SET x = 1", Dialect::Postgres, None).allowed());
}
