//! Policy-table tests for the safety classifier.

use pretty_assertions::assert_eq;

use sql_workbench::classifier::{batch_allowed, classify_batches};
use sql_workbench::{check_batch, DenyReason, Dialect, Outcome};

fn outcome(sql: &str, dialect: Dialect) -> Outcome {
    let report = check_batch(sql, dialect, None);
    assert_eq!(report.verdicts.len(), 1, "{sql}");
    report.verdicts[0].outcome
}

// ============================================================================
// Policy table
// ============================================================================

#[test]
fn test_reads_allow() {
    for (sql, dialect) in [
        ("SELECT 1", Dialect::Sqlite),
        ("SELECT * FROM t ORDER BY 1", Dialect::Postgres),
        ("VALUES (1), (2)", Dialect::Postgres),
        ("EXPLAIN SELECT * FROM t", Dialect::MySql),
        ("WITH a AS (SELECT 1) SELECT * FROM a", Dialect::SqlServer),
        ("DESCRIBE t", Dialect::MySql),
    ] {
        assert_eq!(outcome(sql, dialect), Outcome::Allow, "{sql}");
    }
}

#[test]
fn test_writes_deny_with_write_operation() {
    for (sql, dialect) in [
        ("INSERT INTO t VALUES (1)", Dialect::Sqlite),
        ("UPDATE t SET a = 1 WHERE b = 2", Dialect::Postgres),
        ("DELETE FROM t", Dialect::MySql),
        (
            "MERGE INTO t USING s ON t.id = s.id WHEN MATCHED THEN UPDATE SET a = 1",
            Dialect::SqlServer,
        ),
        ("REPLACE INTO t VALUES (1)", Dialect::MySql),
        ("COPY t FROM stdin", Dialect::Postgres),
    ] {
        assert_eq!(
            outcome(sql, dialect),
            Outcome::Deny(DenyReason::WriteOperation),
            "{sql}"
        );
    }
}

#[test]
fn test_ddl_denies() {
    for (sql, dialect) in [
        ("CREATE TABLE t (id INT)", Dialect::Sqlite),
        ("CREATE INDEX ix ON t (id)", Dialect::Postgres),
        ("ALTER TABLE t ADD COLUMN c TEXT", Dialect::MySql),
        ("DROP VIEW v", Dialect::SqlServer),
        ("TRUNCATE TABLE t", Dialect::Postgres),
        ("VACUUM", Dialect::Sqlite),
        ("GRANT SELECT ON t TO reader", Dialect::Postgres),
    ] {
        assert_eq!(outcome(sql, dialect), Outcome::Deny(DenyReason::Ddl), "{sql}");
    }
}

#[test]
fn test_procedure_calls_deny_regardless_of_resolution() {
    for (sql, dialect) in [
        ("CALL cleanup()", Dialect::MySql),
        ("EXEC sp_rename 'a', 'b'", Dialect::SqlServer),
        ("EXECUTE maintenance", Dialect::SqlServer),
        ("DO $$ BEGIN NULL; END $$", Dialect::Postgres),
    ] {
        assert_eq!(
            outcome(sql, dialect),
            Outcome::Deny(DenyReason::ProcedureCall),
            "{sql}"
        );
    }
}

#[test]
fn test_session_and_transaction_control_denies_as_ambiguous() {
    for (sql, dialect) in [
        ("BEGIN", Dialect::Postgres),
        ("COMMIT", Dialect::Sqlite),
        ("ROLLBACK", Dialect::MySql),
        ("SET autocommit = 0", Dialect::MySql),
        ("PRAGMA writable_schema = ON", Dialect::Sqlite),
        ("ATTACH DATABASE 'x.db' AS x", Dialect::Sqlite),
        ("USE master", Dialect::SqlServer),
        ("LOCK TABLES t WRITE", Dialect::MySql),
    ] {
        assert_eq!(
            outcome(sql, dialect),
            Outcome::Deny(DenyReason::AmbiguousConstruct),
            "{sql}"
        );
    }
}

// ============================================================================
// Batch policy
// ============================================================================

#[test]
fn test_two_reads_still_block_as_a_batch() {
    let report = check_batch("SELECT 1; SELECT 2", Dialect::Sqlite, None);
    assert!(!report.allowed());
    for verdict in &report.verdicts {
        assert_eq!(
            verdict.outcome,
            Outcome::Deny(DenyReason::MultiStatementBatchBlocked)
        );
    }
}

#[test]
fn test_batch_allowed_requires_every_verdict() {
    let good = check_batch("SELECT 1", Dialect::Sqlite, None);
    assert!(batch_allowed(&good.verdicts));
    let bad = check_batch("DELETE FROM t", Dialect::Sqlite, None);
    assert!(!batch_allowed(&bad.verdicts));
}

#[test]
fn test_classify_batches_fan_out_matches_single_calls() {
    let sqls: Vec<String> = (0..32)
        .map(|i| {
            if i % 3 == 0 {
                format!("DELETE FROM t{i}")
            } else {
                format!("SELECT * FROM t{i}")
            }
        })
        .collect();
    let parsed: Vec<_> = sqls
        .iter()
        .map(|sql| check_batch(sql, Dialect::Postgres, None).statements)
        .collect();
    let fanned = classify_batches(&parsed, None);
    for (i, (sql, verdicts)) in sqls.iter().zip(&fanned).enumerate() {
        let direct = check_batch(sql, Dialect::Postgres, None).verdicts;
        assert_eq!(*verdicts, direct, "batch {i}: {sql}");
    }
}

// ============================================================================
// Explanations
// ============================================================================

#[test]
fn test_explanations_name_the_offending_clause() {
    let report = check_batch("DROP TABLE customers", Dialect::Postgres, None);
    let explanation = &report.verdicts[0].explanation;
    assert!(
        explanation.contains("DROP TABLE customers"),
        "explanation should quote the clause: {explanation}"
    );
}

#[test]
fn test_allow_explanation_names_the_tables() {
    let report = check_batch(
        "SELECT * FROM orders JOIN customers ON orders.cid = customers.id",
        Dialect::Postgres,
        None,
    );
    let explanation = &report.verdicts[0].explanation;
    assert!(explanation.contains("orders"), "{explanation}");
    assert!(explanation.contains("customers"), "{explanation}");
}
