//! Per-dialect grammar tables.
//!
//! Statement-kind detection is table-driven: a statement's leading keyword
//! is looked up first in the dialect-specific table, then in the shared
//! ANSI base table. Anything not listed is `Unknown`, which the classifier
//! denies; the tables therefore only enumerate statements the workbench
//! positively recognizes.
//!
//! Engine statements outside the closed kind enumeration are folded onto
//! the conservative branch whose deny reason is truthful: session and
//! engine controls (`PRAGMA`, `ATTACH`, `USE`, `LOCK` ...) become
//! `TransactionControl`, bulk data loads (`COPY`, `LOAD`, `REPLACE`)
//! become `Insert`, and catalog security or maintenance (`GRANT`,
//! `VACUUM`, `REINDEX` ...) becomes `Alter`.

use super::Dialect;
use crate::parser::statement::StatementKind;

/// Grammar table for one engine: leading-keyword vocabulary plus the
/// statement shapes the parser needs to resolve.
pub struct GrammarTable {
    /// Dialect-specific leading keywords, consulted before the ANSI base.
    pub leading: &'static [(&'static str, StatementKind)],
    /// Statement kinds that may legally terminate a `WITH` prologue.
    pub cte_terminals: &'static [StatementKind],
}

/// Leading keywords shared by every supported engine.
const ANSI_LEADING: &[(&str, StatementKind)] = &[
    ("SELECT", StatementKind::Select),
    ("VALUES", StatementKind::Select),
    ("EXPLAIN", StatementKind::Explain),
    ("INSERT", StatementKind::Insert),
    ("UPDATE", StatementKind::Update),
    ("DELETE", StatementKind::Delete),
    ("MERGE", StatementKind::Merge),
    ("CREATE", StatementKind::Create),
    ("ALTER", StatementKind::Alter),
    ("DROP", StatementKind::Drop),
    ("TRUNCATE", StatementKind::Truncate),
    ("CALL", StatementKind::Call),
    ("EXECUTE", StatementKind::Call),
    ("BEGIN", StatementKind::TransactionControl),
    ("START", StatementKind::TransactionControl),
    ("COMMIT", StatementKind::TransactionControl),
    ("ROLLBACK", StatementKind::TransactionControl),
    ("SAVEPOINT", StatementKind::TransactionControl),
    ("RELEASE", StatementKind::TransactionControl),
    ("SET", StatementKind::TransactionControl),
    ("GRANT", StatementKind::Alter),
    ("REVOKE", StatementKind::Alter),
];

const SQLITE_LEADING: &[(&str, StatementKind)] = &[
    ("PRAGMA", StatementKind::TransactionControl),
    ("ATTACH", StatementKind::TransactionControl),
    ("DETACH", StatementKind::TransactionControl),
    ("VACUUM", StatementKind::Alter),
    ("REINDEX", StatementKind::Alter),
    ("ANALYZE", StatementKind::Alter),
    ("REPLACE", StatementKind::Insert),
];

const POSTGRES_LEADING: &[(&str, StatementKind)] = &[
    ("TABLE", StatementKind::Select),
    ("SHOW", StatementKind::Select),
    ("COPY", StatementKind::Insert),
    ("VACUUM", StatementKind::Alter),
    ("ANALYZE", StatementKind::Alter),
    ("CLUSTER", StatementKind::Alter),
    ("COMMENT", StatementKind::Alter),
    ("DO", StatementKind::Call),
    ("PREPARE", StatementKind::Call),
    ("DEALLOCATE", StatementKind::Call),
    ("LISTEN", StatementKind::TransactionControl),
    ("UNLISTEN", StatementKind::TransactionControl),
    ("NOTIFY", StatementKind::TransactionControl),
    ("DISCARD", StatementKind::TransactionControl),
    ("ABORT", StatementKind::TransactionControl),
];

const MYSQL_LEADING: &[(&str, StatementKind)] = &[
    ("SHOW", StatementKind::Select),
    ("DESCRIBE", StatementKind::Select),
    ("DESC", StatementKind::Select),
    ("REPLACE", StatementKind::Insert),
    ("LOAD", StatementKind::Insert),
    ("RENAME", StatementKind::Alter),
    ("OPTIMIZE", StatementKind::Alter),
    ("ANALYZE", StatementKind::Alter),
    ("FLUSH", StatementKind::Alter),
    ("DO", StatementKind::Call),
    ("USE", StatementKind::TransactionControl),
    ("LOCK", StatementKind::TransactionControl),
    ("UNLOCK", StatementKind::TransactionControl),
];

const SQLSERVER_LEADING: &[(&str, StatementKind)] = &[
    ("EXEC", StatementKind::Call),
    ("BULK", StatementKind::Insert),
    ("DBCC", StatementKind::Alter),
    ("USE", StatementKind::TransactionControl),
    ("WAITFOR", StatementKind::TransactionControl),
];

/// Kinds a CTE prologue may terminate in. Identical across the four
/// engines today, but kept per-table so a divergence stays a data change.
const CTE_TERMINALS: &[StatementKind] = &[
    StatementKind::Select,
    StatementKind::Insert,
    StatementKind::Update,
    StatementKind::Delete,
    StatementKind::Merge,
];

const SQLITE_TABLE: GrammarTable = GrammarTable {
    leading: SQLITE_LEADING,
    cte_terminals: CTE_TERMINALS,
};
const POSTGRES_TABLE: GrammarTable = GrammarTable {
    leading: POSTGRES_LEADING,
    cte_terminals: CTE_TERMINALS,
};
const MYSQL_TABLE: GrammarTable = GrammarTable {
    leading: MYSQL_LEADING,
    cte_terminals: CTE_TERMINALS,
};
const SQLSERVER_TABLE: GrammarTable = GrammarTable {
    leading: SQLSERVER_LEADING,
    cte_terminals: CTE_TERMINALS,
};

/// Grammar table for a dialect.
pub fn grammar(dialect: Dialect) -> &'static GrammarTable {
    match dialect {
        Dialect::Sqlite => &SQLITE_TABLE,
        Dialect::Postgres => &POSTGRES_TABLE,
        Dialect::MySql => &MYSQL_TABLE,
        Dialect::SqlServer => &SQLSERVER_TABLE,
    }
}

/// Resolve a leading keyword to a statement kind, dialect table first,
/// ANSI base second. Case-insensitive; returns `None` for vocabulary the
/// workbench does not recognize.
pub fn statement_kind(dialect: Dialect, word: &str) -> Option<StatementKind> {
    let table = grammar(dialect);
    table
        .leading
        .iter()
        .chain(ANSI_LEADING.iter())
        .find(|(kw, _)| kw.eq_ignore_ascii_case(word))
        .map(|(_, kind)| *kind)
}

/// Whether `kind` may terminate a CTE prologue in this dialect.
pub fn is_cte_terminal(dialect: Dialect, kind: StatementKind) -> bool {
    grammar(dialect).cte_terminals.contains(&kind)
}
