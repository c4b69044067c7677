//! SQL dialect selection.
//!
//! The four supported engines differ in identifier quoting, comment styles,
//! statement vocabulary, and catalog layout. All of that variance is keyed
//! off a single `Dialect` value chosen when a connection is opened; the rest
//! of the crate dispatches through this module instead of carrying four
//! parallel type hierarchies.

pub mod catalog;
pub mod grammar;

use std::fmt;
use std::str::FromStr;

use sqlparser::dialect::{
    Dialect as TokenizerDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};

/// A supported SQL engine variant.
///
/// Immutable for the lifetime of a connection; selects grammar tables,
/// tokenizer behavior, and catalog query templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgres,
    MySql,
    SqlServer,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::Sqlite,
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::SqlServer,
    ];

    /// Human-readable engine name.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "SQLite",
            Dialect::Postgres => "PostgreSQL",
            Dialect::MySql => "MySQL",
            Dialect::SqlServer => "SQL Server",
        }
    }

    /// The sqlparser tokenizer dialect implementing this engine's lexical
    /// rules (quoting styles, comment styles, operators).
    pub(crate) fn tokenizer_dialect(&self) -> Box<dyn TokenizerDialect> {
        match self {
            Dialect::Sqlite => Box::new(SQLiteDialect {}),
            Dialect::Postgres => Box::new(PostgreSqlDialect {}),
            Dialect::MySql => Box::new(MySqlDialect {}),
            Dialect::SqlServer => Box::new(MsSqlDialect {}),
        }
    }

    /// Quote an identifier for this engine, escaping embedded quote
    /// characters by doubling.
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            Dialect::SqlServer => format!("[{}]", name.replace(']', "]]")),
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
            Dialect::Sqlite | Dialect::Postgres => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Render a row-limited SELECT. SQL Server uses `TOP`, everything else
    /// uses a trailing `LIMIT`.
    pub fn limited_select(&self, projection: &str, from: &str, limit: u32) -> String {
        match self {
            Dialect::SqlServer => format!("SELECT TOP {limit} {projection} FROM {from}"),
            _ => format!("SELECT {projection} FROM {from} LIMIT {limit}"),
        }
    }

    /// Render a row-limited `SELECT DISTINCT` over one column. On SQL Server
    /// the `DISTINCT` must precede `TOP`.
    pub fn limited_distinct(&self, column: &str, from: &str, limit: u32) -> String {
        match self {
            Dialect::SqlServer => format!("SELECT DISTINCT TOP {limit} {column} FROM {from}"),
            _ => format!("SELECT DISTINCT {column} FROM {from} LIMIT {limit}"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlserver" | "mssql" | "tsql" => Ok(Dialect::SqlServer),
            other => Err(format!(
                "unknown dialect '{other}' (expected sqlite, postgres, mysql, or sqlserver)"
            )),
        }
    }
}
