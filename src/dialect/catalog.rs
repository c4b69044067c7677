//! Per-dialect catalog query templates.
//!
//! The introspector drives these read-only queries through the connection
//! collaborator and normalizes the rows into the canonical schema model.
//! Templates for the three information-schema engines return uniformly
//! shaped rows so the normalization code is shared; SQLite is catalogued
//! through `sqlite_master` and the `PRAGMA` table functions and handled on
//! its own path.
//!
//! Row shapes:
//! - `list_tables`: SQLite `[name]`; others `[table_schema, table_name]`
//! - `table_columns`: SQLite `PRAGMA table_info` rows
//!   `(cid, name, type, notnull, dflt_value, pk)`; others
//!   `[column_name, data_type, is_nullable, ordinal_position,
//!   numeric_precision, numeric_scale]`
//! - `primary_key` (non-SQLite): `[column_name]` in key order
//! - `foreign_keys`: SQLite `PRAGMA foreign_key_list` rows; others
//!   `[constraint_name, column_name, referenced_table_schema,
//!   referenced_table_name, referenced_column_name]`
//! - `indexes`: SQLite `PRAGMA index_list` rows; others
//!   `[index_name, column_name, is_unique]`

use super::Dialect;

/// Escape a string for embedding in a single-quoted SQL literal.
pub(crate) fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

fn qualified(dialect: Dialect, schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(s) => format!("{}.{}", dialect.quote_ident(s), dialect.quote_ident(table)),
        None => dialect.quote_ident(table),
    }
}

/// Query listing user tables.
pub(crate) fn list_tables(dialect: Dialect) -> String {
    match dialect {
        Dialect::Sqlite => "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            .to_string(),
        Dialect::Postgres => "SELECT table_schema, table_name FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' \
             AND table_schema NOT IN ('pg_catalog', 'information_schema') \
             ORDER BY table_schema, table_name"
            .to_string(),
        Dialect::MySql => "SELECT table_schema, table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
            .to_string(),
        Dialect::SqlServer => "SELECT table_schema, table_name FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' ORDER BY table_schema, table_name"
            .to_string(),
    }
}

/// Query listing a table's columns in catalog (ordinal) order.
pub(crate) fn table_columns(dialect: Dialect, schema: Option<&str>, table: &str) -> String {
    match dialect {
        Dialect::Sqlite => format!("PRAGMA table_info({})", qualified(dialect, None, table)),
        Dialect::Postgres | Dialect::SqlServer => format!(
            "SELECT column_name, data_type, is_nullable, ordinal_position, \
             numeric_precision, numeric_scale \
             FROM information_schema.columns \
             WHERE table_schema = '{}' AND table_name = '{}' \
             ORDER BY ordinal_position",
            escape_literal(schema.unwrap_or_default()),
            escape_literal(table)
        ),
        Dialect::MySql => format!(
            "SELECT column_name, data_type, is_nullable, ordinal_position, \
             numeric_precision, numeric_scale \
             FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = '{}' \
             ORDER BY ordinal_position",
            escape_literal(table)
        ),
    }
}

/// Query listing a table's primary-key columns in key order. SQLite has no
/// separate query; the key falls out of `PRAGMA table_info`.
pub(crate) fn primary_key(dialect: Dialect, schema: Option<&str>, table: &str) -> Option<String> {
    match dialect {
        Dialect::Sqlite => None,
        Dialect::Postgres | Dialect::SqlServer => Some(format!(
            "SELECT kcu.column_name \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
             ON tc.constraint_name = kcu.constraint_name \
             AND tc.table_schema = kcu.table_schema \
             WHERE tc.constraint_type = 'PRIMARY KEY' \
             AND tc.table_schema = '{}' AND tc.table_name = '{}' \
             ORDER BY kcu.ordinal_position",
            escape_literal(schema.unwrap_or_default()),
            escape_literal(table)
        )),
        Dialect::MySql => Some(format!(
            "SELECT column_name FROM information_schema.key_column_usage \
             WHERE table_schema = DATABASE() AND table_name = '{}' \
             AND constraint_name = 'PRIMARY' ORDER BY ordinal_position",
            escape_literal(table)
        )),
    }
}

/// Query listing a table's outbound foreign keys.
pub(crate) fn foreign_keys(dialect: Dialect, schema: Option<&str>, table: &str) -> String {
    match dialect {
        Dialect::Sqlite => format!(
            "PRAGMA foreign_key_list({})",
            qualified(dialect, None, table)
        ),
        Dialect::Postgres => format!(
            "SELECT kcu.constraint_name, kcu.column_name, \
             ccu.table_schema, ccu.table_name, ccu.column_name \
             FROM information_schema.key_column_usage kcu \
             JOIN information_schema.constraint_column_usage ccu \
             ON kcu.constraint_name = ccu.constraint_name \
             AND kcu.constraint_schema = ccu.constraint_schema \
             WHERE kcu.table_schema = '{}' AND kcu.table_name = '{}' \
             AND kcu.constraint_name IN (SELECT constraint_name \
             FROM information_schema.table_constraints \
             WHERE constraint_type = 'FOREIGN KEY') \
             ORDER BY kcu.constraint_name, kcu.ordinal_position",
            escape_literal(schema.unwrap_or_default()),
            escape_literal(table)
        ),
        Dialect::MySql => format!(
            "SELECT constraint_name, column_name, \
             referenced_table_schema, referenced_table_name, referenced_column_name \
             FROM information_schema.key_column_usage \
             WHERE table_schema = DATABASE() AND table_name = '{}' \
             AND referenced_table_name IS NOT NULL \
             ORDER BY constraint_name, ordinal_position",
            escape_literal(table)
        ),
        Dialect::SqlServer => format!(
            "SELECT OBJECT_NAME(fc.constraint_object_id), \
             COL_NAME(fc.parent_object_id, fc.parent_column_id), \
             OBJECT_SCHEMA_NAME(fc.referenced_object_id), \
             OBJECT_NAME(fc.referenced_object_id), \
             COL_NAME(fc.referenced_object_id, fc.referenced_column_id) \
             FROM sys.foreign_key_columns fc \
             WHERE fc.parent_object_id = OBJECT_ID('{}') \
             ORDER BY fc.constraint_object_id, fc.constraint_column_id",
            escape_literal(&qualified(dialect, schema, table))
        ),
    }
}

/// Query listing a table's indexes. For SQLite the per-index column list
/// needs a follow-up `index_columns_sqlite` call.
pub(crate) fn indexes(dialect: Dialect, schema: Option<&str>, table: &str) -> String {
    match dialect {
        Dialect::Sqlite => format!("PRAGMA index_list({})", qualified(dialect, None, table)),
        Dialect::Postgres => format!(
            "SELECT i.relname, a.attname, ix.indisunique \
             FROM pg_class t \
             JOIN pg_namespace n ON n.oid = t.relnamespace \
             JOIN pg_index ix ON t.oid = ix.indrelid \
             JOIN pg_class i ON i.oid = ix.indexrelid \
             JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
             WHERE n.nspname = '{}' AND t.relname = '{}' \
             ORDER BY i.relname, a.attnum",
            escape_literal(schema.unwrap_or_default()),
            escape_literal(table)
        ),
        Dialect::MySql => format!(
            "SELECT index_name, column_name, (non_unique = 0) \
             FROM information_schema.statistics \
             WHERE table_schema = DATABASE() AND table_name = '{}' \
             ORDER BY index_name, seq_in_index",
            escape_literal(table)
        ),
        Dialect::SqlServer => format!(
            "SELECT i.name, c.name, i.is_unique \
             FROM sys.indexes i \
             JOIN sys.index_columns ic \
             ON i.object_id = ic.object_id AND i.index_id = ic.index_id \
             JOIN sys.columns c \
             ON ic.object_id = c.object_id AND ic.column_id = c.column_id \
             WHERE i.object_id = OBJECT_ID('{}') AND i.name IS NOT NULL \
             ORDER BY i.name, ic.key_ordinal",
            escape_literal(&qualified(dialect, schema, table))
        ),
    }
}

/// SQLite follow-up: the column list of one named index.
pub(crate) fn index_columns_sqlite(index: &str) -> String {
    format!("PRAGMA index_info({})", Dialect::Sqlite.quote_ident(index))
}
