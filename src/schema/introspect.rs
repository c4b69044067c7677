//! Catalog introspection and snapshot management.
//!
//! `Introspector` drives the per-dialect catalog queries from
//! [`crate::dialect::catalog`] through the connection collaborator and
//! normalizes the rows into a [`CanonicalSchema`]. Tables the session cannot
//! read are skipped with a recorded warning; only a dead connection aborts
//! the whole pass. Foreign keys whose target table did not make it into the
//! snapshot are dropped with a logged inconsistency, since catalogs can be read
//! mid-migration.
//!
//! `SchemaCache` holds the per-connection snapshot behind an `Arc` swap:
//! refreshes build a complete new schema first and publish it in one store,
//! so a concurrent reader either sees the whole old snapshot or the whole
//! new one, never a half-built mix.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::connect::{ConnectionDescriptor, QueryConnection, SessionError, Value};
use crate::dialect::{catalog, Dialect};
use crate::error::WorkbenchError;

use super::normalize;
use super::{CanonicalSchema, ColumnModel, ForeignKeyModel, IndexModel, TableModel};

/// One catalog object that could not be read; introspection continued
/// without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionWarning {
    pub object: String,
    pub detail: String,
}

/// A built snapshot plus the warnings accumulated while building it.
#[derive(Debug)]
pub struct IntrospectionOutcome {
    pub schema: CanonicalSchema,
    pub warnings: Vec<IntrospectionWarning>,
}

impl IntrospectionOutcome {
    /// True when some catalog objects were skipped; browsing continues with
    /// what was read.
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Issues read-only catalog queries and normalizes the results.
#[derive(Debug, Clone)]
pub struct Introspector {
    /// Timeout handed to the collaborator per catalog query.
    pub query_timeout: Option<Duration>,
}

impl Default for Introspector {
    fn default() -> Self {
        Self {
            query_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl Introspector {
    pub fn introspect(
        &self,
        descriptor: &ConnectionDescriptor,
        connection: &dyn QueryConnection,
    ) -> Result<IntrospectionOutcome, WorkbenchError> {
        let dialect = descriptor.dialect;
        let table_rows = connection
            .run(&catalog::list_tables(dialect), self.query_timeout)
            .map_err(|err| WorkbenchError::IntrospectionUnavailable(err.to_string()))?;

        let mut tables = Vec::new();
        let mut warnings = Vec::new();
        for row in table_rows {
            let (schema_name, table_name) = match dialect {
                Dialect::Sqlite => (None, text_at(&row, 0)),
                _ => (text_at(&row, 0), text_at(&row, 1)),
            };
            let Some(table_name) = table_name else {
                continue;
            };
            let object = match &schema_name {
                Some(s) => format!("{s}.{table_name}"),
                None => table_name.clone(),
            };
            match self.introspect_table(dialect, schema_name.as_deref(), &table_name, connection) {
                Ok(table) => tables.push(table),
                Err(SessionError::ConnectionLost(message)) => {
                    return Err(WorkbenchError::IntrospectionUnavailable(message));
                }
                Err(err) => {
                    warn!(table = %object, error = %err, "skipping unreadable table");
                    warnings.push(IntrospectionWarning {
                        object,
                        detail: err.to_string(),
                    });
                }
            }
        }

        let tables = drop_dangling_foreign_keys(tables);
        debug!(
            tables = tables.len(),
            warnings = warnings.len(),
            dialect = %dialect,
            "catalog introspection complete"
        );
        Ok(IntrospectionOutcome {
            schema: CanonicalSchema::from_tables(tables),
            warnings,
        })
    }

    fn introspect_table(
        &self,
        dialect: Dialect,
        schema: Option<&str>,
        table: &str,
        connection: &dyn QueryConnection,
    ) -> Result<TableModel, SessionError> {
        let column_rows =
            connection.run(&catalog::table_columns(dialect, schema, table), self.query_timeout)?;

        let (columns, primary_key) = match dialect {
            Dialect::Sqlite => sqlite_columns(&column_rows),
            _ => {
                let columns = information_schema_columns(&column_rows);
                let primary_key = match catalog::primary_key(dialect, schema, table) {
                    Some(sql) => connection
                        .run(&sql, self.query_timeout)?
                        .iter()
                        .filter_map(|row| text_at(row, 0))
                        .collect(),
                    None => Vec::new(),
                };
                (columns, primary_key)
            }
        };

        let fk_rows = connection.run(&catalog::foreign_keys(dialect, schema, table), self.query_timeout)?;
        let foreign_keys = match dialect {
            Dialect::Sqlite => sqlite_foreign_keys(&fk_rows),
            _ => information_schema_foreign_keys(&fk_rows),
        };

        let index_rows = connection.run(&catalog::indexes(dialect, schema, table), self.query_timeout)?;
        let indexes = match dialect {
            Dialect::Sqlite => self.sqlite_indexes(&index_rows, connection)?,
            _ => information_schema_indexes(&index_rows),
        };

        Ok(TableModel {
            schema: schema.map(str::to_string),
            name: table.to_string(),
            columns,
            primary_key,
            foreign_keys,
            indexes,
        })
    }

    /// `PRAGMA index_list` only names the indexes; each one needs an
    /// `index_info` follow-up for its column list.
    fn sqlite_indexes(
        &self,
        index_rows: &[Vec<Value>],
        connection: &dyn QueryConnection,
    ) -> Result<Vec<IndexModel>, SessionError> {
        let mut indexes = Vec::new();
        for row in index_rows {
            let Some(name) = text_at(row, 1) else {
                continue;
            };
            let unique = bool_at(row, 2);
            let columns = connection
                .run(&catalog::index_columns_sqlite(&name), self.query_timeout)?
                .iter()
                .filter_map(|info| text_at(info, 2))
                .collect();
            indexes.push(IndexModel {
                name,
                columns,
                unique,
            });
        }
        Ok(indexes)
    }
}

/// `PRAGMA table_info` rows: `(cid, name, type, notnull, dflt_value, pk)`.
/// The primary key falls out of the `pk` column (1-based key position).
fn sqlite_columns(rows: &[Vec<Value>]) -> (Vec<ColumnModel>, Vec<String>) {
    let mut columns = Vec::new();
    let mut keyed: Vec<(i64, String)> = Vec::new();
    for row in rows {
        let Some(name) = text_at(row, 1) else {
            continue;
        };
        let declared = text_at(row, 2).unwrap_or_default();
        let (precision, scale) = normalize::parse_precision(&declared);
        columns.push(ColumnModel {
            canonical_type: normalize::canonical_type(&declared),
            declared_type: declared,
            nullable: int_at(row, 3).unwrap_or(0) == 0,
            ordinal: int_at(row, 0).unwrap_or(columns.len() as i64) as u32,
            precision,
            scale,
            name: name.clone(),
        });
        let pk_position = int_at(row, 5).unwrap_or(0);
        if pk_position > 0 {
            keyed.push((pk_position, name));
        }
    }
    keyed.sort_by_key(|(position, _)| *position);
    let primary_key = keyed.into_iter().map(|(_, name)| name).collect();
    (columns, primary_key)
}

/// `information_schema.columns` rows: `[column_name, data_type, is_nullable,
/// ordinal_position, numeric_precision, numeric_scale]`.
fn information_schema_columns(rows: &[Vec<Value>]) -> Vec<ColumnModel> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let name = text_at(row, 0)?;
            let declared = text_at(row, 1).unwrap_or_default();
            let (fallback_precision, fallback_scale) = normalize::parse_precision(&declared);
            Some(ColumnModel {
                canonical_type: normalize::canonical_type(&declared),
                declared_type: declared,
                nullable: text_at(row, 2)
                    .map(|v| v.eq_ignore_ascii_case("YES"))
                    .unwrap_or(true),
                ordinal: int_at(row, 3).unwrap_or(i as i64 + 1) as u32,
                precision: int_at(row, 4).map(|p| p as u32).or(fallback_precision),
                scale: int_at(row, 5).map(|s| s as u32).or(fallback_scale),
                name,
            })
        })
        .collect()
}

/// `PRAGMA foreign_key_list` rows: `(id, seq, table, from, to, ...)`,
/// grouped by `id` for composite keys.
fn sqlite_foreign_keys(rows: &[Vec<Value>]) -> Vec<ForeignKeyModel> {
    let mut grouped: Vec<(i64, ForeignKeyModel)> = Vec::new();
    for row in rows {
        let id = int_at(row, 0).unwrap_or(0);
        let Some(referenced_table) = text_at(row, 2) else {
            continue;
        };
        let local = text_at(row, 3).unwrap_or_default();
        let remote = text_at(row, 4).unwrap_or_default();
        match grouped.iter_mut().find(|(gid, _)| *gid == id) {
            Some((_, fk)) => {
                fk.columns.push(local);
                fk.referenced_columns.push(remote);
            }
            None => grouped.push((
                id,
                ForeignKeyModel {
                    name: None,
                    columns: vec![local],
                    referenced_table,
                    referenced_columns: vec![remote],
                },
            )),
        }
    }
    grouped.into_iter().map(|(_, fk)| fk).collect()
}

/// Uniform rows: `[constraint_name, column_name, referenced_table_schema,
/// referenced_table_name, referenced_column_name]`, grouped by constraint.
fn information_schema_foreign_keys(rows: &[Vec<Value>]) -> Vec<ForeignKeyModel> {
    let mut grouped: Vec<ForeignKeyModel> = Vec::new();
    for row in rows {
        let name = text_at(row, 0);
        let Some(column) = text_at(row, 1) else {
            continue;
        };
        let referenced_schema = text_at(row, 2).filter(|s| !s.is_empty());
        let Some(referenced_name) = text_at(row, 3) else {
            continue;
        };
        let referenced_column = text_at(row, 4).unwrap_or_default();
        let referenced_table = match referenced_schema {
            Some(s) => format!("{s}.{referenced_name}"),
            None => referenced_name,
        };
        match grouped.iter_mut().find(|fk| fk.name == name) {
            Some(fk) => {
                fk.columns.push(column);
                fk.referenced_columns.push(referenced_column);
            }
            None => grouped.push(ForeignKeyModel {
                name,
                columns: vec![column],
                referenced_table,
                referenced_columns: vec![referenced_column],
            }),
        }
    }
    grouped
}

/// Uniform rows: `[index_name, column_name, is_unique]`, grouped by name.
fn information_schema_indexes(rows: &[Vec<Value>]) -> Vec<IndexModel> {
    let mut grouped: Vec<IndexModel> = Vec::new();
    for row in rows {
        let Some(name) = text_at(row, 0) else {
            continue;
        };
        let Some(column) = text_at(row, 1) else {
            continue;
        };
        let unique = bool_at(row, 2);
        match grouped.iter_mut().find(|ix| ix.name == name) {
            Some(ix) => ix.columns.push(column),
            None => grouped.push(IndexModel {
                name,
                columns: vec![column],
                unique,
            }),
        }
    }
    grouped
}

/// Remove foreign keys whose target table is absent from the snapshot.
fn drop_dangling_foreign_keys(mut tables: Vec<TableModel>) -> Vec<TableModel> {
    let qualified: Vec<String> = tables
        .iter()
        .map(|t| t.qualified_name().to_lowercase())
        .collect();
    let mut bare_counts: HashMap<String, usize> = HashMap::new();
    for table in &tables {
        *bare_counts.entry(table.name.to_lowercase()).or_default() += 1;
    }

    for table in &mut tables {
        let owner = table.qualified_name();
        table.foreign_keys.retain(|fk| {
            let target = fk.referenced_table.to_lowercase();
            let known = qualified.contains(&target)
                || bare_counts.get(&target).copied().unwrap_or(0) == 1;
            if !known {
                warn!(
                    table = %owner,
                    referenced = %fk.referenced_table,
                    "dropping foreign key to a table absent from the snapshot"
                );
            }
            known
        });
    }
    tables
}

fn text_at(row: &[Value], index: usize) -> Option<String> {
    row.get(index).and_then(Value::render)
}

fn int_at(row: &[Value], index: usize) -> Option<i64> {
    match row.get(index)? {
        Value::Integer(i) => Some(*i),
        Value::Text(s) => s.trim().parse().ok(),
        Value::Boolean(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn bool_at(row: &[Value], index: usize) -> bool {
    match row.get(index) {
        Some(Value::Boolean(b)) => *b,
        Some(Value::Integer(i)) => *i != 0,
        Some(Value::Text(s)) => {
            matches!(s.to_ascii_lowercase().as_str(), "1" | "t" | "true" | "yes")
        }
        _ => false,
    }
}

/// Per-connection snapshot holder. Readers clone an `Arc` out and keep
/// iterating their snapshot even while a refresh replaces it.
#[derive(Debug, Default)]
pub struct SchemaCache {
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Arc<CanonicalSchema>>,
    stale: bool,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if one has been built.
    pub fn snapshot(&self) -> Option<Arc<CanonicalSchema>> {
        self.read().snapshot.clone()
    }

    /// Whether the snapshot predates a failed refresh.
    pub fn is_stale(&self) -> bool {
        self.read().stale
    }

    /// Rebuild the snapshot and swap it in atomically. On failure the
    /// previous snapshot stays available, marked stale.
    pub fn refresh(
        &self,
        introspector: &Introspector,
        descriptor: &ConnectionDescriptor,
        connection: &dyn QueryConnection,
    ) -> Result<Vec<IntrospectionWarning>, WorkbenchError> {
        match introspector.introspect(descriptor, connection) {
            Ok(outcome) => {
                let mut state = self.write();
                state.snapshot = Some(Arc::new(outcome.schema));
                state.stale = false;
                Ok(outcome.warnings)
            }
            Err(err) => {
                self.write().stale = true;
                Err(err)
            }
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
