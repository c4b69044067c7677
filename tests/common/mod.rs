//! Common test utilities for sql-workbench tests

use std::time::Duration;

use sql_workbench::connect::{ConnectionDescriptor, QueryConnection, SessionError, Value};

/// One fixture column: name, declared type, primary-key membership.
pub struct FixtureColumn {
    pub name: &'static str,
    pub declared: &'static str,
    pub primary_key: bool,
}

/// One fixture table with its data rows (one cell per column, row-major).
pub struct FixtureTable {
    pub name: &'static str,
    pub columns: Vec<FixtureColumn>,
    /// (local column, referenced table, referenced column)
    pub foreign_keys: Vec<(&'static str, &'static str, &'static str)>,
    pub rows: Vec<Vec<Value>>,
}

/// In-memory stand-in for the execution collaborator. Answers the SQLite
/// catalog queries the introspector issues and the bounded sampling queries
/// the value search issues, from fixture data.
pub struct FakeDatabase {
    pub tables: Vec<FixtureTable>,
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

pub fn int(i: i64) -> Value {
    Value::Integer(i)
}

impl FakeDatabase {
    /// A small two-table customers/orders database.
    pub fn customers_and_orders() -> Self {
        FakeDatabase {
            tables: vec![
                FixtureTable {
                    name: "customers",
                    columns: vec![
                        FixtureColumn {
                            name: "code",
                            declared: "TEXT",
                            primary_key: true,
                        },
                        FixtureColumn {
                            name: "city",
                            declared: "TEXT",
                            primary_key: false,
                        },
                    ],
                    foreign_keys: vec![],
                    rows: vec![
                        vec![text("ALFKI"), text("Berlin")],
                        vec![text("ANATR"), text("London")],
                        vec![text("BERGS"), text("Berlin")],
                    ],
                },
                FixtureTable {
                    name: "orders",
                    columns: vec![
                        FixtureColumn {
                            name: "id",
                            declared: "INTEGER",
                            primary_key: true,
                        },
                        FixtureColumn {
                            name: "customer_code",
                            declared: "TEXT",
                            primary_key: false,
                        },
                        FixtureColumn {
                            name: "total",
                            declared: "REAL",
                            primary_key: false,
                        },
                    ],
                    foreign_keys: vec![("customer_code", "customers", "code")],
                    rows: vec![
                        vec![int(1), text("ALFKI"), Value::Real(19.99)],
                        vec![int(2), text("BERGS"), Value::Real(5.00)],
                    ],
                },
            ],
        }
    }

    pub fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor::sqlite("fixture.db")
    }

    fn table(&self, name: &str) -> Option<&FixtureTable> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// `PRAGMA table_info` shape: `(cid, name, type, notnull, dflt_value, pk)`.
    fn table_info_rows(&self, table: &FixtureTable) -> Vec<Vec<Value>> {
        table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                vec![
                    int(i as i64),
                    text(c.name),
                    text(c.declared),
                    int(i64::from(c.primary_key)),
                    Value::Null,
                    int(i64::from(c.primary_key)),
                ]
            })
            .collect()
    }

    /// `PRAGMA foreign_key_list` shape: `(id, seq, table, from, to)`.
    fn foreign_key_rows(&self, table: &FixtureTable) -> Vec<Vec<Value>> {
        table
            .foreign_keys
            .iter()
            .enumerate()
            .map(|(i, (local, referenced_table, referenced_column))| {
                vec![
                    int(i as i64),
                    int(0),
                    text(referenced_table),
                    text(local),
                    text(referenced_column),
                ]
            })
            .collect()
    }

    fn distinct_rows(&self, table: &FixtureTable, column: &str) -> Vec<Vec<Value>> {
        let Some(index) = table
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(column))
        else {
            return Vec::new();
        };
        let mut seen: Vec<Value> = Vec::new();
        for row in &table.rows {
            if let Some(value) = row.get(index) {
                if !seen.contains(value) {
                    seen.push(value.clone());
                }
            }
        }
        seen.into_iter().map(|v| vec![v]).collect()
    }
}

/// Double-quoted identifiers in order of appearance.
fn quoted_idents(sql: &str) -> Vec<&str> {
    sql.split('"').skip(1).step_by(2).collect()
}

impl QueryConnection for FakeDatabase {
    fn run(&self, sql: &str, _timeout: Option<Duration>) -> Result<Vec<Vec<Value>>, SessionError> {
        if sql.contains("sqlite_master") {
            let mut names: Vec<&str> = self.tables.iter().map(|t| t.name).collect();
            names.sort_unstable();
            return Ok(names.into_iter().map(|n| vec![text(n)]).collect());
        }

        if let Some(rest) = sql.strip_prefix("PRAGMA table_info(") {
            let name = quoted_idents(rest).first().copied().unwrap_or_default();
            return match self.table(name) {
                Some(table) => Ok(self.table_info_rows(table)),
                None => Err(SessionError::QueryFailed(format!("no such table: {name}"))),
            };
        }

        if let Some(rest) = sql.strip_prefix("PRAGMA foreign_key_list(") {
            let name = quoted_idents(rest).first().copied().unwrap_or_default();
            return Ok(self
                .table(name)
                .map(|t| self.foreign_key_rows(t))
                .unwrap_or_default());
        }

        if sql.starts_with("PRAGMA index_list(") || sql.starts_with("PRAGMA index_info(") {
            return Ok(Vec::new());
        }

        if sql.starts_with("SELECT DISTINCT ") {
            let idents = quoted_idents(sql);
            let (Some(column), Some(name)) = (idents.first(), idents.get(1)) else {
                return Err(SessionError::QueryFailed(format!(
                    "unexpected probe: {sql}"
                )));
            };
            return match self.table(name) {
                Some(table) => Ok(self.distinct_rows(table, column)),
                None => Err(SessionError::QueryFailed(format!("no such table: {name}"))),
            };
        }

        Err(SessionError::QueryFailed(format!("unexpected query: {sql}")))
    }
}
