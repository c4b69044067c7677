//! Canonical schema model.
//!
//! Four catalog formats normalize into this one representation; the schema
//! browser, the safety classifier, and the value search all read it and
//! nothing mutates it. A snapshot is immutable once built: refreshes build
//! a whole new `CanonicalSchema` and swap it in (see
//! [`introspect::SchemaCache`]).

pub mod introspect;
pub mod normalize;

pub use introspect::{IntrospectionOutcome, IntrospectionWarning, Introspector, SchemaCache};
pub use normalize::CanonicalType;

use std::collections::BTreeMap;

use crate::parser::{ObjectKind, SchemaRef};

/// One column, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnModel {
    pub name: String,
    /// Type name exactly as the catalog declared it.
    pub declared_type: String,
    pub canonical_type: CanonicalType,
    pub nullable: bool,
    /// Position within the table, unique, matching catalog order.
    pub ordinal: u32,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

/// A (possibly multi-column) index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexModel {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// An outbound foreign key. `referenced_table` is a qualified name that must
/// resolve inside the same snapshot; dangling keys are dropped during
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyModel {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    pub schema: Option<String>,
    pub name: String,
    pub columns: Vec<ColumnModel>,
    /// Primary-key column names in key order; empty when the table has none.
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyModel>,
    pub indexes: Vec<IndexModel>,
}

impl TableModel {
    /// Dotted display name, `schema.table` or bare `table`.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(s) => format!("{}.{}", s, self.name),
            None => self.name.clone(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Whether a column is the primary key or covered by a single-column
    /// unique index, the identifying columns the value search prefers.
    pub fn is_identifying_column(&self, name: &str) -> bool {
        let in_pk = self
            .primary_key
            .iter()
            .any(|c| c.eq_ignore_ascii_case(name));
        let in_unique = self.indexes.iter().any(|ix| {
            ix.unique && ix.columns.len() == 1 && ix.columns[0].eq_ignore_ascii_case(name)
        });
        in_pk || in_unique
    }
}

/// One edge of a join path over the foreign-key graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEdge {
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
}

/// The normalized, engine-agnostic schema of one database. Process-local and
/// per-connection; rebuilt wholesale, never partially mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalSchema {
    /// Keyed by lowercased qualified name for case-insensitive lookup.
    tables: BTreeMap<String, TableModel>,
}

impl CanonicalSchema {
    pub fn from_tables(tables: Vec<TableModel>) -> Self {
        let tables = tables
            .into_iter()
            .map(|t| (t.qualified_name().to_lowercase(), t))
            .collect();
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Tables in qualified-name order.
    pub fn tables(&self) -> impl Iterator<Item = &TableModel> {
        self.tables.values()
    }

    /// Case-insensitive lookup by qualified or bare name.
    pub fn get(&self, name: &str) -> Option<&TableModel> {
        let key = name.to_lowercase();
        self.tables.get(&key).or_else(|| {
            // Bare name: unique suffix match across schemas.
            let mut found = None;
            for table in self.tables.values() {
                if table.name.eq_ignore_ascii_case(name) {
                    if found.is_some() {
                        return None;
                    }
                    found = Some(table);
                }
            }
            found
        })
    }

    /// Best-effort resolution of a parsed reference. Procedure references
    /// never resolve to tables; partially qualified table references match
    /// when unambiguous.
    pub fn resolve(&self, reference: &SchemaRef) -> Option<&TableModel> {
        if reference.kind == ObjectKind::Procedure {
            return None;
        }
        match &reference.schema {
            Some(schema) => self.get(&format!("{}.{}", schema, reference.object)),
            None => self.get(&reference.object),
        }
    }

    /// Breadth-first search over the foreign-key graph for a chain of join
    /// edges connecting every listed table. Returns `None` when any table is
    /// unreachable from the first.
    pub fn join_path(&self, table_names: &[&str]) -> Option<Vec<JoinEdge>> {
        let targets: Vec<&TableModel> = table_names
            .iter()
            .map(|name| self.get(name))
            .collect::<Option<Vec<_>>>()?;
        if targets.len() < 2 {
            return Some(Vec::new());
        }

        let adjacency = self.fk_adjacency();
        let mut connected: Vec<String> = vec![targets[0].qualified_name().to_lowercase()];
        let mut path = Vec::new();

        for target in &targets[1..] {
            let goal = target.qualified_name().to_lowercase();
            if connected.contains(&goal) {
                continue;
            }
            let edges = bfs(&adjacency, &connected, &goal)?;
            for edge in edges {
                let right = edge.right_table.to_lowercase();
                if !connected.contains(&right) {
                    connected.push(right);
                }
                let left = edge.left_table.to_lowercase();
                if !connected.contains(&left) {
                    connected.push(left);
                }
                path.push(edge);
            }
        }
        Some(path)
    }

    /// Undirected adjacency over foreign keys, keyed by lowercased
    /// qualified name. Composite keys contribute their first column pair.
    fn fk_adjacency(&self) -> BTreeMap<String, Vec<JoinEdge>> {
        let mut adjacency: BTreeMap<String, Vec<JoinEdge>> = BTreeMap::new();
        for table in self.tables.values() {
            let left = table.qualified_name();
            for fk in &table.foreign_keys {
                let Some(referenced) = self.get(&fk.referenced_table) else {
                    continue;
                };
                let right = referenced.qualified_name();
                let (Some(lc), Some(rc)) = (fk.columns.first(), fk.referenced_columns.first())
                else {
                    continue;
                };
                let forward = JoinEdge {
                    left_table: left.clone(),
                    left_column: lc.clone(),
                    right_table: right.clone(),
                    right_column: rc.clone(),
                };
                let backward = JoinEdge {
                    left_table: right.clone(),
                    left_column: rc.clone(),
                    right_table: left.clone(),
                    right_column: lc.clone(),
                };
                adjacency
                    .entry(left.to_lowercase())
                    .or_default()
                    .push(forward);
                adjacency
                    .entry(right.to_lowercase())
                    .or_default()
                    .push(backward);
            }
        }
        adjacency
    }
}

/// Shortest edge chain from any already-connected table to `goal`.
fn bfs(
    adjacency: &BTreeMap<String, Vec<JoinEdge>>,
    connected: &[String],
    goal: &str,
) -> Option<Vec<JoinEdge>> {
    use std::collections::{HashMap, VecDeque};

    let mut queue: VecDeque<String> = connected.iter().cloned().collect();
    let mut came_from: HashMap<String, JoinEdge> = HashMap::new();
    let mut visited: Vec<String> = connected.to_vec();

    while let Some(current) = queue.pop_front() {
        for edge in adjacency.get(&current).into_iter().flatten() {
            let next = edge.right_table.to_lowercase();
            if visited.contains(&next) {
                continue;
            }
            visited.push(next.clone());
            came_from.insert(next.clone(), edge.clone());
            if next == goal {
                // Reconstruct the chain back to the connected set.
                let mut chain = Vec::new();
                let mut node = goal.to_string();
                while let Some(edge) = came_from.get(&node) {
                    node = edge.left_table.to_lowercase();
                    chain.push(edge.clone());
                }
                chain.reverse();
                return Some(chain);
            }
            queue.push_back(next);
        }
    }
    None
}
