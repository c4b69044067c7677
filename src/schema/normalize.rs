//! Declared-type normalization.
//!
//! Catalogs report engine-specific type names (`NVARCHAR(80)`, `int8`,
//! `SMALLDATETIME`, `TINYINT UNSIGNED`). The value search and the schema
//! browser only need a coarse shape, so every declared type maps into one
//! canonical type; precision and scale are carried alongside on the column
//! model but nothing downstream requires them.

use std::fmt;

/// Coarse, engine-agnostic column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalType {
    Integer,
    Real,
    Text,
    Binary,
    Boolean,
    DateTime,
    Unknown,
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CanonicalType::Integer => "integer",
            CanonicalType::Real => "real",
            CanonicalType::Text => "text",
            CanonicalType::Binary => "binary",
            CanonicalType::Boolean => "boolean",
            CanonicalType::DateTime => "datetime",
            CanonicalType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Map a declared type name to its canonical type. Matching is on the base
/// name with any `(precision, scale)` suffix and attribute words stripped,
/// so `NVARCHAR(80)` and `TINYINT UNSIGNED` classify by `nvarchar` and
/// `tinyint`.
pub fn canonical_type(declared: &str) -> CanonicalType {
    let lowered = declared.trim().to_lowercase();
    let base = lowered
        .split(['(', ' '])
        .next()
        .unwrap_or_default()
        .trim();

    match base {
        "bool" | "boolean" | "bit" => CanonicalType::Boolean,

        // The date/time family goes before the integer family: `interval`
        // and `smalldatetime` would otherwise substring-match `int`.
        "date" | "time" | "timetz" | "datetime" | "datetime2" | "smalldatetime"
        | "datetimeoffset" | "timestamp" | "timestamptz" | "interval" | "year" => {
            CanonicalType::DateTime
        }

        "int" | "integer" | "int2" | "int4" | "int8" | "tinyint" | "smallint" | "mediumint"
        | "bigint" | "serial" | "smallserial" | "bigserial" | "rowid" => CanonicalType::Integer,

        "real" | "float" | "float4" | "float8" | "double" | "decimal" | "dec" | "numeric"
        | "number" | "money" | "smallmoney" => CanonicalType::Real,

        "char" | "nchar" | "varchar" | "nvarchar" | "varchar2" | "character" | "text"
        | "ntext" | "tinytext" | "mediumtext" | "longtext" | "clob" | "nclob" | "string"
        | "uuid" | "uniqueidentifier" | "enum" | "set" | "json" | "jsonb" | "xml"
        | "citext" | "name" | "inet" | "cidr" | "macaddr" => CanonicalType::Text,

        "blob" | "tinyblob" | "mediumblob" | "longblob" | "binary" | "varbinary" | "bytea"
        | "image" | "raw" => CanonicalType::Binary,

        _ => CanonicalType::Unknown,
    }
}

/// Extract `(precision[, scale])` from a declared type suffix, e.g.
/// `DECIMAL(10, 2)` or `VARCHAR(80)`. Engines whose catalogs report these in
/// dedicated columns bypass this and pass them in directly.
pub fn parse_precision(declared: &str) -> (Option<u32>, Option<u32>) {
    let Some(open) = declared.find('(') else {
        return (None, None);
    };
    let Some(close) = declared[open..].find(')') else {
        return (None, None);
    };
    let inner = &declared[open + 1..open + close];
    let mut parts = inner.split(',').map(|p| p.trim().parse::<u32>().ok());
    let precision = parts.next().flatten();
    let scale = parts.next().flatten();
    (precision, scale)
}
