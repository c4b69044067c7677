//! Connection boundary.
//!
//! The workbench core never talks to a database driver directly. Everything
//! that needs the engine (catalog introspection, value sampling) goes
//! through the [`QueryConnection`] trait, implemented outside this crate by
//! a pool/driver layer that is expected to open each session read-only.
//! Tests implement it with an in-memory fake.
//!
//! Credentials live only inside the descriptor passed per call; the core
//! does not cache them, and the `Debug` impl redacts the password so they
//! cannot leak through logging.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::dialect::Dialect;

/// Where a database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// Local database file (SQLite).
    Path(PathBuf),
    /// Network endpoint (PostgreSQL, MySQL, SQL Server).
    Server {
        host: String,
        port: Option<u16>,
        database: String,
    },
}

/// Login credentials, session-scoped. The password is unreadable through
/// `Debug` and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the introspector and sampler need to reach one database.
/// Passed explicitly into each call; never stored process-wide.
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    pub dialect: Dialect,
    pub target: ConnectionTarget,
    pub credentials: Option<Credentials>,
}

impl ConnectionDescriptor {
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            dialect: Dialect::Sqlite,
            target: ConnectionTarget::Path(path.into()),
            credentials: None,
        }
    }

    pub fn server(
        dialect: Dialect,
        host: impl Into<String>,
        port: Option<u16>,
        database: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            dialect,
            target: ConnectionTarget::Server {
                host: host.into(),
                port,
                database: database.into(),
            },
            credentials: Some(credentials),
        }
    }
}

/// A scalar cell value returned by the collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text rendering used when comparing sampled values against
    /// user-supplied example literals.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null | Value::Bytes(_) => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) => Some(r.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Text(s) => Some(s.clone()),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Errors surfaced by the execution collaborator.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The connection is gone; the operation as a whole fails.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The session lacks privileges on one object; callers degrade and
    /// continue.
    #[error("permission denied on {object}")]
    PermissionDenied { object: String },

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// The single seam to the out-of-scope execution collaborator. `run` issues
/// one statement inside a session the collaborator has configured read-only
/// and returns the full result set as rows of scalars.
///
/// The statements this crate sends through the trait are its own catalog
/// and sampling queries; user text reaches a connection only after the
/// safety classifier allowed the whole batch.
pub trait QueryConnection: Send + Sync {
    fn run(&self, sql: &str, timeout: Option<Duration>) -> Result<Vec<Vec<Value>>, SessionError>;
}
