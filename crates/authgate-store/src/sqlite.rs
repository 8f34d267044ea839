//! SQLite user repository.

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection};
use serde_json::Value;

use authgate_core::UserRecord;

use crate::error::{Error, Result};
use crate::table::UserRepository;

/// Default user table name.
pub const DEFAULT_USER_TABLE: &str = "users";

/// Looks users up in one SQLite table.
///
/// Table and field names must be plain identifiers; values are always bound
/// as parameters.
pub struct SqliteRepository {
    conn: Connection,
    table: String,
}

impl SqliteRepository {
    /// Open a database file.
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, table)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(table: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, table)
    }

    /// Use an existing connection.
    pub fn from_connection(conn: Connection, table: &str) -> Result<Self> {
        validate_identifier(table)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// Underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    fn lookup(&self, field: &str, value: &str) -> Result<Option<UserRecord>> {
        validate_identifier(field)?;

        let sql = format!(
            "SELECT * FROM \"{}\" WHERE \"{}\" = ?1 LIMIT 1",
            self.table, field
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = stmt.query(params![value])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut record = UserRecord::new();
        for (idx, name) in columns.into_iter().enumerate() {
            let value: SqlValue = row.get(idx)?;
            record.insert(name, to_json(value));
        }

        Ok(Some(record))
    }
}

impl UserRepository for SqliteRepository {
    fn find_by_field(&self, field: &str, value: &str) -> authgate_core::Result<Option<UserRecord>> {
        Ok(self.lookup(field, value)?)
    }
}

fn to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => Value::from(f),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(bytes) => Value::String(hex::encode(bytes)),
    }
}

/// Accept `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}
