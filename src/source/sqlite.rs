//! SQLite query executor.
//!
//! `rusqlite` statements borrow their connection, so the statement is drained
//! into a [`MemoryCursor`] before it is handed out. A fetch error part-way
//! through is returned at the position it happened.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::types::ValueRef;
use tracing::debug;

use super::{ColumnMeta, MemoryCursor, QueryError, QueryExecutor, RowCursor, SqlType, SqlValue};

/// Executes queries against one SQLite connection.
pub struct SqliteExecutor {
    conn: Connection,
    target: String,
}

impl SqliteExecutor {
    /// Open (or create) a database file.
    pub fn open(path: &Path) -> Result<Self, QueryError> {
        let conn = Connection::open(path).map_err(|e| QueryError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| QueryError::Open {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            conn,
            target: path.display().to_string(),
        })
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> Result<Self, QueryError> {
        let conn = Connection::open_in_memory().map_err(|e| QueryError::Open {
            path: ":memory:".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            conn,
            target: ":memory:".to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl QueryExecutor for SqliteExecutor {
    fn execute(&mut self, sql: &str) -> Result<Box<dyn RowCursor>, QueryError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| QueryError::Prepare(e.to_string()))?;

        let declared: Vec<(String, Option<SqlType>)> = stmt
            .columns()
            .iter()
            .map(|col| {
                (
                    col.name().to_string(),
                    col.decl_type().map(SqlType::from_decl_type),
                )
            })
            .collect();
        let width = declared.len();

        let mut rows = VecDeque::new();
        let mut failure = None;
        let mut cursor = stmt
            .query([])
            .map_err(|e| QueryError::Prepare(e.to_string()))?;
        loop {
            match cursor.next() {
                Ok(Some(row)) => {
                    let mut values = Vec::with_capacity(width);
                    for idx in 0..width {
                        match row.get_ref(idx) {
                            Ok(value) => values.push(to_sql_value(value)),
                            Err(e) => {
                                failure = Some(QueryError::Fetch(e.to_string()));
                                break;
                            }
                        }
                    }
                    if failure.is_some() {
                        break;
                    }
                    rows.push_back(values);
                }
                Ok(None) => break,
                Err(e) => {
                    failure = Some(QueryError::Fetch(e.to_string()));
                    break;
                }
            }
        }

        let columns = declared
            .into_iter()
            .enumerate()
            .map(|(idx, (name, decl))| {
                let sql_type = decl.unwrap_or_else(|| infer_type(&rows, idx));
                ColumnMeta::new(name, sql_type)
            })
            .collect();

        debug!(rows = rows.len(), columns = width, "sqlite statement drained");
        let cursor = MemoryCursor::new(columns, rows.into());
        Ok(Box::new(match failure {
            Some(err) => cursor.failing_after(err),
            None => cursor,
        }))
    }

    fn describe(&self) -> String {
        self.target.clone()
    }
}

/// Expression columns carry no declared type; use the first non-null value.
fn infer_type(rows: &VecDeque<Vec<SqlValue>>, idx: usize) -> SqlType {
    rows.iter()
        .filter_map(|row| row.get(idx))
        .find(|value| !matches!(value, SqlValue::Null))
        .map(SqlType::from_value)
        .unwrap_or(SqlType::Null)
}

fn to_sql_value(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(f) => SqlValue::Real(f),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    }
}
