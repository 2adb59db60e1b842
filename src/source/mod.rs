//! Query execution interface.
//!
//! The viewer never talks to a database directly. It asks a [`QueryExecutor`]
//! for a [`RowCursor`], reads the column metadata once, and then pulls rows
//! until the cursor is exhausted or fails.
//!
//! - [`sqlite`]: the `rusqlite`-backed executor used by the binary

pub mod sqlite;

use thiserror::Error;

pub use sqlite::SqliteExecutor;

/// Errors surfaced by a query executor.
///
/// The message is shown to the user as a single line, so variants carry the
/// driver text verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("{0}")]
    Prepare(String),

    #[error("{0}")]
    Fetch(String),

    #[error("Could not open database {path}: {message}")]
    Open { path: String, message: String },
}

/// Driver-reported column type.
///
/// Mirrors the usual SQL type-code families so the classifier can be a fixed
/// table. `Other` keeps the declared name for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    Bit,
    Boolean,
    Binary,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Numeric,
    Real,
    Char,
    NChar,
    VarChar,
    NVarChar,
    LongVarChar,
    LongNVarChar,
    Date,
    Time,
    Timestamp,
    Blob,
    Null,
    Other(String),
}

impl SqlType {
    /// Map a declared column type (as SQLite reports it) onto a type code.
    ///
    /// The size suffix is ignored (`VARCHAR(32)` is `VarChar`) and matching is
    /// case-insensitive.
    pub fn from_decl_type(decl: &str) -> Self {
        let base = decl.split('(').next().unwrap_or(decl).trim();
        let upper = base.to_ascii_uppercase();
        match upper.as_str() {
            "BIT" => Self::Bit,
            "BOOL" | "BOOLEAN" => Self::Boolean,
            "BINARY" => Self::Binary,
            "TINYINT" => Self::TinyInt,
            "SMALLINT" | "INT2" => Self::SmallInt,
            "INT" | "INTEGER" | "MEDIUMINT" => Self::Integer,
            "BIGINT" | "INT8" | "UNSIGNED BIG INT" => Self::BigInt,
            "FLOAT" => Self::Float,
            "DOUBLE" | "DOUBLE PRECISION" => Self::Double,
            "DECIMAL" => Self::Decimal,
            "NUMERIC" => Self::Numeric,
            "REAL" => Self::Real,
            "CHAR" | "CHARACTER" => Self::Char,
            "NCHAR" | "NATIVE CHARACTER" => Self::NChar,
            "VARCHAR" | "VARYING CHARACTER" => Self::VarChar,
            "NVARCHAR" => Self::NVarChar,
            "TEXT" | "CLOB" | "LONGVARCHAR" => Self::LongVarChar,
            "LONGNVARCHAR" => Self::LongNVarChar,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "DATETIME" | "TIMESTAMP" => Self::Timestamp,
            "BLOB" => Self::Blob,
            "" => Self::Null,
            _ => Self::Other(base.to_string()),
        }
    }

    /// Type code implied by a runtime value, for columns without a declared type.
    pub fn from_value(value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => Self::Null,
            SqlValue::Integer(_) => Self::BigInt,
            SqlValue::Real(_) => Self::Double,
            SqlValue::Text(_) => Self::VarChar,
            SqlValue::Blob(_) => Self::Blob,
        }
    }
}

/// A raw value as produced by the driver, before coercion to a column kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// Metadata for one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub sql_type: SqlType,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// Forward-only cursor over a query result.
pub trait RowCursor {
    /// Column metadata, in result order.
    fn columns(&self) -> &[ColumnMeta];

    /// Next row, `Ok(None)` once exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<SqlValue>>, QueryError>;
}

/// Runs a query string and hands back a cursor over its rows.
pub trait QueryExecutor {
    fn execute(&mut self, sql: &str) -> Result<Box<dyn RowCursor>, QueryError>;

    /// Human-readable description of the connection target.
    fn describe(&self) -> String {
        String::from("database")
    }
}

/// Cursor over rows already held in memory.
///
/// An optional error is returned after the last row, which lets callers
/// simulate a fetch failure part-way through a result.
#[derive(Debug, Clone)]
pub struct MemoryCursor {
    columns: Vec<ColumnMeta>,
    rows: std::collections::VecDeque<Vec<SqlValue>>,
    failure: Option<QueryError>,
}

impl MemoryCursor {
    pub fn new(columns: Vec<ColumnMeta>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
            failure: None,
        }
    }

    /// Fail with `err` once the buffered rows are consumed.
    pub fn failing_after(mut self, err: QueryError) -> Self {
        self.failure = Some(err);
        self
    }
}

impl RowCursor for MemoryCursor {
    fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<SqlValue>>, QueryError> {
        if let Some(row) = self.rows.pop_front() {
            return Ok(Some(row));
        }
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(None),
        }
    }
}
