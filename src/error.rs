//! Error types for the mapping layer.

use thiserror::Error;

use crate::value::ColumnType;

/// Mapping layer result type.
pub type Result<T> = std::result::Result<T, OrmError>;

/// Errors raised while declaring schemas, building rows or talking to SQLite.
///
/// Every variant is fatal at the point it is raised; nothing in this crate
/// retries or compensates.
#[derive(Error, Debug)]
pub enum OrmError {
    /// A table of that name is already registered and overwrite is disabled
    #[error("table `{0}` is already registered")]
    DuplicateTable(String),

    /// A column of that name is already attached and overwrite is disabled
    #[error("column `{column}` already exists in table `{table}`")]
    DuplicateColumn { table: String, column: String },

    /// A value or type keyword outside boolean/integer/decimal/text
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Declared default disagrees with the column type
    #[error("default for column `{column}` is {found}, expected {expected}")]
    DefaultTypeMismatch {
        column: String,
        expected: ColumnType,
        found: &'static str,
    },

    /// Row construction received names that are not columns of the table
    #[error("unknown field(s) for table `{table}`: {}", fields.join(", "))]
    UnknownField { table: String, fields: Vec<String> },

    /// The same field was given more than once
    #[error("field `{field}` given more than once for table `{table}`")]
    DuplicateField { table: String, field: String },

    /// A required column was left without a value
    #[error("missing required field `{column}` for table `{table}`")]
    MissingField { table: String, column: String },

    /// A row value does not fit the declared column type
    #[error("value for column `{column}` is {found}, expected {expected}")]
    ValueTypeMismatch {
        column: String,
        expected: ColumnType,
        found: &'static str,
    },

    /// Table and column names are emitted unquoted, so they must be plain identifiers
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// No filter condition names a known column
    #[error("no usable filter condition for table `{0}`")]
    EmptyFilter(String),

    /// The schema handle is not the one currently registered under its name
    #[error("table `{0}` is not registered on this database")]
    UnregisteredTable(String),

    /// A table without columns cannot be created
    #[error("table `{0}` has no columns")]
    EmptyTable(String),

    /// A value tuple does not line up with the table's columns
    #[error("table `{table}` has {expected} columns, got {found} values")]
    RowShapeMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    /// SQLite error (malformed statement, constraint violation, locking, ...)
    #[error("engine error: {0}")]
    Engine(#[from] rusqlite::Error),

    /// IO error (database directory, session log)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrmError {
    /// Create an unsupported type error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    /// Create an unknown field error for a single name.
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            table: table.into(),
            fields: vec![field.into()],
        }
    }

    /// Create a row shape error.
    pub fn row_shape(table: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::RowShapeMismatch {
            table: table.into(),
            expected,
            found,
        }
    }
}
