//! Column definitions and table schemas.

use crate::error::{OrmError, Result};
use crate::value::{ColumnType, Value};

/// SQLite keywords, plus the TRUE/FALSE literals. None of these may be used
/// as an unquoted table or column name.
const RESERVED_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FALSE", "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED",
    "GLOB", "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "TRUE",
    "UNBOUNDED", "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL",
    "WHEN", "WHERE", "WINDOW", "WITH", "WITHOUT",
];

/// Check that a table or column name can be emitted unquoted.
pub(crate) fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    let reserved = RESERVED_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(name));
    if valid && !reserved {
        Ok(())
    } else {
        Err(OrmError::InvalidIdentifier(name.to_string()))
    }
}

/// One typed column of a table. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    optional: bool,
    unique: bool,
    default: Option<Value>,
    primary_key: bool,
    autoincrement: bool,
}

impl Column {
    pub fn builder(name: impl Into<String>, column_type: ColumnType) -> ColumnBuilder {
        ColumnBuilder {
            column: Column {
                name: name.into(),
                column_type,
                optional: false,
                unique: false,
                default: None,
                primary_key: false,
                autoincrement: false,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_autoincrement(&self) -> bool {
        self.autoincrement
    }

    /// SQLite assigns the value itself when NULL is inserted.
    pub fn is_engine_assigned(&self) -> bool {
        self.autoincrement || (self.primary_key && self.column_type == ColumnType::Integer)
    }

    /// A fresh row must supply a value for this column.
    pub fn is_required(&self) -> bool {
        !self.optional && self.default.is_none() && !self.is_engine_assigned()
    }
}

/// Builder for [`Column`]
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    column: Column,
}

impl ColumnBuilder {
    /// Allow NULL (drops the `NOT NULL` clause).
    pub fn optional(mut self) -> Self {
        self.column.optional = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.column.unique = true;
        self
    }

    /// A `Value::Null` default is the same as no default.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.column.default = (!value.is_null()).then_some(value);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.column.primary_key = true;
        self
    }

    pub fn autoincrement(mut self) -> Self {
        self.column.autoincrement = true;
        self
    }

    pub fn build(self) -> Result<Column> {
        let column = self.column;
        validate_identifier(&column.name)?;
        if let Some(default) = &column.default {
            if default.kind() != Some(column.column_type) {
                return Err(OrmError::DefaultTypeMismatch {
                    column: column.name.clone(),
                    expected: column.column_type,
                    found: default.type_name(),
                });
            }
        }
        Ok(column)
    }
}

/// Ordered columns of one table
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
    allow_overwrite_column: bool,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;
        Ok(Self {
            name,
            columns: Vec::new(),
            allow_overwrite_column: false,
        })
    }

    /// Let a later column replace an earlier one of the same name, in place.
    pub fn allow_overwrite_column(mut self, allow: bool) -> Self {
        self.allow_overwrite_column = allow;
        self
    }

    /// Chaining form of [`TableSchema::attach_column`].
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        self.attach_column(column)?;
        Ok(self)
    }

    pub fn attach_column(&mut self, column: Column) -> Result<()> {
        match self.column_index(column.name()) {
            Some(_) if !self.allow_overwrite_column => Err(OrmError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            }),
            Some(index) => {
                self.columns[index] = column;
                Ok(())
            }
            None => {
                self.columns.push(column);
                Ok(())
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn overwrites_columns(&self) -> bool {
        self.allow_overwrite_column
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
