//! Rows as values of a declared table.
//!
//! A [`Row`] is either created fresh with [`Row::insert`], which writes it to
//! the database, or rebuilt from a query result with [`Row::from_tuple`],
//! which does not. Column values are reached by name through [`Row::get`] and
//! friends; the table the row belongs to is reached through [`Row::table`].
//! The two never overlap, so any valid identifier can be a column name.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{OrmError, Result};
use crate::params::Params;
use crate::schema::{Column, TableSchema};
use crate::sql;
use crate::sqlite::{Cursor, Database};
use crate::value::{ColumnType, FromValue, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    table: Arc<TableSchema>,
    // aligned with table.columns()
    values: Vec<Value>,
}

impl Row {
    /// Build a row from named fields and insert it.
    ///
    /// Nothing is written unless `table` is the handle registered on `db`,
    /// every field names a column exactly once, every value fits
    /// its column type and every required column has a value. A column left
    /// unset takes its declared default. An integer primary key left for
    /// SQLite to assign is read back after the insert.
    pub fn insert(db: &Database, table: &Arc<TableSchema>, fields: Params) -> Result<Row> {
        db.ensure_registered(table)?;
        let mut row = Self::from_fields(Arc::clone(table), fields)?;

        let query = sql::insert_into(table.name(), &table.column_names(), &row.values)?;
        db.execute(&query)?;

        let assigned_key = table
            .columns()
            .iter()
            .position(|c| c.is_primary_key() && c.column_type() == ColumnType::Integer);
        if let Some(index) = assigned_key {
            if row.values[index].is_null() {
                row.values[index] = Value::Integer(db.last_insert_rowid());
            }
        }
        Ok(row)
    }

    /// Rebuild a row from a result tuple in column order. Nothing is written.
    pub fn from_tuple(table: Arc<TableSchema>, values: Vec<Value>) -> Result<Row> {
        let expected = table.columns().len();
        if values.len() != expected {
            return Err(OrmError::row_shape(table.name(), expected, values.len()));
        }
        let values = table
            .columns()
            .iter()
            .zip(values)
            .map(|(column, value)| value.conform(column.name(), column.column_type()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { table, values })
    }

    fn from_fields(table: Arc<TableSchema>, fields: Params) -> Result<Row> {
        let mut slots: Vec<Option<Value>> = vec![None; table.columns().len()];
        let mut unknown = Vec::new();
        for (name, value) in fields {
            match table.column_index(&name) {
                Some(index) if slots[index].is_some() => {
                    return Err(OrmError::DuplicateField {
                        table: table.name().to_string(),
                        field: name,
                    });
                }
                Some(index) => slots[index] = Some(value),
                None => unknown.push(name),
            }
        }
        if !unknown.is_empty() {
            return Err(OrmError::UnknownField {
                table: table.name().to_string(),
                fields: unknown,
            });
        }

        let values = table
            .columns()
            .iter()
            .zip(slots)
            .map(|(column, slot)| -> Result<Value> {
                let value = match slot {
                    Some(value) => value.conform(column.name(), column.column_type())?,
                    None => column.default().cloned().unwrap_or(Value::Null),
                };
                let value = match (value, column.default()) {
                    (Value::Null, Some(default)) if !column.is_optional() => default.clone(),
                    (value, _) => value,
                };
                check_nullability(&table, column, &value)?;
                Ok(value)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { table, values })
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        let index = self.index_of(name)?;
        Ok(&self.values[index])
    }

    /// Typed read of one column.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get(name)?;
        T::from_value(value).ok_or_else(|| OrmError::ValueTypeMismatch {
            column: name.to_string(),
            expected: T::EXPECTED,
            found: value.type_name(),
        })
    }

    /// Change one column value in memory. The database is not touched.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index_of(name)?;
        let column = &self.table.columns()[index];
        let value = value.into().conform(column.name(), column.column_type())?;
        check_nullability(&self.table, column, &value)?;
        self.values[index] = value;
        Ok(())
    }

    /// Column names and values in column order
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.table
            .columns()
            .iter()
            .map(Column::name)
            .zip(self.values.iter())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn table(&self) -> &Arc<TableSchema> {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub fn columns(&self) -> &[Column] {
        self.table.columns()
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.table
            .column_index(name)
            .ok_or_else(|| OrmError::unknown_field(self.table.name(), name))
    }
}

fn check_nullability(table: &TableSchema, column: &Column, value: &Value) -> Result<()> {
    if value.is_null() && column.is_required() {
        return Err(OrmError::MissingField {
            table: table.name().to_string(),
            column: column.name().to_string(),
        });
    }
    Ok(())
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.table.name())?;
        for (i, (name, value)) in self.values().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.values() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Rows returned by [`Database::find_all`], rebuilt one at a time.
#[derive(Debug)]
pub struct Rows {
    table: Arc<TableSchema>,
    cursor: Cursor,
}

impl Rows {
    pub(crate) fn new(table: Arc<TableSchema>, cursor: Cursor) -> Self {
        Self { table, cursor }
    }
}

impl Iterator for Rows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor
            .next()
            .map(|values| Row::from_tuple(Arc::clone(&self.table), values))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cursor.size_hint()
    }
}
