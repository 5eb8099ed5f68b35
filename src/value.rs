//! Scalar values, column types and their SQL literal form.
//!
//! Everything that crosses into statement text goes through [`value_to_sql`]
//! and [`type_to_sql`]; everything read back from SQLite goes through
//! [`Value::from_engine`] and [`Value::conform`].

use std::fmt;
use std::str::FromStr;

use rusqlite::types::Value as EngineValue;
use serde::{Deserialize, Serialize};

use crate::error::{OrmError, Result};

/// Core value types for row fields, defaults and filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
}

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Boolean,
    Integer,
    Decimal,
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = OrmError;

    /// Accepts both the SQL keyword and the lowercase name, in any case.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BOOLEAN" => Ok(Self::Boolean),
            "INTEGER" => Ok(Self::Integer),
            "DECIMAL" => Ok(Self::Decimal),
            "TEXT" => Ok(Self::Text),
            other => Err(OrmError::unsupported(format!("column type `{other}`"))),
        }
    }
}

/// SQL keyword for a column type.
pub fn type_to_sql(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Boolean => "BOOLEAN",
        ColumnType::Integer => "INTEGER",
        ColumnType::Decimal => "DECIMAL",
        ColumnType::Text => "TEXT",
    }
}

/// SQL literal for a value.
///
/// Text is wrapped in single quotes with every embedded quote doubled, which
/// is the only escape SQLite's tokenizer recognises inside a string literal.
/// Decimals are written with 17 significant digits in exponent form; SQLite
/// reads the shortest round-trip form back one ULP off for some values.
/// Values that have no exact literal form (NaN, infinities, text containing
/// NUL) are rejected rather than truncated.
pub fn value_to_sql(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Boolean(true) => Ok("TRUE".to_string()),
        Value::Boolean(false) => Ok("FALSE".to_string()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Decimal(d) if d.is_finite() => Ok(format!("{d:.16e}")),
        Value::Decimal(d) => Err(OrmError::unsupported(format!("non-finite decimal {d}"))),
        Value::Text(s) if s.contains('\0') => {
            Err(OrmError::unsupported("text containing a NUL character"))
        }
        Value::Text(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
    }
}

impl Value {
    /// The column type this value belongs to, `None` for null.
    pub fn kind(&self) -> Option<ColumnType> {
        match self {
            Self::Null => None,
            Self::Boolean(_) => Some(ColumnType::Boolean),
            Self::Integer(_) => Some(ColumnType::Integer),
            Self::Decimal(_) => Some(ColumnType::Decimal),
            Self::Text(_) => Some(ColumnType::Text),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().map_or("null", |kind| kind.as_str())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert a scalar returned by SQLite.
    pub fn from_engine(value: EngineValue) -> Result<Self> {
        match value {
            EngineValue::Null => Ok(Self::Null),
            EngineValue::Integer(i) => Ok(Self::Integer(i)),
            EngineValue::Real(r) => Ok(Self::Decimal(r)),
            EngineValue::Text(s) => Ok(Self::Text(s)),
            EngineValue::Blob(_) => Err(OrmError::unsupported("blob")),
        }
    }

    /// Fit this value to a declared column type.
    ///
    /// SQLite stores BOOLEAN as 0/1 and whole DECIMAL values as integers, so
    /// those two widenings are accepted. Null fits every type; nullability is
    /// checked by the row, not here.
    pub fn conform(self, column: &str, column_type: ColumnType) -> Result<Self> {
        match (column_type, self) {
            (_, Self::Null) => Ok(Self::Null),
            (ColumnType::Boolean, v @ Self::Boolean(_)) => Ok(v),
            (ColumnType::Boolean, Self::Integer(i)) if i == 0 || i == 1 => {
                Ok(Self::Boolean(i == 1))
            }
            (ColumnType::Integer, v @ Self::Integer(_)) => Ok(v),
            (ColumnType::Decimal, v @ Self::Decimal(_)) => Ok(v),
            (ColumnType::Decimal, Self::Integer(i)) => Ok(Self::Decimal(i as f64)),
            (ColumnType::Text, v @ Self::Text(_)) => Ok(v),
            (expected, other) => Err(OrmError::ValueTypeMismatch {
                column: column.to_string(),
                expected,
                found: other.type_name(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d:?}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Typed extraction from a [`Value`]
pub trait FromValue: Sized {
    /// Type reported when extraction fails.
    const EXPECTED: ColumnType;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    const EXPECTED: ColumnType = ColumnType::Boolean;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: ColumnType = ColumnType::Integer;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: ColumnType = ColumnType::Decimal;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: ColumnType = ColumnType::Text;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: ColumnType = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_keywords() {
        assert_eq!(type_to_sql(ColumnType::Boolean), "BOOLEAN");
        assert_eq!(type_to_sql(ColumnType::Integer), "INTEGER");
        assert_eq!(type_to_sql(ColumnType::Decimal), "DECIMAL");
        assert_eq!(type_to_sql(ColumnType::Text), "TEXT");
        assert_eq!("text".parse::<ColumnType>().unwrap(), ColumnType::Text);
        assert!(matches!(
            "BLOB".parse::<ColumnType>(),
            Err(OrmError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_scalar_literals() {
        assert_eq!(value_to_sql(&Value::Null).unwrap(), "NULL");
        assert_eq!(value_to_sql(&true.into()).unwrap(), "TRUE");
        assert_eq!(value_to_sql(&false.into()).unwrap(), "FALSE");
        assert_eq!(value_to_sql(&(-42i64).into()).unwrap(), "-42");
        assert_eq!(value_to_sql(&2.0.into()).unwrap(), "2.0000000000000000e0");
        assert_eq!(value_to_sql(&(-0.5).into()).unwrap(), "-5.0000000000000000e-1");
    }

    #[test]
    fn test_decimal_literals_keep_every_bit() {
        for d in [
            0.1,
            2.033473006846143e234,
            -3.444418313650998e-109,
            f64::MAX,
            f64::MIN_POSITIVE,
            -1.0 / 3.0,
        ] {
            let literal = value_to_sql(&d.into()).unwrap();
            assert_eq!(literal.parse::<f64>().unwrap().to_bits(), d.to_bits(), "{literal}");
        }
    }

    #[test]
    fn test_text_quotes_are_doubled() {
        let literal = value_to_sql(&"x'); DROP TABLE User; --".into()).unwrap();
        assert_eq!(literal, "'x''); DROP TABLE User; --'");
        assert_eq!(value_to_sql(&"it's".into()).unwrap(), "'it''s'");
    }

    #[test]
    fn test_unencodable_values_are_rejected() {
        assert!(matches!(
            value_to_sql(&f64::NAN.into()),
            Err(OrmError::UnsupportedType(_))
        ));
        assert!(matches!(
            value_to_sql(&f64::INFINITY.into()),
            Err(OrmError::UnsupportedType(_))
        ));
        assert!(matches!(
            value_to_sql(&"a\0b".into()),
            Err(OrmError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_conform_engine_storage_classes() {
        let b = Value::Integer(1).conform("flag", ColumnType::Boolean).unwrap();
        assert_eq!(b, Value::Boolean(true));
        let d = Value::Integer(3).conform("price", ColumnType::Decimal).unwrap();
        assert_eq!(d, Value::Decimal(3.0));
        let n = Value::Null.conform("name", ColumnType::Text).unwrap();
        assert!(n.is_null());

        let err = Value::Text("1".into())
            .conform("id", ColumnType::Integer)
            .unwrap_err();
        assert!(matches!(
            err,
            OrmError::ValueTypeMismatch { expected: ColumnType::Integer, found: "text", .. }
        ));
        assert!(Value::Integer(7).conform("flag", ColumnType::Boolean).is_err());
    }

    #[test]
    fn test_from_engine_rejects_blob() {
        assert_eq!(
            Value::from_engine(EngineValue::Real(1.5)).unwrap(),
            Value::Decimal(1.5)
        );
        assert!(matches!(
            Value::from_engine(EngineValue::Blob(vec![1, 2])),
            Err(OrmError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_typed_extraction() {
        assert_eq!(i64::from_value(&Value::Integer(5)), Some(5));
        assert_eq!(String::from_value(&Value::Integer(5)), None);
        assert_eq!(Option::<bool>::from_value(&Value::Null), Some(None));
        assert_eq!(Option::<f64>::from_value(&Value::Decimal(0.5)), Some(Some(0.5)));
    }
}
