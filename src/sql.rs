//! Statement text for CREATE TABLE, SELECT and INSERT.
//!
//! Builders here are pure: they trust the schema and values they are handed
//! (identifiers already validated, row values already type checked) and only
//! concern themselves with producing well-formed SQLite text.

use crate::error::{OrmError, Result};
use crate::params::Params;
use crate::schema::Column;
use crate::value::{type_to_sql, value_to_sql, Value};

fn column_definition(column: &Column) -> Result<String> {
    let mut args = vec![
        column.name().to_string(),
        type_to_sql(column.column_type()).to_string(),
    ];
    if !column.is_optional() {
        args.push("NOT NULL".to_string());
    }
    if column.is_unique() {
        args.push("UNIQUE".to_string());
    }
    if let Some(default) = column.default() {
        args.push("DEFAULT".to_string());
        args.push(value_to_sql(default)?);
    }
    if column.is_primary_key() {
        args.push("PRIMARY KEY".to_string());
    }
    if column.is_autoincrement() {
        args.push("AUTOINCREMENT".to_string());
    }
    Ok(args.join(" "))
}

/// `CREATE TABLE <name> ( <column>, ... )`
pub fn create_table(table_name: &str, columns: &[Column]) -> Result<String> {
    if columns.is_empty() {
        return Err(OrmError::EmptyTable(table_name.to_string()));
    }
    let definitions = columns
        .iter()
        .map(column_definition)
        .collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "CREATE TABLE {} ( {} )",
        table_name,
        definitions.join(", ")
    ))
}

/// `SELECT * FROM <name>`
pub fn select_all(table_name: &str) -> String {
    format!("SELECT * FROM {}", table_name)
}

/// `SELECT * FROM <name> WHERE <c1>=<v1> AND ...`
///
/// Conditions on names that are not in `known_columns` are dropped without
/// error. Null compares with `IS NULL`. Fails with
/// [`OrmError::EmptyFilter`] when nothing is left to filter on; callers with
/// no filters should use [`select_all`].
pub fn select_where(table_name: &str, filters: &Params, known_columns: &[Column]) -> Result<String> {
    let conditions = filters
        .iter()
        .filter(|(name, _)| known_columns.iter().any(|c| c.name() == *name))
        .map(|(name, value)| -> Result<String> {
            match value {
                Value::Null => Ok(format!("{} IS NULL", name)),
                other => Ok(format!("{}={}", name, value_to_sql(other)?)),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    if conditions.is_empty() {
        return Err(OrmError::EmptyFilter(table_name.to_string()));
    }
    Ok(format!(
        "{} WHERE {}",
        select_all(table_name),
        conditions.join(" AND ")
    ))
}

/// `INSERT INTO <name> ( k1, ... ) VALUES ( v1, ... )`
pub fn insert_into(table_name: &str, keys: &[&str], values: &[Value]) -> Result<String> {
    if keys.len() != values.len() {
        return Err(OrmError::row_shape(table_name, keys.len(), values.len()));
    }
    let literals = values.iter().map(value_to_sql).collect::<Result<Vec<_>>>()?;
    Ok(format!(
        "INSERT INTO {} ( {} ) VALUES ( {} )",
        table_name,
        keys.join(", "),
        literals.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ColumnType;

    fn user_columns() -> Vec<Column> {
        vec![
            Column::builder("id", ColumnType::Integer)
                .primary_key()
                .build()
                .unwrap(),
            Column::builder("name", ColumnType::Text).unique().build().unwrap(),
        ]
    }

    #[test]
    fn test_create_table_clause_order() {
        let sql = create_table("User", &user_columns()).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE User ( id INTEGER NOT NULL PRIMARY KEY, name TEXT NOT NULL UNIQUE )"
        );
    }

    #[test]
    fn test_create_table_all_clauses() {
        let columns = vec![
            Column::builder("uid", ColumnType::Integer)
                .unique()
                .primary_key()
                .autoincrement()
                .build()
                .unwrap(),
            Column::builder("active", ColumnType::Boolean)
                .optional()
                .default(false)
                .build()
                .unwrap(),
            Column::builder("motto", ColumnType::Text)
                .default("don't panic")
                .build()
                .unwrap(),
        ];
        let sql = create_table("Account", &columns).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE Account ( \
             uid INTEGER NOT NULL UNIQUE PRIMARY KEY AUTOINCREMENT, \
             active BOOLEAN DEFAULT FALSE, \
             motto TEXT NOT NULL DEFAULT 'don''t panic' )"
        );
    }

    #[test]
    fn test_create_table_without_columns() {
        assert!(matches!(
            create_table("Empty", &[]),
            Err(OrmError::EmptyTable(_))
        ));
    }

    #[test]
    fn test_select_statements() {
        assert_eq!(select_all("User"), "SELECT * FROM User");

        let filters = Params::new()
            .with_value("name", "admin")
            .with_value("id", 3);
        let sql = select_where("User", &filters, &user_columns()).unwrap();
        assert_eq!(sql, "SELECT * FROM User WHERE name='admin' AND id=3");
    }

    #[test]
    fn test_select_where_drops_unknown_keys() {
        let filters = Params::new()
            .with_value("nickname", "root")
            .with_value("name", "admin");
        let sql = select_where("User", &filters, &user_columns()).unwrap();
        assert_eq!(sql, "SELECT * FROM User WHERE name='admin'");

        let only_unknown = Params::new().with_value("nickname", "root");
        assert!(matches!(
            select_where("User", &only_unknown, &user_columns()),
            Err(OrmError::EmptyFilter(_))
        ));
        assert!(select_where("User", &Params::new(), &user_columns()).is_err());
    }

    #[test]
    fn test_select_where_null() {
        let filters = Params::new().with_value("name", Value::Null);
        let sql = select_where("User", &filters, &user_columns()).unwrap();
        assert_eq!(sql, "SELECT * FROM User WHERE name IS NULL");
    }

    #[test]
    fn test_insert_into() {
        let sql = insert_into(
            "User",
            &["id", "name", "pass"],
            &[Value::Null, "admin".into(), "o'brien".into()],
        )
        .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO User ( id, name, pass ) VALUES ( NULL, 'admin', 'o''brien' )"
        );

        let err = insert_into("User", &["id", "name"], &[Value::Null]).unwrap_err();
        assert!(matches!(
            err,
            OrmError::RowShapeMismatch { expected: 2, found: 1, .. }
        ));
    }
}
