//! Typed table schemas and row mapping over SQLite for the Runar ecosystem.
//!
//! # Intention
//!
//! - Declare tables as ordered, typed columns and have SQLite create them.
//! - Read and write rows as values without hand-written SQL.
//! - Keep all SQL text generation in one pure module, with every literal
//!   escaped before it reaches the engine.
//!
//! # Architectural Boundaries
//!
//! - Only schema, row and statement code belongs here.
//! - SQLite itself is an opaque connection: statements in, scalar tuples out.
//! - No joins, migrations, secondary indexes or multi-process coordination.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rust_sqlite_orm::{Column, ColumnType, Database, DatabaseConfig, Params, TableSchema};
//!
//! # fn main() -> rust_sqlite_orm::Result<()> {
//! let mut db = Database::open(DatabaseConfig::new("example"))?;
//! let users = db.register_table(
//!     TableSchema::new("User")?
//!         .with_column(
//!             Column::builder("id", ColumnType::Integer)
//!                 .unique()
//!                 .primary_key()
//!                 .autoincrement()
//!                 .build()?,
//!         )?
//!         .with_column(Column::builder("name", ColumnType::Text).unique().build()?)?,
//! )?;
//!
//! if !db.existed_before_open() {
//!     db.build()?;
//!     db.insert(&users, Params::new().with_value("name", "admin"))?;
//!     db.commit()?;
//! }
//!
//! for user in db.find_all(&users, Params::new())? {
//!     println!("{}", user?);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod params;
mod row;
mod schema;
mod session_log;
pub mod sql;
mod sqlite;
mod value;

pub use error::{OrmError, Result};
pub use params::Params;
pub use row::{Row, Rows};
pub use schema::{Column, ColumnBuilder, TableSchema};
pub use sqlite::{Cursor, Database, DatabaseConfig, SessionLogSetting};
pub use value::{type_to_sql, value_to_sql, ColumnType, FromValue, Value};
