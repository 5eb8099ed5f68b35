use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use rusqlite::types::Value as EngineValue;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{OrmError, Result};
use crate::params::Params;
use crate::row::{Row, Rows};
use crate::schema::TableSchema;
use crate::session_log::SessionLog;
use crate::sql;
use crate::value::Value;

/// Where the session log goes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionLogSetting {
    /// `<root>/<name>.log`
    #[default]
    Default,
    Path(PathBuf),
    Disabled,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Logical name; the backing file is `<root>/<name>.db`
    pub name: String,
    /// Directory holding the backing file
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Let a later table registration replace an earlier one of the same name
    #[serde(default)]
    pub allow_overwrite_table: bool,
    #[serde(default)]
    pub session_log: SessionLogSetting,
}

impl DatabaseConfig {
    /// Create a config rooted at the current directory
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: default_root(),
            allow_overwrite_table: false,
            session_log: SessionLogSetting::Default,
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_overwrite_table(mut self, allow: bool) -> Self {
        self.allow_overwrite_table = allow;
        self
    }

    pub fn with_session_log(mut self, setting: SessionLogSetting) -> Self {
        self.session_log = setting;
        self
    }

    /// Absolute path of the backing file
    pub fn db_path(&self) -> Result<PathBuf> {
        let root = if self.root.is_absolute() {
            self.root.clone()
        } else {
            std::env::current_dir()?.join(&self.root)
        };
        Ok(root.join(format!("{}.db", self.name)))
    }

    fn log_path(&self) -> Option<PathBuf> {
        match &self.session_log {
            SessionLogSetting::Default => Some(self.root.join(format!("{}.log", self.name))),
            SessionLogSetting::Path(path) => Some(path.clone()),
            SessionLogSetting::Disabled => None,
        }
    }
}

/// Result rows of one statement, fetched up front and consumed once.
#[derive(Debug)]
pub struct Cursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl Cursor {
    fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new().into_iter(),
        }
    }

    /// Result column names, empty for statements that return no rows
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Iterator for Cursor {
    type Item = Vec<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// One SQLite file, the tables declared on it and its connection.
///
/// Writes are held in an open transaction until [`Database::commit`]; dropping
/// the database commits whatever is pending.
pub struct Database {
    name: String,
    path: PathBuf,
    allow_overwrite_table: bool,
    tables: Vec<Arc<TableSchema>>,
    existed_before_open: bool,
    session_start: DateTime<Local>,
    log: Option<SessionLog>,
    conn: Connection,
}

impl Database {
    /// Open or create the backing file described by `config`.
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        let path = config.db_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let existed_before_open = path.exists();
        let session_start = Local::now();

        let log = match config.log_path() {
            Some(log_path) => Some(SessionLog::start(&log_path, &path, session_start)?),
            None => None,
        };

        let conn = Connection::open(&path)?;

        info!(
            name = %config.name,
            path = %path.display(),
            existed = existed_before_open,
            "database opened"
        );

        Ok(Self {
            name: config.name,
            path,
            allow_overwrite_table: config.allow_overwrite_table,
            tables: Vec::new(),
            existed_before_open,
            session_start,
            log,
            conn,
        })
    }

    /// In-memory database with no session log.
    pub fn open_in_memory(name: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            name: name.into(),
            path: PathBuf::from(":memory:"),
            allow_overwrite_table: false,
            tables: Vec::new(),
            existed_before_open: false,
            session_start: Local::now(),
            log: None,
            conn,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file was already there when this handle opened it.
    /// Callers use this to decide whether to [`build`](Self::build).
    pub fn existed_before_open(&self) -> bool {
        self.existed_before_open
    }

    pub fn session_start(&self) -> DateTime<Local> {
        self.session_start
    }

    pub fn session_log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(SessionLog::path)
    }

    pub fn set_overwrite_table(&mut self, allow: bool) {
        self.allow_overwrite_table = allow;
    }

    /// Register a table schema, returning the shared handle rows refer to.
    pub fn register_table(&mut self, schema: TableSchema) -> Result<Arc<TableSchema>> {
        if schema.columns().is_empty() {
            return Err(OrmError::EmptyTable(schema.name().to_string()));
        }
        let schema = Arc::new(schema);
        match self.tables.iter().position(|t| t.name() == schema.name()) {
            Some(_) if !self.allow_overwrite_table => {
                return Err(OrmError::DuplicateTable(schema.name().to_string()));
            }
            Some(index) => self.tables[index] = Arc::clone(&schema),
            None => self.tables.push(Arc::clone(&schema)),
        }
        debug!(db = %self.name, table = schema.name(), "table registered");
        Ok(schema)
    }

    pub fn get_table(&self, name: &str) -> Option<Arc<TableSchema>> {
        self.tables.iter().find(|t| t.name() == name).cloned()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name() == name)
    }

    /// Fail unless `table` is the handle currently registered under its name.
    pub(crate) fn ensure_registered(&self, table: &Arc<TableSchema>) -> Result<()> {
        match self.tables.iter().find(|t| t.name() == table.name()) {
            Some(registered) if Arc::ptr_eq(registered, table) => Ok(()),
            _ => Err(OrmError::UnregisteredTable(table.name().to_string())),
        }
    }

    /// Registered tables in registration order
    pub fn tables(&self) -> &[Arc<TableSchema>] {
        &self.tables
    }

    /// Create every registered table, then commit.
    ///
    /// Not idempotent: on an existing file the first `CREATE TABLE` fails with
    /// an engine error. Check [`existed_before_open`](Self::existed_before_open) first.
    pub fn build(&self) -> Result<()> {
        for table in &self.tables {
            let query = sql::create_table(table.name(), table.columns())?;
            self.execute(&query)?;
        }
        self.commit()?;
        info!(db = %self.name, tables = self.tables.len(), "database built");
        Ok(())
    }

    /// Run one statement.
    ///
    /// Statements without result columns are writes: they open a transaction
    /// if none is pending and return an empty cursor.
    pub fn execute(&self, statement: &str) -> Result<Cursor> {
        debug!(db = %self.name, statement, "execute");
        if let Some(log) = &self.log {
            log.statement(statement);
        }

        let mut stmt = self.conn.prepare(statement)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        if columns.is_empty() {
            if self.conn.is_autocommit() {
                self.conn.execute_batch("BEGIN")?;
            }
            stmt.execute([])?;
            return Ok(Cursor::empty());
        }

        let mut rows = stmt.query([])?;
        let mut tuples = Vec::new();
        while let Some(row) = rows.next()? {
            let tuple = (0..columns.len())
                .map(|i| Value::from_engine(row.get::<_, EngineValue>(i)?))
                .collect::<Result<Vec<_>>>()?;
            tuples.push(tuple);
        }
        Ok(Cursor {
            columns,
            rows: tuples.into_iter(),
        })
    }

    /// Commit pending writes. A no-op when nothing is pending.
    pub fn commit(&self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
            debug!(db = %self.name, "committed");
        }
        Ok(())
    }

    /// Rowid of the most recent successful insert on this connection
    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Insert a fresh row. Same as [`Row::insert`].
    pub fn insert(&self, table: &Arc<TableSchema>, fields: Params) -> Result<Row> {
        Row::insert(self, table, fields)
    }

    /// Rows of `table` matching every filter whose name is a column.
    ///
    /// Filter names that are not columns are ignored (with a warning), so a
    /// misspelt key widens the query instead of failing it.
    pub fn find_all(&self, table: &Arc<TableSchema>, filters: Params) -> Result<Rows> {
        self.ensure_registered(table)?;
        let dropped: Vec<&str> = filters
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !table.has_column(name))
            .collect();
        if !dropped.is_empty() {
            warn!(table = table.name(), keys = ?dropped, "ignoring filter keys that are not columns");
        }

        let query = if dropped.len() == filters.len() {
            sql::select_all(table.name())
        } else {
            sql::select_where(table.name(), &filters, table.columns())?
        };
        let cursor = self.execute(&query)?;
        Ok(Rows::new(Arc::clone(table), cursor))
    }

    /// Commit and close.
    pub fn close(self) -> Result<()> {
        self.commit()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(err) = self.commit() {
            warn!(db = %self.name, error = %err, "commit on close failed");
        }
    }
}
