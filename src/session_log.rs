//! Plaintext, append-only log of sessions and executed statements.

use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::warn;

use crate::error::Result;

pub(crate) struct SessionLog {
    path: PathBuf,
    file: RefCell<File>,
}

impl SessionLog {
    /// Open (or create) the log and write the session-start marker.
    ///
    /// A new file starts with a header naming the database it belongs to.
    pub(crate) fn start(path: &Path, database: &Path, started: DateTime<Local>) -> Result<Self> {
        let fresh = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if fresh {
            writeln!(file, "database log for : {}", database.display())?;
        }
        writeln!(file, "LOG : new session starting at {}", started.to_rfc3339())?;
        Ok(Self {
            path: path.to_path_buf(),
            file: RefCell::new(file),
        })
    }

    /// Append one statement. Failures are reported, never propagated.
    pub(crate) fn statement(&self, statement: &str) {
        let mut file = self.file.borrow_mut();
        if let Err(err) = writeln!(file, "SQL : {}", statement) {
            warn!(path = %self.path.display(), error = %err, "failed to append to session log");
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}
