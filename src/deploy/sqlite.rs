use super::error::format_sql_error;
use super::SqlExecutor;
use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Applies migrations to a local SQLite file
pub struct SqliteExecutor {
    conn: Connection,
    path: PathBuf,
}

impl SqliteExecutor {
    /// Open (or create) the database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;

        let conn = Connection::open_with_flags(path, flags)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        conn.execute("PRAGMA foreign_keys = ON", [])
            .context("Failed to enable foreign keys")?;

        conn.busy_timeout(std::time::Duration::from_secs(5))
            .context("Failed to set busy timeout")?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }
}

impl SqlExecutor for SqliteExecutor {
    fn describe(&self) -> String {
        format!("SQLite database {}", self.path.display())
    }

    fn execute(&mut self, statement: &str) -> Result<()> {
        self.conn
            .execute_batch(statement)
            .map_err(|e| anyhow::anyhow!("{}", format_sql_error(&e, statement)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_file_and_runs_ddl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.db");

        let mut executor = SqliteExecutor::open(&path).unwrap();
        executor
            .execute("-- Create posts table\nCREATE TABLE posts (\n  id INTEGER PRIMARY KEY AUTOINCREMENT\n)")
            .unwrap();
        assert!(path.exists());

        let conn = Connection::open(&path).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'posts'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn reports_friendly_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = SqliteExecutor::open(dir.path().join("a.db")).unwrap();
        let err = executor.execute("CREATE TABLE broken (").unwrap_err();
        assert!(err.to_string().contains("Statement: CREATE TABLE broken ("));
    }
}
