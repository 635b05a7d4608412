//! SQLite driver implementation using rusqlite
//!
//! rusqlite is synchronous; every call is bridged into the async world
//! expected by DatabaseDriver with `spawn_blocking`, taking the
//! connection lock inside the blocking task.

use crate::config::SqliteConfig;
use crate::db::driver::{DatabaseBackend, DatabaseDriver};
use crate::db::query::{CellValue, ColumnInfo, QueryResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{types::ValueRef, Connection};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// SQLite driver
pub struct SqliteDriver {
    conn: Arc<Mutex<Connection>>,
    config: SqliteConfig,
}

impl SqliteDriver {
    /// Open the database file named by the config, or an in-memory
    /// database when no file is set
    pub async fn new(config: SqliteConfig) -> Result<Self> {
        let cfg = config.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&cfg)).await??;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    /// Run a closure against the connection on a blocking thread
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    fn database_name(&self) -> String {
        match &self.config.path {
            Some(path) => path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "sqlite".to_string()),
            None => ":memory:".to_string(),
        }
    }

    async fn test_connection(&self) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute_batch("SELECT 1").is_ok()))
            .await
    }

    async fn server_version(&self) -> Result<String> {
        let version: String = self
            .with_conn(|conn| {
                conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))
                    .context("failed to read sqlite_version()")
            })
            .await?;
        Ok(format!("SQLite {}", version))
    }

    /// Reopen the database file. For an in-memory database this yields
    /// a fresh, empty database.
    async fn reconnect(&mut self) -> Result<()> {
        let cfg = self.config.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&cfg)).await??;
        *self.conn.lock().await = conn;
        Ok(())
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        let sql = sql.to_string();
        self.with_conn(move |conn| run_query(conn, &sql)).await
    }

    async fn execute_batch(&self, sql: &str) -> Result<()> {
        let sql = sql.to_string();
        self.with_conn(move |conn| {
            conn.execute_batch(&sql)
                .context("failed to execute SQL batch")
        })
        .await
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )?;
            let mut tables = Vec::new();
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                tables.push(row.get(0)?);
            }
            Ok(tables)
        })
        .await
    }
}

fn open_connection(config: &SqliteConfig) -> Result<Connection> {
    match &config.path {
        Some(path) => Connection::open(path).context("failed to open SQLite database"),
        None => Connection::open_in_memory().context("failed to open in-memory SQLite database"),
    }
}

/// Execute one statement, collecting rows when it produces any and the
/// change count otherwise
fn run_query(conn: &Connection, sql: &str) -> Result<QueryResult> {
    let start = Instant::now();

    let mut stmt = conn.prepare(sql)?;
    let col_count = stmt.column_count();

    if col_count == 0 {
        // Statement doesn't return rows (INSERT/UPDATE/DELETE/DDL)
        drop(stmt);
        let affected = conn.execute(sql, [])?;
        return Ok(QueryResult {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            execution_time: start.elapsed(),
            affected_rows: Some(affected as u64),
        });
    }

    let mut columns: Vec<ColumnInfo> = stmt
        .column_names()
        .iter()
        .map(|name| ColumnInfo {
            name: name.to_string(),
            // refined from the first row below
            type_name: "TEXT".to_string(),
        })
        .collect();

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut raw_rows = stmt.query([])?;
    while let Some(row) = raw_rows.next()? {
        let mut row_data = Vec::with_capacity(col_count);
        for i in 0..col_count {
            let value = cell_from_ref(row.get_ref(i)?);
            if rows.is_empty() {
                columns[i].type_name = value.sql_type().to_string();
            }
            row_data.push(value);
        }
        rows.push(row_data);
    }

    Ok(QueryResult {
        row_count: rows.len(),
        columns,
        rows,
        execution_time: start.elapsed(),
        affected_rows: None,
    })
}

fn cell_from_ref(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(v) => CellValue::Int(v),
        ValueRef::Real(v) => CellValue::Float(v),
        ValueRef::Text(v) => CellValue::String(String::from_utf8_lossy(v).to_string()),
        ValueRef::Blob(v) => CellValue::Binary(v.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_driver() -> SqliteDriver {
        SqliteDriver::new(SqliteConfig::memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_execute_returns_typed_rows() {
        let driver = memory_driver().await;
        driver
            .execute_batch(
                "CREATE TABLE t (id INTEGER, score REAL, label TEXT);
                 INSERT INTO t VALUES (1, 0.5, 'a'), (2, 1.5, NULL);",
            )
            .await
            .unwrap();

        let result = driver.execute("SELECT id, score, label FROM t ORDER BY id").await.unwrap();
        assert_eq!(result.row_count, 2);
        assert_eq!(result.columns.len(), 3);
        assert_eq!(result.columns[0].name, "id");
        assert_eq!(result.columns[0].type_name, "INTEGER");
        assert_eq!(result.rows[0][0], CellValue::Int(1));
        assert_eq!(result.rows[0][1], CellValue::Float(0.5));
        assert_eq!(result.rows[0][2], CellValue::String("a".to_string()));
        assert_eq!(result.rows[1][2], CellValue::Null);
        assert!(result.affected_rows.is_none());
    }

    #[tokio::test]
    async fn test_execute_reports_affected_rows() {
        let driver = memory_driver().await;
        driver
            .execute_batch("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1), (2), (3);")
            .await
            .unwrap();

        let result = driver.execute("DELETE FROM t WHERE id > 1").await.unwrap();
        assert_eq!(result.affected_rows, Some(2));
        assert_eq!(result.row_count, 0);
    }

    #[tokio::test]
    async fn test_list_tables_sorted() {
        let driver = memory_driver().await;
        driver
            .execute_batch("CREATE TABLE zebra (id INTEGER); CREATE TABLE apple (id INTEGER);")
            .await
            .unwrap();

        let tables = driver.list_tables().await.unwrap();
        assert_eq!(tables, vec!["apple".to_string(), "zebra".to_string()]);
    }

    #[tokio::test]
    async fn test_server_version() {
        let driver = memory_driver().await;
        let version = driver.server_version().await.unwrap();
        assert!(version.starts_with("SQLite "));
    }

    #[tokio::test]
    async fn test_file_backed_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let driver = SqliteDriver::new(SqliteConfig::file(&path)).await.unwrap();
        driver
            .execute_batch("CREATE TABLE t (id INTEGER)")
            .await
            .unwrap();

        assert!(path.exists());
        assert_eq!(driver.database_name(), "test.db");
        assert!(driver.test_connection().await.unwrap());
    }

    #[tokio::test]
    async fn test_reconnect_keeps_file_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut driver = SqliteDriver::new(SqliteConfig::file(&path)).await.unwrap();
        driver
            .execute_batch("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (7);")
            .await
            .unwrap();

        driver.reconnect().await.unwrap();
        let result = driver.execute("SELECT id FROM t").await.unwrap();
        assert_eq!(result.rows[0][0], CellValue::Int(7));
    }
}
