//! Database driver abstraction trait
//!
//! Defines the interface that all database backends must implement.

use crate::db::QueryResult;
use anyhow::Result;
use async_trait::async_trait;

/// Which database backend is in use
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DatabaseBackend {
    Postgres,
    Sqlite,
}

impl std::fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseBackend::Postgres => write!(f, "PostgreSQL"),
            DatabaseBackend::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Trait that all database drivers must implement.
///
/// All methods are async because the caller lives in a tokio runtime.
/// Synchronous drivers (like rusqlite) use `spawn_blocking` internally.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Which backend this driver represents
    fn backend(&self) -> DatabaseBackend;

    /// Get the name of the current database / file
    fn database_name(&self) -> String;

    /// Test that the connection is alive
    async fn test_connection(&self) -> Result<bool>;

    /// Get a human-readable server/engine version string
    async fn server_version(&self) -> Result<String>;

    /// Reconnect using the same configuration
    async fn reconnect(&mut self) -> Result<()>;

    /// Execute a single SQL statement and return results
    async fn execute(&self, sql: &str) -> Result<QueryResult>;

    /// Execute a batch of SQL statements, discarding any results.
    /// Used for DDL.
    async fn execute_batch(&self, sql: &str) -> Result<()>;

    /// List user tables in the current database, sorted by name
    async fn list_tables(&self) -> Result<Vec<String>>;
}
