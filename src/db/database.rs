//! The `Database` front type — URL dispatch plus schema lifecycle
//!
//! Owns a boxed driver and a [`Schema`]; opening a database connects
//! the matching backend and initializes the schema in one step.

use crate::config::{DatabaseUrl, PostgresConfig, SqliteConfig};
use crate::db::driver::{DatabaseBackend, DatabaseDriver};
use crate::db::postgres::PostgresDriver;
use crate::db::query::QueryResult;
use crate::db::schema::Schema;
use crate::db::sqlite::SqliteDriver;
use anyhow::Result;

/// Options applied when opening a database
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenOptions {
    /// Log every executed statement at INFO instead of DEBUG
    pub echo: bool,
    /// Drop all schema tables before (re)creating them
    pub reinitialize: bool,
}

/// A connected database: a backend driver plus the schema it manages
pub struct Database {
    driver: Box<dyn DatabaseDriver>,
    schema: Schema,
    echo: bool,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("backend", &self.driver.backend())
            .field("database", &self.driver.database_name())
            .field("tables", &self.schema.tables().len())
            .field("echo", &self.echo)
            .finish()
    }
}

impl Database {
    /// Open a database from a connection URL.
    ///
    /// Dispatches on the URL scheme (`postgres://`, `postgresql://`,
    /// `sqlite://`), connects the matching backend, and initializes the
    /// schema. Unrecognized schemes fail with [`crate::UrlError`];
    /// connection failures propagate as errors.
    pub async fn open(url: &str, schema: Schema, opts: OpenOptions) -> Result<Self> {
        let driver: Box<dyn DatabaseDriver> = match DatabaseUrl::parse(url)? {
            DatabaseUrl::Postgres(config) => Box::new(PostgresDriver::new(config).await?),
            DatabaseUrl::Sqlite(config) => Box::new(SqliteDriver::new(config).await?),
        };
        Self::connect(driver, schema, opts).await
    }

    /// Open a PostgreSQL database from discrete connection parameters
    pub async fn open_postgres(
        config: PostgresConfig,
        schema: Schema,
        opts: OpenOptions,
    ) -> Result<Self> {
        let driver = Box::new(PostgresDriver::new(config).await?);
        Self::connect(driver, schema, opts).await
    }

    /// Open a SQLite database from a file path or in-memory
    pub async fn open_sqlite(
        config: SqliteConfig,
        schema: Schema,
        opts: OpenOptions,
    ) -> Result<Self> {
        let driver = Box::new(SqliteDriver::new(config).await?);
        Self::connect(driver, schema, opts).await
    }

    async fn connect(
        driver: Box<dyn DatabaseDriver>,
        schema: Schema,
        opts: OpenOptions,
    ) -> Result<Self> {
        let db = Self {
            driver,
            schema,
            echo: opts.echo,
        };
        db.initialize(opts.reinitialize).await?;
        Ok(db)
    }

    /// Which backend this database runs on
    pub fn backend(&self) -> DatabaseBackend {
        self.driver.backend()
    }

    /// Name of the connected database (or file)
    pub fn database_name(&self) -> String {
        self.driver.database_name()
    }

    /// Human-readable server/engine version
    pub async fn server_version(&self) -> Result<String> {
        self.driver.server_version().await
    }

    /// Test that the connection is alive
    pub async fn test_connection(&self) -> Result<bool> {
        self.driver.test_connection().await
    }

    /// Reconnect the backend using its stored configuration
    pub async fn reconnect(&mut self) -> Result<()> {
        self.driver.reconnect().await
    }

    /// Execute a raw SQL statement
    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.log_sql(sql);
        self.driver.execute(sql).await
    }

    /// (Optionally) drop all schema tables, then (re)create them
    pub async fn initialize(&self, reinitialize: bool) -> Result<()> {
        if reinitialize {
            self.drop_tables().await?;
        }
        self.create_tables().await?;
        tracing::info!(
            backend = %self.backend(),
            tables = self.schema.tables().len(),
            "database schema initialized"
        );
        Ok(())
    }

    /// Create all schema tables, in declaration order
    pub async fn create_tables(&self) -> Result<()> {
        for statement in self.schema.create_statements() {
            self.log_sql(&statement);
            self.driver.execute_batch(&statement).await?;
        }
        Ok(())
    }

    /// Drop all schema tables, in reverse declaration order
    pub async fn drop_tables(&self) -> Result<()> {
        for statement in self.schema.drop_statements() {
            self.log_sql(&statement);
            self.driver.execute_batch(&statement).await?;
        }
        Ok(())
    }

    /// Delete all rows in one table, returning how many were removed
    pub async fn delete(&self, table: &str) -> Result<u64> {
        let sql = Schema::delete_statement(table);
        self.log_sql(&sql);
        let result = self.driver.execute(&sql).await?;
        Ok(result.affected_rows.unwrap_or(0))
    }

    /// List user tables currently present in the database
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.driver.list_tables().await
    }

    fn log_sql(&self, sql: &str) {
        if self.echo {
            tracing::info!(target: "dbkit::sql", %sql, "executing");
        } else {
            tracing::debug!(target: "dbkit::sql", %sql, "executing");
        }
    }
}
