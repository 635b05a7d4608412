//! PostgreSQL driver implementation using tokio-postgres
//!
//! The connection is split into a client and a background task driving
//! the socket, per tokio-postgres convention. Queries run through the
//! simple-query protocol, so result cells arrive in text form.

use crate::config::PostgresConfig;
use crate::db::driver::{DatabaseBackend, DatabaseDriver};
use crate::db::query::{CellValue, ColumnInfo, QueryResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Instant;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

/// Default socket directory for Unix-domain connections
const UNIX_SOCKET_DIR: &str = "/var/run/postgresql";

/// PostgreSQL driver
pub struct PostgresDriver {
    client: Client,
    config: PostgresConfig,
}

impl PostgresDriver {
    /// Create a new PostgreSQL connection
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        let client = Self::connect_internal(&config).await?;
        Ok(Self { client, config })
    }

    /// Establish the connection and spawn its driving task
    async fn connect_internal(cfg: &PostgresConfig) -> Result<Client> {
        let pg = pg_config(cfg);
        let (client, connection) = pg
            .connect(NoTls)
            .await
            .context("failed to connect to PostgreSQL")?;

        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::warn!(%err, "PostgreSQL connection task ended with error");
            }
        });

        Ok(client)
    }
}

#[async_trait]
impl DatabaseDriver for PostgresDriver {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    fn database_name(&self) -> String {
        self.config.database.clone()
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(self.client.simple_query("SELECT 1").await.is_ok())
    }

    async fn server_version(&self) -> Result<String> {
        let result = self.execute("SHOW server_version").await?;
        let version = result
            .rows
            .first()
            .and_then(|row| row.first())
            .context("no version row")?;
        Ok(format!("PostgreSQL {}", version))
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.client = Self::connect_internal(&self.config).await?;
        Ok(())
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();
        let messages = self
            .client
            .simple_query(sql)
            .await
            .context("query execution failed")?;
        Ok(collect_results(messages, start))
    }

    async fn execute_batch(&self, sql: &str) -> Result<()> {
        self.client
            .batch_execute(sql)
            .await
            .context("failed to execute SQL batch")
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let result = self
            .execute(
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
                 ORDER BY table_name",
            )
            .await?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| match row.first() {
                Some(CellValue::String(name)) => Some(name.clone()),
                _ => None,
            })
            .collect())
    }
}

/// Map the discrete connection parameters onto a tokio-postgres config.
/// No host selects a Unix-domain connection through the default socket
/// directory.
fn pg_config(cfg: &PostgresConfig) -> tokio_postgres::Config {
    let mut pg = tokio_postgres::Config::new();
    pg.user(&cfg.user);
    if let Some(password) = &cfg.password {
        pg.password(password);
    }
    match &cfg.host {
        Some(host) => {
            pg.host(host);
            pg.port(cfg.port);
        }
        None => {
            pg.host(UNIX_SOCKET_DIR);
        }
    }
    pg.dbname(&cfg.database);
    pg
}

/// Collect simple-query messages into a QueryResult. Cells are text
/// because the simple protocol has no binary format.
fn collect_results(messages: Vec<SimpleQueryMessage>, start: Instant) -> QueryResult {
    let mut columns: Vec<ColumnInfo> = Vec::new();
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut affected = None;

    for message in messages {
        match message {
            SimpleQueryMessage::Row(row) => {
                if columns.is_empty() {
                    columns = row
                        .columns()
                        .iter()
                        .map(|c| ColumnInfo {
                            name: c.name().to_string(),
                            type_name: "TEXT".to_string(),
                        })
                        .collect();
                }
                let row_data = (0..row.len())
                    .map(|i| match row.get(i) {
                        Some(value) => CellValue::String(value.to_string()),
                        None => CellValue::Null,
                    })
                    .collect();
                rows.push(row_data);
            }
            SimpleQueryMessage::CommandComplete(n) => {
                affected = Some(n);
            }
            _ => {}
        }
    }

    // CommandComplete reports the row count for SELECTs too; only keep
    // it as an affected count when no rows came back.
    if !rows.is_empty() {
        affected = None;
    }

    QueryResult {
        row_count: rows.len(),
        columns,
        rows,
        execution_time: start.elapsed(),
        affected_rows: affected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pg_config_tcp() {
        let cfg = PostgresConfig {
            database: "appdb".to_string(),
            user: "app".to_string(),
            password: Some("secret".to_string()),
            host: Some("db.example.com".to_string()),
            port: 5433,
        };
        let pg = pg_config(&cfg);
        assert_eq!(pg.get_user(), Some("app"));
        assert_eq!(pg.get_dbname(), Some("appdb"));
        assert_eq!(pg.get_ports(), &[5433]);
        assert_eq!(
            pg.get_hosts(),
            &[tokio_postgres::config::Host::Tcp("db.example.com".to_string())]
        );
    }

    #[test]
    fn test_pg_config_unix_domain() {
        let cfg = PostgresConfig {
            database: "appdb".to_string(),
            user: "app".to_string(),
            password: None,
            host: None,
            port: 5432,
        };
        let pg = pg_config(&cfg);
        assert_eq!(
            pg.get_hosts(),
            &[tokio_postgres::config::Host::Unix(UNIX_SOCKET_DIR.into())]
        );
    }
}
