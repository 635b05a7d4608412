//! dbkit — async convenience layer over PostgreSQL and SQLite connections.
//!
//! Builds connection URLs from parts, dispatches on URL scheme, and wraps
//! the native drivers (`tokio-postgres`, `rusqlite`) behind a single
//! [`DatabaseDriver`] trait. Schema creation and teardown are driven by a
//! [`Schema`] of plain DDL statements.

pub mod config;
pub mod db;

pub use config::{DatabaseUrl, PostgresConfig, SqliteConfig, UrlError};
pub use db::{
    CellValue, ColumnInfo, Database, DatabaseBackend, DatabaseDriver, OpenOptions, QueryResult,
    Schema, TableDef,
};
