//! Database module — driver abstraction + PostgreSQL and SQLite backends

mod database;
mod driver;
mod query;
mod schema;
pub mod postgres;
pub mod sqlite;

pub use database::*;
pub use driver::*;
pub use query::*;
pub use schema::*;
