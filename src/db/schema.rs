//! Schema definition — the set of tables a database is initialized with
//!
//! The analog of an ORM's metadata object: an ordered list of table
//! names with their CREATE TABLE DDL. Definitions should use
//! `CREATE TABLE IF NOT EXISTS` so that initialization is idempotent.

/// One table: its name plus the DDL that creates it
#[derive(Clone, Debug)]
pub struct TableDef {
    pub name: String,
    pub create_sql: String,
}

/// Ordered collection of table definitions
#[derive(Clone, Debug, Default)]
pub struct Schema {
    tables: Vec<TableDef>,
}

impl Schema {
    /// An empty schema (no tables created or dropped)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table definition. Declaration order matters: tables are
    /// created in this order and dropped in the reverse order, so
    /// declare referenced tables before the tables that reference them.
    pub fn table(mut self, name: impl Into<String>, create_sql: impl Into<String>) -> Self {
        self.tables.push(TableDef {
            name: name.into(),
            create_sql: create_sql.into(),
        });
        self
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// CREATE statements in declaration order
    pub fn create_statements(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.create_sql.clone()).collect()
    }

    /// DROP statements in reverse declaration order, so dependent
    /// tables go before the tables they reference
    pub fn drop_statements(&self) -> Vec<String> {
        self.tables
            .iter()
            .rev()
            .map(|t| format!("DROP TABLE IF EXISTS {}", quote_ident(&t.name)))
            .collect()
    }

    /// DELETE statement clearing all rows of one table
    pub fn delete_statement(table: &str) -> String {
        format!("DELETE FROM {}", quote_ident(table))
    }
}

/// Quote an identifier with double quotes (valid for both PostgreSQL
/// and SQLite), doubling any embedded quote characters.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::new()
            .table(
                "users",
                "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
            )
            .table(
                "posts",
                "CREATE TABLE IF NOT EXISTS posts (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id))",
            )
    }

    #[test]
    fn test_empty_schema() {
        let schema = Schema::new();
        assert!(schema.is_empty());
        assert!(schema.create_statements().is_empty());
        assert!(schema.drop_statements().is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn test_create_order() {
        let stmts = sample().create_statements();
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("users"));
        assert!(stmts[1].contains("posts"));
    }

    #[test]
    fn test_drop_order_reversed() {
        let stmts = sample().drop_statements();
        assert_eq!(
            stmts,
            vec![
                "DROP TABLE IF EXISTS \"posts\"".to_string(),
                "DROP TABLE IF EXISTS \"users\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_delete_statement_quotes_identifier() {
        assert_eq!(Schema::delete_statement("users"), "DELETE FROM \"users\"");
        assert_eq!(
            Schema::delete_statement("odd\"name"),
            "DELETE FROM \"odd\"\"name\""
        );
    }
}
