//! Shared query result types used by all database drivers

use std::time::Duration;

/// Represents a cell value in the result set
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
}

impl CellValue {
    /// SQL type name for this value
    pub fn sql_type(&self) -> &'static str {
        match self {
            CellValue::Null => "NULL",
            CellValue::Int(_) => "INTEGER",
            CellValue::Float(_) => "REAL",
            CellValue::String(_) => "TEXT",
            CellValue::Binary(_) => "BLOB",
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::String(v) => write!(f, "{}", v),
            CellValue::Binary(v) => {
                write!(f, "0x")?;
                for byte in v {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
        }
    }
}

/// Column metadata
#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
}

/// Query result
#[derive(Clone, Debug)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<CellValue>>,
    pub row_count: usize,
    pub execution_time: Duration,
    /// Rows changed by a non-SELECT statement; `None` for statements
    /// that return rows.
    pub affected_rows: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Null.to_string(), "NULL");
        assert_eq!(CellValue::Int(42).to_string(), "42");
        assert_eq!(CellValue::String("abc".to_string()).to_string(), "abc");
        assert_eq!(CellValue::Binary(vec![0xDE, 0xAD]).to_string(), "0xDEAD");
    }
}
