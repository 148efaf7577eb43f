use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub mod column;
pub mod product_table;
pub mod query_builder;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The input file is missing, unreadable or cannot be mapped
    #[error("cannot read data source '{}': {source}", path.display())]
    DataSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more required columns are absent from the header
    #[error("Missing column(s): {0}")]
    MissingColumn(String),

    #[error("Malformed row: {0}")]
    Malformed(ParseError),

    #[error("Column '{column}' is not a {expected} column")]
    ColumnType {
        column: &'static str,
        expected: &'static str,
    },

    #[error("Missing measure: {0}")]
    MissingMeasure(String),

    #[error("Schema/parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Default, Clone)]
pub struct ParseSummary {
    pub rows_processed: usize,
    /// Records dropped under the lenient load policy
    pub errors: Vec<ParseError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// 1-based record number, the header being record 1
    pub row: usize,
    pub column: String,
    pub value: String,
    pub error: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.column.is_empty() {
            write!(f, "record {}: {}", self.row, self.value)
        } else {
            write!(
                f,
                "record {}, column '{}': cannot parse '{}'",
                self.row, self.column, self.value
            )?;
            if let Some(reason) = &self.error {
                write!(f, " ({reason})")?;
            }
            Ok(())
        }
    }
}

/// Aggregate operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    /// Sum of all numeric values
    Sum,
    /// Count of all rows
    Count,
    /// Average of numeric values, 0.0 over no rows
    Avg,
    /// Number of distinct values
    CountDistinct,
}

/// Result of an aggregation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateResult {
    Int(i64),
    Float(f64),
}

impl AggregateResult {
    pub fn as_f64(self) -> f64 {
        match self {
            AggregateResult::Int(v) => v as f64,
            AggregateResult::Float(v) => v,
        }
    }

    /// Floats are truncated toward zero
    pub fn as_i64(self) -> i64 {
        match self {
            AggregateResult::Int(v) => v,
            AggregateResult::Float(v) => v as i64,
        }
    }
}
