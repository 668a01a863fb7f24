use lin_reg::LinRegError;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading samples, computing correlations or fitting
/// models on a `SampleTable`
#[derive(Debug, Error)]
pub enum Error {
    /// Two sequences that must be paired have different lengths
    #[error("dimension mismatch: expected {expected} values, found {found}")]
    DimensionMismatch {
        /// Length of the reference sequence
        expected: usize,
        /// Length of the offending sequence
        found: usize,
    },

    /// Input without variance (or without values) for which a statistic is undefined
    #[error("degenerate input: {0}")]
    DegenerateInput(&'static str),

    /// The requested column is not part of the table
    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    /// The same column name occurs twice in the header
    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),

    /// A cell is empty, missing or does not hold a finite number
    #[error("invalid value `{value}` in column `{column}` at row {row}")]
    InvalidValue {
        /// Zero based data row
        row: usize,
        /// Column name
        column: String,
        /// The raw cell content
        value: String,
    },

    /// A row index beyond the table
    #[error("row {index} out of range for a table of {n_rows} rows")]
    RowOutOfRange {
        /// The offending index
        index: usize,
        /// Number of rows in the table
        n_rows: usize,
    },

    /// Fitting or applying a linear model failed
    #[error(transparent)]
    LinReg(#[from] LinRegError),

    /// Reading the delimited sample file failed
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
