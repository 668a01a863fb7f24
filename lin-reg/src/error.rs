use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, LinRegError>;

/// Everything that can go wrong while fitting or applying a linear model
#[derive(Debug, Error)]
pub enum LinRegError {
    /// A sequence does not have the expected number of values
    #[error("dimension mismatch: expected {expected} values, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// The design matrix (including the intercept column) is rank deficient
    #[error("singular design matrix: rank {rank} < {columns} columns")]
    Singularity { rank: usize, columns: usize },

    /// Not enough observations to leave any residual degrees of freedom
    #[error("not enough data: {n_samples} samples for {n_parameters} parameters")]
    InsufficientData { n_samples: usize, n_parameters: usize },

    #[error("at least one covariate is required")]
    NoCovariates,

    #[error("covariate `{0}` given more than once")]
    DuplicateCovariate(String),

    #[error("confidence level must lie in (0, 1), got {0}")]
    InvalidConfidenceLevel(f64),

    /// A distribution or decomposition failed to produce a result
    #[error("numerical error: {0}")]
    Numerical(String),
}
