use std::fmt;

use lin_reg::LinRegError;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, RasterError>;

/// How a set of grids failed to line up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeMismatch {
    /// A grid's (rows, cols) differs from the reference grid
    Grid {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// The number of grids differs from the number of model covariates
    LayerCount { expected: usize, found: usize },
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeMismatch::Grid { expected, found } => write!(
                f,
                "expected a {}x{} grid, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            ShapeMismatch::LayerCount { expected, found } => {
                write!(f, "expected {} layers, found {}", expected, found)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("shape mismatch: {0}")]
    ShapeMismatch(ShapeMismatch),

    /// Rows of unequal length were given for a grid
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A covariate of the model has no matching named layer
    #[error("no layer named `{0}`")]
    MissingLayer(String),

    #[error("unknown category `{0}`")]
    UnknownCategory(String),

    /// A grid file could not be understood
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    LinReg(#[from] LinRegError),
}

impl From<ShapeMismatch> for RasterError {
    fn from(mismatch: ShapeMismatch) -> Self {
        RasterError::ShapeMismatch(mismatch)
    }
}
