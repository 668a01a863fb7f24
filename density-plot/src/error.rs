use lin_reg::LinRegError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlotError>;

#[derive(Debug, Error)]
pub enum PlotError {
    /// Fit curves can only be drawn for models with a single covariate
    #[error("model has {0} covariates, expected exactly one")]
    NotUnivariate(usize),

    #[error("invalid plot options: {0}")]
    InvalidOptions(String),

    #[error("nothing to plot")]
    EmptySeries,

    #[error("series lengths differ: {0} vs {1}")]
    LengthMismatch(usize, usize),

    #[error("{panels} panels do not fit a {rows}x{cols} layout")]
    LayoutTooSmall {
        panels: usize,
        rows: usize,
        cols: usize,
    },

    /// The plotting backend failed
    #[error("drawing failed: {0}")]
    Drawing(String),

    #[error(transparent)]
    LinReg(#[from] LinRegError),
}

pub(crate) fn drawing<E: std::fmt::Display>(err: E) -> PlotError {
    PlotError::Drawing(err.to_string())
}
