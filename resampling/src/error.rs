use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, CvError>;

/// Errors of the cross-validation engine
#[derive(Debug, Error)]
pub enum CvError {
    /// k must be at least 2 and at most the number of rows
    #[error("cannot split {n_rows} rows into {num_folds} folds")]
    InvalidFolds { num_folds: usize, n_rows: usize },

    #[error("{repetitions} repetitions requested but only {seeds} seeds given")]
    NotEnoughSeeds { repetitions: usize, seeds: usize },

    #[error("at least one repetition is required")]
    NoRepetitions,

    /// A partition did not hold out every row exactly once
    #[error("row {row} is held out {count} times")]
    Coverage { row: usize, count: usize },

    #[error("all {0} repetitions failed")]
    NoSuccessfulRepetitions(usize),

    /// A worker thread went away before reporting its repetition
    #[error("repetition {0} was never reported by its worker")]
    MissingRepetition(usize),

    /// Fitting, predicting or correlating inside a fold failed
    #[error(transparent)]
    Sample(#[from] common::Error),
}
