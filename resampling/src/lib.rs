//! Repeated k-fold cross-validation of linear models fitted on a `SampleTable`

#[macro_use]
extern crate log;

mod accumulator;
mod error;
mod fold_partition;
mod kfold;
mod repeated;

pub use accumulator::{CvSummary, RepetitionAccumulator};
pub use error::{CvError, Result};
pub use fold_partition::FoldPartition;
pub use kfold::{cross_validate, CvResult};
pub use repeated::{
    repeated_cv, seed_sequence, CvParams, FailurePolicy, Parallelism, RepeatedCrossValidation,
};
