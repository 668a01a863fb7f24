//! This crate provides the sample table and correlation statistics shared
//! by the regression, resampling and plotting crates

#![deny(unused_imports, unused_crate_dependencies)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;

mod correlation;
mod error;
mod sample_table;

pub use correlation::{kendall, kendall_test, pearson, pearson_test, CorrelationTest};
pub use error::{Error, Result};
pub use sample_table::SampleTable;
