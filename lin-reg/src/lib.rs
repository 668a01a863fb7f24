#[macro_use]
extern crate log;

use nalgebra::{Const, DMatrix, Dyn, MatrixView};

mod error;
mod fitted_model;
mod ordinary_least_squares;

pub use error::{LinRegError, Result};
pub use fitted_model::FittedModel;
pub use ordinary_least_squares::OrdinaryLeastSquares;

/// Generic way of solving a linear least squares problem for its coefficients
pub trait LinReg: Clone {
    /// Solve for the coefficient matrix, mapping the design onto the targets
    ///
    /// # Parameters
    /// design: Input data, where the first column should be just 1s
    /// targets: Target data having as many rows as the design
    fn fit_coefficients<'a>(
        &self,
        design: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
        targets: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
    ) -> Result<DMatrix<f64>>;
}
