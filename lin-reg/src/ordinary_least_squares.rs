use nalgebra::{Const, DMatrix, Dyn, MatrixView};

use super::{LinReg, LinRegError, Result};

/// Ordinary least squares, solved through a singular value decomposition.
/// Rank deficient designs are rejected with `Singularity`.
#[derive(Debug, Clone)]
pub struct OrdinaryLeastSquares {
    /// Singular values below `rank_tolerance * largest singular value`
    /// count as zero when determining the rank of the design
    pub rank_tolerance: f64,
}

impl Default for OrdinaryLeastSquares {
    fn default() -> Self {
        Self {
            rank_tolerance: 1e-10,
        }
    }
}

impl LinReg for OrdinaryLeastSquares {
    fn fit_coefficients<'a>(
        &self,
        design: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
        targets: &'a MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>,
    ) -> Result<DMatrix<f64>> {
        if design.nrows() != targets.nrows() {
            return Err(LinRegError::DimensionMismatch {
                expected: design.nrows(),
                found: targets.nrows(),
            });
        }
        let columns = design.ncols();
        if design.nrows() < columns {
            return Err(LinRegError::Singularity {
                rank: design.nrows(),
                columns,
            });
        }

        let svd = design.clone_owned().svd(true, true);
        let largest = svd.singular_values.iter().cloned().fold(0.0, f64::max);
        let eps = largest * self.rank_tolerance;
        let rank = svd.rank(eps);
        trace!("design singular values: {}", svd.singular_values.transpose());
        if rank < columns {
            return Err(LinRegError::Singularity { rank, columns });
        }

        svd.solve(&targets.clone_owned(), eps)
            .map_err(|e| LinRegError::Numerical(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Dim, Matrix};
    use round::round;

    use super::*;

    fn design_and_targets(scale: f64) -> (DMatrix<f64>, DMatrix<f64>) {
        // Note the first column being just ones (scaled)
        let design: DMatrix<f64> = Matrix::from_vec_generic(
            Dim::from_usize(4),
            Dim::from_usize(3),
            vec![1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 2.0]
                .into_iter()
                .map(|v| v * scale)
                .collect(),
        );
        let targets: DMatrix<f64> = Matrix::from_vec_generic(
            Dim::from_usize(4),
            Dim::from_usize(1),
            vec![1.0, 2.0, 3.0, 4.0].into_iter().map(|v| v * scale).collect(),
        );
        (design, targets)
    }

    #[test]
    fn ordinary_least_squares() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let (design, targets) = design_and_targets(1.0);
        info!("design: {}, targets: {}", design, targets);

        let mut coefficients = OrdinaryLeastSquares::default()
            .fit_coefficients(&design.columns(0, design.ncols()), &targets.columns(0, 1))
            .unwrap();
        coefficients.iter_mut().for_each(|v| *v = round(*v, 6));

        assert_eq!(coefficients.as_slice(), &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn ordinary_least_squares_shifted() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let (design, targets) = design_and_targets(100.0);

        let mut coefficients = OrdinaryLeastSquares::default()
            .fit_coefficients(&design.columns(0, design.ncols()), &targets.columns(0, 1))
            .unwrap();
        coefficients.iter_mut().for_each(|v| *v = round(*v, 6));

        assert_eq!(coefficients.as_slice(), &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn collinear_columns_are_singular() {
        if let Err(_) = pretty_env_logger::try_init() {}

        // third column is twice the second one
        let design: DMatrix<f64> = Matrix::from_vec_generic(
            Dim::from_usize(4),
            Dim::from_usize(3),
            vec![1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 2.0, 3.0, 0.0, 2.0, 4.0, 6.0],
        );
        let targets: DMatrix<f64> =
            Matrix::from_vec_generic(Dim::from_usize(4), Dim::from_usize(1), vec![1.0, 2.0, 3.0, 5.0]);

        let err = OrdinaryLeastSquares::default()
            .fit_coefficients(&design.columns(0, 3), &targets.columns(0, 1))
            .unwrap_err();
        assert!(matches!(err, LinRegError::Singularity { rank: 2, columns: 3 }));
    }

    #[test]
    fn more_columns_than_rows_is_singular() {
        let design: DMatrix<f64> = DMatrix::from_element(2, 3, 1.0);
        let targets: DMatrix<f64> = DMatrix::from_element(2, 1, 1.0);

        let err = OrdinaryLeastSquares::default()
            .fit_coefficients(&design.columns(0, 3), &targets.columns(0, 1))
            .unwrap_err();
        assert!(matches!(err, LinRegError::Singularity { .. }));
    }

    #[test]
    fn mismatched_targets() {
        let design: DMatrix<f64> = DMatrix::from_element(4, 2, 1.0);
        let targets: DMatrix<f64> = DMatrix::from_element(3, 1, 1.0);

        let err = OrdinaryLeastSquares::default()
            .fit_coefficients(&design.columns(0, 2), &targets.columns(0, 1))
            .unwrap_err();
        assert!(matches!(err, LinRegError::DimensionMismatch { expected: 4, found: 3 }));
    }
}
