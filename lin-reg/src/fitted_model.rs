use std::fmt;

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use super::{LinReg, LinRegError, Result};

/// A linear model fitted with an intercept to a response and named covariates.
///
/// Coefficients are stored intercept first, followed by one slope per
/// covariate in the order of `covariate_names`. That order is also the
/// order in which covariate rows (and raster layers) must be supplied when
/// predicting.
#[derive(Debug, Clone)]
pub struct FittedModel {
    response_name: String,
    covariate_names: Vec<String>,
    coefficients: DVector<f64>,
    standard_errors: DVector<f64>,
    t_values: DVector<f64>,
    p_values: DVector<f64>,
    fitted_values: DVector<f64>,
    residuals: DVector<f64>,
    r_squared: f64,
    adj_r_squared: f64,
    residual_std_error: f64,
    f_statistic: f64,
    f_p_value: f64,
    df_residual: usize,
    // (X'X)^-1 of the training design, kept for mean response intervals
    xtx_inv: DMatrix<f64>,
}

impl FittedModel {
    /// Fit `response ~ covariates` with an intercept.
    ///
    /// # Arguments
    /// regressor: Solver for the least squares problem
    /// response_name: Name of the response, only used for display
    /// response: The n observed responses
    /// covariates: Named covariate columns, each of length n
    pub fn fit<R: LinReg>(
        regressor: &R,
        response_name: &str,
        response: &[f64],
        covariates: &[(&str, &[f64])],
    ) -> Result<Self> {
        let n = response.len();
        let p = covariates.len();
        if p == 0 {
            return Err(LinRegError::NoCovariates);
        }
        for (i, (name, values)) in covariates.iter().enumerate() {
            if values.len() != n {
                return Err(LinRegError::DimensionMismatch {
                    expected: n,
                    found: values.len(),
                });
            }
            if covariates[..i].iter().any(|(other, _)| other == name) {
                return Err(LinRegError::DuplicateCovariate(name.to_string()));
            }
        }
        if n <= p + 1 {
            return Err(LinRegError::InsufficientData {
                n_samples: n,
                n_parameters: p + 1,
            });
        }

        let design: DMatrix<f64> =
            DMatrix::from_fn(n, p + 1, |i, j| if j == 0 { 1.0 } else { covariates[j - 1].1[i] });
        let targets: DMatrix<f64> = DMatrix::from_column_slice(n, 1, response);

        let solution = regressor
            .fit_coefficients(&design.columns(0, design.ncols()), &targets.columns(0, 1))?;
        let coefficients = DVector::from_iterator(p + 1, solution.column(0).iter().cloned());

        let y = DVector::from_vec(response.to_vec());
        let fitted_values = &design * &coefficients;
        let residuals = &y - &fitted_values;

        let df_residual = n - p - 1;
        let mean = y.mean();
        let ss_res = residuals.norm_squared();
        let ss_tot = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        // a constant response has no variance to explain, whatever rounding
        // leaves in ss_tot
        let constant_response = response.iter().all(|v| *v == response[0]);
        let r_squared = if !constant_response && ss_tot > 0.0 {
            (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residual as f64;
        let sigma2 = ss_res / df_residual as f64;

        let columns = design.ncols();
        let xtx_inv = (design.transpose() * &design)
            .try_inverse()
            .ok_or(LinRegError::Singularity {
                rank: columns - 1,
                columns,
            })?;

        let standard_errors =
            DVector::from_fn(p + 1, |j, _| (sigma2 * xtx_inv[(j, j)]).max(0.0).sqrt());
        let t_values = coefficients.zip_map(&standard_errors, |c, se| c / se);

        let t_dist = StudentsT::new(0.0, 1.0, df_residual as f64)
            .map_err(|e| LinRegError::Numerical(e.to_string()))?;
        let p_values = t_values.map(|t| {
            if t.is_nan() {
                1.0
            } else {
                (2.0 * (1.0 - t_dist.cdf(t.abs()))).clamp(0.0, 1.0)
            }
        });

        let f_statistic = ((ss_tot - ss_res) / p as f64) / sigma2;
        let f_p_value = if f_statistic.is_nan() {
            1.0
        } else if f_statistic.is_infinite() {
            0.0
        } else {
            let f_dist = FisherSnedecor::new(p as f64, df_residual as f64)
                .map_err(|e| LinRegError::Numerical(e.to_string()))?;
            (1.0 - f_dist.cdf(f_statistic.max(0.0))).clamp(0.0, 1.0)
        };

        debug!(
            "fitted {} ~ {}: coefficients {:?}, r_squared {:.4}",
            response_name,
            covariates.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(" + "),
            coefficients.as_slice(),
            r_squared
        );

        Ok(Self {
            response_name: response_name.to_string(),
            covariate_names: covariates.iter().map(|(name, _)| name.to_string()).collect(),
            coefficients,
            standard_errors,
            t_values,
            p_values,
            fitted_values,
            residuals,
            r_squared,
            adj_r_squared,
            residual_std_error: sigma2.sqrt(),
            f_statistic,
            f_p_value,
            df_residual,
            xtx_inv,
        })
    }

    /// Predict the response for a single row of covariate values,
    /// given in the order of `covariate_names`
    pub fn predict(&self, covariates: &[f64]) -> Result<f64> {
        if covariates.len() != self.covariate_names.len() {
            return Err(LinRegError::DimensionMismatch {
                expected: self.covariate_names.len(),
                found: covariates.len(),
            });
        }
        Ok(self.intercept()
            + self.slopes().iter().zip(covariates).map(|(b, x)| b * x).sum::<f64>())
    }

    /// Predict the response for every row of `covariates`.
    /// The matrix holds one column per covariate and no intercept column.
    pub fn predict_design(&self, covariates: &DMatrix<f64>) -> Result<DVector<f64>> {
        let p = self.covariate_names.len();
        if covariates.ncols() != p {
            return Err(LinRegError::DimensionMismatch {
                expected: p,
                found: covariates.ncols(),
            });
        }
        let slopes = self.coefficients.rows(1, p);

        Ok((covariates * slopes).add_scalar(self.intercept()))
    }

    /// The fitted mean response at `covariates` together with the lower and
    /// upper bounds of its confidence interval at the given level
    pub fn mean_confidence_interval(
        &self,
        covariates: &[f64],
        level: f64,
    ) -> Result<(f64, f64, f64)> {
        if !(level > 0.0 && level < 1.0) {
            return Err(LinRegError::InvalidConfidenceLevel(level));
        }
        let fit = self.predict(covariates)?;
        let x0 = DVector::from_fn(self.coefficients.len(), |i, _| {
            if i == 0 {
                1.0
            } else {
                covariates[i - 1]
            }
        });
        let leverage = (x0.transpose() * &self.xtx_inv * &x0)[(0, 0)].max(0.0);
        let t_dist = StudentsT::new(0.0, 1.0, self.df_residual as f64)
            .map_err(|e| LinRegError::Numerical(e.to_string()))?;
        let half_width =
            t_dist.inverse_cdf(0.5 + level / 2.0) * self.residual_std_error * leverage.sqrt();

        Ok((fit, fit - half_width, fit + half_width))
    }

    #[inline(always)]
    pub fn response_name(&self) -> &str {
        &self.response_name
    }

    #[inline(always)]
    pub fn covariate_names(&self) -> &[String] {
        &self.covariate_names
    }

    /// Intercept followed by the slopes
    #[inline(always)]
    pub fn coefficients(&self) -> &[f64] {
        self.coefficients.as_slice()
    }

    #[inline(always)]
    pub fn intercept(&self) -> f64 {
        self.coefficients[0]
    }

    #[inline(always)]
    pub fn slopes(&self) -> &[f64] {
        &self.coefficients.as_slice()[1..]
    }

    /// The slope belonging to the named covariate
    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.covariate_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.coefficients[i + 1])
    }

    #[inline(always)]
    pub fn standard_errors(&self) -> &[f64] {
        self.standard_errors.as_slice()
    }

    #[inline(always)]
    pub fn t_values(&self) -> &[f64] {
        self.t_values.as_slice()
    }

    /// Two sided p-values of the coefficients, intercept first
    #[inline(always)]
    pub fn p_values(&self) -> &[f64] {
        self.p_values.as_slice()
    }

    #[inline(always)]
    pub fn fitted_values(&self) -> &[f64] {
        self.fitted_values.as_slice()
    }

    #[inline(always)]
    pub fn residuals(&self) -> &[f64] {
        self.residuals.as_slice()
    }

    #[inline(always)]
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    #[inline(always)]
    pub fn adj_r_squared(&self) -> f64 {
        self.adj_r_squared
    }

    #[inline(always)]
    pub fn residual_std_error(&self) -> f64 {
        self.residual_std_error
    }

    #[inline(always)]
    pub fn f_statistic(&self) -> f64 {
        self.f_statistic
    }

    #[inline(always)]
    pub fn f_p_value(&self) -> f64 {
        self.f_p_value
    }

    #[inline(always)]
    pub fn df_residual(&self) -> usize {
        self.df_residual
    }

    /// Number of observations the model was fitted on
    #[inline(always)]
    pub fn n_samples(&self) -> usize {
        self.fitted_values.len()
    }
}

impl fmt::Display for FittedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ~ {}", self.response_name, self.covariate_names.join(" + "))?;
        writeln!(
            f,
            "{:<14}{:>12}{:>12}{:>9}{:>11}",
            "", "Estimate", "Std. Error", "t value", "Pr(>|t|)"
        )?;
        let names = std::iter::once("(Intercept)").chain(self.covariate_names.iter().map(|s| s.as_str()));
        for (i, name) in names.enumerate() {
            writeln!(
                f,
                "{:<14}{:>12.5}{:>12.5}{:>9.3}{:>11.4}",
                name,
                self.coefficients[i],
                self.standard_errors[i],
                self.t_values[i],
                self.p_values[i]
            )?;
        }
        writeln!(
            f,
            "Residual standard error: {:.4} on {} degrees of freedom",
            self.residual_std_error, self.df_residual
        )?;
        writeln!(
            f,
            "Multiple R-squared: {:.4}, Adjusted R-squared: {:.4}",
            self.r_squared, self.adj_r_squared
        )?;
        write!(
            f,
            "F-statistic: {:.3} on {} and {} DF, p-value: {:.4e}",
            self.f_statistic,
            self.covariate_names.len(),
            self.df_residual,
            self.f_p_value
        )
    }
}
