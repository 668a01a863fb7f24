use common::{kendall, pearson, SampleTable};
use lin_reg::LinReg;

use crate::{CvError, FoldPartition, Result};

/// Observed responses and their out-of-fold predictions, both indexed by row
#[derive(Debug, Clone, PartialEq)]
pub struct CvResult {
    observed: Vec<f64>,
    predicted: Vec<f64>,
}

impl CvResult {
    #[inline(always)]
    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    #[inline(always)]
    pub fn predicted(&self) -> &[f64] {
        &self.predicted
    }

    /// Squared Pearson correlation of observed and predicted
    pub fn r_squared(&self) -> Result<f64> {
        Ok(pearson(&self.observed, &self.predicted)?.powi(2))
    }

    /// Kendall tau of observed and predicted
    pub fn tau(&self) -> Result<f64> {
        Ok(kendall(&self.observed, &self.predicted)?)
    }

    /// Root mean square prediction error
    pub fn rmse(&self) -> f64 {
        let sse: f64 = self
            .observed
            .iter()
            .zip(self.predicted.iter())
            .map(|(o, p)| (o - p).powi(2))
            .sum();
        (sse / self.observed.len() as f64).sqrt()
    }
}

/// Run one k-fold cross-validation over `partition`.
///
/// For every fold a model is fitted on the remaining rows and used to predict
/// the held out rows. Every row of the table must be held out exactly once.
pub fn cross_validate<R: LinReg>(
    table: &SampleTable,
    regressor: &R,
    response: &str,
    covariates: &[&str],
    partition: &FoldPartition,
) -> Result<CvResult> {
    if partition.n_rows() != table.n_rows() {
        return Err(CvError::InvalidFolds {
            num_folds: partition.num_folds(),
            n_rows: table.n_rows(),
        });
    }
    let observed = table.column(response)?.to_vec();

    let mut predicted: Vec<Option<f64>> = vec![None; table.n_rows()];
    let mut counts = vec![0_usize; table.n_rows()];
    for f in 0..partition.num_folds() {
        let training = table.select_rows(&partition.training_indices(f))?;
        let model = training.fit(regressor, response, covariates)?;

        let held_out = partition.fold(f);
        for (&row, p) in held_out.iter().zip(table.predict(&model, held_out)?) {
            predicted[row] = Some(p);
            counts[row] += 1;
        }
    }

    if let Some((row, &count)) = counts.iter().enumerate().find(|(_, c)| **c != 1) {
        return Err(CvError::Coverage { row, count });
    }
    let predicted = predicted
        .into_iter()
        .enumerate()
        .map(|(row, p)| p.ok_or(CvError::Coverage { row, count: 0 }))
        .collect::<Result<Vec<f64>>>()?;

    Ok(CvResult {
        observed,
        predicted,
    })
}
