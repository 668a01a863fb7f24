//! Repeating k-fold cross-validation under many random partitions

use std::{cmp::max, sync::Arc};

use common::SampleTable;
use crossbeam::channel::unbounded;
use lin_reg::{LinReg, OrdinaryLeastSquares};
use nanorand::{Rng, WyRand};
use threadpool::ThreadPool;

use crate::{cross_validate, CvError, CvSummary, FoldPartition, RepetitionAccumulator, Result};

/// What to do when a repetition fails, e.g. because a training fold is singular
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the error of the first failing repetition
    Abort,
    /// Log the failure and leave the repetition out of the summary
    SkipRepetition,
}

/// How many worker threads evaluate repetitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    Serial,
    Threads(usize),
    /// All but two of the available cpus, at least one
    Auto,
}

impl Parallelism {
    fn num_threads(&self) -> usize {
        match self {
            Parallelism::Serial => 1,
            Parallelism::Threads(n) => max(*n, 1),
            Parallelism::Auto => max(num_cpus::get().saturating_sub(2), 1),
        }
    }
}

/// The parameters of a repeated cross-validation
#[derive(Debug, Clone)]
pub struct CvParams {
    /// k, the number of folds per partition
    pub num_folds: usize,
    pub repetitions: usize,
    /// Repetition i partitions the rows with `seeds[i]`
    pub seeds: Vec<u64>,
    pub failure_policy: FailurePolicy,
    pub parallelism: Parallelism,
}

impl Default for CvParams {
    /// Five folds, repeated 100 times, as in Millington et al. (2010)
    fn default() -> Self {
        Self {
            num_folds: 5,
            repetitions: 100,
            seeds: (0..100).collect(),
            failure_policy: FailurePolicy::Abort,
            parallelism: Parallelism::Serial,
        }
    }
}

/// Derive `n` per repetition seeds from a single base seed
pub fn seed_sequence(base_seed: u64, n: usize) -> Vec<u64> {
    let mut rng = WyRand::new_seed(base_seed);
    (0..n).map(|_| rng.generate::<u64>()).collect()
}

/// Repeated k-fold cross-validation of a linear model
#[derive(Debug, Clone)]
pub struct RepeatedCrossValidation<R> {
    params: CvParams,
    regressor: R,
}

impl<R> RepeatedCrossValidation<R>
where
    R: LinReg + Send + Sync + 'static,
{
    pub fn new(params: CvParams, regressor: R) -> Result<Self> {
        if params.repetitions == 0 {
            return Err(CvError::NoRepetitions);
        }
        if params.seeds.len() < params.repetitions {
            return Err(CvError::NotEnoughSeeds {
                repetitions: params.repetitions,
                seeds: params.seeds.len(),
            });
        }

        Ok(Self { params, regressor })
    }

    #[inline(always)]
    pub fn params(&self) -> &CvParams {
        &self.params
    }

    /// Cross-validate `response ~ covariates` once per repetition and
    /// summarize the r² and tau of the out-of-fold predictions
    pub fn run(
        &self,
        table: Arc<SampleTable>,
        response: &str,
        covariates: &[&str],
    ) -> Result<CvSummary> {
        if self.params.num_folds < 2 || self.params.num_folds > table.n_rows() {
            return Err(CvError::InvalidFolds {
                num_folds: self.params.num_folds,
                n_rows: table.n_rows(),
            });
        }

        let summary = match self.params.parallelism.num_threads() {
            1 => self.run_serial(&table, response, covariates)?,
            n => self.run_parallel(table, response, covariates, n)?,
        };
        info!(
            "{} ~ {}: mean r2 {:.4} (1.96 var {:.4}), mean tau {:.4} (1.96 var {:.4}) over {} repetitions",
            response,
            covariates.join(" + "),
            summary.mean_r_squared,
            summary.r_squared_spread,
            summary.mean_tau,
            summary.tau_spread,
            summary.repetitions()
        );

        Ok(summary)
    }

    fn run_serial(
        &self,
        table: &SampleTable,
        response: &str,
        covariates: &[&str],
    ) -> Result<CvSummary> {
        let mut acc = RepetitionAccumulator::with_capacity(self.params.repetitions);
        for (i, &seed) in self.params.seeds.iter().take(self.params.repetitions).enumerate() {
            let outcome = evaluate_repetition(
                table,
                &self.regressor,
                response,
                covariates,
                self.params.num_folds,
                seed,
            );
            self.absorb(&mut acc, i, outcome)?;
        }

        self.finish(acc)
    }

    fn run_parallel(
        &self,
        table: Arc<SampleTable>,
        response: &str,
        covariates: &[&str],
        num_threads: usize,
    ) -> Result<CvSummary> {
        let pool = ThreadPool::new(num_threads);
        debug!("evaluating {} repetitions on {} threads", self.params.repetitions, num_threads);

        let response = Arc::new(response.to_string());
        let covariates: Arc<Vec<String>> =
            Arc::new(covariates.iter().map(|c| c.to_string()).collect());

        let (ch_cv_s, ch_cv_r) = unbounded();
        for (i, &seed) in self.params.seeds.iter().take(self.params.repetitions).enumerate() {
            let ch_cv_s = ch_cv_s.clone();
            let table = table.clone();
            let regressor = self.regressor.clone();
            let response = response.clone();
            let covariates = covariates.clone();
            let num_folds = self.params.num_folds;
            pool.execute(move || {
                let covariates: Vec<&str> = covariates.iter().map(|c| c.as_str()).collect();
                let outcome = evaluate_repetition(
                    &table,
                    &regressor,
                    &response,
                    &covariates,
                    num_folds,
                    seed,
                );
                if ch_cv_s.send((i, outcome)).is_err() {
                    warn!("result of repetition {} could not be delivered", i);
                }
            });
        }
        drop(ch_cv_s);

        let mut outcomes: Vec<Option<Result<(f64, f64)>>> =
            (0..self.params.repetitions).map(|_| None).collect();
        while let Ok((i, outcome)) = ch_cv_r.recv() {
            outcomes[i] = Some(outcome);
        }

        // fill the accumulator in repetition order, independent of completion order
        let mut acc = RepetitionAccumulator::with_capacity(self.params.repetitions);
        for (i, outcome) in outcomes.into_iter().enumerate() {
            let outcome = outcome.ok_or(CvError::MissingRepetition(i))?;
            self.absorb(&mut acc, i, outcome)?;
        }

        self.finish(acc)
    }

    fn absorb(
        &self,
        acc: &mut RepetitionAccumulator,
        i: usize,
        outcome: Result<(f64, f64)>,
    ) -> Result<()> {
        match outcome {
            Ok((r_squared, tau)) => {
                debug!("repetition {}: r2 {:.4}, tau {:.4}", i, r_squared, tau);
                acc.push(r_squared, tau);
            }
            Err(e) => match self.params.failure_policy {
                FailurePolicy::Abort => return Err(e),
                FailurePolicy::SkipRepetition => {
                    warn!(
                        "skipping repetition {} (seed {}): {}",
                        i, self.params.seeds[i], e
                    );
                    acc.push_skipped();
                }
            },
        }

        Ok(())
    }

    fn finish(&self, acc: RepetitionAccumulator) -> Result<CvSummary> {
        if acc.is_empty() {
            return Err(CvError::NoSuccessfulRepetitions(self.params.repetitions));
        }

        Ok(acc.summarize())
    }
}

fn evaluate_repetition<R: LinReg>(
    table: &SampleTable,
    regressor: &R,
    response: &str,
    covariates: &[&str],
    num_folds: usize,
    seed: u64,
) -> Result<(f64, f64)> {
    let partition = FoldPartition::new(table.n_rows(), num_folds, seed)?;
    let result = cross_validate(table, regressor, response, covariates, &partition)?;

    Ok((result.r_squared()?, result.tau()?))
}

/// Repeated k-fold cross-validation of an ordinary least squares fit,
/// evaluated serially; repetition i uses `seeds[i]`.
///
/// Returns mean r², mean tau and `1.96 * variance` of each. See `CvSummary`
/// for why the latter is not a confidence half-width.
pub fn repeated_cv(
    table: &SampleTable,
    response: &str,
    covariates: &[&str],
    k: usize,
    repetitions: usize,
    seeds: &[u64],
) -> Result<CvSummary> {
    if k < 2 || k > table.n_rows() {
        return Err(CvError::InvalidFolds {
            num_folds: k,
            n_rows: table.n_rows(),
        });
    }
    let params = CvParams {
        num_folds: k,
        repetitions,
        seeds: seeds.to_vec(),
        failure_policy: FailurePolicy::Abort,
        parallelism: Parallelism::Serial,
    };

    RepeatedCrossValidation::new(params, OrdinaryLeastSquares::default())?
        .run_serial(table, response, covariates)
}

#[cfg(test)]
mod tests {
    use round::round;

    use super::*;

    fn noisy_table(n: usize, seed: u64) -> SampleTable {
        let mut rng = WyRand::new_seed(seed);
        let x: Vec<f64> = (0..n).map(|_| rng.generate::<f64>() * 10.0).collect();
        let z: Vec<f64> = (0..n).map(|_| rng.generate::<f64>()).collect();
        let y: Vec<f64> = x
            .iter()
            .zip(z.iter())
            .map(|(x, z)| 1.0 + 0.3 * x - 0.5 * z + (rng.generate::<f64>() - 0.5) * 2.0)
            .collect();
        SampleTable::new(vec!["logDD".into(), "x".into(), "z".into()], vec![y, x, z]).unwrap()
    }

    #[test]
    fn repeated_cv_is_deterministic() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let table = noisy_table(51, 0);
        let seeds = seed_sequence(42, 100);

        let a = repeated_cv(&table, "logDD", &["x", "z"], 5, 100, &seeds).unwrap();
        let b = repeated_cv(&table, "logDD", &["x", "z"], 5, 100, &seeds).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.repetitions(), 100);
        assert_eq!(a.skipped, 0);
        assert!(a.mean_r_squared > 0.0 && a.mean_r_squared <= 1.0);
        assert!(a.mean_tau > 0.0 && a.mean_tau <= 1.0);
        assert!(a.r_squared.iter().all(|r2| (0.0..=1.0).contains(r2)));
        assert_eq!(
            round(a.r_squared_spread, 12),
            round(1.96 * a.var_r_squared, 12)
        );
    }

    #[test]
    fn parallel_matches_serial() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let table = Arc::new(noisy_table(51, 1));
        let serial_params = CvParams {
            repetitions: 20,
            seeds: seed_sequence(7, 20),
            ..CvParams::default()
        };
        let parallel_params = CvParams {
            parallelism: Parallelism::Threads(4),
            ..serial_params.clone()
        };

        let serial = RepeatedCrossValidation::new(serial_params, OrdinaryLeastSquares::default())
            .unwrap()
            .run(table.clone(), "logDD", &["x"])
            .unwrap();
        let parallel =
            RepeatedCrossValidation::new(parallel_params, OrdinaryLeastSquares::default())
                .unwrap()
                .run(table, "logDD", &["x"])
                .unwrap();

        assert_eq!(serial, parallel);
    }

    #[test]
    fn different_seeds_give_different_partitions() {
        let table = noisy_table(51, 2);
        let a = repeated_cv(&table, "logDD", &["x"], 5, 10, &seed_sequence(1, 10)).unwrap();
        let b = repeated_cv(&table, "logDD", &["x"], 5, 10, &seed_sequence(2, 10)).unwrap();
        assert_ne!(a.r_squared, b.r_squared);
    }

    #[test]
    fn failure_policies() {
        // an indicator set on a single row is constant in every training set
        // that excludes that row, which makes the design singular
        let mut indicator = vec![0.0; 20];
        indicator[3] = 1.0;
        let y: Vec<f64> = (0..20).map(|i| i as f64 * 0.5 + (i % 3) as f64).collect();
        let table = Arc::new(
            SampleTable::new(vec!["y".into(), "flag".into()], vec![y, indicator]).unwrap(),
        );

        let abort = RepeatedCrossValidation::new(
            CvParams {
                repetitions: 3,
                ..CvParams::default()
            },
            OrdinaryLeastSquares::default(),
        )
        .unwrap()
        .run(table.clone(), "y", &["flag"])
        .unwrap_err();
        assert!(matches!(
            abort,
            CvError::Sample(common::Error::LinReg(lin_reg::LinRegError::Singularity { .. }))
        ));

        let skip = RepeatedCrossValidation::new(
            CvParams {
                repetitions: 3,
                failure_policy: FailurePolicy::SkipRepetition,
                ..CvParams::default()
            },
            OrdinaryLeastSquares::default(),
        )
        .unwrap()
        .run(table, "y", &["flag"])
        .unwrap_err();
        assert!(matches!(skip, CvError::NoSuccessfulRepetitions(3)));
    }

    #[test]
    fn skipped_repetitions_leave_the_rest_summarized() {
        if let Err(_) = pretty_env_logger::try_init() {}

        // two flagged rows; holding both out in one fold leaves a training
        // set whose flag column is all zeros, which makes the design singular
        let n = 20;
        let mut flag = vec![0.0; n];
        flag[3] = 1.0;
        flag[11] = 1.0;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> =
            (0..n).map(|i| 0.5 * i as f64 + (i % 3) as f64 * 0.3 + 2.0 * flag[i]).collect();
        let table = Arc::new(
            SampleTable::new(vec!["y".into(), "x".into(), "flag".into()], vec![y, x, flag])
                .unwrap(),
        );

        let held_out_together = |seed: u64| {
            FoldPartition::new(n, 5, seed)
                .unwrap()
                .folds()
                .iter()
                .any(|fold| fold.contains(&3) && fold.contains(&11))
        };
        let failing: Vec<u64> = (0..1000).filter(|s| held_out_together(*s)).take(2).collect();
        let passing: Vec<u64> = (0..1000).filter(|s| !held_out_together(*s)).take(6).collect();
        assert_eq!(failing.len(), 2);
        assert_eq!(passing.len(), 6);
        let seeds: Vec<u64> = passing[..3]
            .iter()
            .chain(&failing[..1])
            .chain(&passing[3..])
            .chain(&failing[1..])
            .cloned()
            .collect();

        let serial_params = CvParams {
            num_folds: 5,
            repetitions: 8,
            seeds,
            failure_policy: FailurePolicy::SkipRepetition,
            parallelism: Parallelism::Serial,
        };
        let parallel_params = CvParams {
            parallelism: Parallelism::Threads(3),
            ..serial_params.clone()
        };
        let abort_params = CvParams {
            failure_policy: FailurePolicy::Abort,
            ..serial_params.clone()
        };

        let serial = RepeatedCrossValidation::new(serial_params, OrdinaryLeastSquares::default())
            .unwrap()
            .run(table.clone(), "y", &["x", "flag"])
            .unwrap();
        assert_eq!(serial.skipped, 2);
        assert_eq!(serial.repetitions(), 6);
        assert_eq!(serial.tau.len(), 6);
        assert!(serial.mean_r_squared > 0.0 && serial.mean_r_squared <= 1.0);

        let parallel =
            RepeatedCrossValidation::new(parallel_params, OrdinaryLeastSquares::default())
                .unwrap()
                .run(table.clone(), "y", &["x", "flag"])
                .unwrap();
        assert_eq!(serial, parallel);

        let abort = RepeatedCrossValidation::new(abort_params, OrdinaryLeastSquares::default())
            .unwrap()
            .run(table, "y", &["x", "flag"])
            .unwrap_err();
        assert!(matches!(
            abort,
            CvError::Sample(common::Error::LinReg(lin_reg::LinRegError::Singularity { .. }))
        ));
    }

    #[test]
    fn invalid_parameters() {
        let table = noisy_table(10, 3);
        assert!(matches!(
            repeated_cv(&table, "logDD", &["x"], 5, 10, &[1, 2, 3]),
            Err(CvError::NotEnoughSeeds { repetitions: 10, seeds: 3 })
        ));
        assert!(matches!(
            repeated_cv(&table, "logDD", &["x"], 5, 0, &[]),
            Err(CvError::NoRepetitions)
        ));
        assert!(matches!(
            repeated_cv(&table, "logDD", &["x"], 11, 1, &[0]),
            Err(CvError::InvalidFolds { num_folds: 11, n_rows: 10 })
        ));
    }
}
