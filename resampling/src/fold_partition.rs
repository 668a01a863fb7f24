use nanorand::{Rng, WyRand};

use crate::{CvError, Result};

/// A random assignment of the row indices `0..n_rows` into `num_folds`
/// disjoint folds of near equal size.
///
/// The rows are shuffled with a `WyRand` seeded by `seed` and then cut into
/// contiguous folds. When `n_rows` is not divisible by `num_folds`, the first
/// `n_rows % num_folds` folds receive one extra row each, so a given
/// `(n_rows, num_folds, seed)` always yields the same fold contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldPartition {
    folds: Vec<Vec<usize>>,
    n_rows: usize,
}

impl FoldPartition {
    pub fn new(n_rows: usize, num_folds: usize, seed: u64) -> Result<Self> {
        if num_folds < 2 || num_folds > n_rows {
            return Err(CvError::InvalidFolds { num_folds, n_rows });
        }

        let mut indices: Vec<usize> = (0..n_rows).collect();
        let mut rng = WyRand::new_seed(seed);
        rng.shuffle(&mut indices);

        let base = n_rows / num_folds;
        let remainder = n_rows % num_folds;
        let mut folds = Vec::with_capacity(num_folds);
        let mut start = 0;
        for f in 0..num_folds {
            let len = if f < remainder { base + 1 } else { base };
            folds.push(indices[start..start + len].to_vec());
            start += len;
        }
        trace!("partition of {} rows with seed {}: {:?}", n_rows, seed, folds);

        Ok(Self { folds, n_rows })
    }

    #[inline(always)]
    pub fn num_folds(&self) -> usize {
        self.folds.len()
    }

    #[inline(always)]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// The held out rows of fold `f`
    #[inline(always)]
    pub fn fold(&self, f: usize) -> &[usize] {
        &self.folds[f]
    }

    #[inline(always)]
    pub fn folds(&self) -> &[Vec<usize>] {
        &self.folds
    }

    /// All rows not in fold `f`, ascending
    pub fn training_indices(&self, f: usize) -> Vec<usize> {
        let mut training: Vec<usize> = self
            .folds
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != f)
            .flat_map(|(_, fold)| fold.iter().cloned())
            .collect();
        training.sort_unstable();
        training
    }
}
