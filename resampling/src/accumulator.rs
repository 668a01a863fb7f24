/// Collects the accuracy statistics of every cross-validation repetition.
/// Values are only appended; `summarize` consumes the accumulator.
#[derive(Debug, Clone, Default)]
pub struct RepetitionAccumulator {
    r_squared: Vec<f64>,
    tau: Vec<f64>,
    skipped: usize,
}

impl RepetitionAccumulator {
    pub fn with_capacity(repetitions: usize) -> Self {
        Self {
            r_squared: Vec::with_capacity(repetitions),
            tau: Vec::with_capacity(repetitions),
            skipped: 0,
        }
    }

    #[inline(always)]
    pub fn push(&mut self, r_squared: f64, tau: f64) {
        self.r_squared.push(r_squared);
        self.tau.push(tau);
    }

    /// Record a repetition that failed and was left out
    #[inline(always)]
    pub fn push_skipped(&mut self) {
        self.skipped += 1;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.r_squared.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.r_squared.is_empty()
    }

    /// Freeze the accumulator into its summary statistics
    pub fn summarize(self) -> CvSummary {
        let (mean_r_squared, var_r_squared) = mean_and_variance(&self.r_squared);
        let (mean_tau, var_tau) = mean_and_variance(&self.tau);

        CvSummary {
            mean_r_squared,
            mean_tau,
            r_squared_spread: 1.96 * var_r_squared,
            tau_spread: 1.96 * var_tau,
            var_r_squared,
            var_tau,
            r_squared: self.r_squared,
            tau: self.tau,
            skipped: self.skipped,
        }
    }
}

/// Mean and sample variance (n - 1 denominator, 0 for fewer than two values)
fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);

    (mean, variance)
}

/// Aggregated accuracy of a repeated cross-validation.
///
/// `r_squared_spread` and `tau_spread` are `1.96 * variance`, reproducing the
/// figure reported by Millington et al. (2010). This is not a 95% confidence
/// half-width; `conventional_half_widths` gives `1.96 * sqrt(variance / n)`
/// for comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CvSummary {
    pub mean_r_squared: f64,
    pub mean_tau: f64,
    pub r_squared_spread: f64,
    pub tau_spread: f64,
    pub var_r_squared: f64,
    pub var_tau: f64,
    /// r² of every successful repetition, in repetition order
    pub r_squared: Vec<f64>,
    /// tau of every successful repetition, in repetition order
    pub tau: Vec<f64>,
    pub skipped: usize,
}

impl CvSummary {
    /// Number of repetitions that entered the summary
    #[inline(always)]
    pub fn repetitions(&self) -> usize {
        self.r_squared.len()
    }

    /// `1.96 * sqrt(variance / repetitions)` for r² and tau
    pub fn conventional_half_widths(&self) -> (f64, f64) {
        let n = self.repetitions() as f64;
        (1.96 * (self.var_r_squared / n).sqrt(), 1.96 * (self.var_tau / n).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use round::round;

    use super::*;

    #[test]
    fn summary_reproduces_variance_scaling() {
        let mut acc = RepetitionAccumulator::with_capacity(4);
        for (r2, tau) in [(0.2, 0.4), (0.4, 0.5), (0.6, 0.6), (0.8, 0.7)] {
            acc.push(r2, tau);
        }
        acc.push_skipped();
        assert_eq!(acc.len(), 4);

        let summary = acc.summarize();
        assert_eq!(summary.repetitions(), 4);
        assert_eq!(summary.skipped, 1);
        assert_eq!(round(summary.mean_r_squared, 10), 0.5);
        assert_eq!(round(summary.mean_tau, 10), 0.55);
        // sample variance of r2 is 0.2 / 3
        assert_eq!(round(summary.var_r_squared, 10), round(0.2 / 3.0, 10));
        assert_eq!(round(summary.r_squared_spread, 10), round(1.96 * 0.2 / 3.0, 10));
        assert_eq!(round(summary.tau_spread, 10), round(1.96 * 0.05 / 3.0, 10));

        let (hw_r2, _) = summary.conventional_half_widths();
        assert_eq!(round(hw_r2, 10), round(1.96 * (0.2 / 3.0 / 4.0_f64).sqrt(), 10));
    }

    #[test]
    fn single_repetition_has_zero_variance() {
        let mut acc = RepetitionAccumulator::default();
        acc.push(0.3, 0.2);
        let summary = acc.summarize();
        assert_eq!(summary.mean_r_squared, 0.3);
        assert_eq!(summary.r_squared_spread, 0.0);
        assert_eq!(summary.tau_spread, 0.0);
    }
}
