use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::{Error, Result};

/// Outcome of a correlation significance test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationTest {
    /// The correlation coefficient (Pearson r or Kendall tau)
    pub estimate: f64,
    /// The test statistic (t for Pearson, z for Kendall)
    pub statistic: f64,
    /// Two sided p-value
    pub p_value: f64,
    /// Number of pairs
    pub n: usize,
}

fn check_pairs(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            found: y.len(),
        });
    }
    if x.is_empty() {
        return Err(Error::DegenerateInput("empty sequence"));
    }
    Ok(())
}

// Tested on the values themselves, as the deviations from a rounded mean of
// a constant sequence need not be exactly zero
fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Pearson product moment correlation of `x` and `y`.
///
/// Squaring the result to obtain r² is left to the caller so that the sign
/// of the association is not lost.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<f64> {
    check_pairs(x, y)?;
    if is_constant(x) || is_constant(y) {
        return Err(Error::DegenerateInput("constant sequence has no variance"));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Err(Error::DegenerateInput("constant sequence has no variance"));
    }

    Ok((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Kendall rank correlation (tau-b, which equals tau-a in the absence of ties)
pub fn kendall(x: &[f64], y: &[f64]) -> Result<f64> {
    check_pairs(x, y)?;

    let (mut s, mut pairs_x, mut pairs_y) = (0.0, 0.0, 0.0);
    for i in 0..x.len() {
        for j in i + 1..x.len() {
            let dx = sign(x[i] - x[j]);
            let dy = sign(y[i] - y[j]);
            s += dx * dy;
            pairs_x += dx * dx;
            pairs_y += dy * dy;
        }
    }
    if pairs_x == 0.0 || pairs_y == 0.0 {
        return Err(Error::DegenerateInput("constant sequence has no untied pairs"));
    }

    Ok((s / (pairs_x * pairs_y).sqrt()).clamp(-1.0, 1.0))
}

#[inline(always)]
fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Pearson correlation with a two sided t-test of r = 0 on n - 2 degrees of freedom
pub fn pearson_test(x: &[f64], y: &[f64]) -> Result<CorrelationTest> {
    let r = pearson(x, y)?;
    let n = x.len();
    if n < 3 {
        return Err(Error::DegenerateInput("at least three pairs are required"));
    }
    let df = (n - 2) as f64;

    let (statistic, p_value) = if r.abs() >= 1.0 {
        (r.signum() * f64::INFINITY, 0.0)
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        let t_dist = StudentsT::new(0.0, 1.0, df)
            .map_err(|_| Error::DegenerateInput("invalid degrees of freedom"))?;
        (t, (2.0 * (1.0 - t_dist.cdf(t.abs()))).clamp(0.0, 1.0))
    };

    Ok(CorrelationTest {
        estimate: r,
        statistic,
        p_value,
        n,
    })
}

/// Kendall tau with a two sided test of tau = 0, using the normal approximation
/// of the sampling distribution (no tie correction of the variance)
pub fn kendall_test(x: &[f64], y: &[f64]) -> Result<CorrelationTest> {
    let tau = kendall(x, y)?;
    let n = x.len();
    if n < 3 {
        return Err(Error::DegenerateInput("at least three pairs are required"));
    }
    let nf = n as f64;
    let variance = 2.0 * (2.0 * nf + 5.0) / (9.0 * nf * (nf - 1.0));
    let z = tau / variance.sqrt();
    let normal =
        Normal::new(0.0, 1.0).map_err(|_| Error::DegenerateInput("invalid normal distribution"))?;
    let p_value = (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0);
    debug!("kendall tau {:.4}, z {:.4}, p {:.4e} on {} pairs", tau, z, p_value, n);

    Ok(CorrelationTest {
        estimate: tau,
        statistic: z,
        p_value,
        n,
    })
}

#[cfg(test)]
mod tests {
    use round::round;

    use super::*;

    #[test]
    fn pearson_of_identical_and_negated() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let x = [0.3, 1.7, 2.2, 5.9, 4.4, 8.1];
        let neg: Vec<f64> = x.iter().map(|v| -v).collect();

        assert_eq!(round(pearson(&x, &x).unwrap(), 12), 1.0);
        assert_eq!(round(pearson(&x, &neg).unwrap(), 12), -1.0);
    }

    #[test]
    fn pearson_known_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        // r = 6 / sqrt(10 * 6)
        assert_eq!(round(pearson(&x, &y).unwrap(), 6), round(6.0 / 60.0_f64.sqrt(), 6));
    }

    #[test]
    fn kendall_of_increasing_sequence() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(kendall(&x, &x).unwrap(), 1.0);

        let rev: Vec<f64> = x.iter().rev().cloned().collect();
        assert_eq!(kendall(&x, &rev).unwrap(), -1.0);
    }

    #[test]
    fn kendall_known_value() {
        // 2 concordant and 4 discordant pairs
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 3.0, 2.0, 0.5];
        let tau = kendall(&x, &y).unwrap();
        assert_eq!(round(tau, 6), round(-2.0 / 6.0, 6));
    }

    #[test]
    fn kendall_with_ties() {
        let x = [1.0, 1.0, 2.0, 3.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        // s = 5, pairs_x = 5, pairs_y = 6
        let tau = kendall(&x, &y).unwrap();
        assert_eq!(round(tau, 6), round(5.0 / 30.0_f64.sqrt(), 6));
    }

    #[test]
    fn degenerate_inputs() {
        let constant = [2.0, 2.0, 2.0];
        let x = [1.0, 2.0, 3.0];
        assert!(matches!(pearson(&constant, &x), Err(Error::DegenerateInput(_))));
        assert!(matches!(kendall(&x, &constant), Err(Error::DegenerateInput(_))));
        assert!(matches!(pearson(&[], &[]), Err(Error::DegenerateInput(_))));
        // the mean of these is not exactly 0.1
        assert!(matches!(
            pearson(&[0.1, 0.1, 0.1], &x),
            Err(Error::DegenerateInput(_))
        ));
        assert!(matches!(
            pearson_test(&x, &[0.7, 0.7, 0.7]),
            Err(Error::DegenerateInput(_))
        ));
        assert!(matches!(
            kendall(&x, &[1.0, 2.0]),
            Err(Error::DimensionMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn significance_tests() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let y = [1.2, 1.8, 3.5, 3.9, 5.2, 5.8, 7.1, 8.3, 8.9, 10.4];
        let strong = pearson_test(&x, &y).unwrap();
        assert!(strong.p_value < 1e-6);
        assert_eq!(strong.n, 10);

        let noise = [0.5, -0.2, 0.9, -0.7, 0.1, 0.3, -0.9, 0.8, -0.4, 0.0];
        let weak = kendall_test(&x, &noise).unwrap();
        assert!(weak.p_value > 0.05);
        assert!(weak.estimate.abs() < 0.5);
    }
}
