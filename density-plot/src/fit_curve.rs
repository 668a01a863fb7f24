use lin_reg::FittedModel;

use crate::{PlotError, Result, Series};

/// How a fitted line is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandOptions {
    /// Draw the confidence band of the mean response around the line
    pub draw_bands: bool,
    /// In (0, 1), only used when drawing bands
    pub confidence_level: f64,
    /// Number of straight segments the x range is split into
    pub segment_count: usize,
}

impl Default for BandOptions {
    fn default() -> Self {
        Self {
            draw_bands: true,
            confidence_level: 0.95,
            segment_count: 50,
        }
    }
}

/// Points of a fitted line and, optionally, its lower and upper confidence band
#[derive(Debug, Clone, PartialEq)]
pub struct FitCurve {
    pub fit: Series,
    pub bands: Option<(Series, Series)>,
}

impl FitCurve {
    /// Smallest and largest y of the line and its bands
    pub fn y_range(&self) -> Option<(f64, f64)> {
        let mut ys = self.fit.iter().map(|(_, y)| *y).collect::<Vec<f64>>();
        if let Some((lower, upper)) = &self.bands {
            ys.extend(lower.iter().chain(upper.iter()).map(|(_, y)| *y));
        }
        ys.into_iter().fold(None, |acc, y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    }
}

/// Evaluate a univariate model over `x_range`
pub fn fit_curve(model: &FittedModel, x_range: (f64, f64), options: &BandOptions) -> Result<FitCurve> {
    let p = model.covariate_names().len();
    if p != 1 {
        return Err(PlotError::NotUnivariate(p));
    }
    if options.segment_count == 0 {
        return Err(PlotError::InvalidOptions("segment_count must be positive".into()));
    }
    let (x_lo, x_hi) = x_range;
    if !(x_lo.is_finite() && x_hi.is_finite()) {
        return Err(PlotError::InvalidOptions(format!("x range {:?} is not finite", x_range)));
    }

    let step = (x_hi - x_lo) / options.segment_count as f64;
    let xs = (0..=options.segment_count).map(|i| x_lo + i as f64 * step);

    if !options.draw_bands {
        let fit = xs
            .map(|x| Ok((x, model.predict(&[x])?)))
            .collect::<Result<Series>>()?;
        return Ok(FitCurve { fit, bands: None });
    }

    let mut fit = Series::with_capacity(options.segment_count + 1);
    let mut lower = Series::with_capacity(options.segment_count + 1);
    let mut upper = Series::with_capacity(options.segment_count + 1);
    for x in xs {
        let (y, lo, hi) = model.mean_confidence_interval(&[x], options.confidence_level)?;
        fit.push((x, y));
        lower.push((x, lo));
        upper.push((x, hi));
    }

    Ok(FitCurve {
        fit,
        bands: Some((lower, upper)),
    })
}
