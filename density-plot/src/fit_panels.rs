use lin_reg::FittedModel;
use plotters::prelude::*;

use crate::{
    error::drawing, fit_curve, BandOptions, FitCurve, PlotError, Result, Series,
};

/// Grid of panels a figure is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLayout {
    pub rows: usize,
    pub cols: usize,
}

impl PanelLayout {
    /// Smallest near-square layout holding `n` panels
    pub fn for_panels(n: usize) -> Self {
        let cols = (n as f64).sqrt().ceil().max(1.0) as usize;
        let rows = ((n + cols - 1) / cols).max(1);
        Self { rows, cols }
    }
}

/// Observations of one covariate against the response, with the fitted line
#[derive(Debug, Clone)]
pub struct FitPanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Series,
    pub curve: FitCurve,
}

impl FitPanel {
    /// Build a panel for a univariate `model` fitted to `x` and `y`
    pub fn new(model: &FittedModel, x: &[f64], y: &[f64], options: &BandOptions) -> Result<Self> {
        if x.len() != y.len() {
            return Err(PlotError::LengthMismatch(x.len(), y.len()));
        }
        let (x_lo, x_hi) = min_max(x.iter().cloned()).ok_or(PlotError::EmptySeries)?;
        let curve = fit_curve(model, (x_lo, x_hi), options)?;
        let x_label = model.covariate_names().join(", ");

        Ok(Self {
            title: format!("{} ~ {} (R² = {:.3})", model.response_name(), x_label, model.r_squared()),
            x_label,
            y_label: model.response_name().to_string(),
            points: x.iter().cloned().zip(y.iter().cloned()).collect(),
            curve,
        })
    }
}

pub(crate) fn min_max<I: Iterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Widen a range by 5% on each side, or by 0.5 if it is a single value
fn padded((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi - lo <= f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Draw each panel into its own cell of `layout`
pub fn plot_fits(
    panels: &[FitPanel],
    layout: &PanelLayout,
    filename: &str,
    dims: (u32, u32),
) -> Result<()> {
    if panels.is_empty() {
        return Err(PlotError::EmptySeries);
    }
    if layout.rows == 0 || layout.cols == 0 {
        return Err(PlotError::InvalidOptions(format!("empty layout {:?}", layout)));
    }
    if panels.len() > layout.rows * layout.cols {
        return Err(PlotError::LayoutTooSmall {
            panels: panels.len(),
            rows: layout.rows,
            cols: layout.cols,
        });
    }
    info!("plotting {} fit panels to {}", panels.len(), filename);

    let root_area = BitMapBackend::new(filename, dims).into_drawing_area();
    root_area.fill(&WHITE).map_err(drawing)?;
    let areas = root_area.split_evenly((layout.rows, layout.cols));

    for (panel, area) in panels.iter().zip(areas.iter()) {
        let (x_lo, x_hi) = padded(
            min_max(panel.points.iter().map(|(x, _)| *x)).ok_or(PlotError::EmptySeries)?,
        );
        let ys = panel.points.iter().map(|(_, y)| *y);
        let (y_lo, y_hi) = match (min_max(ys), panel.curve.y_range()) {
            (Some((a, b)), Some((c, d))) => padded((a.min(c), b.max(d))),
            (Some(r), None) | (None, Some(r)) => padded(r),
            (None, None) => return Err(PlotError::EmptySeries),
        };

        let mut cc = ChartBuilder::on(area)
            .margin(5)
            .set_all_label_area_size(40)
            .caption(&panel.title, ("sans-serif", 16).into_font().with_color(&BLACK))
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
            .map_err(drawing)?;
        cc.configure_mesh()
            .x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .x_label_formatter(&|v| format!("{:.2}", v))
            .y_label_formatter(&|v| format!("{:.2}", v))
            .draw()
            .map_err(drawing)?;

        cc.draw_series(panel.points.iter().map(|(x, y)| Circle::new((*x, *y), 3, BLACK.filled())))
            .map_err(drawing)?
            .label("observed")
            .legend(|(x, y)| Circle::new((x + 10, y), 3, BLACK.filled()));
        cc.draw_series(LineSeries::new(panel.curve.fit.clone(), &RED))
            .map_err(drawing)?
            .label("fit")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
        if let Some((lower, upper)) = &panel.curve.bands {
            cc.draw_series(LineSeries::new(lower.clone(), &BLUE))
                .map_err(drawing)?
                .label("confidence band")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
            cc.draw_series(LineSeries::new(upper.clone(), &BLUE))
                .map_err(drawing)?;
        }
        cc.configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .draw()
            .map_err(drawing)?;
    }
    root_area.present().map_err(drawing)?;

    info!("successfully plotted to {}", filename);

    Ok(())
}

/// Scatter the out-of-fold predictions against the observations, with the 1:1 line
pub fn plot_observed_vs_predicted(
    observed: &[f64],
    predicted: &[f64],
    title: &str,
    filename: &str,
    dims: (u32, u32),
) -> Result<()> {
    if observed.len() != predicted.len() {
        return Err(PlotError::LengthMismatch(observed.len(), predicted.len()));
    }
    let (lo, hi) = padded(
        min_max(observed.iter().chain(predicted.iter()).cloned()).ok_or(PlotError::EmptySeries)?,
    );

    let root_area = BitMapBackend::new(filename, dims).into_drawing_area();
    root_area.fill(&WHITE).map_err(drawing)?;

    let mut cc = ChartBuilder::on(&root_area)
        .margin(5)
        .set_all_label_area_size(50)
        .caption(title, ("sans-serif", 20).into_font().with_color(&BLACK))
        .build_cartesian_2d(lo..hi, lo..hi)
        .map_err(drawing)?;
    cc.configure_mesh()
        .x_desc("observed")
        .y_desc("predicted")
        .x_label_formatter(&|v| format!("{:.2}", v))
        .y_label_formatter(&|v| format!("{:.2}", v))
        .draw()
        .map_err(drawing)?;

    cc.draw_series(LineSeries::new(vec![(lo, lo), (hi, hi)], &RED))
        .map_err(drawing)?;
    cc.draw_series(
        observed
            .iter()
            .zip(predicted.iter())
            .map(|(o, p)| Circle::new((*o, *p), 3, BLACK.filled())),
    )
    .map_err(drawing)?;
    root_area.present().map_err(drawing)?;

    info!("successfully plotted to {}", filename);

    Ok(())
}

#[cfg(test)]
mod tests {
    use lin_reg::OrdinaryLeastSquares;

    use super::*;

    #[test]
    fn layouts() {
        assert_eq!(PanelLayout::for_panels(1), PanelLayout { rows: 1, cols: 1 });
        assert_eq!(PanelLayout::for_panels(5), PanelLayout { rows: 2, cols: 3 });
        assert_eq!(PanelLayout::for_panels(4), PanelLayout { rows: 2, cols: 2 });
        assert_eq!(PanelLayout::for_panels(0), PanelLayout { rows: 1, cols: 1 });
    }

    #[test]
    fn panel_from_model() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.1, 3.9, 6.2, 7.8];
        let model =
            FittedModel::fit(&OrdinaryLeastSquares::default(), "logDD", &y, &[("SnowDepth", &x)])
                .unwrap();
        let panel = FitPanel::new(&model, &x, &y, &BandOptions::default()).unwrap();

        assert_eq!(panel.points.len(), 4);
        assert_eq!(panel.x_label, "SnowDepth");
        assert_eq!(panel.y_label, "logDD");
        assert_eq!(panel.curve.fit.first().map(|p| p.0), Some(1.0));
        assert!(panel.curve.bands.is_some());

        assert!(matches!(
            FitPanel::new(&model, &x, &y[..3], &BandOptions::default()),
            Err(PlotError::LengthMismatch(4, 3))
        ));
    }

    #[test]
    fn layout_must_hold_all_panels() {
        let x = [1.0, 2.0, 3.0];
        let y = [1.0, 2.5, 2.9];
        let model = FittedModel::fit(&OrdinaryLeastSquares::default(), "y", &y, &[("x", &x)]).unwrap();
        let panel = FitPanel::new(&model, &x, &y, &BandOptions::default()).unwrap();

        let err = plot_fits(
            &[panel.clone(), panel],
            &PanelLayout { rows: 1, cols: 1 },
            "unused.png",
            (100, 100),
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::LayoutTooSmall { panels: 2, .. }));
    }

    #[test]
    fn observed_and_predicted_must_pair_up() {
        let err = plot_observed_vs_predicted(&[1.0, 2.0], &[1.0], "cv", "unused.png", (100, 100))
            .unwrap_err();
        assert!(matches!(err, PlotError::LengthMismatch(2, 1)));
    }
}
