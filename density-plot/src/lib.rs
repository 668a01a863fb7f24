#[macro_use]
extern crate log;

mod error;
mod fit_curve;
mod fit_panels;
mod raster_map;

pub use error::{PlotError, Result};
pub use fit_curve::{fit_curve, BandOptions, FitCurve};
pub use fit_panels::{plot_fits, plot_observed_vs_predicted, FitPanel, PanelLayout};
pub use raster_map::plot_raster;

pub type Series = Vec<(f64, f64)>;
