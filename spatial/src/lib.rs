//! Raster grids, the ASCII grid exchange format, and projection of fitted
//! linear models over aligned covariate grids

#[macro_use]
extern crate log;

mod ascii_grid;
mod error;
mod grid;
mod mask;
mod predict;

pub use ascii_grid::{read_ascii_grid, read_ascii_grid_file, write_ascii_grid, write_ascii_grid_file};
pub use error::{RasterError, Result, ShapeMismatch};
pub use grid::{CellOrigin, Georeference, RasterGrid, DEFAULT_NODATA};
pub use mask::{apply_mask, mask_by_category, CategoricalRaster, CategoryMask};
pub use predict::{predict_raster, predict_raster_by_name};
