use nalgebra::DMatrix;

use crate::{RasterError, Result, ShapeMismatch};

/// No-data sentinel used when a grid file does not declare one
pub const DEFAULT_NODATA: f64 = -9999.0;

/// Whether the lower left coordinate refers to the corner or the center of
/// the lower left cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellOrigin {
    #[default]
    Corner,
    Center,
}

/// Placement of a grid in map units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Georeference {
    pub x_lower_left: f64,
    pub y_lower_left: f64,
    pub cell_size: f64,
    pub origin: CellOrigin,
}

impl Default for Georeference {
    fn default() -> Self {
        Self {
            x_lower_left: 0.0,
            y_lower_left: 0.0,
            cell_size: 1.0,
            origin: CellOrigin::Corner,
        }
    }
}

/// A 2-D grid of cell values with a no-data sentinel.
///
/// Row 0 is the northernmost row, as in the ASCII grid format. A cell is
/// no-data when it equals the sentinel or is NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    values: DMatrix<f64>,
    nodata: f64,
    georeference: Georeference,
}

impl RasterGrid {
    pub fn new(values: DMatrix<f64>, nodata: f64) -> Self {
        Self {
            values,
            nodata,
            georeference: Georeference::default(),
        }
    }

    /// Build a grid from row vectors, which must all have the same length
    pub fn from_rows(rows: &[Vec<f64>], nodata: f64) -> Result<Self> {
        let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(RasterError::RaggedRows {
                row,
                expected: ncols,
                found: r.len(),
            });
        }
        let values = DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]);

        Ok(Self::new(values, nodata))
    }

    /// Build a grid from row-major cell values
    pub fn from_row_major(nrows: usize, ncols: usize, cells: &[f64], nodata: f64) -> Result<Self> {
        if cells.len() != nrows * ncols {
            return Err(RasterError::ShapeMismatch(ShapeMismatch::Grid {
                expected: (nrows, ncols),
                found: (cells.len() / ncols.max(1), ncols),
            }));
        }

        Ok(Self::new(DMatrix::from_row_slice(nrows, ncols, cells), nodata))
    }

    pub fn with_georeference(mut self, georeference: Georeference) -> Self {
        self.georeference = georeference;
        self
    }

    #[inline(always)]
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    #[inline(always)]
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    #[inline(always)]
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    #[inline(always)]
    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    #[inline(always)]
    pub fn georeference(&self) -> &Georeference {
        &self.georeference
    }

    #[inline(always)]
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    #[inline(always)]
    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || value == self.nodata
    }

    /// The cell value, or `None` for no-data and out of range cells
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values
            .get((row, col))
            .cloned()
            .filter(|v| !self.is_nodata(*v))
    }

    /// All cell values, row by row
    pub fn to_row_major(&self) -> Vec<f64> {
        self.values.transpose().as_slice().to_vec()
    }

    /// Number of cells holding data
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !self.is_nodata(**v)).count()
    }

    /// Smallest and largest valid cell value
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter(|v| !self.is_nodata(**v))
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Fail with `ShapeMismatch` unless `other` has the same rows and columns
    pub fn check_same_shape(&self, other: &RasterGrid) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(ShapeMismatch::Grid {
                expected: self.shape(),
                found: other.shape(),
            }
            .into());
        }
        if self.georeference != other.georeference {
            warn!(
                "grids share a shape but not a georeference: {:?} vs {:?}",
                self.georeference, other.georeference
            );
        }

        Ok(())
    }

    /// A grid of the same shape, placement and sentinel holding `values`
    pub(crate) fn with_values(&self, values: DMatrix<f64>) -> Self {
        Self {
            values,
            nodata: self.nodata,
            georeference: self.georeference,
        }
    }
}
