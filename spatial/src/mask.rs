use std::collections::{BTreeMap, BTreeSet};

use nalgebra::DMatrix;

use crate::{RasterError, RasterGrid, Result, ShapeMismatch};

/// Cells of a categorical grid selected by their category code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMask {
    valid: DMatrix<bool>,
}

impl CategoryMask {
    #[inline(always)]
    pub fn shape(&self) -> (usize, usize) {
        self.valid.shape()
    }

    /// False for cells outside the grid
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.valid.get((row, col)).cloned().unwrap_or(false)
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }

    /// Render the mask as a grid holding 1 where valid and `nodata` elsewhere
    pub fn to_raster(&self, nodata: f64) -> RasterGrid {
        RasterGrid::new(self.valid.map(|v| if v { 1.0 } else { nodata }), nodata)
    }
}

/// Integral code held by a cell, if any
fn cell_code(grid: &RasterGrid, value: f64) -> Option<i64> {
    if grid.is_nodata(value) || value.fract() != 0.0 {
        return None;
    }
    Some(value as i64)
}

/// Mark every cell whose code is one of `keep_codes` as valid.
/// No-data and non-integral cells are never valid.
pub fn mask_by_category(grid: &RasterGrid, keep_codes: &BTreeSet<i64>) -> CategoryMask {
    let valid = grid.values().map(|v| match cell_code(grid, v) {
        Some(code) => keep_codes.contains(&code),
        None => false,
    });
    debug!(
        "mask over codes {:?} keeps {} cells",
        keep_codes,
        valid.iter().filter(|v| **v).count()
    );

    CategoryMask { valid }
}

/// Keep `prediction` where `mask` is valid and set every other cell to no-data
pub fn apply_mask(prediction: &RasterGrid, mask: &CategoryMask) -> Result<RasterGrid> {
    if prediction.shape() != mask.shape() {
        return Err(ShapeMismatch::Grid {
            expected: prediction.shape(),
            found: mask.shape(),
        }
        .into());
    }
    let nodata = prediction.nodata();
    let values = prediction
        .values()
        .zip_map(&mask.valid, |v, keep| if keep { v } else { nodata });

    Ok(prediction.with_values(values))
}

/// A grid of integer land-cover codes with a legend naming each code
#[derive(Debug, Clone)]
pub struct CategoricalRaster {
    pub grid: RasterGrid,
    pub legend: BTreeMap<i64, String>,
}

impl CategoricalRaster {
    pub fn new(grid: RasterGrid, legend: BTreeMap<i64, String>) -> Self {
        Self { grid, legend }
    }

    /// Code and label of a cell. The label is `None` for codes missing from
    /// the legend.
    pub fn category_at(&self, row: usize, col: usize) -> Option<(i64, Option<&str>)> {
        let code = cell_code(&self.grid, self.grid.get(row, col)?)?;
        Some((code, self.legend.get(&code).map(|l| l.as_str())))
    }

    /// Number of cells holding each code
    pub fn code_counts(&self) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for v in self.grid.values().iter() {
            if let Some(code) = cell_code(&self.grid, *v) {
                *counts.entry(code).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn mask_for_codes(&self, codes: &BTreeSet<i64>) -> CategoryMask {
        mask_by_category(&self.grid, codes)
    }

    /// Mask of the cells whose legend label is one of `labels`
    pub fn mask_for_labels(&self, labels: &[&str]) -> Result<CategoryMask> {
        let mut codes = BTreeSet::new();
        for label in labels {
            let matching: Vec<i64> = self
                .legend
                .iter()
                .filter(|(_, l)| l.as_str() == *label)
                .map(|(code, _)| *code)
                .collect();
            if matching.is_empty() {
                return Err(RasterError::UnknownCategory(label.to_string()));
            }
            codes.extend(matching);
        }

        Ok(self.mask_for_codes(&codes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_NODATA;

    const ND: f64 = DEFAULT_NODATA;

    fn land_cover() -> CategoricalRaster {
        let grid = RasterGrid::from_rows(&[vec![1.0, 2.0, 6.0, 6.0, 5.0]], ND).unwrap();
        let legend = [(1, "water"), (2, "urban"), (5, "deciduous"), (6, "mixed")]
            .into_iter()
            .map(|(c, l)| (c, l.to_string()))
            .collect();
        CategoricalRaster::new(grid, legend)
    }

    #[test]
    fn mask_keeps_listed_codes() {
        if let Err(_) = pretty_env_logger::try_init() {}

        let cover = land_cover();
        let mask = mask_by_category(&cover.grid, &BTreeSet::from([6]));
        let valid: Vec<usize> = (0..5).filter(|&c| mask.is_valid(0, c)).collect();
        assert_eq!(valid, vec![2, 3]);
        assert_eq!(mask.valid_count(), 2);
        assert!(!mask.is_valid(3, 3));

        assert_eq!(mask.to_raster(ND).to_row_major(), vec![ND, ND, 1.0, 1.0, ND]);
    }

    #[test]
    fn nodata_and_fractional_cells_are_never_valid() {
        let grid = RasterGrid::from_rows(&[vec![6.0, ND, 6.5, f64::NAN]], ND).unwrap();
        let mask = mask_by_category(&grid, &BTreeSet::from([6, -9999]));
        assert_eq!(mask.valid_count(), 1);
        assert!(mask.is_valid(0, 0));
    }

    #[test]
    fn applying_a_mask() {
        let cover = land_cover();
        let prediction = RasterGrid::from_rows(&[vec![0.1, 0.2, 0.3, ND, 0.5]], ND).unwrap();
        let mask = cover.mask_for_codes(&BTreeSet::from([2, 6]));

        let masked = apply_mask(&prediction, &mask).unwrap();
        assert_eq!(masked.to_row_major(), vec![ND, 0.2, 0.3, ND, ND]);

        let other = RasterGrid::from_rows(&[vec![0.1], vec![0.2]], ND).unwrap();
        assert!(matches!(
            apply_mask(&other, &mask),
            Err(RasterError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn legend_lookups() {
        let cover = land_cover();
        assert_eq!(cover.category_at(0, 2), Some((6, Some("mixed"))));
        assert_eq!(cover.category_at(0, 9), None);

        let counts = cover.code_counts();
        assert_eq!(counts.get(&6), Some(&2));
        assert_eq!(counts.get(&1), Some(&1));
        assert_eq!(counts.len(), 4);

        let mask = cover.mask_for_labels(&["mixed", "water"]).unwrap();
        assert_eq!(mask.valid_count(), 3);

        let err = cover.mask_for_labels(&["tundra"]).unwrap_err();
        assert!(matches!(err, RasterError::UnknownCategory(label) if label == "tundra"));
    }
}
