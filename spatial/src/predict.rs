use lin_reg::FittedModel;
use nalgebra::DMatrix;

use crate::{RasterError, RasterGrid, Result, ShapeMismatch};

/// Project a fitted model over aligned covariate grids.
///
/// `grids` must be given in the order of the model's covariates and share one
/// shape. A cell whose value is no-data in any grid stays no-data in the
/// output; only the remaining cells are passed to the model. The output takes
/// its shape, sentinel and georeference from the first grid. A prediction
/// that happens to equal that sentinel reads back as no-data.
pub fn predict_raster(grids: &[&RasterGrid], model: &FittedModel) -> Result<RasterGrid> {
    let p = model.covariate_names().len();
    if grids.len() != p {
        return Err(ShapeMismatch::LayerCount {
            expected: p,
            found: grids.len(),
        }
        .into());
    }
    let first = grids[0];
    for grid in &grids[1..] {
        first.check_same_shape(grid)?;
    }

    let layers: Vec<Vec<f64>> = grids.iter().map(|g| g.to_row_major()).collect();
    let n_cells = first.nrows() * first.ncols();
    let valid: Vec<usize> = (0..n_cells)
        .filter(|&i| {
            grids
                .iter()
                .zip(layers.iter())
                .all(|(g, layer)| !g.is_nodata(layer[i]))
        })
        .collect();
    debug!("predicting {} of {} cells", valid.len(), n_cells);

    let mut cells = vec![first.nodata(); n_cells];
    if !valid.is_empty() {
        let design = DMatrix::from_fn(valid.len(), p, |r, c| layers[c][valid[r]]);
        let predicted = model.predict_design(&design)?;
        for (&i, v) in valid.iter().zip(predicted.iter()) {
            cells[i] = *v;
        }
    }

    let values = DMatrix::from_row_slice(first.nrows(), first.ncols(), &cells);

    Ok(first.with_values(values))
}

/// Like `predict_raster`, but matches layers to covariates by name so the
/// caller does not have to know the model's covariate order
pub fn predict_raster_by_name(
    layers: &[(&str, &RasterGrid)],
    model: &FittedModel,
) -> Result<RasterGrid> {
    let grids = model
        .covariate_names()
        .iter()
        .map(|name| {
            layers
                .iter()
                .find(|(layer, _)| layer == name)
                .map(|(_, grid)| *grid)
                .ok_or_else(|| RasterError::MissingLayer(name.clone()))
        })
        .collect::<Result<Vec<&RasterGrid>>>()?;
    if layers.len() > grids.len() {
        info!(
            "ignoring {} layers the model does not use",
            layers.len() - grids.len()
        );
    }

    predict_raster(&grids, model)
}
