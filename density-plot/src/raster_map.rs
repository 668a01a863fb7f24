use plotters::prelude::*;
use spatial::RasterGrid;

use crate::{error::drawing, PlotError, Result};

/// Blue for the lowest value through red for the highest
fn value_color(t: f64) -> HSLColor {
    HSLColor((1.0 - t.clamp(0.0, 1.0)) * 240.0 / 360.0, 0.75, 0.5)
}

/// Draw `grid` as a heat map with row 0 at the top. No-data cells stay blank.
pub fn plot_raster(grid: &RasterGrid, title: &str, filename: &str, dims: (u32, u32)) -> Result<()> {
    let (lo, hi) = grid.value_range().ok_or(PlotError::EmptySeries)?;
    info!(
        "plotting {}x{} grid with values in [{}, {}] to {}",
        grid.nrows(),
        grid.ncols(),
        lo,
        hi,
        filename
    );
    let nrows = grid.nrows() as i32;
    let ncols = grid.ncols() as i32;
    let span = hi - lo;

    let root_area = BitMapBackend::new(filename, dims).into_drawing_area();
    root_area.fill(&WHITE).map_err(drawing)?;
    let (map_area, scale_area) = root_area.split_horizontally(dims.0 * 9 / 10);

    let mut cc = ChartBuilder::on(&map_area)
        .margin(5)
        .set_all_label_area_size(30)
        .caption(title, ("sans-serif", 20).into_font().with_color(&BLACK))
        .build_cartesian_2d(0..ncols, 0..nrows)
        .map_err(drawing)?;
    cc.configure_mesh().disable_mesh().draw().map_err(drawing)?;

    let cells = (0..grid.nrows()).flat_map(|r| (0..grid.ncols()).map(move |c| (r, c)));
    cc.draw_series(cells.filter_map(|(r, c)| {
        let v = grid.get(r, c)?;
        let t = if span > 0.0 { (v - lo) / span } else { 0.5 };
        let (x, y) = (c as i32, nrows - r as i32);
        Some(Rectangle::new([(x, y - 1), (x + 1, y)], value_color(t).filled()))
    }))
    .map_err(drawing)?;

    let steps = 50;
    let mut scale = ChartBuilder::on(&scale_area)
        .margin(5)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..1.0, lo..(if span > 0.0 { hi } else { lo + 1.0 }))
        .map_err(drawing)?;
    scale
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_label_formatter(&|v| format!("{:.2}", v))
        .draw()
        .map_err(drawing)?;
    let step = (if span > 0.0 { span } else { 1.0 }) / steps as f64;
    scale
        .draw_series((0..steps).map(|i| {
            let y = lo + i as f64 * step;
            Rectangle::new(
                [(0.0, y), (1.0, y + step)],
                value_color(i as f64 / (steps - 1) as f64).filled(),
            )
        }))
        .map_err(drawing)?;

    root_area.present().map_err(drawing)?;

    info!("successfully plotted to {}", filename);

    Ok(())
}

#[cfg(test)]
mod tests {
    use spatial::DEFAULT_NODATA;

    use super::*;

    #[test]
    fn colors_run_from_blue_to_red() {
        assert_eq!(value_color(0.0).0, 240.0 / 360.0);
        assert_eq!(value_color(1.0).0, 0.0);
        assert_eq!(value_color(7.0).0, 0.0);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let grid = RasterGrid::from_rows(&[vec![DEFAULT_NODATA; 3]], DEFAULT_NODATA).unwrap();
        assert!(matches!(
            plot_raster(&grid, "empty", "unused.png", (100, 100)),
            Err(PlotError::EmptySeries)
        ));
    }
}
