//! Reading and writing the ESRI ASCII grid format.
//!
//! A file starts with a header of `key value` lines:
//! `ncols`, `nrows`, `xllcorner` or `xllcenter`, `yllcorner` or `yllcenter`,
//! `cellsize` and an optional `nodata_value`. Keys are case-insensitive.
//! The header is followed by `nrows * ncols` whitespace separated values,
//! northernmost row first.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::{CellOrigin, Georeference, RasterError, RasterGrid, Result, DEFAULT_NODATA};

#[derive(Default)]
struct Header {
    ncols: Option<usize>,
    nrows: Option<usize>,
    x: Option<(f64, CellOrigin)>,
    y: Option<(f64, CellOrigin)>,
    cell_size: Option<f64>,
    nodata: Option<f64>,
}

fn parse_err(line: usize, message: impl Into<String>) -> RasterError {
    RasterError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_number<T: std::str::FromStr>(line: usize, token: &str) -> Result<T> {
    token
        .parse::<T>()
        .map_err(|_| parse_err(line, format!("`{}` is not a valid number", token)))
}

impl Header {
    fn complete(&self) -> bool {
        self.ncols.is_some()
            && self.nrows.is_some()
            && self.x.is_some()
            && self.y.is_some()
            && self.cell_size.is_some()
    }

    /// Try to read a header line. Returns false once the line is not a
    /// header line.
    fn accept(&mut self, line: usize, text: &str) -> Result<bool> {
        let mut tokens = text.split_whitespace();
        let (key, value) = match (tokens.next(), tokens.next()) {
            (Some(k), Some(v)) => (k.to_ascii_lowercase(), v),
            _ => return Ok(false),
        };
        match key.as_str() {
            "ncols" => self.ncols = Some(parse_number(line, value)?),
            "nrows" => self.nrows = Some(parse_number(line, value)?),
            "xllcorner" => self.x = Some((parse_number(line, value)?, CellOrigin::Corner)),
            "xllcenter" => self.x = Some((parse_number(line, value)?, CellOrigin::Center)),
            "yllcorner" => self.y = Some((parse_number(line, value)?, CellOrigin::Corner)),
            "yllcenter" => self.y = Some((parse_number(line, value)?, CellOrigin::Center)),
            "cellsize" => self.cell_size = Some(parse_number(line, value)?),
            "nodata_value" => self.nodata = Some(parse_number(line, value)?),
            _ => return Ok(false),
        }
        if tokens.next().is_some() {
            return Err(parse_err(line, format!("trailing tokens after `{}`", key)));
        }

        Ok(true)
    }
}

/// Read an ASCII grid
pub fn read_ascii_grid<R: BufRead>(reader: R) -> Result<RasterGrid> {
    let mut header = Header::default();
    let mut cells: Vec<f64> = Vec::new();
    let mut in_header = true;
    let mut last_line = 0;

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        last_line = line_no;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if in_header {
            if header.accept(line_no, &line)? {
                continue;
            }
            if !header.complete() {
                return Err(parse_err(line_no, "incomplete header"));
            }
            in_header = false;
            let (nrows, ncols) = (header.nrows.unwrap_or(0), header.ncols.unwrap_or(0));
            cells.reserve(nrows * ncols);
        }
        for token in line.split_whitespace() {
            cells.push(parse_number(line_no, token)?);
        }
    }

    if !header.complete() {
        return Err(parse_err(last_line, "incomplete header"));
    }
    let (nrows, ncols, (x, x_origin), (y, y_origin), cell_size) = match header {
        Header {
            nrows: Some(nrows),
            ncols: Some(ncols),
            x: Some(x),
            y: Some(y),
            cell_size: Some(cell_size),
            ..
        } => (nrows, ncols, x, y, cell_size),
        _ => return Err(parse_err(last_line, "incomplete header")),
    };
    if x_origin != y_origin {
        return Err(parse_err(
            last_line,
            "x and y lower left coordinates use different cell origins",
        ));
    }
    if cells.len() != nrows * ncols {
        return Err(parse_err(
            last_line,
            format!(
                "expected {} values for a {}x{} grid, found {}",
                nrows * ncols,
                nrows,
                ncols,
                cells.len()
            ),
        ));
    }
    let nodata = header.nodata.unwrap_or(DEFAULT_NODATA);
    debug!("read {}x{} grid with nodata {}", nrows, ncols, nodata);

    let grid = RasterGrid::from_row_major(nrows, ncols, &cells, nodata)?;

    Ok(grid.with_georeference(Georeference {
        x_lower_left: x,
        y_lower_left: y,
        cell_size,
        origin: x_origin,
    }))
}

pub fn read_ascii_grid_file<P: AsRef<Path>>(path: P) -> Result<RasterGrid> {
    info!("reading grid {}", path.as_ref().display());
    read_ascii_grid(BufReader::new(File::open(path)?))
}

/// Write `grid` as an ASCII grid. No-data cells, NaN included, are written
/// as the grid's sentinel.
pub fn write_ascii_grid<W: Write>(grid: &RasterGrid, mut writer: W) -> Result<()> {
    let geo = grid.georeference();
    let (x_key, y_key) = match geo.origin {
        CellOrigin::Corner => ("xllcorner", "yllcorner"),
        CellOrigin::Center => ("xllcenter", "yllcenter"),
    };
    writeln!(writer, "ncols {}", grid.ncols())?;
    writeln!(writer, "nrows {}", grid.nrows())?;
    writeln!(writer, "{} {}", x_key, geo.x_lower_left)?;
    writeln!(writer, "{} {}", y_key, geo.y_lower_left)?;
    writeln!(writer, "cellsize {}", geo.cell_size)?;
    writeln!(writer, "NODATA_value {}", grid.nodata())?;

    for r in 0..grid.nrows() {
        let row: Vec<String> = (0..grid.ncols())
            .map(|c| grid.get(r, c).unwrap_or(grid.nodata()).to_string())
            .collect();
        writeln!(writer, "{}", row.join(" "))?;
    }
    writer.flush()?;

    Ok(())
}

pub fn write_ascii_grid_file<P: AsRef<Path>>(grid: &RasterGrid, path: P) -> Result<()> {
    info!("writing grid {}", path.as_ref().display());
    write_ascii_grid(grid, BufWriter::new(File::create(path)?))
}
