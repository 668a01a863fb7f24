use std::{io::Read, path::Path};

use lin_reg::{FittedModel, LinReg};

use crate::{Error, Result};

/// The point sample dataset: named numeric columns of equal length without
/// missing values. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl SampleTable {
    /// Create a new table from column names and the matching column vectors
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(Error::DimensionMismatch {
                expected: names.len(),
                found: columns.len(),
            });
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(Error::DuplicateColumn(name.clone()));
            }
        }
        let n_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        for (name, column) in names.iter().zip(columns.iter()) {
            if column.len() != n_rows {
                return Err(Error::DimensionMismatch {
                    expected: n_rows,
                    found: column.len(),
                });
            }
            if let Some(row) = column.iter().position(|v| !v.is_finite()) {
                return Err(Error::InvalidValue {
                    row,
                    column: name.clone(),
                    value: column[row].to_string(),
                });
            }
        }

        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    /// Read a table from delimited text with a header row naming the columns
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    /// Read a table from a delimited text file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("loading samples from {}", path.as_ref().display());

        Self::from_csv(csv::Reader::from_path(path.as_ref())?)
    }

    fn from_csv<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self> {
        let names: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            if record.len() != names.len() {
                return Err(Error::DimensionMismatch {
                    expected: names.len(),
                    found: record.len(),
                });
            }
            for (j, field) in record.iter().enumerate() {
                let value = field.trim().parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(
                    || Error::InvalidValue {
                        row,
                        column: names[j].clone(),
                        value: field.to_string(),
                    },
                )?;
                columns[j].push(value);
            }
        }
        debug!("read {} columns, {} rows", names.len(), columns.first().map(|c| c.len()).unwrap_or(0));

        Self::new(names, columns)
    }

    /// Number of sample rows
    #[inline(always)]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Column names in file order
    #[inline(always)]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// The values of the named column
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// A new table holding only the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.n_rows) {
            return Err(Error::RowOutOfRange {
                index,
                n_rows: self.n_rows,
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|c| indices.iter().map(|&i| c[i]).collect())
            .collect();

        Ok(Self {
            names: self.names.clone(),
            columns,
            n_rows: indices.len(),
        })
    }

    /// Fit `response ~ covariates` with an intercept on all rows of the table
    pub fn fit<R: LinReg>(
        &self,
        regressor: &R,
        response: &str,
        covariates: &[&str],
    ) -> Result<FittedModel> {
        let y = self.column(response)?;
        let xs = covariates
            .iter()
            .map(|name| self.column(name).map(|values| (*name, values)))
            .collect::<Result<Vec<(&str, &[f64])>>>()?;

        Ok(FittedModel::fit(regressor, response, y, &xs)?)
    }

    /// Apply `model` to the given rows, looking covariates up by the model's names
    pub fn predict(&self, model: &FittedModel, rows: &[usize]) -> Result<Vec<f64>> {
        let xs = model
            .covariate_names()
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<&[f64]>>>()?;

        let mut row_values = vec![0.0; xs.len()];
        rows.iter()
            .map(|&i| {
                if i >= self.n_rows {
                    return Err(Error::RowOutOfRange {
                        index: i,
                        n_rows: self.n_rows,
                    });
                }
                for (v, x) in row_values.iter_mut().zip(xs.iter()) {
                    *v = x[i];
                }
                Ok(model.predict(&row_values)?)
            })
            .collect()
    }
}
