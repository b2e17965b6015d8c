use std::fs::File;
use std::io::Read;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::Deserialize;

use crate::error::{FraudError, Result};

pub const TIME_COLUMN: &str = "Time";
pub const AMOUNT_COLUMN: &str = "Amount";
pub const LABEL_COLUMN: &str = "Class";

pub const NON_FRAUD: usize = 0;
pub const FRAUD: usize = 1;

// One CSV row, every cell parsed as a number (quoted cells included)
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawRow {
    values: Vec<f64>,
}

// Labeled transactions held fully in memory.
// `features` has one row per transaction and one column per entry of
// `feature_names`; the label column is kept apart in `labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionTable {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub labels: Array1<usize>,
}

impl TransactionTable {
    // Build a table from parts, checking the shape and the binary label invariant.
    pub fn new(
        feature_names: Vec<String>,
        features: Array2<f64>,
        labels: Array1<usize>,
    ) -> Result<Self> {
        if features.ncols() != feature_names.len() {
            return Err(FraudError::LengthMismatch {
                left: features.ncols(),
                right: feature_names.len(),
            });
        }
        if features.nrows() != labels.len() {
            return Err(FraudError::LengthMismatch {
                left: features.nrows(),
                right: labels.len(),
            });
        }
        if let Some((row, &value)) = labels.iter().enumerate().find(|(_, &l)| l > FRAUD) {
            return Err(FraudError::InvalidLabel {
                row: row + 1,
                value: value as f64,
            });
        }

        Ok(Self {
            feature_names,
            features,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| FraudError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self.column_index(name)?;
        Ok(self.features.column(idx))
    }

    // Rows at `indices`, in the order given.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
        }
    }

    // Row indices carrying `label`, in table order.
    pub fn indices_of(&self, label: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == label)
            .map(|(i, _)| i)
            .collect()
    }
}

// Load a transaction table from a CSV file with a header row.
pub fn read_transactions<P: AsRef<Path>>(file_path: P) -> Result<TransactionTable> {
    let file = File::open(file_path)?;
    parse_transactions(file)
}

// Parse a transaction table from any reader.
// The header must name `Time`, `Amount` and `Class`; every other column is
// treated as an anonymized numeric feature. Labels outside {0, 1} and
// non-finite feature values are rejected with the offending row number
// (1-based, header excluded).
pub fn parse_transactions<R: Read>(reader: R) -> Result<TransactionTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let label_idx = headers
        .iter()
        .position(|h| h == LABEL_COLUMN)
        .ok_or_else(|| FraudError::MissingColumn(LABEL_COLUMN.to_string()))?;
    for required in [TIME_COLUMN, AMOUNT_COLUMN] {
        if !headers.iter().any(|h| h == required) {
            return Err(FraudError::MissingColumn(required.to_string()));
        }
    }

    let feature_names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_idx)
        .map(|(_, h)| h.clone())
        .collect();

    let mut values = Vec::new();
    let mut labels = Vec::new();
    for (i, result) in rdr.deserialize::<RawRow>().enumerate() {
        let row = i + 1;
        let raw = result?;
        for (col, &value) in raw.values.iter().enumerate() {
            if col == label_idx {
                labels.push(parse_label(row, value)?);
            } else if !value.is_finite() {
                return Err(FraudError::MalformedValue {
                    row,
                    column: headers[col].clone(),
                    value,
                });
            } else {
                values.push(value);
            }
        }
    }

    if labels.is_empty() {
        return Err(FraudError::EmptyDataset);
    }

    let features = Array2::from_shape_vec((labels.len(), feature_names.len()), values)?;
    TransactionTable::new(feature_names, features, Array1::from(labels))
}

fn parse_label(row: usize, value: f64) -> Result<usize> {
    if value == 0.0 {
        Ok(NON_FRAUD)
    } else if value == 1.0 {
        Ok(FRAUD)
    } else {
        Err(FraudError::InvalidLabel { row, value })
    }
}
