// Robust scaling: centre on the median, divide by the interquartile range.

use ndarray::{Array1, ArrayView1};
use tracing::debug;

use crate::csv_reader::TransactionTable;
use crate::error::{FraudError, Result};

// Statistics fitted on one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobustScaler {
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
}

impl RobustScaler {
    // Fit median and quartiles on `column`. `name` is only used in errors.
    pub fn fit(name: &str, column: ArrayView1<'_, f64>) -> Result<Self> {
        if column.is_empty() {
            return Err(FraudError::EmptyColumn(name.to_string()));
        }

        let mut sorted = column.to_vec();
        sorted.sort_by(f64::total_cmp);

        let scaler = Self {
            median: percentile(&sorted, 0.50),
            q1: percentile(&sorted, 0.25),
            q3: percentile(&sorted, 0.75),
        };
        if scaler.iqr() == 0.0 {
            return Err(FraudError::DegenerateScale {
                column: name.to_string(),
                median: scaler.median,
            });
        }
        Ok(scaler)
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    pub fn transform(&self, x: f64) -> f64 {
        (x - self.median) / self.iqr()
    }

    pub fn transform_column(&self, column: ArrayView1<'_, f64>) -> Array1<f64> {
        column.mapv(|x| self.transform(x))
    }
}

// Percentile of an ascending slice, interpolating linearly between the two
// closest ranks. `q` is in [0, 1]; `sorted` must be non-empty.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// Robust-scale the column `name` of `table` in place and rename it to
// `new_name`. Returns the fitted statistics.
pub fn scale_column_in_place(
    table: &mut TransactionTable,
    name: &str,
    new_name: &str,
) -> Result<RobustScaler> {
    let column = table.column(name)?;
    let scaler = RobustScaler::fit(name, column)?;
    let scaled = scaler.transform_column(column);

    let idx = table.column_index(name)?;
    table.features.column_mut(idx).assign(&scaled);
    table.feature_names[idx] = new_name.to_string();

    debug!(
        column = name,
        median = scaler.median,
        iqr = scaler.iqr(),
        "Column robust-scaled"
    );
    Ok(scaler)
}
