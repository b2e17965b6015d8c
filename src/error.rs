// Error types for the fraud detection pipeline.

use thiserror::Error;

// Result type alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, FraudError>;

// Every way a pipeline stage can fail. All of them are fatal for a run.
#[derive(Error, Debug)]
pub enum FraudError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column `{0}` not found")]
    MissingColumn(String),

    #[error("row {row}: column `{column}` holds non-finite value {value}")]
    MalformedValue {
        row: usize,
        column: String,
        value: f64,
    },

    #[error("row {row}: label {value} is not 0 or 1")]
    InvalidLabel { row: usize, value: f64 },

    #[error("dataset contains no rows")]
    EmptyDataset,

    #[error("column `{0}` is empty")]
    EmptyColumn(String),

    #[error("column `{column}` has zero interquartile range (median {median})")]
    DegenerateScale { column: String, median: f64 },

    #[error("{context}: requested {requested} rows but only {available} available")]
    InsufficientRows {
        context: &'static str,
        requested: usize,
        available: usize,
    },

    #[error("splitting {rows} rows with {test_rows} test rows leaves a partition empty")]
    EmptyPartition { rows: usize, test_rows: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("dimension mismatch: model expects {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("model error: {0}")]
    Model(#[from] linfa_logistic::error::Error),
}
