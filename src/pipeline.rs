// Stage orchestration: scale, balance, split, fit, evaluate.

use tracing::{debug, info};

use crate::balancer::{balance, class_counts};
use crate::classifier::FraudClassifier;
use crate::config::PipelineConfig;
use crate::csv_reader::{read_transactions, TransactionTable, AMOUNT_COLUMN, TIME_COLUMN};
use crate::error::{FraudError, Result};
use crate::evaluator::{ClassificationReport, ConfusionMatrix};
use crate::scaler::scale_column_in_place;
use crate::splitter::train_test_split;

pub const SCALED_TIME_COLUMN: &str = "scaled_time";
pub const SCALED_AMOUNT_COLUMN: &str = "scaled_amount";

// Everything a run reports.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub total_rows: usize,
    pub fraud_rows: usize,
    pub balanced_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
}

// Load the CSV named by `config` and run every stage on it.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    config.validate()?;
    info!(path = %config.data_path.display(), "Loading transactions");
    let table = read_transactions(&config.data_path)?;
    run_on_table(table, config)
}

// Run every stage on an already loaded table.
pub fn run_on_table(mut table: TransactionTable, config: &PipelineConfig) -> Result<PipelineOutcome> {
    config.validate()?;

    if table.is_empty() {
        return Err(FraudError::EmptyDataset);
    }
    let total_rows = table.len();
    let (non_fraud_rows, fraud_rows) = class_counts(&table);
    info!(
        rows = total_rows,
        features = table.n_features(),
        fraud = fraud_rows,
        non_fraud = non_fraud_rows,
        fraud_pct = format!("{:.3}%", 100.0 * fraud_rows as f64 / total_rows.max(1) as f64),
        "Dataset loaded"
    );

    scale_column_in_place(&mut table, AMOUNT_COLUMN, SCALED_AMOUNT_COLUMN)?;
    scale_column_in_place(&mut table, TIME_COLUMN, SCALED_TIME_COLUMN)?;

    let balanced = balance(&table, config.seed)?;
    info!(rows = balanced.len(), "Balanced subset built");

    let split = train_test_split(&balanced, config.test_fraction, config.seed, config.stratify)?;
    info!(
        train = split.train.len(),
        test = split.test.len(),
        "Train/test partitions ready"
    );

    let model = FraudClassifier::fit(&config.classifier, &split.train.features, &split.train.labels)?;
    debug!(
        n_features = model.n_features(),
        intercept = model.intercept(),
        weights = ?model.weights(),
        "Model coefficients"
    );
    let predicted = model.predict(&split.test.features)?;

    let confusion = ConfusionMatrix::from_labels(&split.test.labels, &predicted)?;
    let report = ClassificationReport::from_confusion(&confusion);
    info!(accuracy = report.accuracy, "Evaluation complete");

    Ok(PipelineOutcome {
        total_rows,
        fraud_rows,
        balanced_rows: balanced.len(),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        confusion,
        report,
    })
}
