// Entry point for the undersampling fraud classifier. Parses arguments, runs the pipeline and prints the reports.
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{Cli, PipelineConfig};
use pipeline::{run, PipelineOutcome};

mod balancer;
mod classifier;
mod config;
mod csv_reader;
mod error;
mod evaluator;
mod pipeline;
mod scaler;
mod splitter;

// Prints the dataset summary, confusion matrix and classification report
// Inputs: outcome of a pipeline run
// Outputs: formatted text on stdout
fn print_outcome(outcome: &PipelineOutcome) {
    println!("Transactions: {}", outcome.total_rows);
    println!(
        "Fraudulent: {} ({:.3}%)",
        outcome.fraud_rows,
        100.0 * outcome.fraud_rows as f64 / outcome.total_rows.max(1) as f64
    );
    println!(
        "Balanced subset: {} rows (train {}, test {})",
        outcome.balanced_rows, outcome.train_rows, outcome.test_rows
    );

    println!("\n{}", outcome.confusion);
    println!("\nClassification Report:\n{}", outcome.report);
}

// Main entry point
// Key steps:
// 1. Set up logging on stderr
// 2. Build the run configuration from the command line
// 3. Run the pipeline and print the reports
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fraud_undersampling=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = PipelineConfig::from(Cli::parse());
    let outcome = run(&config)
        .with_context(|| format!("pipeline failed for {}", config.data_path.display()))?;

    print_outcome(&outcome);
    Ok(())
}
