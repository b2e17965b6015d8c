// Run configuration and command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{FraudError, Result};

pub const DEFAULT_CSV_FILE_PATH: &str = "creditcard.csv";
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TEST_FRACTION: f64 = 0.3;

// Logistic regression solver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    // L2 penalty strength
    pub alpha: f64,
    pub max_iterations: u64,
    pub gradient_tolerance: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            max_iterations: 100,
            gradient_tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub data_path: PathBuf,
    // `None` draws balancing and splitting randomness from OS entropy
    pub seed: Option<u64>,
    pub test_fraction: f64,
    pub stratify: bool,
    pub classifier: ClassifierConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_CSV_FILE_PATH),
            seed: Some(DEFAULT_SEED),
            test_fraction: DEFAULT_TEST_FRACTION,
            stratify: false,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(FraudError::InvalidConfig(format!(
                "test fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if !(self.classifier.alpha >= 0.0) {
            return Err(FraudError::InvalidConfig(format!(
                "alpha must be non-negative, got {}",
                self.classifier.alpha
            )));
        }
        if self.classifier.max_iterations == 0 {
            return Err(FraudError::InvalidConfig(
                "max iterations must be positive".to_string(),
            ));
        }
        if !(self.classifier.gradient_tolerance > 0.0) {
            return Err(FraudError::InvalidConfig(format!(
                "gradient tolerance must be positive, got {}",
                self.classifier.gradient_tolerance
            )));
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Undersample labeled card transactions and evaluate a logistic regression fraud classifier"
)]
pub struct Cli {
    /// Transactions CSV with Time, V1..Vn, Amount and Class columns
    #[arg(default_value = DEFAULT_CSV_FILE_PATH)]
    pub input: PathBuf,

    /// Seed for undersampling and the train/test split
    #[arg(long, default_value_t = DEFAULT_SEED, conflicts_with = "no_seed")]
    pub seed: u64,

    /// Draw randomness from the OS instead of a fixed seed
    #[arg(long)]
    pub no_seed: bool,

    /// Fraction of the balanced rows held out for testing
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    pub test_fraction: f64,

    /// Keep the label ratio equal in both partitions
    #[arg(long)]
    pub stratify: bool,

    /// L2 regularisation strength
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Solver iteration cap
    #[arg(long, default_value_t = 100)]
    pub max_iterations: u64,
}

impl From<Cli> for PipelineConfig {
    fn from(cli: Cli) -> Self {
        Self {
            data_path: cli.input,
            seed: if cli.no_seed { None } else { Some(cli.seed) },
            test_fraction: cli.test_fraction,
            stratify: cli.stratify,
            classifier: ClassifierConfig {
                alpha: cli.alpha,
                max_iterations: cli.max_iterations,
                ..ClassifierConfig::default()
            },
        }
    }
}
