use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};
use tracing::info;

use crate::config::ClassifierConfig;
use crate::error::{FraudError, Result};

// Binary logistic regression fitted on one train partition.
#[derive(Debug, Clone)]
pub struct FraudClassifier {
    model: FittedLogisticRegression<f64, usize>,
    n_features: usize,
}

impl FraudClassifier {
    // Fit an L2-regularised logistic regression (L-BFGS) on `features` and
    // `labels`. Both labels must occur in the training rows.
    pub fn fit(
        config: &ClassifierConfig,
        features: &Array2<f64>,
        labels: &Array1<usize>,
    ) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(FraudError::LengthMismatch {
                left: features.nrows(),
                right: labels.len(),
            });
        }

        let dataset = Dataset::new(features.clone(), labels.clone());
        let model = LogisticRegression::default()
            .alpha(config.alpha)
            .max_iterations(config.max_iterations)
            .gradient_tolerance(config.gradient_tolerance)
            .with_intercept(true)
            .fit(&dataset)?;

        info!(
            rows = features.nrows(),
            features = features.ncols(),
            intercept = model.intercept(),
            "Logistic regression fitted"
        );

        Ok(Self {
            model,
            n_features: features.ncols(),
        })
    }

    // Hard 0/1 labels, thresholding the sigmoid of the linear score at 0.5.
    pub fn predict(&self, features: &Array2<f64>) -> Result<Array1<usize>> {
        if features.ncols() != self.n_features {
            return Err(FraudError::DimensionMismatch {
                expected: self.n_features,
                got: features.ncols(),
            });
        }
        Ok(self.model.predict(features))
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn weights(&self) -> &Array1<f64> {
        self.model.params()
    }

    pub fn intercept(&self) -> f64 {
        self.model.intercept()
    }
}
