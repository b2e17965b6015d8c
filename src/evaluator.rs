// Confusion matrix and classification report for binary predictions.

use std::fmt;

use ndarray::Array1;

use crate::csv_reader::{FRAUD, NON_FRAUD};
use crate::error::{FraudError, Result};

pub const CLASS_NAMES: [&str; 2] = ["non-fraud", "fraud"];

// 2x2 counts with fraud as the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    // Count (actual, predicted) pairs aligned by row.
    pub fn from_labels(actual: &Array1<usize>, predicted: &Array1<usize>) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(FraudError::LengthMismatch {
                left: actual.len(),
                right: predicted.len(),
            });
        }

        let mut cm = Self::default();
        for (row, (&a, &p)) in actual.iter().zip(predicted.iter()).enumerate() {
            match (a, p) {
                (NON_FRAUD, NON_FRAUD) => cm.tn += 1,
                (NON_FRAUD, FRAUD) => cm.fp += 1,
                (FRAUD, NON_FRAUD) => cm.fn_ += 1,
                (FRAUD, FRAUD) => cm.tp += 1,
                _ => {
                    return Err(FraudError::InvalidLabel {
                        row,
                        value: a.max(p) as f64,
                    })
                }
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    // Rows are actual labels, columns predicted labels.
    pub fn as_grid(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [[tn, fp], [fn_, tp]] = self.as_grid();
        writeln!(f, "Confusion Matrix:")?;
        writeln!(f, "              Predicted 0  Predicted 1")?;
        writeln!(f, "Actual 0   {:>13}{:>13}", tn, fp)?;
        write!(f, "Actual 1   {:>13}{:>13}", fn_, tp)
    }
}

// Precision, recall, F1 and support for one class (or an average row).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(tp: usize, fp: usize, fn_: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

// Zero denominators report 0.0
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    // Indexed by label: `[non-fraud, fraud]`.
    pub per_class: [ClassMetrics; 2],
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        // non-fraud treated as positive: its TP is our TN
        let non_fraud = ClassMetrics::from_counts(cm.tn, cm.fn_, cm.fp);
        let fraud = ClassMetrics::from_counts(cm.tp, cm.fp, cm.fn_);
        let per_class = [non_fraud, fraud];
        let total = cm.total();

        let macro_avg = ClassMetrics {
            precision: (non_fraud.precision + fraud.precision) / 2.0,
            recall: (non_fraud.recall + fraud.recall) / 2.0,
            f1: (non_fraud.f1 + fraud.f1) / 2.0,
            support: total,
        };

        let weighted = |get: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                per_class
                    .iter()
                    .map(|m| get(m) * m.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
            support: total,
        };

        Self {
            per_class,
            accuracy: ratio(cm.tn + cm.tp, total),
            macro_avg,
            weighted_avg,
        }
    }

    pub fn support(&self) -> usize {
        self.macro_avg.support
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14}{:>11}{:>11}{:>11}{:>11}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (name, m) in CLASS_NAMES.iter().zip(self.per_class.iter()) {
            writeln!(
                f,
                "{:>14}{:>11.2}{:>11.2}{:>11.2}{:>11}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14}{:>11}{:>11}{:>11.2}{:>11}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support()
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14}{:>11.2}{:>11.2}{:>11.2}{:>11}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        Ok(())
    }
}
