// Random undersampling of the majority class.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::csv_reader::{TransactionTable, FRAUD, NON_FRAUD};
use crate::error::{FraudError, Result};

// Seeded generator, or one drawn from OS entropy when no seed is given.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// `(non_fraud, fraud)` label counts.
pub fn class_counts(table: &TransactionTable) -> (usize, usize) {
    let fraud = table.labels.iter().filter(|&&l| l == FRAUD).count();
    (table.len() - fraud, fraud)
}

fn other_class(label: usize) -> usize {
    if label == FRAUD {
        NON_FRAUD
    } else {
        FRAUD
    }
}

// Keep every row labelled `keep_class`, then append an equal number of rows
// drawn uniformly without replacement from the other class.
// Kept rows come first; sampled rows follow in their original relative
// order. Fails when the other class has fewer rows than the kept one.
pub fn undersample(
    table: &TransactionTable,
    keep_class: usize,
    seed: Option<u64>,
) -> Result<TransactionTable> {
    if keep_class > FRAUD {
        return Err(FraudError::InvalidConfig(format!(
            "class to keep must be 0 or 1, got {}",
            keep_class
        )));
    }

    let kept = table.indices_of(keep_class);
    if kept.is_empty() {
        return Err(FraudError::InsufficientRows {
            context: "undersampling",
            requested: 1,
            available: 0,
        });
    }
    let pool = table.indices_of(other_class(keep_class));
    if pool.len() < kept.len() {
        return Err(FraudError::InsufficientRows {
            context: "undersampling",
            requested: kept.len(),
            available: pool.len(),
        });
    }

    let mut rng = make_rng(seed);
    let mut picked: Vec<usize> = index::sample(&mut rng, pool.len(), kept.len())
        .into_iter()
        .map(|i| pool[i])
        .collect();
    picked.sort_unstable();

    debug!(
        kept = kept.len(),
        pool = pool.len(),
        sampled = picked.len(),
        "Undersampled majority class"
    );

    let mut rows = kept;
    rows.extend(picked);
    Ok(table.select(&rows))
}

// Undersample whichever class is more frequent down to the size of the
// other one. On a tie the fraud rows are the ones kept whole.
pub fn balance(table: &TransactionTable, seed: Option<u64>) -> Result<TransactionTable> {
    let (non_fraud, fraud) = class_counts(table);
    let minority = if fraud <= non_fraud { FRAUD } else { NON_FRAUD };

    info!(non_fraud, fraud, minority, "Balancing classes");
    undersample(table, minority, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    // Row i has feature value i, so rows can be traced through selection.
    fn table_with_labels(labels: &[usize]) -> TransactionTable {
        let n = labels.len();
        let features = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        TransactionTable::new(vec!["V1".into()], features, Array1::from(labels.to_vec()))
            .unwrap()
    }

    #[test]
    fn test_balanced_size_is_twice_minority() {
        let table = table_with_labels(&[0, 0, 1, 0, 0, 1, 0, 0, 0, 1]);
        let balanced = balance(&table, Some(42)).unwrap();

        assert_eq!(balanced.len(), 6);
        assert_eq!(class_counts(&balanced), (3, 3));
    }

    #[test]
    fn test_fraud_rows_come_first_and_are_all_kept() {
        let table = table_with_labels(&[0, 1, 0, 0, 1, 0]);
        let balanced = undersample(&table, FRAUD, Some(7)).unwrap();

        assert_eq!(balanced.labels.to_vec(), vec![1, 1, 0, 0]);
        assert_eq!(balanced.features[[0, 0]], 1.0);
        assert_eq!(balanced.features[[1, 0]], 4.0);
        // sampled rows are distinct non-fraud rows in ascending order
        let a = balanced.features[[2, 0]];
        let b = balanced.features[[3, 0]];
        assert!(a < b);
        assert_eq!(table.labels[a as usize], NON_FRAUD);
        assert_eq!(table.labels[b as usize], NON_FRAUD);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let labels: Vec<usize> = (0..200).map(|i| usize::from(i % 9 == 0)).collect();
        let table = table_with_labels(&labels);

        let first = balance(&table, Some(42)).unwrap();
        let second = balance(&table, Some(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_requesting_more_than_available_fails() {
        let table = table_with_labels(&[1, 1, 1, 0]);
        match undersample(&table, FRAUD, Some(1)) {
            Err(FraudError::InsufficientRows {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 3);
                assert_eq!(available, 1);
            }
            other => panic!("expected InsufficientRows, got {:?}", other),
        }
    }

    #[test]
    fn test_balance_keeps_non_fraud_when_it_is_minority() {
        let table = table_with_labels(&[1, 1, 1, 0]);
        let balanced = balance(&table, Some(1)).unwrap();
        assert_eq!(balanced.labels.to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_single_label_table_fails_at_balancing() {
        let table = table_with_labels(&[0, 0, 0]);
        match balance(&table, Some(42)) {
            Err(FraudError::InsufficientRows {
                context,
                requested,
                available,
            }) => {
                assert_eq!(context, "undersampling");
                assert_eq!(requested, 1);
                assert_eq!(available, 0);
            }
            other => panic!("expected InsufficientRows, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_keep_class() {
        let table = table_with_labels(&[0, 1]);
        assert!(matches!(
            undersample(&table, 2, None),
            Err(FraudError::InvalidConfig(_))
        ));
    }
}
