// Train/test partitioning.

use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::balancer::make_rng;
use crate::csv_reader::{TransactionTable, FRAUD, NON_FRAUD};
use crate::error::{FraudError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train: TransactionTable,
    pub test: TransactionTable,
}

// Number of test rows for `n` rows: `ceil(fraction * n)`, snapping values
// within 1e-9 of an integer first so that 0.3 * 10 stays 3.
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    let raw = test_fraction * n as f64;
    let nearest = raw.round();
    if (raw - nearest).abs() < 1e-9 {
        nearest as usize
    } else {
        raw.ceil() as usize
    }
}

// Split `table` into disjoint train and test partitions.
// Without `stratify` one seeded permutation of all rows is taken; its first
// `test_size` rows become the test partition and the rest the train
// partition. With `stratify` the test rows are apportioned between the two
// labels in proportion to their counts.
pub fn train_test_split(
    table: &TransactionTable,
    test_fraction: f64,
    seed: Option<u64>,
    stratify: bool,
) -> Result<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(FraudError::InvalidConfig(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let n = table.len();
    let n_test = test_size(n, test_fraction);
    if n_test == 0 || n_test >= n {
        return Err(FraudError::EmptyPartition { rows: n, test_rows: n_test });
    }

    let mut rng = make_rng(seed);
    let (train_idx, test_idx) = if stratify {
        let per_class = [table.indices_of(NON_FRAUD), table.indices_of(FRAUD)];
        let quotas = apportion(n_test, [per_class[0].len(), per_class[1].len()]);

        let mut train = Vec::with_capacity(n - n_test);
        let mut test = Vec::with_capacity(n_test);
        for (mut rows, quota) in per_class.into_iter().zip(quotas) {
            rows.shuffle(&mut rng);
            test.extend_from_slice(&rows[..quota]);
            train.extend_from_slice(&rows[quota..]);
        }
        train.shuffle(&mut rng);
        test.shuffle(&mut rng);
        (train, test)
    } else {
        let mut rows: Vec<usize> = (0..n).collect();
        rows.shuffle(&mut rng);
        let train = rows.split_off(n_test);
        (train, rows)
    };

    let split = TrainTestSplit {
        train: table.select(&train_idx),
        test: table.select(&test_idx),
    };

    let test_fraud = split.test.indices_of(FRAUD).len();
    debug!(
        train = split.train.len(),
        test = split.test.len(),
        test_fraud,
        stratify,
        "Split dataset"
    );
    if warrants_balance_warning(stratify, test_fraud, split.test.len()) {
        warn!(
            test_fraud,
            test_non_fraud = split.test.len() - test_fraud,
            "Test partition is not evenly balanced"
        );
    }

    Ok(split)
}

// Stratified splits are as even as the test size allows, so only plain ones warn
fn warrants_balance_warning(stratify: bool, test_fraud: usize, test_len: usize) -> bool {
    !stratify && test_fraud * 2 != test_len
}

// Share `total` between two classes proportionally to `counts` using largest
// remainders; ties go to the lower label.
fn apportion(total: usize, counts: [usize; 2]) -> [usize; 2] {
    let n: usize = counts.iter().sum();
    let exact = counts.map(|c| (total * c) as f64 / n as f64);
    let mut quotas = exact.map(|e| e.floor() as usize);

    let mut left = total - quotas.iter().sum::<usize>();
    let mut order = [0, 1];
    order.sort_by(|&a, &b| {
        let ra = exact[a] - quotas[a] as f64;
        let rb = exact[b] - quotas[b] as f64;
        rb.total_cmp(&ra)
    });
    for class in order {
        if left == 0 {
            break;
        }
        if quotas[class] < counts[class] {
            quotas[class] += 1;
            left -= 1;
        }
    }
    quotas
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use std::collections::HashSet;

    fn table(n_non_fraud: usize, n_fraud: usize) -> TransactionTable {
        let n = n_non_fraud + n_fraud;
        let features = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
        let labels: Vec<usize> = (0..n).map(|i| usize::from(i >= n_non_fraud)).collect();
        TransactionTable::new(vec!["V1".into()], features, Array1::from(labels)).unwrap()
    }

    fn ids(t: &TransactionTable) -> Vec<usize> {
        t.features.column(0).iter().map(|&v| v as usize).collect()
    }

    #[test]
    fn test_test_size_rounding() {
        assert_eq!(test_size(6, 0.3), 2);
        assert_eq!(test_size(10, 0.3), 3);
        assert_eq!(test_size(984, 0.3), 296);
        assert_eq!(test_size(7, 0.5), 4);
    }

    #[test]
    fn test_partitions_are_disjoint_and_cover_input() {
        let data = table(3, 3);
        let split = train_test_split(&data, 0.3, Some(42), false).unwrap();

        assert_eq!(split.train.len(), 4);
        assert_eq!(split.test.len(), 2);

        let train: HashSet<usize> = ids(&split.train).into_iter().collect();
        let test: HashSet<usize> = ids(&split.test).into_iter().collect();
        assert!(train.is_disjoint(&test));
        let union: HashSet<usize> = train.union(&test).copied().collect();
        assert_eq!(union, (0..6).collect::<HashSet<usize>>());
    }

    #[test]
    fn test_same_seed_same_partitions() {
        let data = table(50, 50);
        let a = train_test_split(&data, 0.3, Some(42), false).unwrap();
        let b = train_test_split(&data, 0.3, Some(42), false).unwrap();
        assert_eq!(a, b);

        let c = train_test_split(&data, 0.3, Some(43), false).unwrap();
        assert_ne!(ids(&a.test), ids(&c.test));
    }

    #[test]
    fn test_stratified_test_partition_is_balanced() {
        let data = table(50, 50);
        for seed in 0..10 {
            let split = train_test_split(&data, 0.3, Some(seed), true).unwrap();
            assert_eq!(split.test.len(), 30);
            let fraud = split.test.indices_of(FRAUD).len();
            assert_eq!(fraud, 15);
        }

        let odd = table(3, 3);
        let split = train_test_split(&odd, 0.5, Some(1), true).unwrap();
        let fraud = split.test.indices_of(FRAUD).len();
        let non_fraud = split.test.len() - fraud;
        assert!(fraud.abs_diff(non_fraud) <= 1);
    }

    #[test]
    fn test_uneven_test_partition_warns_only_without_stratify() {
        assert!(warrants_balance_warning(false, 1, 3));
        assert!(!warrants_balance_warning(false, 2, 4));
        // odd stratified test size cannot be split evenly
        assert!(!warrants_balance_warning(true, 1, 3));
    }

    #[test]
    fn test_apportion_largest_remainder() {
        assert_eq!(apportion(2, [3, 3]), [1, 1]);
        assert_eq!(apportion(3, [3, 3]), [2, 1]);
        assert_eq!(apportion(3, [1, 9]), [0, 3]);
    }

    #[test]
    fn test_invalid_fraction() {
        let data = table(3, 3);
        for fraction in [0.0, 1.0, -0.2, f64::NAN] {
            assert!(matches!(
                train_test_split(&data, fraction, Some(1), false),
                Err(FraudError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_too_few_rows() {
        let data = table(1, 0);
        assert!(matches!(
            train_test_split(&data, 0.3, Some(1), false),
            Err(FraudError::EmptyPartition {
                rows: 1,
                test_rows: 1
            })
        ));

        let pair = table(1, 1);
        assert!(matches!(
            train_test_split(&pair, 0.9, Some(1), false),
            Err(FraudError::EmptyPartition {
                rows: 2,
                test_rows: 2
            })
        ));
    }
}
