//! Seeded, label-stratified train/test partitioning

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Share of each class held out for evaluation
pub const TEST_FRACTION: f64 = 0.3;

/// Seed used for every training run
pub const SPLIT_SEED: u64 = 42;

/// Row indices of the two partitions, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so each label keeps its proportion in both partitions
///
/// Classes with at least two rows contribute at least one row to each side.
pub fn stratified_split(labels: &[f64], test_fraction: f64, seed: u64) -> Partition {
    let mut by_class: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(label.to_bits()).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for (_, mut indices) in by_class {
        indices.shuffle(&mut rng);

        let n = indices.len();
        let mut n_test = (n as f64 * test_fraction).round() as usize;
        if n >= 2 {
            n_test = n_test.clamp(1, n - 1);
        } else {
            n_test = 0;
        }

        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Partition { train, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pos: usize, neg: usize) -> Vec<f64> {
        let mut l = vec![1.0; pos];
        l.extend(vec![0.0; neg]);
        l
    }

    #[test]
    fn test_partitions_cover_all_rows_once() {
        let y = labels(40, 60);
        let p = stratified_split(&y, TEST_FRACTION, SPLIT_SEED);

        let mut all: Vec<usize> = p.train.iter().chain(&p.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_class_proportions_preserved() {
        let y = labels(40, 60);
        let p = stratified_split(&y, TEST_FRACTION, SPLIT_SEED);

        let test_pos = p.test.iter().filter(|&&i| y[i] == 1.0).count();
        let test_neg = p.test.len() - test_pos;
        assert_eq!(test_pos, 12);
        assert_eq!(test_neg, 18);
        assert_eq!(p.train.len(), 70);
    }

    #[test]
    fn test_same_seed_same_split() {
        let y = labels(25, 33);
        assert_eq!(
            stratified_split(&y, TEST_FRACTION, 7),
            stratified_split(&y, TEST_FRACTION, 7)
        );
    }

    #[test]
    fn test_small_classes() {
        // Two rows: one each side. One row: train only.
        let y = vec![1.0, 1.0, 0.0];
        let p = stratified_split(&y, TEST_FRACTION, SPLIT_SEED);
        assert_eq!(p.test.len(), 1);
        assert!(p.train.contains(&2));
    }
}
