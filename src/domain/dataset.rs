//! Labeled training data and the stratified train/test split.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::features::FeatureRecord;

/// A feature record with its binary outcome (0 = negative, 1 = positive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: FeatureRecord,
    pub outcome: u8,
}

/// Ordered, immutable collection of training samples.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingSet {
    samples: Vec<TrainingSample>,
}

impl TrainingSet {
    /// Wrap a list of samples.
    #[must_use]
    pub fn new(samples: Vec<TrainingSample>) -> Self {
        Self { samples }
    }

    #[must_use]
    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Feature matrix, one row per sample, columns in model order.
    #[must_use]
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.samples.iter().map(|s| s.features.to_vec()).collect()
    }

    /// Outcome labels in sample order.
    #[must_use]
    pub fn labels(&self) -> Vec<u8> {
        self.samples.iter().map(|s| s.outcome).collect()
    }

    /// Distinct outcome classes, sorted ascending.
    #[must_use]
    pub fn classes(&self) -> Vec<u8> {
        let mut classes: Vec<u8> = self.samples.iter().map(|s| s.outcome).collect();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    /// Number of samples with the given outcome.
    #[must_use]
    pub fn count_outcome(&self, outcome: u8) -> usize {
        self.samples.iter().filter(|s| s.outcome == outcome).count()
    }

    /// Fraction of positive samples, 0.0 for an empty set.
    #[must_use]
    pub fn positive_rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.count_outcome(1) as f64 / self.samples.len() as f64
    }

    /// Split into (train, test) partitions, stratified on outcome.
    ///
    /// The test partition holds `round(len * test_fraction)` samples. That
    /// total is shared out across classes in proportion to their counts
    /// (largest remainder first), so both partitions keep the class balance
    /// and the partition sizes do not drift with the number of classes.
    /// Sample selection and the order of each partition are shuffled with
    /// `seed`.
    #[must_use]
    pub fn stratified_split(&self, test_fraction: f64, seed: u64) -> (TrainingSet, TrainingSet) {
        let total = self.samples.len();
        if total == 0 {
            return (TrainingSet::default(), TrainingSet::default());
        }

        let fraction = test_fraction.clamp(0.0, 1.0);
        let n_test = ((total as f64 * fraction).round() as usize).min(total);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let groups: Vec<Vec<usize>> = self
            .classes()
            .into_iter()
            .map(|class| {
                let mut indices: Vec<usize> = self
                    .samples
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.outcome == class)
                    .map(|(i, _)| i)
                    .collect();
                indices.shuffle(&mut rng);
                indices
            })
            .collect();

        let mut quota: Vec<usize> = groups.iter().map(|g| n_test * g.len() / total).collect();
        let mut order: Vec<usize> = (0..groups.len()).collect();
        order.sort_by_key(|&k| std::cmp::Reverse(n_test * groups[k].len() % total));
        let mut remaining = n_test - quota.iter().sum::<usize>();
        for k in order {
            if remaining == 0 {
                break;
            }
            if quota[k] < groups[k].len() {
                quota[k] += 1;
                remaining -= 1;
            }
        }

        let mut train = Vec::with_capacity(total - n_test);
        let mut test = Vec::with_capacity(n_test);
        for (indices, n) in groups.iter().zip(quota) {
            let (test_idx, train_idx) = indices.split_at(n);
            test.extend_from_slice(test_idx);
            train.extend_from_slice(train_idx);
        }

        train.shuffle(&mut rng);
        test.shuffle(&mut rng);

        let pick = |idx: &[usize]| TrainingSet::new(idx.iter().map(|&i| self.samples[i]).collect());
        (pick(&train), pick(&test))
    }
}

impl FromIterator<TrainingSample> for TrainingSet {
    fn from_iter<I: IntoIterator<Item = TrainingSample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(positives: usize, negatives: usize) -> TrainingSet {
        (0..positives + negatives)
            .map(|i| TrainingSample {
                features: FeatureRecord {
                    glucose: i as f64,
                    ..Default::default()
                },
                outcome: u8::from(i < positives),
            })
            .collect()
    }

    #[test]
    fn test_stratified_split_preserves_balance() {
        let data = set_with(100, 400);
        let (train, test) = data.stratified_split(0.2, 42);

        assert_eq!(train.len() + test.len(), 500);
        assert_eq!(test.len(), 100);
        assert_eq!(test.count_outcome(1), 20);
        assert_eq!(train.count_outcome(1), 80);
        assert!((train.positive_rate() - test.positive_rate()).abs() < 1e-9);
    }

    #[test]
    fn test_split_partitions_are_disjoint() {
        let data = set_with(30, 70);
        let (train, test) = data.stratified_split(0.2, 7);

        let mut seen: Vec<f64> = train
            .samples()
            .iter()
            .chain(test.samples())
            .map(|s| s.features.glucose)
            .collect();
        seen.sort_by(f64::total_cmp);
        seen.dedup();
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn test_test_size_fixed_before_class_allocation() {
        // Each class alone would round 0.5 up to 1.
        let (train, test) = set_with(5, 5).stratified_split(0.1, 3);
        assert_eq!(test.len(), 1);
        assert_eq!(train.len(), 9);

        let (train, test) = set_with(3, 7).stratified_split(0.25, 3);
        assert_eq!(test.len(), 3);
        assert_eq!(test.count_outcome(1), 1);
        assert_eq!(test.count_outcome(0), 2);
        assert_eq!(train.len(), 7);
    }

    #[test]
    fn test_split_of_empty_set() {
        let (train, test) = TrainingSet::default().stratified_split(0.2, 1);
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_split_is_deterministic() {
        let data = set_with(30, 70);
        assert_eq!(data.stratified_split(0.2, 1), data.stratified_split(0.2, 1));
    }

    #[test]
    fn test_classes_and_rate() {
        let data = set_with(0, 10);
        assert_eq!(data.classes(), vec![0]);
        assert_eq!(data.positive_rate(), 0.0);
        assert_eq!(TrainingSet::default().positive_rate(), 0.0);
    }
}
