//! Held-out evaluation metrics.

use serde::{Deserialize, Serialize};

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged precision, recall and F1.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class and averaged metrics for a set of predictions.
///
/// Undefined ratios (no predicted or no true samples of a class) are 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Fraction of matching labels, 0.0 for empty input.
#[must_use]
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    ratio(correct, y_true.len().min(y_pred.len()))
}

impl ClassificationReport {
    /// Compute the report over the union of true and predicted classes.
    #[must_use]
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut classes: Vec<u8> = y_true.iter().chain(y_pred).copied().collect();
        classes.sort_unstable();
        classes.dedup();

        let per_class: Vec<ClassMetrics> = classes
            .iter()
            .map(|&class| {
                let tp = y_true
                    .iter()
                    .zip(y_pred)
                    .filter(|(t, p)| **t == class && **p == class)
                    .count();
                let predicted = y_pred.iter().filter(|p| **p == class).count();
                let support = y_true.iter().filter(|t| **t == class).count();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let total: usize = per_class.iter().map(|m| m.support).sum();
        let k = per_class.len().max(1) as f64;

        let macro_avg = AverageMetrics {
            precision: per_class.iter().map(|m| m.precision).sum::<f64>() / k,
            recall: per_class.iter().map(|m| m.recall).sum::<f64>() / k,
            f1: per_class.iter().map(|m| m.f1).sum::<f64>() / k,
            support: total,
        };

        let weight = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                per_class
                    .iter()
                    .map(|m| f(m) * m.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = AverageMetrics {
            precision: weight(|m| m.precision),
            recall: weight(|m| m.recall),
            f1: weight(|m| m.f1),
            support: total,
        };

        Self {
            per_class,
            accuracy: accuracy(y_true, y_pred),
            macro_avg,
            weighted_avg,
        }
    }
}

impl std::fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.class, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert!((accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]) - 0.75).abs() < 1e-12);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_report_values() {
        let y_true = [0, 0, 0, 1, 1];
        let y_pred = [0, 0, 1, 1, 0];
        let report = ClassificationReport::from_predictions(&y_true, &y_pred);

        assert_eq!(report.per_class.len(), 2);
        let c0 = report.per_class[0];
        assert_eq!(c0.support, 3);
        assert!((c0.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((c0.recall - 2.0 / 3.0).abs() < 1e-12);

        let c1 = report.per_class[1];
        assert_eq!(c1.support, 2);
        assert!((c1.precision - 0.5).abs() < 1e-12);
        assert!((c1.recall - 0.5).abs() < 1e-12);

        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert_eq!(report.macro_avg.support, 5);
        assert!((report.weighted_avg.recall - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_missing_predictions_give_zero() {
        let report = ClassificationReport::from_predictions(&[0, 1, 1], &[0, 0, 0]);
        let c1 = report.per_class[1];
        assert_eq!(c1.precision, 0.0);
        assert_eq!(c1.recall, 0.0);
        assert_eq!(c1.f1, 0.0);
    }

    #[test]
    fn test_display_lists_classes() {
        let report = ClassificationReport::from_predictions(&[0, 1], &[0, 1]);
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("1.00"));
    }
}
