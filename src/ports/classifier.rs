//! Classifier port: Trait for a fitted binary classifier.
//!
//! The classifier only sees bare vectors; callers are responsible for
//! building them in [`crate::domain::Feature::ALL`] order.

/// Errors raised by a classifier while scoring a vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Feature count mismatch: got {got}, expected {expected}")]
    ShapeMismatch { got: usize, expected: usize },

    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Malformed model: {0}")]
    Malformed(String),
}

/// Probability distribution over the classes seen during training.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbabilities {
    /// Observed classes, sorted ascending
    pub classes: Vec<u8>,

    /// Probability per class, same order as `classes`
    pub probabilities: Vec<f64>,
}

impl ClassProbabilities {
    /// Class with the highest probability (first wins on ties).
    #[must_use]
    pub fn argmax(&self) -> Option<u8> {
        let mut best: Option<(u8, f64)> = None;
        for (&class, &p) in self.classes.iter().zip(&self.probabilities) {
            match best {
                Some((_, bp)) if p <= bp => {}
                _ => best = Some((class, p)),
            }
        }
        best.map(|(class, _)| class)
    }

    /// Probability of a specific class, if it was observed in training.
    #[must_use]
    pub fn probability_of(&self, class: u8) -> Option<f64> {
        self.classes
            .iter()
            .position(|&c| c == class)
            .map(|i| self.probabilities[i])
    }
}

/// Trait for a fitted classifier.
///
/// Implementations must be immutable after fitting so a single instance can
/// be shared across threads without locking.
pub trait Classifier: Send + Sync {
    /// Number of features each input vector must have.
    fn n_features(&self) -> usize;

    /// Classes observed during training, sorted ascending.
    fn classes(&self) -> &[u8];

    /// Probability distribution over [`Classifier::classes`].
    ///
    /// # Errors
    /// Returns `ClassifierError::ShapeMismatch` if `x` has the wrong length.
    fn predict_proba(&self, x: &[f64]) -> Result<ClassProbabilities, ClassifierError>;

    /// Most probable class.
    ///
    /// # Errors
    /// Returns error if scoring fails.
    fn predict(&self, x: &[f64]) -> Result<u8, ClassifierError> {
        self.predict_proba(x)?
            .argmax()
            .ok_or(ClassifierError::NotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_and_lookup() {
        let dist = ClassProbabilities {
            classes: vec![0, 1],
            probabilities: vec![0.25, 0.75],
        };
        assert_eq!(dist.argmax(), Some(1));
        assert_eq!(dist.probability_of(0), Some(0.25));
        assert_eq!(dist.probability_of(2), None);
    }

    #[test]
    fn test_argmax_tie_and_empty() {
        let tie = ClassProbabilities {
            classes: vec![0, 1],
            probabilities: vec![0.5, 0.5],
        };
        assert_eq!(tie.argmax(), Some(0));

        let empty = ClassProbabilities {
            classes: vec![],
            probabilities: vec![],
        };
        assert_eq!(empty.argmax(), None);
    }
}
