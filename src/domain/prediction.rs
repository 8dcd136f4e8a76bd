//! Prediction result types.
//!
//! Represents the output of the random forest diabetes classifier.

use serde::{Deserialize, Serialize};

/// Coarse bucket of the predicted risk score for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Risk score below 0.3
    Low,
    /// Risk score in [0.3, 0.7)
    Moderate,
    /// Risk score of 0.7 or more
    High,
}

impl RiskLevel {
    /// Bucket a risk score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            Self::Low
        } else if score < 0.7 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low estimated diabetes risk",
            Self::Moderate => "Moderate estimated diabetes risk, consider screening",
            Self::High => "High estimated diabetes risk, HbA1c or fasting glucose test advised",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        };
        f.write_str(label)
    }
}

/// Classifier output for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class (0 = not diabetic, 1 = diabetic)
    pub label: u8,

    /// Probability of the positive class (0.0 to 1.0)
    pub risk_score: f64,
}

impl Prediction {
    /// Build a prediction from the classifier's class list and probabilities.
    ///
    /// The label is the class with the highest probability (first wins on
    /// ties). The risk score is the probability of class 1; when the model
    /// only ever saw one class, it is the probability of that class.
    ///
    /// # Errors
    /// Returns a description of the defect if the distribution is empty,
    /// the two lists differ in length, a class is not 0 or 1, or a
    /// two-class distribution has no positive class.
    pub fn from_distribution(classes: &[u8], probabilities: &[f64]) -> Result<Self, String> {
        if classes.is_empty() {
            return Err("empty class distribution".into());
        }
        if classes.len() != probabilities.len() {
            return Err(format!(
                "{} classes but {} probabilities",
                classes.len(),
                probabilities.len()
            ));
        }
        if let Some(c) = classes.iter().find(|&&c| c > 1) {
            return Err(format!("class {c} is not a binary outcome"));
        }

        let mut best = 0;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > probabilities[best] {
                best = i;
            }
        }
        let label = classes[best];

        let risk_score = if classes.len() > 1 {
            let positive = classes
                .iter()
                .position(|&c| c == 1)
                .ok_or_else(|| format!("no positive class among {classes:?}"))?;
            probabilities[positive]
        } else {
            probabilities[0]
        };

        Ok(Self { label, risk_score })
    }

    /// Whether the positive class was predicted.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.label == 1
    }

    /// Display text for the predicted class.
    #[must_use]
    pub fn verdict(&self) -> &'static str {
        if self.is_positive() {
            "Diabetic"
        } else {
            "Not Diabetic"
        }
    }

    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}
