//! Rule-based risk factor analysis.
//!
//! Flags measurements that cross fixed clinical thresholds. This runs
//! independently of the trained model: an empty profile only means none of
//! the coded thresholds were crossed, not that the patient is risk free.

use serde::{Deserialize, Serialize};

use super::features::{FeatureRecord, Gender};

/// A single coded risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    /// Glucose above 125
    Hyperglycemia,
    /// BMI of 30 or more
    Obesity,
    /// BMI in [25, 30)
    Overweight,
    /// Blood pressure above 90
    Hypertension,
    /// Age above 45
    AdvancedAge,
    /// Pedigree score above 0.5
    GeneticPredisposition,
    /// Female with at least one pregnancy
    GestationalRiskFactor,
}

impl RiskFactor {
    /// Human-readable flag text.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hyperglycemia => "hyperglycemia",
            Self::Obesity => "obesity",
            Self::Overweight => "overweight",
            Self::Hypertension => "hypertension",
            Self::AdvancedAge => "advanced age",
            Self::GeneticPredisposition => "genetic predisposition",
            Self::GestationalRiskFactor => "gestational risk factor",
        }
    }
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Risk factors raised for one record, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskProfile {
    factors: Vec<RiskFactor>,
}

impl RiskProfile {
    #[must_use]
    pub fn factors(&self) -> &[RiskFactor] {
        &self.factors
    }

    #[must_use]
    pub fn contains(&self, factor: RiskFactor) -> bool {
        self.factors.contains(&factor)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Flag texts in rule order.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.factors.iter().map(RiskFactor::label).collect()
    }
}

/// Evaluate the coded risk rules against a record.
#[must_use]
pub fn analyze(record: &FeatureRecord, gender: Gender) -> RiskProfile {
    let mut factors = Vec::new();

    if record.glucose > 125.0 {
        factors.push(RiskFactor::Hyperglycemia);
    }
    if record.bmi >= 30.0 {
        factors.push(RiskFactor::Obesity);
    } else if record.bmi >= 25.0 {
        factors.push(RiskFactor::Overweight);
    }
    if record.blood_pressure > 90.0 {
        factors.push(RiskFactor::Hypertension);
    }
    if record.age > 45.0 {
        factors.push(RiskFactor::AdvancedAge);
    }
    if record.pedigree_score > 0.5 {
        factors.push(RiskFactor::GeneticPredisposition);
    }
    if gender == Gender::Female && record.pregnancies > 0 {
        factors.push(RiskFactor::GestationalRiskFactor);
    }

    RiskProfile { factors }
}
