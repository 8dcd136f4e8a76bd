//! Per-metric qualitative bands.
//!
//! Band edges are part of the public behaviour: each comparison below is
//! either strict or inclusive on purpose and must not be normalised.

use serde::{Deserialize, Serialize};

use super::features::FeatureRecord;

/// Metrics that have a band table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Glucose,
    BloodPressure,
    Bmi,
    Age,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Self::Glucose, Self::BloodPressure, Self::Bmi, Self::Age];

    /// The metric's value on a record.
    #[must_use]
    pub fn value_of(self, record: &FeatureRecord) -> f64 {
        match self {
            Self::Glucose => record.glucose,
            Self::BloodPressure => record.blood_pressure,
            Self::Bmi => record.bmi,
            Self::Age => record.age,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Glucose => write!(f, "Glucose"),
            Self::BloodPressure => write!(f, "Blood Pressure"),
            Self::Bmi => write!(f, "BMI"),
            Self::Age => write!(f, "Age"),
        }
    }
}

/// Qualitative band label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Low,
    Normal,
    Elevated,
    High,
    Underweight,
    Overweight,
    Obese,
    Young,
    Adult,
    Senior,
}

impl Band {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Normal => "Normal",
            Self::Elevated => "Elevated",
            Self::High => "High",
            Self::Underweight => "Underweight",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
            Self::Young => "Young",
            Self::Adult => "Adult",
            Self::Senior => "Senior",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Assign the band for a single metric value.
#[must_use]
pub fn status(value: f64, metric: Metric) -> Band {
    match metric {
        Metric::Glucose => {
            if value < 70.0 {
                Band::Low
            } else if value <= 100.0 {
                Band::Normal
            } else if value <= 125.0 {
                Band::Elevated
            } else {
                Band::High
            }
        }
        Metric::BloodPressure => {
            if value < 80.0 {
                Band::Normal
            } else if value <= 89.0 {
                Band::Elevated
            } else {
                Band::High
            }
        }
        Metric::Bmi => {
            if value < 18.5 {
                Band::Underweight
            } else if value < 25.0 {
                Band::Normal
            } else if value < 30.0 {
                Band::Overweight
            } else {
                Band::Obese
            }
        }
        Metric::Age => {
            if value < 30.0 {
                Band::Young
            } else if value < 50.0 {
                Band::Adult
            } else {
                Band::Senior
            }
        }
    }
}

/// One banded measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStatus {
    pub metric: Metric,
    pub value: f64,
    pub band: Band,
}

/// Bands for every banded metric of a record, in [`Metric::ALL`] order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusReport {
    pub entries: Vec<MetricStatus>,
}

impl StatusReport {
    #[must_use]
    pub fn for_record(record: &FeatureRecord) -> Self {
        let entries = Metric::ALL
            .iter()
            .map(|&metric| {
                let value = metric.value_of(record);
                MetricStatus {
                    metric,
                    value,
                    band: status(value, metric),
                }
            })
            .collect();
        Self { entries }
    }

    /// Band assigned to a metric, if it is part of the report.
    #[must_use]
    pub fn band(&self, metric: Metric) -> Option<Band> {
        self.entries
            .iter()
            .find(|e| e.metric == metric)
            .map(|e| e.band)
    }
}
