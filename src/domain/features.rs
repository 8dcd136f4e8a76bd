//! Clinical feature record for diabetes risk prediction.
//!
//! The field order of [`FeatureRecord`] is the wire contract between callers,
//! the training pipeline and the persisted classifier. It is defined once by
//! [`Feature::ALL`] and every vector conversion goes through it.

use serde::{Deserialize, Serialize};

/// Number of features the classifier is trained on.
pub const FEATURE_COUNT: usize = 8;

/// Feature names in model order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "pregnancies",
    "glucose",
    "blood_pressure",
    "skin_thickness",
    "insulin",
    "bmi",
    "pedigree_score",
    "age",
];

/// A single clinical measurement, in model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Pregnancies,
    Glucose,
    BloodPressure,
    SkinThickness,
    Insulin,
    Bmi,
    PedigreeScore,
    Age,
}

impl Feature {
    /// All features in the order the classifier expects.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Self::Pregnancies,
        Self::Glucose,
        Self::BloodPressure,
        Self::SkinThickness,
        Self::Insulin,
        Self::Bmi,
        Self::PedigreeScore,
        Self::Age,
    ];

    /// Position of this feature in the model vector.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Schema name of this feature.
    #[must_use]
    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    /// Closed interval synthetic values are clipped into.
    #[must_use]
    pub fn valid_range(self) -> (f64, f64) {
        match self {
            Self::Pregnancies => (0.0, 17.0),
            Self::Glucose => (50.0, 300.0),
            Self::BloodPressure => (40.0, 180.0),
            Self::SkinThickness => (0.0, 100.0),
            Self::Insulin => (0.0, 900.0),
            Self::Bmi => (15.0, 70.0),
            Self::PedigreeScore => (0.0, 3.0),
            Self::Age => (18.0, 120.0),
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Patient gender, used only by the rule-based risk analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    #[default]
    Other,
}

/// The eight clinical measurements used for training and inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureRecord {
    /// Number of pregnancies
    pub pregnancies: u32,

    /// Plasma glucose concentration (mg/dL)
    pub glucose: f64,

    /// Diastolic blood pressure (mm Hg)
    pub blood_pressure: f64,

    /// Triceps skin fold thickness (mm)
    pub skin_thickness: f64,

    /// 2-hour serum insulin (mu U/ml)
    pub insulin: f64,

    /// Body mass index (kg/m^2)
    pub bmi: f64,

    /// Diabetes pedigree function
    pub pedigree_score: f64,

    /// Age in years
    pub age: f64,
}

impl FeatureRecord {
    /// Value of a single feature.
    #[must_use]
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Pregnancies => f64::from(self.pregnancies),
            Feature::Glucose => self.glucose,
            Feature::BloodPressure => self.blood_pressure,
            Feature::SkinThickness => self.skin_thickness,
            Feature::Insulin => self.insulin,
            Feature::Bmi => self.bmi,
            Feature::PedigreeScore => self.pedigree_score,
            Feature::Age => self.age,
        }
    }

    /// Convert to the ordered vector the classifier consumes.
    #[must_use]
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        Feature::ALL.map(|f| self.get(f))
    }

    /// Convert to a heap vector in model order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    /// Build a record from a vector in model order.
    ///
    /// The pregnancy count is rounded and floored at zero.
    ///
    /// # Errors
    /// Returns error if the vector length is not [`FEATURE_COUNT`].
    pub fn from_vec(v: &[f64]) -> Result<Self, String> {
        if v.len() != FEATURE_COUNT {
            return Err(format!(
                "Expected {FEATURE_COUNT} features, got {}",
                v.len()
            ));
        }

        Ok(Self {
            pregnancies: v[0].round().max(0.0) as u32,
            glucose: v[1],
            blood_pressure: v[2],
            skin_thickness: v[3],
            insulin: v[4],
            bmi: v[5],
            pedigree_score: v[6],
            age: v[7],
        })
    }

    /// Features whose values fall outside the entry form's input bounds.
    ///
    /// Carries no measurement values, so the result is safe to log.
    #[must_use]
    pub fn out_of_range_fields(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|&feature| {
                let value = self.get(feature);
                match feature {
                    Feature::Pregnancies => self.pregnancies > 20,
                    Feature::Age => !(1.0..=120.0).contains(&value),
                    _ => !value.is_finite() || value < 0.0,
                }
            })
            .collect()
    }

    /// Validate the record against the input bounds of the entry form.
    ///
    /// Inference does not call this; callers that accept user input should.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.pregnancies > 20 {
            errors.push(format!(
                "Pregnancies {} out of range [0, 20]",
                self.pregnancies
            ));
        }
        if !(1.0..=120.0).contains(&self.age) {
            errors.push(format!("Age {} out of range [1, 120]", self.age));
        }

        for feature in &Feature::ALL[1..FEATURE_COUNT - 1] {
            let value = self.get(*feature);
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{feature} {value} must be a finite value >= 0"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureRecord {
        FeatureRecord {
            pregnancies: 2,
            glucose: 130.0,
            blood_pressure: 95.0,
            skin_thickness: 20.0,
            insulin: 85.0,
            bmi: 32.0,
            pedigree_score: 0.6,
            age: 50.0,
        }
    }

    #[test]
    fn test_vector_follows_schema_order() {
        let v = sample().to_vec();
        assert_eq!(v, vec![2.0, 130.0, 95.0, 20.0, 85.0, 32.0, 0.6, 50.0]);

        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
            assert_eq!(feature.name(), FEATURE_NAMES[i]);
        }
    }

    #[test]
    fn test_from_vec() {
        let record = FeatureRecord::from_vec(&sample().to_vec()).expect("Should parse");
        assert_eq!(record, sample());

        assert!(FeatureRecord::from_vec(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_validation() {
        assert!(sample().validate().is_ok());

        let invalid = FeatureRecord {
            pregnancies: 25,
            glucose: -1.0,
            age: 0.0,
            ..sample()
        };
        let errors = invalid.validate().expect_err("Should reject");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_out_of_range_fields_names_only() {
        assert!(sample().out_of_range_fields().is_empty());

        let invalid = FeatureRecord {
            glucose: f64::NAN,
            insulin: -4.0,
            age: 130.0,
            ..sample()
        };
        assert_eq!(
            invalid.out_of_range_fields(),
            vec![Feature::Glucose, Feature::Insulin, Feature::Age]
        );
    }

    #[test]
    fn test_serde_uses_schema_names() {
        let json = serde_json::to_value(sample()).expect("serialize");
        for name in FEATURE_NAMES {
            assert!(json.get(name).is_some(), "missing {name}");
        }
    }
}
