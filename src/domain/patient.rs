//! Patient record types and feature extraction.
//!
//! Records follow the FAERS-derived upload format. Feature extraction
//! produces the fixed ten-component vector consumed by the external model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Number of components in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 10;

/// Feature names in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "sex",
    "medication_count",
    "comorbidity_count",
    "creatinine",
    "alt",
    "ast",
    "systolic_bp",
    "diastolic_bp",
    "heart_rate",
];

// Reference values used when a lab or vital is not reported.
const DEFAULT_CREATININE: f64 = 1.0;
const DEFAULT_ALT: f64 = 30.0;
const DEFAULT_AST: f64 = 30.0;
const DEFAULT_BP_SYSTOLIC: f64 = 120.0;
const DEFAULT_BP_DIASTOLIC: f64 = 80.0;
const DEFAULT_HEART_RATE: f64 = 70.0;

/// Raw patient data as received from uploads or API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Patient identifier (unique within the store once assigned)
    #[serde(default)]
    pub patient_id: String,

    /// Age in years
    pub age: u32,

    /// Sex, `M` or `F` in practice but any string is accepted
    pub sex: String,

    #[serde(default = "default_race")]
    pub race: String,

    /// Drug names, in reported order
    #[serde(default)]
    pub medications: Vec<String>,

    /// Condition names, in reported order
    #[serde(default)]
    pub comorbidities: Vec<String>,

    /// Lab name -> value (`creatinine`, `alt`, `ast`, ...)
    #[serde(default)]
    pub lab_results: HashMap<String, f64>,

    /// Vital name -> value (`bp_systolic`, `bp_diastolic`, `heart_rate`, ...)
    #[serde(default)]
    pub vital_signs: HashMap<String, f64>,

    #[serde(default)]
    pub study_group: Option<String>,
}

fn default_race() -> String {
    "Unknown".to_string()
}

impl PatientRecord {
    /// Create a record with the required attributes and empty optional fields.
    #[must_use]
    pub fn new(patient_id: impl Into<String>, age: u32, sex: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            age,
            sex: sex.into(),
            race: default_race(),
            medications: Vec::new(),
            comorbidities: Vec::new(),
            lab_results: HashMap::new(),
            vital_signs: HashMap::new(),
            study_group: None,
        }
    }

    #[must_use]
    pub fn with_medications<I, S>(mut self, medications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.medications = medications.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_comorbidities<I, S>(mut self, comorbidities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comorbidities = comorbidities.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_study_group(mut self, group: impl Into<String>) -> Self {
        self.study_group = Some(group.into());
        self
    }

    fn lab(&self, name: &str, default: f64) -> f64 {
        self.lab_results.get(name).copied().unwrap_or(default)
    }

    fn vital(&self, name: &str, default: f64) -> f64 {
        self.vital_signs.get(name).copied().unwrap_or(default)
    }
}

/// Fixed-order numeric encoding of a patient record.
///
/// Order matches [`FEATURE_NAMES`]. Values are not clamped, so inputs outside
/// the usual clinical ranges produce components greater than one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Extract features from a patient record.
    #[must_use]
    pub fn extract(record: &PatientRecord) -> Self {
        Self([
            f64::from(record.age) / 100.0,
            if record.sex == "M" { 1.0 } else { 0.0 },
            record.medications.len() as f64 / 10.0,
            record.comorbidities.len() as f64 / 5.0,
            record.lab("creatinine", DEFAULT_CREATININE),
            record.lab("alt", DEFAULT_ALT) / 100.0,
            record.lab("ast", DEFAULT_AST) / 100.0,
            record.vital("bp_systolic", DEFAULT_BP_SYSTOLIC) / 200.0,
            record.vital("bp_diastolic", DEFAULT_BP_DIASTOLIC) / 120.0,
            record.vital("heart_rate", DEFAULT_HEART_RATE) / 120.0,
        ])
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_extract_defaults() {
        let record = PatientRecord::new("P-1", 70, "M")
            .with_medications(["Metformin", "Lisinopril"])
            .with_comorbidities(["diabetes"]);

        let features = FeatureVector::extract(&record);
        let v = features.as_slice();
        assert_eq!(v.len(), FEATURE_COUNT);
        assert!(approx(v[0], 0.7));
        assert!(approx(v[1], 1.0));
        assert!(approx(v[2], 0.2));
        assert!(approx(v[3], 0.2));
        assert!(approx(v[4], 1.0));
        assert!(approx(v[5], 0.3));
        assert!(approx(v[6], 0.3));
        assert!(approx(v[7], 0.6));
        assert!(approx(v[8], 80.0 / 120.0));
        assert!(approx(v[9], 70.0 / 120.0));
    }

    #[test]
    fn test_extract_uses_reported_values() {
        let mut record = PatientRecord::new("P-2", 40, "F");
        record.lab_results.insert("creatinine".into(), 2.4);
        record.lab_results.insert("alt".into(), 85.0);
        record.vital_signs.insert("bp_systolic".into(), 180.0);
        record.vital_signs.insert("heart_rate".into(), 96.0);

        let v = FeatureVector::extract(&record).to_vec();
        assert!(approx(v[1], 0.0));
        assert!(approx(v[4], 2.4));
        assert!(approx(v[5], 0.85));
        assert!(approx(v[7], 0.9));
        assert!(approx(v[9], 0.8));
    }

    #[test]
    fn test_extract_does_not_clamp() {
        let record = PatientRecord::new("P-3", 120, "m");
        let v = FeatureVector::extract(&record);
        assert!(v.0[0] > 1.0);
        // only an exact "M" encodes as male
        assert!(approx(v.0[1], 0.0));
    }

    #[test]
    fn test_record_deserializes_with_defaults() {
        let json = r#"{"patient_id":"P-9","age":55,"sex":"F"}"#;
        let record: PatientRecord = serde_json::from_str(json).expect("Should parse");
        assert_eq!(record.race, "Unknown");
        assert!(record.medications.is_empty());
        assert!(record.lab_results.is_empty());
        assert!(record.study_group.is_none());
    }
}
