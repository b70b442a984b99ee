//! Stored patient entries and group selection for listings.

use serde::{Deserialize, Serialize};

use super::patient::PatientRecord;
use super::prediction::{DataSource, RiskPrediction};

/// A patient record joined with its most recent prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPatient {
    pub record: PatientRecord,
    pub prediction: RiskPrediction,
}

impl StoredPatient {
    #[must_use]
    pub fn new(record: PatientRecord, prediction: RiskPrediction) -> Self {
        Self { record, prediction }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.record.patient_id
    }

    #[must_use]
    pub fn risk_score(&self) -> f64 {
        self.prediction.risk_score
    }

    #[must_use]
    pub fn data_source(&self) -> DataSource {
        self.prediction.data_source()
    }
}

/// Parsed `group` selector of a patient listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupFilter {
    /// `<name>-group`: case-insensitive substring of any medication
    Medication(String),
    /// Historical study names: case-sensitive substring of any medication
    Legacy(&'static str),
    /// Anything else: exact study-group tag
    StudyGroup(String),
}

impl GroupFilter {
    /// Parse a selector. `None` for empty, `all` and `none`, which list everything.
    #[must_use]
    pub fn parse(group: &str) -> Option<Self> {
        let group = group.trim();
        match group {
            "" | "all" | "none" => None,
            "metformin-study" => Some(Self::Legacy("Metformin")),
            "warfarin-study" => Some(Self::Legacy("Warfarin")),
            _ => match group.strip_suffix("-group") {
                Some(name) => Some(Self::Medication(name.replace('-', " ").to_lowercase())),
                None => Some(Self::StudyGroup(group.to_string())),
            },
        }
    }

    #[must_use]
    pub fn matches(&self, record: &PatientRecord) -> bool {
        match self {
            Self::Medication(name) => record
                .medications
                .iter()
                .any(|m| m.to_lowercase().contains(name.as_str())),
            Self::Legacy(name) => record.medications.iter().any(|m| m.contains(name)),
            Self::StudyGroup(tag) => record.study_group.as_deref() == Some(tag.as_str()),
        }
    }
}
