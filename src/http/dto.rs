//! Request and response bodies of the JSON API.
//!
//! Patient listings and upload summaries use camelCase keys for the
//! dashboard frontend; prediction and analysis bodies use snake_case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{CohortReport, UploadSummary};
use crate::domain::{
    CohortFilter, DataSource, Percentiles, PatientRecord, RiskPrediction, StoredPatient,
};

/// Default size of a generated synthetic cohort.
pub const DEFAULT_GENERATED: usize = 100;

/// Number of sample predictions echoed back after an upload.
const UPLOAD_SAMPLE: usize = 5;

/// Flattened patient entry as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientView {
    pub id: String,
    pub age: u32,
    pub sex: String,
    pub race: String,
    pub medications: Vec<String>,
    pub comorbidities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_group: Option<String>,
    pub risk_score: f64,
    pub predicted_events: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub data_source: DataSource,
    pub confidence: f64,
}

impl From<&StoredPatient> for PatientView {
    fn from(p: &StoredPatient) -> Self {
        Self {
            id: p.record.patient_id.clone(),
            age: p.record.age,
            sex: p.record.sex.clone(),
            race: p.record.race.clone(),
            medications: p.record.medications.clone(),
            comorbidities: p.record.comorbidities.clone(),
            study_group: p.record.study_group.clone(),
            risk_score: p.prediction.risk_score,
            predicted_events: p.prediction.predicted_events.clone(),
            last_updated: p.prediction.last_updated,
            data_source: p.data_source(),
            confidence: p.prediction.confidence,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PatientsQuery {
    pub group: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CreatePatientResponse {
    pub message: String,
    pub patient: PatientView,
    pub prediction: RiskPrediction,
}

#[derive(Debug, Serialize)]
pub struct UploadedPrediction {
    pub patient: PatientRecord,
    pub prediction: RiskPrediction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub total_rows: usize,
    pub processed_rows: usize,
    pub skipped_rows: usize,
    pub data_source: DataSource,
    pub predictions: Vec<UploadedPrediction>,
}

impl UploadResponse {
    #[must_use]
    pub fn new(summary: UploadSummary, source: DataSource) -> Self {
        let processed = summary.stored.len();
        Self {
            message: format!("Successfully processed {processed} patients"),
            total_rows: summary.total_rows,
            processed_rows: processed,
            skipped_rows: summary.skipped_rows,
            data_source: source,
            predictions: summary
                .stored
                .into_iter()
                .take(UPLOAD_SAMPLE)
                .map(|p| UploadedPrediction {
                    patient: p.record,
                    prediction: p.prediction,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub patients: Vec<PatientRecord>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub total_patients: usize,
    pub successful_predictions: usize,
    pub predictions: Vec<RiskPrediction>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CohortRequest {
    pub patients: Vec<PatientRecord>,
    #[serde(default)]
    pub filters: Option<CohortFilter>,
    #[serde(default)]
    pub include_percentiles: bool,
    #[serde(default)]
    pub require_non_empty: bool,
}

#[derive(Debug, Serialize)]
pub struct SpreadView {
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

#[derive(Debug, Serialize)]
pub struct CohortResponse {
    pub cohort_size: usize,
    pub average_risk: f64,
    pub median_risk: f64,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    pub risk_distribution: SpreadView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<Percentiles>,
    pub predictions: Vec<RiskPrediction>,
}

impl From<CohortReport> for CohortResponse {
    fn from(report: CohortReport) -> Self {
        let stats = report.stats;
        Self {
            cohort_size: stats.cohort_size,
            average_risk: stats.mean,
            median_risk: stats.median,
            high_risk_count: stats.buckets.high,
            medium_risk_count: stats.buckets.medium,
            low_risk_count: stats.buckets.low,
            risk_distribution: SpreadView {
                min: stats.min,
                max: stats.max,
                std: stats.std,
            },
            percentiles: stats.percentiles,
            predictions: report.predictions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SyntheticResponse {
    pub generated_patients: usize,
    pub patients: Vec<PatientRecord>,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub status: &'static str,
    pub kumo_connected: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub kumo_rfm: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct Capabilities {
    pub adverse_event_prediction: bool,
    pub risk_scoring: bool,
    pub cohort_analysis: bool,
    pub real_time_monitoring: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelStatusResponse {
    pub kumo_connected: bool,
    pub model_type: &'static str,
    pub api_key_configured: bool,
    pub last_check: DateTime<Utc>,
    pub capabilities: Capabilities,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::synthetic::synthetic_prediction;
    use crate::domain::FALLBACK_MODEL_VERSION;

    #[test]
    fn test_patient_view_keys() {
        let record = PatientRecord::new("P-7", 64, "M").with_medications(["Warfarin"]);
        let prediction = synthetic_prediction(&record, FALLBACK_MODEL_VERSION);
        let view = PatientView::from(&StoredPatient::new(record, prediction));

        let json = serde_json::to_value(&view).expect("Should serialize");
        for key in [
            "id",
            "riskScore",
            "predictedEvents",
            "lastUpdated",
            "dataSource",
            "confidence",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("studyGroup").is_none());
        assert_eq!(json["dataSource"], "mock");
    }

    #[test]
    fn test_cohort_request_defaults() {
        let req: CohortRequest =
            serde_json::from_str(r#"{"patients": [{"age": 50, "sex": "F"}]}"#)
                .expect("Should deserialize");
        assert_eq!(req.patients.len(), 1);
        assert!(req.filters.is_none());
        assert!(!req.include_percentiles);
        assert!(!req.require_non_empty);
    }
}
