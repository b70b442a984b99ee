//! Alerts derived from stored patient predictions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::prediction::DataSource;
use super::roster::StoredPatient;

/// Maximum number of alerts returned by [`derive_alerts`].
pub const MAX_ALERTS: usize = 8;

/// Scores at or above this are primary alerts.
pub const PRIMARY_THRESHOLD: f64 = 0.6;

/// Scores at or above this (and below [`PRIMARY_THRESHOLD`]) fill remaining slots.
pub const SECONDARY_THRESHOLD: f64 = 0.3;

/// Event type tag carried by streamed alerts.
pub const ALERT_EVENT_TYPE: &str = "kumorfm_alert";

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Severity of a primary-tier alert.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Critical
        } else if score >= 0.7 {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// A ranked risk alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Display identifier `ALT-<patient>-<millis>`; unique within one
    /// derivation through the patient id, not a stable key across calls
    pub id: String,
    pub patient_id: String,
    pub risk_score: f64,
    pub condition: String,
    /// Synthesized for display ordering; not the time of any clinical event
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub data_source: DataSource,
    pub confidence: f64,
}

/// Alert as emitted on the push stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub alert: Alert,
}

impl From<Alert> for AlertEvent {
    fn from(alert: Alert) -> Self {
        Self {
            kind: ALERT_EVENT_TYPE.to_string(),
            alert,
        }
    }
}

fn alert_for(
    patient: &StoredPatient,
    position: usize,
    severity: Severity,
    placeholder: &str,
    now: DateTime<Utc>,
) -> Alert {
    let condition = patient
        .prediction
        .predicted_events
        .first()
        .cloned()
        .unwrap_or_else(|| placeholder.to_string());

    Alert {
        id: format!("ALT-{}-{}", patient.id(), now.timestamp_millis()),
        patient_id: patient.id().to_string(),
        risk_score: patient.risk_score(),
        condition,
        timestamp: now - Duration::hours(position as i64),
        severity,
        data_source: patient.data_source(),
        confidence: patient.prediction.confidence,
    }
}

fn ranked<'a>(patients: &'a [StoredPatient], keep: impl Fn(f64) -> bool) -> Vec<&'a StoredPatient> {
    let mut tier: Vec<_> = patients.iter().filter(|p| keep(p.risk_score())).collect();
    tier.sort_by(|a, b| b.risk_score().total_cmp(&a.risk_score()));
    tier
}

/// Rank stored patients into at most [`MAX_ALERTS`] alerts.
///
/// Primary patients (score >= 0.6) come first, then secondary ones
/// (0.3 <= score < 0.6), each tier by descending score. The timestamp of the
/// alert at position `i` is `now - i hours`.
#[must_use]
pub fn derive_alerts(patients: &[StoredPatient], now: DateTime<Utc>) -> Vec<Alert> {
    let primary = ranked(patients, |s| s >= PRIMARY_THRESHOLD);
    let secondary = ranked(patients, |s| (SECONDARY_THRESHOLD..PRIMARY_THRESHOLD).contains(&s));

    let primary = primary
        .into_iter()
        .map(|p| (p, Severity::from_score(p.risk_score()), "Unknown Risk"));
    let secondary = secondary
        .into_iter()
        .map(|p| (p, Severity::Medium, "Monitoring Required"));

    primary
        .chain(secondary)
        .take(MAX_ALERTS)
        .enumerate()
        .map(|(i, (patient, severity, placeholder))| {
            alert_for(patient, i, severity, placeholder, now)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::PatientRecord;
    use crate::domain::prediction::{RiskPrediction, FALLBACK_MODEL_VERSION};

    fn stored(id: &str, score: f64, events: &[&str]) -> StoredPatient {
        let prediction = RiskPrediction {
            patient_id: id.to_string(),
            risk_score: score,
            predicted_events: events.iter().map(|e| (*e).to_string()).collect(),
            risk_factors: Vec::new(),
            confidence: 0.8,
            last_updated: Utc::now(),
            model_version: FALLBACK_MODEL_VERSION.to_string(),
        };
        StoredPatient::new(PatientRecord::new(id, 60, "F"), prediction)
    }

    #[test]
    fn test_empty_store_yields_no_alerts() {
        assert!(derive_alerts(&[], Utc::now()).is_empty());
    }

    #[test]
    fn test_cap_and_low_risk_exclusion() {
        let mut patients: Vec<_> = (0..12u32)
            .map(|i| stored(&format!("P-{i}"), 0.6 + f64::from(i) * 0.02, &["Hepatotoxicity"]))
            .collect();
        patients.push(stored("P-low", 0.1, &["Anaphylaxis"]));

        let alerts = derive_alerts(&patients, Utc::now());
        assert_eq!(alerts.len(), MAX_ALERTS);
        assert!(alerts.iter().all(|a| a.risk_score >= 0.3));
        assert!(alerts.windows(2).all(|w| w[0].risk_score >= w[1].risk_score));
    }

    #[test]
    fn test_fills_from_secondary_tier() {
        let patients = vec![
            stored("P-a", 0.35, &["GI Bleeding"]),
            stored("P-b", 0.85, &["QT Prolongation"]),
            stored("P-c", 0.72, &[]),
            stored("P-d", 0.55, &[]),
            stored("P-e", 0.2, &["Hypoglycemia"]),
        ];
        let alerts = derive_alerts(&patients, Utc::now());

        let ids: Vec<_> = alerts.iter().map(|a| a.patient_id.as_str()).collect();
        assert_eq!(ids, ["P-b", "P-c", "P-d", "P-a"]);

        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].condition, "QT Prolongation");
        assert_eq!(alerts[1].severity, Severity::High);
        assert_eq!(alerts[1].condition, "Unknown Risk");
        assert_eq!(alerts[2].severity, Severity::Medium);
        assert_eq!(alerts[2].condition, "Monitoring Required");
        assert_eq!(alerts[3].condition, "GI Bleeding");
    }

    #[test]
    fn test_primary_boundary_is_inclusive() {
        let alerts = derive_alerts(&[stored("P-1", 0.6, &["Hyperkalemia"])], Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Medium);
    }

    #[test]
    fn test_ids_unique_within_derivation() {
        let now = Utc::now();
        let patients = vec![stored("P-1", 0.9, &["A"]), stored("P-2", 0.8, &["B"])];
        let alerts = derive_alerts(&patients, now);

        let suffix = format!("-{}", now.timestamp_millis());
        assert_eq!(alerts[0].id, format!("ALT-P-1{suffix}"));
        assert_eq!(alerts[1].id, format!("ALT-P-2{suffix}"));
    }

    #[test]
    fn test_timestamps_step_back_by_position() {
        let now = Utc::now();
        let patients = vec![
            stored("P-1", 0.9, &["A"]),
            stored("P-2", 0.8, &["B"]),
            stored("P-3", 0.4, &["C"]),
        ];
        let alerts = derive_alerts(&patients, now);
        for (i, alert) in alerts.iter().enumerate() {
            assert_eq!(alert.timestamp, now - Duration::hours(i as i64));
        }
    }

    #[test]
    fn test_event_serializes_flat() {
        let alert = derive_alerts(&[stored("P-1", 0.9, &["Anaphylaxis"])], Utc::now())
            .pop()
            .expect("Should derive one alert");
        let value = serde_json::to_value(AlertEvent::from(alert)).expect("Should serialize");

        for key in [
            "type",
            "id",
            "patientId",
            "riskScore",
            "condition",
            "timestamp",
            "severity",
            "dataSource",
            "confidence",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["type"], ALERT_EVENT_TYPE);
        assert_eq!(value["severity"], "critical");
        assert_eq!(value["dataSource"], "mock");
    }
}
