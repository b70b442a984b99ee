//! Dashboard aggregates over the stored roster.
//!
//! All three views are computed from a roster snapshot on each request;
//! nothing is cached.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{derive_alerts, round_to, DataSource, StoredPatient};

/// Scores above this count as high risk.
const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Scores below this count as low risk.
const LOW_RISK_THRESHOLD: f64 = 0.3;

/// Days covered by the trend view, ending today.
const TREND_DAYS: i64 = 5;

const DISTRIBUTION_BINS: [(&str, f64, f64); 5] = [
    ("0.0-0.2", 0.0, 0.2),
    ("0.2-0.4", 0.2, 0.4),
    ("0.4-0.6", 0.4, 0.6),
    ("0.6-0.8", 0.6, 0.8),
    ("0.8-1.0", 0.8, f64::INFINITY),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_patients: usize,
    pub active_alerts: usize,
    pub high_risk_patients: usize,
    pub average_risk_score: f64,
    pub data_source: DataSource,
    pub last_updated: DateTime<Utc>,
}

impl DashboardMetrics {
    #[must_use]
    pub fn compute(patients: &[StoredPatient], source: DataSource, now: DateTime<Utc>) -> Self {
        let average = if patients.is_empty() {
            0.0
        } else {
            patients.iter().map(StoredPatient::risk_score).sum::<f64>() / patients.len() as f64
        };

        Self {
            total_patients: patients.len(),
            active_alerts: derive_alerts(patients, now).len(),
            high_risk_patients: patients
                .iter()
                .filter(|p| p.risk_score() > HIGH_RISK_THRESHOLD)
                .count(),
            average_risk_score: round_to(average, 4),
            data_source: source,
            last_updated: now,
        }
    }
}

/// Risk tier counts of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    #[serde(with = "day_format")]
    pub date: NaiveDate,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub total: usize,
    pub data_source: DataSource,
}

mod day_format {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format("%Y-%m-%d"))
    }
}

/// Per-day tier counts for the last five UTC days, oldest first.
///
/// A prediction counts towards the day of its `last_updated` timestamp.
#[must_use]
pub fn risk_trends(
    patients: &[StoredPatient],
    source: DataSource,
    now: DateTime<Utc>,
) -> Vec<TrendPoint> {
    let today = now.date_naive();
    (0..TREND_DAYS)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let mut point = TrendPoint {
                date,
                high_risk: 0,
                medium_risk: 0,
                low_risk: 0,
                total: 0,
                data_source: source,
            };
            for patient in patients
                .iter()
                .filter(|p| p.prediction.last_updated.date_naive() == date)
            {
                let score = patient.risk_score();
                if score > HIGH_RISK_THRESHOLD {
                    point.high_risk += 1;
                } else if score < LOW_RISK_THRESHOLD {
                    point.low_risk += 1;
                } else {
                    point.medium_risk += 1;
                }
                point.total += 1;
            }
            point
        })
        .collect()
}

/// One bin of the score histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionBin {
    pub range: &'static str,
    pub count: usize,
    /// Share of all stored patients, rounded to a whole percent
    pub percentage: u32,
    pub data_source: DataSource,
}

/// Histogram of stored scores over five 0.2-wide bins.
#[must_use]
pub fn risk_distribution(patients: &[StoredPatient], source: DataSource) -> Vec<DistributionBin> {
    let total = patients.len();
    DISTRIBUTION_BINS
        .iter()
        .map(|&(range, lo, hi)| {
            let count = patients
                .iter()
                .filter(|p| (lo..hi).contains(&p.risk_score()))
                .count();
            let percentage = if total == 0 {
                0
            } else {
                (count as f64 * 100.0 / total as f64).round() as u32
            };
            DistributionBin {
                range,
                count,
                percentage,
                data_source: source,
            }
        })
        .collect()
}
