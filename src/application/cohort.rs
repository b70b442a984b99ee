//! Cohort analysis use case.

use crate::domain::{CohortFilter, CohortStats, PatientRecord, RiskPrediction};
use crate::RiskwatchError;

use super::scoring::Scorer;

/// Options of a cohort analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct CohortOptions {
    pub include_percentiles: bool,
    /// Reject an empty filtered cohort instead of reporting zeros
    pub require_non_empty: bool,
}

/// Statistics plus the per-patient predictions they were computed from.
#[derive(Debug, Clone)]
pub struct CohortReport {
    pub stats: CohortStats,
    pub predictions: Vec<RiskPrediction>,
}

/// Filter, score and aggregate a cohort.
///
/// # Errors
/// Returns `RiskwatchError::InvalidInput` when no record survives the filter
/// and `options.require_non_empty` is set.
pub async fn analyze_cohort(
    scorer: &Scorer,
    records: &[PatientRecord],
    filter: Option<&CohortFilter>,
    options: CohortOptions,
) -> Result<CohortReport, RiskwatchError> {
    let selected: Vec<&PatientRecord> = match filter {
        Some(f) => f.apply(records),
        None => records.iter().collect(),
    };

    if selected.is_empty() && options.require_non_empty {
        return Err(RiskwatchError::InvalidInput(
            "No patients match the filters".to_string(),
        ));
    }

    tracing::info!(
        "Analyzing cohort of {} (from {} submitted)",
        selected.len(),
        records.len()
    );

    let predictions = scorer.score_all(selected).await;
    let scores: Vec<f64> = predictions.iter().map(|p| p.risk_score).collect();

    Ok(CohortReport {
        stats: CohortStats::from_scores(&scores, options.include_percentiles),
        predictions,
    })
}
