//! Risk scoring service: external model with synthetic fallback.
//!
//! The strategy is fixed when the scorer is built. An external scorer never
//! fails: port errors, timeouts and unusable outputs are logged and the
//! record is scored synthetically instead.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::synthetic::{rng_for, select_events, synthetic_prediction};
use crate::domain::{
    round_to, DataSource, FeatureVector, PatientRecord, RiskFactor, RiskPrediction,
    FALLBACK_MODEL_VERSION, FEATURE_NAMES,
};
use crate::ports::{ModelError, ModelOutput, PredictiveModel};

/// Number of feature-importance factors reported for external predictions.
const TOP_FACTORS: usize = 5;

/// Scoring strategy.
#[derive(Clone)]
pub enum Scorer {
    /// Deterministic synthetic scoring only
    Synthetic,
    /// Remote model, bounded by `timeout`, synthetic on any failure
    External {
        model: Arc<dyn PredictiveModel>,
        timeout: Duration,
    },
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Synthetic => f.write_str("Scorer::Synthetic"),
            Self::External { model, timeout } => f
                .debug_struct("Scorer::External")
                .field("model", &model.model_version())
                .field("timeout", timeout)
                .finish(),
        }
    }
}

impl Scorer {
    #[must_use]
    pub fn external(model: Arc<dyn PredictiveModel>, timeout: Duration) -> Self {
        Self::External { model, timeout }
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }

    /// Source reported for this scorer's results when nothing fails.
    #[must_use]
    pub fn data_source(&self) -> DataSource {
        if self.is_external() {
            DataSource::Kumo
        } else {
            DataSource::Mock
        }
    }

    /// Score one record. Never fails.
    pub async fn score(&self, record: &PatientRecord) -> RiskPrediction {
        match self {
            Self::Synthetic => synthetic_prediction(record, FALLBACK_MODEL_VERSION),
            Self::External { model, timeout } => {
                match call_model(model.as_ref(), record, *timeout).await {
                    Ok(output) => from_model_output(record, &output, model.model_version()),
                    Err(e) => {
                        tracing::warn!(
                            "Model call failed for {}, using synthetic score: {}",
                            record.patient_id,
                            e
                        );
                        synthetic_prediction(record, FALLBACK_MODEL_VERSION)
                    }
                }
            }
        }
    }

    /// Score records one after another, in input order.
    pub async fn score_all<'a, I>(&self, records: I) -> Vec<RiskPrediction>
    where
        I: IntoIterator<Item = &'a PatientRecord>,
    {
        let mut predictions = Vec::new();
        for record in records {
            predictions.push(self.score(record).await);
        }
        predictions
    }
}

async fn call_model(
    model: &dyn PredictiveModel,
    record: &PatientRecord,
    timeout: Duration,
) -> Result<ModelOutput, ModelError> {
    let features = FeatureVector::extract(record);
    let output = tokio::time::timeout(timeout, model.predict(&features))
        .await
        .map_err(|_| ModelError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)))??;
    output.validate()?;
    Ok(output)
}

/// Wrap a validated model output into a prediction.
///
/// Events use the same seeded draw as synthetic scoring; factors are the
/// five most important features, each carrying the model confidence.
#[must_use]
pub fn from_model_output(
    record: &PatientRecord,
    output: &ModelOutput,
    model_version: &str,
) -> RiskPrediction {
    let risk_score = round_to(output.risk_score, 4);

    let mut rng = rng_for(&record.patient_id);
    let predicted_events = select_events(&mut rng, risk_score);

    let mut ranked: Vec<(&str, f64)> = FEATURE_NAMES
        .iter()
        .copied()
        .zip(output.feature_importance.iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let risk_factors = ranked
        .into_iter()
        .take(TOP_FACTORS)
        .map(|(name, importance)| RiskFactor::new(name, importance, output.confidence))
        .collect();

    RiskPrediction {
        patient_id: record.patient_id.clone(),
        risk_score,
        predicted_events,
        risk_factors,
        confidence: output.confidence,
        last_updated: chrono::Utc::now(),
        model_version: model_version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RiskTier, EVENT_CATALOG, EXTERNAL_MODEL_VERSION};
    use async_trait::async_trait;

    enum Behavior {
        Answer(ModelOutput),
        Fail,
        Hang,
    }

    struct StubModel(Behavior);

    #[async_trait]
    impl PredictiveModel for StubModel {
        fn model_version(&self) -> &str {
            EXTERNAL_MODEL_VERSION
        }

        async fn predict(&self, _features: &FeatureVector) -> Result<ModelOutput, ModelError> {
            match &self.0 {
                Behavior::Answer(output) => Ok(output.clone()),
                Behavior::Fail => Err(ModelError::Status(503)),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(ModelError::Unavailable("unreachable".to_string()))
                }
            }
        }
    }

    fn scorer(behavior: Behavior) -> Scorer {
        Scorer::external(Arc::new(StubModel(behavior)), Duration::from_millis(50))
    }

    fn record() -> PatientRecord {
        PatientRecord::new("P-1", 70, "F")
            .with_medications(["Warfarin", "Aspirin"])
            .with_comorbidities(["AF"])
    }

    fn output(risk_score: f64) -> ModelOutput {
        ModelOutput {
            risk_score,
            confidence: 0.91,
            feature_importance: vec![0.05, 0.01, 0.3, 0.2, 0.15, 0.02, 0.03, 0.12, 0.08, 0.04],
        }
    }

    #[tokio::test]
    async fn test_synthetic_scorer() {
        let prediction = Scorer::Synthetic.score(&record()).await;
        assert_eq!(prediction.model_version, FALLBACK_MODEL_VERSION);
        assert_eq!(prediction.data_source(), DataSource::Mock);
        assert!(!Scorer::Synthetic.is_external());
    }

    #[tokio::test]
    async fn test_external_success() {
        let prediction = scorer(Behavior::Answer(output(0.812_345))).score(&record()).await;

        assert_eq!(prediction.model_version, EXTERNAL_MODEL_VERSION);
        assert_eq!(prediction.data_source(), DataSource::Kumo);
        assert!((prediction.risk_score - 0.8123).abs() < 1e-12);
        assert_eq!(prediction.tier(), RiskTier::High);
        assert_eq!(prediction.predicted_events.len(), 3);
        assert!(prediction
            .predicted_events
            .iter()
            .all(|e| EVENT_CATALOG.contains(&e.as_str())));

        let names: Vec<&str> = prediction.risk_factors.iter().map(|f| f.factor.as_str()).collect();
        assert_eq!(
            names,
            ["medication_count", "comorbidity_count", "creatinine", "systolic_bp", "diastolic_bp"]
        );
        assert!(prediction.risk_factors.iter().all(|f| (f.confidence - 0.91).abs() < 1e-12));
    }

    #[tokio::test]
    async fn test_external_failure_falls_back() {
        let expected = synthetic_prediction(&record(), FALLBACK_MODEL_VERSION);
        let prediction = scorer(Behavior::Fail).score(&record()).await;

        assert_eq!(prediction.model_version, FALLBACK_MODEL_VERSION);
        assert_eq!(prediction.risk_score, expected.risk_score);
        assert_eq!(prediction.predicted_events, expected.predicted_events);
    }

    #[tokio::test]
    async fn test_out_of_range_output_falls_back() {
        let prediction = scorer(Behavior::Answer(output(1.7))).score(&record()).await;
        assert_eq!(prediction.model_version, FALLBACK_MODEL_VERSION);
        assert!((0.05..=0.95).contains(&prediction.risk_score));
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let prediction = scorer(Behavior::Hang).score(&record()).await;
        assert_eq!(prediction.data_source(), DataSource::Mock);
    }

    #[tokio::test]
    async fn test_score_all_keeps_order() {
        let records = vec![
            PatientRecord::new("A", 30, "M"),
            PatientRecord::new("B", 60, "F"),
            PatientRecord::new("C", 90, "M"),
        ];
        let predictions = Scorer::Synthetic.score_all(&records).await;
        let ids: Vec<&str> = predictions.iter().map(|p| p.patient_id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C"]);
    }

    #[test]
    fn test_short_importance_vector() {
        let out = ModelOutput {
            risk_score: 0.2,
            confidence: 0.8,
            feature_importance: vec![0.4, 0.6],
        };
        let prediction = from_model_output(&record(), &out, EXTERNAL_MODEL_VERSION);
        assert_eq!(prediction.risk_factors.len(), 2);
        assert_eq!(prediction.risk_factors[0].factor, "sex");
        assert_eq!(prediction.predicted_events.len(), 1);
    }
}
