//! Predictive model port: Trait for the external risk modeling service.
//!
//! This trait abstracts the remote model (Kumo RFM) from the scoring logic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::FeatureVector;

/// Errors raised while calling a predictive model.
///
/// The scorer recovers from every variant by falling back to synthetic
/// scoring; they are only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model service not configured: {0}")]
    NotConfigured(String),

    #[error("Model service unreachable: {0}")]
    Unavailable(String),

    #[error("Model call timed out after {0} ms")]
    Timeout(u64),

    #[error("Model service returned status {0}")]
    Status(u16),

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),
}

/// Raw output of a model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// Probability of an adverse event, expected in [0, 1]
    pub risk_score: f64,

    /// Model confidence, expected in [0, 1]
    pub confidence: f64,

    /// One importance value per feature, in feature order
    #[serde(default)]
    pub feature_importance: Vec<f64>,
}

impl ModelOutput {
    /// Check that the output is usable.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidResponse` when scores are outside [0, 1]
    /// or not finite.
    pub fn validate(&self) -> Result<(), ModelError> {
        let unit = 0.0..=1.0;
        if !self.risk_score.is_finite() || !unit.contains(&self.risk_score) {
            return Err(ModelError::InvalidResponse(format!(
                "risk_score {} outside [0, 1]",
                self.risk_score
            )));
        }
        if !self.confidence.is_finite() || !unit.contains(&self.confidence) {
            return Err(ModelError::InvalidResponse(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if self.feature_importance.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidResponse(
                "non-finite feature importance".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for remote risk models.
///
/// Implementations turn a feature vector into a risk estimate. They may be
/// slow or fail; callers bound each call with a timeout.
#[async_trait]
pub trait PredictiveModel: Send + Sync {
    /// Identifier reported as the prediction's model version.
    fn model_version(&self) -> &str;

    /// Predict risk for one feature vector.
    ///
    /// # Errors
    /// Returns `ModelError` if the service is unreachable or answers badly.
    async fn predict(&self, features: &FeatureVector) -> Result<ModelOutput, ModelError>;
}
