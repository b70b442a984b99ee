//! Kumo adapter: HTTP client for the remote RFM risk model.
//!
//! Implements `PredictiveModel` over a JSON endpoint:
//!
//! ```text
//! POST {base_url}/predict
//! Authorization: Bearer <api key>
//! {"features": [f64; 10], "feature_names": [..]}
//! -> {"risk_score": f64, "confidence": f64, "feature_importance": [f64]}
//! ```
//!
//! The API key is never logged; log output is additionally passed through
//! the sanitizing writer.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ModelSettings;
use crate::domain::{FeatureVector, EXTERNAL_MODEL_VERSION, FEATURE_NAMES};
use crate::ports::{ModelError, ModelOutput, PredictiveModel};

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    features: &'a [f64],
    feature_names: &'a [&'static str],
}

/// Remote Kumo RFM model.
pub struct KumoClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl KumoClient {
    /// Build a client from model settings.
    ///
    /// # Errors
    /// Returns `ModelError::NotConfigured` when no API key is set or the HTTP
    /// client cannot be built.
    pub fn new(settings: &ModelSettings) -> Result<Self, ModelError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ModelError::NotConfigured("KUMORFM_API_KEY is not set".to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ModelError::NotConfigured(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/predict", settings.base_url.trim_end_matches('/')),
            api_key,
            timeout: settings.timeout,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_send_error(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
        } else {
            ModelError::Unavailable(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl PredictiveModel for KumoClient {
    fn model_version(&self) -> &str {
        EXTERNAL_MODEL_VERSION
    }

    async fn predict(&self, features: &FeatureVector) -> Result<ModelOutput, ModelError> {
        let body = PredictRequest {
            features: features.as_slice(),
            feature_names: &FEATURE_NAMES,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::Status(status.as_u16()));
        }

        let output: ModelOutput = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.without_url().to_string()))?;

        tracing::debug!(risk_score = output.risk_score, "Model prediction received");
        Ok(output)
    }
}
