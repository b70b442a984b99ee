//! Risk prediction result types.
//!
//! Represents the output of a scoring call, whichever strategy produced it.

use serde::{Deserialize, Serialize};

/// Model version tag for predictions produced by the external model service.
pub const EXTERNAL_MODEL_VERSION: &str = "Kumo-RFM-2.1";

/// Model version tag for predictions produced by the synthetic fallback.
pub const FALLBACK_MODEL_VERSION: &str = "Mock-1.0";

/// Adverse events a prediction may name.
pub const EVENT_CATALOG: [&str; 10] = [
    "Hepatotoxicity",
    "Cardiac Arrhythmia",
    "Renal Function Decline",
    "GI Bleeding",
    "Hypoglycemia",
    "Hyperkalemia",
    "Drug Interaction",
    "QT Prolongation",
    "Stevens-Johnson Syndrome",
    "Anaphylaxis",
];

/// Risk tier used to size the predicted event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Tier of a risk score: `< 0.3` low, `< 0.7` medium, otherwise high.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            Self::Low
        } else if score < 0.7 {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Number of predicted events reported for this tier.
    #[must_use]
    pub fn event_count(self) -> usize {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

/// Which scoring path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// External model service
    Kumo,
    /// Synthetic fallback
    Mock,
}

impl DataSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kumo => "kumo",
            Self::Mock => "mock",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attribution entry of a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: String,
    /// Contribution of the factor (impact for synthetic, importance for external)
    pub impact: f64,
    pub confidence: f64,
}

impl RiskFactor {
    #[must_use]
    pub fn new(factor: impl Into<String>, impact: f64, confidence: f64) -> Self {
        Self {
            factor: factor.into(),
            impact,
            confidence,
        }
    }
}

/// Complete prediction for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPrediction {
    pub patient_id: String,

    /// Risk score in [0, 1]
    pub risk_score: f64,

    /// Distinct entries of [`EVENT_CATALOG`], count set by [`RiskTier`]
    pub predicted_events: Vec<String>,

    pub risk_factors: Vec<RiskFactor>,

    /// Confidence in [0, 1]
    pub confidence: f64,

    pub last_updated: chrono::DateTime<chrono::Utc>,

    pub model_version: String,
}

impl RiskPrediction {
    #[must_use]
    pub fn tier(&self) -> RiskTier {
        RiskTier::from_score(self.risk_score)
    }

    /// Source tag derived from the model version.
    #[must_use]
    pub fn data_source(&self) -> DataSource {
        if self.model_version == FALLBACK_MODEL_VERSION {
            DataSource::Mock
        } else {
            DataSource::Kumo
        }
    }
}

/// Round to a fixed number of decimal places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
