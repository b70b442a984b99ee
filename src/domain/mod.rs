//! Domain layer: Core business types and logic.
//!
//! Pure Rust types and algorithms with no I/O. Everything here is
//! deterministic given its inputs (the synthetic scorer seeds its own RNG).

pub mod alert;
pub mod cohort;
mod patient;
mod prediction;
mod roster;
pub mod synthetic;

pub use alert::{derive_alerts, Alert, AlertEvent, Severity, ALERT_EVENT_TYPE};
pub use cohort::{CohortFilter, CohortStats, Percentiles, RiskBuckets};
pub use patient::{FeatureVector, PatientRecord, FEATURE_COUNT, FEATURE_NAMES};
pub use prediction::{
    round_to, DataSource, RiskFactor, RiskPrediction, RiskTier, EVENT_CATALOG,
    EXTERNAL_MODEL_VERSION, FALLBACK_MODEL_VERSION,
};
pub use roster::{GroupFilter, StoredPatient};
