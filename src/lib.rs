//! # Riskwatch
//!
//! Adverse-event risk scoring and cohort analytics over FAERS-style
//! patient records.
//!
//! This crate provides:
//! - Feature extraction and risk scoring (external model or deterministic synthetic fallback)
//! - Cohort statistics over filtered patient sets
//! - An in-memory patient store with derived alerts and dashboard aggregates
//! - An HTTP JSON API with a server-sent alert stream
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types and pure algorithms (features, scoring, cohorts, alerts)
//! - `ports`: Trait definitions for external collaborators (model service, patient store)
//! - `adapters`: Concrete implementations (Kumo HTTP client, in-memory store, CSV import)
//! - `application`: Use cases orchestrating domain and ports
//! - `http`: axum router and handlers

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;

pub use domain::{PatientRecord, RiskPrediction};

/// Result type for Riskwatch operations
pub type Result<T> = std::result::Result<T, RiskwatchError>;

/// Main error type for Riskwatch
#[derive(Debug, thiserror::Error)]
pub enum RiskwatchError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("CSV import failed: {0}")]
    Csv(#[from] adapters::CsvError),

    #[error("Storage operation failed: {0}")]
    Store(#[from] ports::StoreError),
}
