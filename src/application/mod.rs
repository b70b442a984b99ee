//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

pub mod alert_feed;
mod cohort;
pub mod dashboard;
pub mod generator;
mod patients;
mod scoring;

pub use alert_feed::{AlertFeed, AlertFeedHandle};
pub use cohort::{analyze_cohort, CohortOptions, CohortReport};
pub use dashboard::{risk_distribution, risk_trends, DashboardMetrics, DistributionBin, TrendPoint};
pub use generator::generate_patients;
pub use patients::{PatientService, UploadSummary};
pub use scoring::{from_model_output, Scorer};
