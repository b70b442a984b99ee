//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `kumo`: reqwest client for the remote risk model
//! - `memory`: in-memory patient store
//! - `csv_import`: csv parsing of bulk uploads
//! - `sanitize`: PII and secret filtering for logs

pub mod csv_import;
pub mod kumo;
pub mod memory;
pub mod sanitize;

pub use csv_import::{CsvError, RowError};
pub use kumo::KumoClient;
pub use memory::InMemoryPatientStore;
