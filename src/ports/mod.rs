//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (model service, storage).

mod model;
mod store;

pub use model::{ModelError, ModelOutput, PredictiveModel};
pub use store::{PatientStore, StoreError};
