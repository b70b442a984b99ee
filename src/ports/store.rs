//! Patient store port: Trait for the patient roster.
//!
//! The roster holds the last-known record and prediction of every patient.
//! It is the only shared mutable state of the service.

use crate::domain::{GroupFilter, StoredPatient};

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Duplicate patient id in batch: {0}")]
    DuplicateId(String),
}

/// Trait for patient roster storage.
///
/// Writes are atomic with respect to readers: a reader sees either the
/// snapshot before a write or the one after it, never a mix.
pub trait PatientStore: Send + Sync {
    /// Replace the entire contents with `patients`, discarding old entries.
    ///
    /// # Errors
    /// Returns `StoreError::DuplicateId` if two entries share an identifier.
    fn replace_all(&self, patients: Vec<StoredPatient>) -> Result<(), StoreError>;

    /// Insert a patient, or replace the entry with the same identifier.
    ///
    /// # Errors
    /// Returns error if the store is unavailable.
    fn upsert(&self, patient: StoredPatient) -> Result<(), StoreError>;

    /// All entries in insertion order, optionally restricted to a group.
    ///
    /// # Errors
    /// Returns error if the store is unavailable.
    fn list(&self, group: Option<&GroupFilter>) -> Result<Vec<StoredPatient>, StoreError>;

    /// Look up one entry.
    ///
    /// # Errors
    /// Returns error if the store is unavailable.
    fn get(&self, patient_id: &str) -> Result<Option<StoredPatient>, StoreError>;

    /// Reserve an identifier for a new patient.
    ///
    /// Returns `candidate` when it is non-empty, not stored and not reserved,
    /// otherwise the next free `P-<counter>` value. The identifier stays
    /// reserved until [`release_id`](Self::release_id) is called, so two
    /// in-flight creations never receive the same one.
    ///
    /// # Errors
    /// Returns error if the store is unavailable.
    fn assign_id(&self, candidate: &str) -> Result<String, StoreError>;

    /// Drop the reservation taken by `assign_id`.
    fn release_id(&self, patient_id: &str);

    /// Advance the id counter past an externally supplied `P-<n>` identifier.
    fn observe_id(&self, patient_id: &str);
}
