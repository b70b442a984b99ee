//! In-memory adapter: Implementation of PatientStore.
//!
//! Holds the roster as an immutable snapshot behind an `RwLock`. Writers
//! build a new snapshot and swap it in; readers clone the `Arc` and never
//! observe a partially written roster.
//!
//! # Lock Behavior
//!
//! A poisoned lock (from a panic in another thread) fails closed with
//! `StoreError::Poisoned`.
//!
//! Identifier reservations live under their own mutex. `assign_id` holds it
//! while checking the snapshot, so a check and its reservation are one step.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::domain::{GroupFilter, StoredPatient};
use crate::ports::{PatientStore, StoreError};

/// First value of the identifier counter.
pub const FIRST_PATIENT_NUMBER: u64 = 1000;

/// In-memory patient roster.
pub struct InMemoryPatientStore {
    snapshot: RwLock<Arc<Vec<StoredPatient>>>,

    /// Identifiers handed out by `assign_id` and not yet released
    reserved: Mutex<HashSet<String>>,

    /// Next number handed out by `assign_id`
    next_number: AtomicU64,
}

impl InMemoryPatientStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Vec::new())),
            reserved: Mutex::new(HashSet::new()),
            next_number: AtomicU64::new(FIRST_PATIENT_NUMBER),
        }
    }

    /// Current snapshot. Cheap: clones an `Arc`.
    ///
    /// # Errors
    /// Returns `StoreError::Poisoned` if the lock is poisoned.
    pub fn snapshot(&self) -> Result<Arc<Vec<StoredPatient>>, StoreError> {
        self.snapshot
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| StoreError::Poisoned)
    }

    fn swap(&self, next: Vec<StoredPatient>) -> Result<(), StoreError> {
        let mut guard = self.snapshot.write().map_err(|_| StoreError::Poisoned)?;
        *guard = Arc::new(next);
        Ok(())
    }

    fn parse_number(patient_id: &str) -> Option<u64> {
        patient_id.strip_prefix("P-")?.parse().ok()
    }
}

impl Default for InMemoryPatientStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientStore for InMemoryPatientStore {
    fn replace_all(&self, patients: Vec<StoredPatient>) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(patients.len());
        if let Some(dup) = patients.iter().find(|p| !seen.insert(p.id())) {
            return Err(StoreError::DuplicateId(dup.id().to_string()));
        }

        let count = patients.len();
        self.swap(patients)?;
        tracing::info!("Replaced patient store with {} entries", count);
        Ok(())
    }

    fn upsert(&self, patient: StoredPatient) -> Result<(), StoreError> {
        let mut guard = self.snapshot.write().map_err(|_| StoreError::Poisoned)?;

        let mut next = guard.as_ref().clone();
        match next.iter_mut().find(|p| p.id() == patient.id()) {
            Some(existing) => *existing = patient,
            None => next.push(patient),
        }
        *guard = Arc::new(next);
        Ok(())
    }

    fn list(&self, group: Option<&GroupFilter>) -> Result<Vec<StoredPatient>, StoreError> {
        let snapshot = self.snapshot()?;
        Ok(match group {
            Some(filter) => snapshot
                .iter()
                .filter(|p| filter.matches(&p.record))
                .cloned()
                .collect(),
            None => snapshot.as_ref().clone(),
        })
    }

    fn get(&self, patient_id: &str) -> Result<Option<StoredPatient>, StoreError> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.iter().find(|p| p.id() == patient_id).cloned())
    }

    fn assign_id(&self, candidate: &str) -> Result<String, StoreError> {
        let mut reserved = self.reserved.lock().map_err(|_| StoreError::Poisoned)?;
        let snapshot = self.snapshot()?;
        let taken = |id: &str| reserved.contains(id) || snapshot.iter().any(|p| p.id() == id);

        let candidate = candidate.trim();
        let id = if !candidate.is_empty() && !taken(candidate) {
            candidate.to_string()
        } else {
            // Skip numbers already taken by explicitly supplied ids.
            loop {
                let number = self.next_number.fetch_add(1, Ordering::SeqCst);
                let id = format!("P-{number:03}");
                if !taken(&id) {
                    break id;
                }
            }
        };

        reserved.insert(id.clone());
        Ok(id)
    }

    fn release_id(&self, patient_id: &str) {
        match self.reserved.lock() {
            Ok(mut reserved) => {
                reserved.remove(patient_id);
            }
            Err(_) => tracing::warn!("Id reservations poisoned, {} not released", patient_id),
        }
    }

    fn observe_id(&self, patient_id: &str) {
        if let Some(number) = Self::parse_number(patient_id) {
            self.next_number
                .fetch_max(number.saturating_add(1), Ordering::SeqCst);
        }
    }
}
