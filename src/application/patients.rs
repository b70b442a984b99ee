//! Patient roster use cases: create, list, bulk upload, batch prediction,
//! and alert derivation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::adapters::csv_import::{ensure_csv_filename, parse_patients};
use crate::domain::{
    derive_alerts, Alert, GroupFilter, PatientRecord, RiskPrediction, StoredPatient,
};
use crate::ports::PatientStore;
use crate::RiskwatchError;

use super::scoring::Scorer;

/// Outcome of a bulk CSV upload.
#[derive(Debug, Clone)]
pub struct UploadSummary {
    /// Data rows in the file
    pub total_rows: usize,
    /// Patients now in the store, in file order
    pub stored: Vec<StoredPatient>,
    /// Rows skipped because they could not be converted
    pub skipped_rows: usize,
}

/// Identifier held by an in-flight creation, released when dropped.
struct IdReservation<'a> {
    store: &'a dyn PatientStore,
    id: String,
}

impl Drop for IdReservation<'_> {
    fn drop(&mut self) {
        self.store.release_id(&self.id);
    }
}

/// Service over the shared patient store.
pub struct PatientService {
    store: Arc<dyn PatientStore>,
    scorer: Scorer,
}

impl PatientService {
    #[must_use]
    pub fn new(store: Arc<dyn PatientStore>, scorer: Scorer) -> Self {
        Self { store, scorer }
    }

    #[must_use]
    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Snapshot of every stored patient.
    ///
    /// # Errors
    /// Returns error if the store is unavailable.
    pub fn all(&self) -> Result<Vec<StoredPatient>, RiskwatchError> {
        Ok(self.store.list(None)?)
    }

    /// Stored patients, optionally restricted by a `group` selector.
    ///
    /// # Errors
    /// Returns error if the store is unavailable.
    pub fn list(&self, group: Option<&str>) -> Result<Vec<StoredPatient>, RiskwatchError> {
        let filter = group.and_then(GroupFilter::parse);
        let patients = self.store.list(filter.as_ref())?;
        tracing::info!(
            "Returning {} patients for group: {}",
            patients.len(),
            group.unwrap_or("all")
        );
        Ok(patients)
    }

    /// Score and store a new patient.
    ///
    /// The record keeps its identifier when it is non-empty and unused;
    /// otherwise it gets the next `P-<counter>` identifier. The identifier
    /// stays reserved while the record is scored, so concurrent creations
    /// never share one.
    ///
    /// # Errors
    /// Returns error if the store is unavailable.
    pub async fn create(&self, mut record: PatientRecord) -> Result<StoredPatient, RiskwatchError> {
        let reservation = IdReservation {
            store: self.store.as_ref(),
            id: self.store.assign_id(&record.patient_id)?,
        };
        record.patient_id = reservation.id.clone();
        let prediction = self.scorer.score(&record).await;

        let patient = StoredPatient::new(record, prediction);
        self.store.upsert(patient.clone())?;
        drop(reservation);

        tracing::info!(
            "Created patient {} with risk score {}",
            patient.id(),
            patient.risk_score()
        );
        Ok(patient)
    }

    /// Score one record without storing it.
    pub async fn predict(&self, record: &PatientRecord) -> RiskPrediction {
        self.scorer.score(record).await
    }

    /// Score records without storing them, in input order.
    pub async fn predict_batch(&self, records: &[PatientRecord]) -> Vec<RiskPrediction> {
        self.scorer.score_all(records).await
    }

    /// Replace the store with the patients of an uploaded CSV file.
    ///
    /// Rows sharing an identifier collapse into one entry holding the last
    /// such row. The store is only touched once every row has been scored.
    ///
    /// # Errors
    /// Returns `RiskwatchError::Csv` for a wrong extension, an empty or
    /// unreadable file, or missing required columns.
    pub async fn upload_csv(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<UploadSummary, RiskwatchError> {
        ensure_csv_filename(file_name)?;
        let import = parse_patients(bytes)?;
        tracing::info!(
            "Processing CSV upload: {} with {} rows",
            file_name,
            import.total_rows
        );

        let mut stored: Vec<StoredPatient> = Vec::with_capacity(import.records.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        for record in import.records {
            self.store.observe_id(&record.patient_id);
            let prediction = self.scorer.score(&record).await;
            let patient = StoredPatient::new(record, prediction);

            match index.get(patient.id()) {
                Some(&i) => stored[i] = patient,
                None => {
                    index.insert(patient.id().to_string(), stored.len());
                    stored.push(patient);
                }
            }
        }

        self.store.replace_all(stored.clone())?;
        tracing::info!(
            "Stored {} patients from upload ({} rows skipped)",
            stored.len(),
            import.rejected.len()
        );

        Ok(UploadSummary {
            total_rows: import.total_rows,
            stored,
            skipped_rows: import.rejected.len(),
        })
    }

    /// Alerts derived from the current store.
    ///
    /// # Errors
    /// Returns error if the store is unavailable.
    pub fn recent_alerts(&self, now: DateTime<Utc>) -> Result<Vec<Alert>, RiskwatchError> {
        Ok(derive_alerts(&self.store.list(None)?, now))
    }
}
