//! Background alert feed for the server-sent event stream.
//!
//! A single tokio task ticks at a fixed interval. Each tick it derives the
//! current alerts from the store and broadcasts one of them, rotating
//! through the list; with nothing in the store it synthesizes a plausible
//! alert instead so dashboards keep moving.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::domain::{derive_alerts, round_to, Alert, AlertEvent, DataSource, Severity};
use crate::ports::PatientStore;

/// Events buffered per subscriber before it starts skipping.
const CHANNEL_CAPACITY: usize = 64;

const KUMO_CONDITIONS: [&str; 4] = [
    "Hepatotoxicity",
    "Cardiac Arrhythmia",
    "Acute Kidney Injury",
    "Drug-Drug Interaction",
];
const MOCK_CONDITIONS: [&str; 4] = [
    "Hepatotoxicity",
    "Cardiac Risk",
    "Renal Decline",
    "Drug Interaction",
];
const KUMO_SEVERITIES: [Severity; 2] = [Severity::Critical, Severity::High];
const MOCK_SEVERITIES: [Severity; 3] = [Severity::High, Severity::Critical, Severity::Medium];

/// Build a synthetic alert for `source`.
pub fn synthesize_alert<R: Rng + ?Sized>(rng: &mut R, source: DataSource) -> Alert {
    let (conditions, severities, score_floor, confidence_range) = match source {
        DataSource::Kumo => (&KUMO_CONDITIONS[..], &KUMO_SEVERITIES[..], 0.7, 0.85..=0.96),
        DataSource::Mock => (&MOCK_CONDITIONS[..], &MOCK_SEVERITIES[..], 0.6, 0.70..=0.85),
    };

    let now = Utc::now();
    Alert {
        id: format!("ALT-{}", now.timestamp_millis()),
        patient_id: format!("P-{}", rng.gen_range(1000..=9999)),
        risk_score: round_to(rng.gen_range(score_floor..=0.95), 3),
        condition: conditions.choose(rng).copied().unwrap_or("Unknown Risk").to_string(),
        timestamp: now,
        severity: severities.choose(rng).copied().unwrap_or(Severity::Medium),
        data_source: source,
        confidence: round_to(rng.gen_range(confidence_range), 3),
    }
}

/// Handle to the running feed.
pub struct AlertFeedHandle {
    sender: broadcast::Sender<AlertEvent>,
    task: JoinHandle<()>,
}

impl AlertFeedHandle {
    /// New receiver of future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn sender(&self) -> broadcast::Sender<AlertEvent> {
        self.sender.clone()
    }

    /// Stop the background task.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for AlertFeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawns the background alert task.
pub struct AlertFeed;

impl AlertFeed {
    /// Start ticking every `interval`. Must be called inside a tokio runtime.
    pub fn spawn(
        store: Arc<dyn PatientStore>,
        source: DataSource,
        interval: Duration,
    ) -> AlertFeedHandle {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let tx = sender.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; start after one full interval.
            ticker.tick().await;

            let mut position = 0usize;
            loop {
                ticker.tick().await;
                let alert = Self::next_alert(store.as_ref(), source, &mut position);
                // No subscribers is fine; the event is just dropped.
                let _ = tx.send(AlertEvent::from(alert));
            }
        });

        tracing::info!("Alert feed started (every {:?})", interval);
        AlertFeedHandle { sender, task }
    }

    fn next_alert(store: &dyn PatientStore, source: DataSource, position: &mut usize) -> Alert {
        let derived = match store.list(None) {
            Ok(patients) => derive_alerts(&patients, Utc::now()),
            Err(e) => {
                tracing::warn!("Alert feed could not read store: {}", e);
                Vec::new()
            }
        };

        if derived.is_empty() {
            return synthesize_alert(&mut rand::thread_rng(), source);
        }
        let alert = derived[*position % derived.len()].clone();
        *position = position.wrapping_add(1);
        alert
    }
}
