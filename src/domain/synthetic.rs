//! Deterministic synthetic risk scoring.
//!
//! The fallback strategy used whenever the external model service is not
//! configured or fails. Every draw comes from a `ChaCha8Rng` seeded from the
//! patient identifier, so repeated calls for the same record agree exactly.

use rand::distributions::Distribution;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::Normal;

use super::patient::PatientRecord;
use super::prediction::{round_to, RiskFactor, RiskPrediction, RiskTier, EVENT_CATALOG};

/// Standard deviation of the score perturbation.
const NOISE_STD: f64 = 0.1;

/// Synthetic scores are clamped to this range.
pub const MIN_SCORE: f64 = 0.05;
pub const MAX_SCORE: f64 = 0.95;

/// Seed derived from a patient identifier (sum of character codes).
#[must_use]
pub fn seed_for(patient_id: &str) -> u64 {
    patient_id.chars().map(|c| u64::from(u32::from(c))).sum()
}

/// Deterministic generator for a patient identifier.
#[must_use]
pub fn rng_for(patient_id: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed_for(patient_id))
}

/// Capped risk contributions of the record's attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseRisk {
    pub age: f64,
    pub medication: f64,
    pub comorbidity: f64,
}

impl BaseRisk {
    #[must_use]
    pub fn from_record(record: &PatientRecord) -> Self {
        Self {
            age: (f64::from(record.age) / 100.0).min(0.4),
            medication: (record.medications.len() as f64 * 0.05).min(0.3),
            comorbidity: (record.comorbidities.len() as f64 * 0.1).min(0.3),
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.age + self.medication + self.comorbidity
    }
}

/// Pick the tier-sized set of distinct catalog events for `score`.
pub fn select_events<R: Rng + ?Sized>(rng: &mut R, score: f64) -> Vec<String> {
    let count = RiskTier::from_score(score).event_count();
    EVENT_CATALOG
        .choose_multiple(rng, count)
        .map(|event| (*event).to_string())
        .collect()
}

/// Produce the synthetic prediction for a record, tagged with `model_version`.
#[must_use]
pub fn synthetic_prediction(record: &PatientRecord, model_version: &str) -> RiskPrediction {
    let mut rng = rng_for(&record.patient_id);
    let base = BaseRisk::from_record(record);

    let noise = Normal::new(0.0, NOISE_STD)
        .map(|normal| normal.sample(&mut rng))
        .unwrap_or(0.0);
    let risk_score = round_to((base.total() + noise).clamp(MIN_SCORE, MAX_SCORE), 4);

    let predicted_events = select_events(&mut rng, risk_score);

    let risk_factors = vec![
        RiskFactor::new("Age", base.age, 0.92),
        RiskFactor::new("Polypharmacy", base.medication, 0.88),
        RiskFactor::new("Comorbidity Burden", base.comorbidity, 0.85),
        RiskFactor::new("Drug Interactions", rng.gen_range(0.1..=0.2), 0.80),
    ];

    let confidence = round_to(rng.gen_range(0.75..=0.95), 3);

    RiskPrediction {
        patient_id: record.patient_id.clone(),
        risk_score,
        predicted_events,
        risk_factors,
        confidence,
        last_updated: chrono::Utc::now(),
        model_version: model_version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::{EXTERNAL_MODEL_VERSION, FALLBACK_MODEL_VERSION};

    fn sample_record(id: &str, age: u32, meds: usize, conditions: usize) -> PatientRecord {
        PatientRecord::new(id, age, "F")
            .with_medications((0..meds).map(|i| format!("med{i}")))
            .with_comorbidities((0..conditions).map(|i| format!("cond{i}")))
    }

    #[test]
    fn test_seed_is_char_code_sum() {
        assert_eq!(seed_for("P-1"), u64::from(b'P') + u64::from(b'-') + u64::from(b'1'));
        assert_eq!(seed_for(""), 0);
    }

    #[test]
    fn test_base_risk_example() {
        let record = sample_record("P-1", 70, 2, 1);
        let base = BaseRisk::from_record(&record);
        assert!((base.age - 0.4).abs() < 1e-12);
        assert!((base.medication - 0.10).abs() < 1e-12);
        assert!((base.comorbidity - 0.10).abs() < 1e-12);
        assert!((base.total() - 0.60).abs() < 1e-12);
    }

    #[test]
    fn test_empty_lists_contribute_nothing() {
        let record = sample_record("P-2", 30, 0, 0);
        let base = BaseRisk::from_record(&record);
        assert_eq!(base.medication, 0.0);
        assert_eq!(base.comorbidity, 0.0);
    }

    #[test]
    fn test_deterministic_per_identifier() {
        let record = sample_record("P-1042", 64, 3, 2);
        let a = synthetic_prediction(&record, FALLBACK_MODEL_VERSION);
        let b = synthetic_prediction(&record, FALLBACK_MODEL_VERSION);

        assert_eq!(a.risk_score, b.risk_score);
        assert_eq!(a.predicted_events, b.predicted_events);
        assert_eq!(a.risk_factors, b.risk_factors);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn test_score_bounds_and_event_tiers() {
        for i in 0..300u32 {
            let record = sample_record(
                &format!("P-{i}"),
                (i * 7) % 110,
                (i % 9) as usize,
                (i % 5) as usize,
            );
            let p = synthetic_prediction(&record, FALLBACK_MODEL_VERSION);

            assert!((MIN_SCORE..=MAX_SCORE).contains(&p.risk_score));
            assert_eq!(p.predicted_events.len(), p.tier().event_count());

            let mut events = p.predicted_events.clone();
            events.sort();
            events.dedup();
            assert_eq!(events.len(), p.predicted_events.len());
            assert!(events.iter().all(|e| EVENT_CATALOG.contains(&e.as_str())));

            assert!((0.75..=0.95).contains(&p.confidence));
        }
    }

    #[test]
    fn test_risk_factor_layout() {
        let record = sample_record("P-7", 85, 8, 4);
        let p = synthetic_prediction(&record, FALLBACK_MODEL_VERSION);

        let names: Vec<_> = p.risk_factors.iter().map(|f| f.factor.as_str()).collect();
        assert_eq!(names, ["Age", "Polypharmacy", "Comorbidity Burden", "Drug Interactions"]);
        assert!((p.risk_factors[0].impact - 0.4).abs() < 1e-12);
        assert!((p.risk_factors[1].impact - 0.3).abs() < 1e-12);
        assert!((p.risk_factors[2].impact - 0.3).abs() < 1e-12);
        assert!((0.1..=0.2).contains(&p.risk_factors[3].impact));
        assert_eq!(p.risk_factors[3].confidence, 0.80);
    }

    #[test]
    fn test_model_version_tag() {
        let record = sample_record("P-5", 50, 1, 1);
        let external = synthetic_prediction(&record, EXTERNAL_MODEL_VERSION);
        let fallback = synthetic_prediction(&record, FALLBACK_MODEL_VERSION);

        assert_eq!(external.model_version, EXTERNAL_MODEL_VERSION);
        assert_eq!(fallback.model_version, FALLBACK_MODEL_VERSION);
        assert_eq!(external.risk_score, fallback.risk_score);
    }
}
