//! Synthetic cohort generator for demos and load testing.
//!
//! Output depends only on `count`: the generator is seeded with a fixed
//! value, so `generate(n)` is always a prefix of `generate(n + 1)`.

use rand::distributions::Distribution;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use statrs::distribution::Normal;

use crate::domain::PatientRecord;

/// Fixed generator seed.
pub const GENERATOR_SEED: u64 = 42;

/// Largest cohort one request may generate.
pub const MAX_GENERATED: usize = 10_000;

const SEXES: [&str; 2] = ["M", "F"];
const RACES: [&str; 5] = ["White", "Black", "Asian", "Hispanic", "Other"];
const MEDICATION_POOL: [&str; 6] = [
    "metformin",
    "lisinopril",
    "atorvastatin",
    "warfarin",
    "metoprolol",
    "furosemide",
];
const COMORBIDITY_POOL: [&str; 5] = [
    "diabetes",
    "hypertension",
    "hyperlipidemia",
    "atrial_fibrillation",
    "heart_failure",
];

/// Draws from N(mean, std), or `mean` if the parameters are rejected.
fn normal(rng: &mut ChaCha8Rng, mean: f64, std: f64) -> f64 {
    Normal::new(mean, std).map_or(mean, |n| n.sample(rng))
}

fn pick_distinct(rng: &mut ChaCha8Rng, pool: &[&str], count: usize) -> Vec<String> {
    pool.choose_multiple(rng, count)
        .map(|s| (*s).to_string())
        .collect()
}

/// Generate `count` patients (capped at [`MAX_GENERATED`]), `P-1000` onward.
#[must_use]
pub fn generate_patients(count: usize) -> Vec<PatientRecord> {
    let count = count.min(MAX_GENERATED);
    let mut rng = ChaCha8Rng::seed_from_u64(GENERATOR_SEED);

    (0..count)
        .map(|i| {
            let age = normal(&mut rng, 65.0, 15.0).clamp(18.0, 95.0) as u32;
            let sex = SEXES[rng.gen_range(0..SEXES.len())];
            let race = RACES[rng.gen_range(0..RACES.len())];

            let med_count = rng.gen_range(1..=4);
            let medications = pick_distinct(&mut rng, &MEDICATION_POOL, med_count);
            let comorbidity_count = rng.gen_range(0..=2);
            let comorbidities = pick_distinct(&mut rng, &COMORBIDITY_POOL, comorbidity_count);

            let mut record = PatientRecord::new(format!("P-{}", 1000 + i), age, sex)
                .with_medications(medications)
                .with_comorbidities(comorbidities);
            record.race = race.to_string();

            for (name, mean, std) in [
                ("creatinine", 1.1, 0.3),
                ("alt", 35.0, 15.0),
                ("ast", 32.0, 12.0),
            ] {
                record
                    .lab_results
                    .insert(name.to_string(), normal(&mut rng, mean, std));
            }
            for (name, mean, std) in [
                ("bp_systolic", 130.0, 20.0),
                ("bp_diastolic", 80.0, 10.0),
                ("heart_rate", 72.0, 12.0),
            ] {
                record
                    .vital_signs
                    .insert(name.to_string(), normal(&mut rng, mean, std));
            }

            record
        })
        .collect()
}
