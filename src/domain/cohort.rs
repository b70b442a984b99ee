//! Cohort filters and distributional statistics over risk scores.

use serde::{Deserialize, Serialize};

use super::patient::PatientRecord;

/// Optional predicates selecting a cohort. Present predicates are ANDed.
///
/// Empty strings and empty lists impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortFilter {
    #[serde(default)]
    pub age_min: Option<u32>,
    #[serde(default)]
    pub age_max: Option<u32>,
    /// Exact sex match
    #[serde(default)]
    pub sex: Option<String>,
    /// Matches when the patient takes any of these (exact names)
    #[serde(default)]
    pub medications: Option<Vec<String>>,
    /// Matches when the patient's study group is any of these
    #[serde(default)]
    pub study_groups: Option<Vec<String>>,
}

impl CohortFilter {
    /// Whether a single record satisfies every present predicate.
    #[must_use]
    pub fn matches(&self, record: &PatientRecord) -> bool {
        if let Some(min) = self.age_min {
            if record.age < min {
                return false;
            }
        }
        if let Some(max) = self.age_max {
            if record.age > max {
                return false;
            }
        }
        if let Some(sex) = self.sex.as_deref().filter(|s| !s.is_empty()) {
            if record.sex != sex {
                return false;
            }
        }
        if let Some(meds) = self.medications.as_ref().filter(|m| !m.is_empty()) {
            if !meds.iter().any(|m| record.medications.contains(m)) {
                return false;
            }
        }
        if let Some(groups) = self.study_groups.as_ref().filter(|g| !g.is_empty()) {
            match &record.study_group {
                Some(group) if groups.contains(group) => {}
                _ => return false,
            }
        }
        true
    }

    /// Records satisfying the filter, in input order.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [PatientRecord]) -> Vec<&'a PatientRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Counts per fixed risk bucket.
///
/// Low is `< 0.3`, high is `> 0.7`; both 0.3 and 0.7 count as medium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBuckets {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskBuckets {
    #[must_use]
    pub fn from_scores(scores: &[f64]) -> Self {
        scores.iter().fold(Self::default(), |mut acc, &s| {
            if s < 0.3 {
                acc.low += 1;
            } else if s <= 0.7 {
                acc.medium += 1;
            } else {
                acc.high += 1;
            }
            acc
        })
    }
}

/// Score percentiles (linear interpolation between closest ranks).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    #[serde(rename = "25th")]
    pub p25: f64,
    #[serde(rename = "50th")]
    pub p50: f64,
    #[serde(rename = "75th")]
    pub p75: f64,
    #[serde(rename = "95th")]
    pub p95: f64,
}

impl Percentiles {
    /// Compute from an ascending-sorted slice. All zero when empty.
    #[must_use]
    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            p25: percentile(sorted, 25.0),
            p50: percentile(sorted, 50.0),
            p75: percentile(sorted, 75.0),
            p95: percentile(sorted, 95.0),
        }
    }
}

/// `p`-th percentile of an ascending-sorted slice, interpolating linearly
/// between the two nearest ranks. Returns 0 for an empty slice.
#[must_use]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// Aggregate statistics of a cohort's risk scores.
///
/// Every field is zero for an empty cohort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    pub cohort_size: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub buckets: RiskBuckets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentiles: Option<Percentiles>,
}

impl CohortStats {
    #[must_use]
    pub fn from_scores(scores: &[f64], with_percentiles: bool) -> Self {
        let percentiles_if =
            |sorted: &[f64]| with_percentiles.then(|| Percentiles::from_sorted(sorted));

        if scores.is_empty() {
            return Self {
                percentiles: percentiles_if(&[]),
                ..Self::default()
            };
        }

        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        Self {
            cohort_size: sorted.len(),
            mean,
            median: percentile(&sorted, 50.0),
            std: variance.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            buckets: RiskBuckets::from_scores(&sorted),
            percentiles: percentiles_if(&sorted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_three_bucket_example() {
        let stats = CohortStats::from_scores(&[0.1, 0.5, 0.9], false);
        assert_eq!(stats.cohort_size, 3);
        assert!(approx(stats.mean, 0.5));
        assert!(approx(stats.median, 0.5));
        assert_eq!(stats.buckets, RiskBuckets { low: 1, medium: 1, high: 1 });
        assert!(stats.percentiles.is_none());
    }

    #[test]
    fn test_identical_scores_have_zero_std() {
        let stats = CohortStats::from_scores(&[0.42; 6], true);
        assert!(approx(stats.mean, 0.42));
        assert!(approx(stats.std, 0.0));
        assert!(approx(stats.min, stats.max));
        let p = stats.percentiles.expect("Should compute percentiles");
        assert!(approx(p.p95, 0.42));
    }

    #[test]
    fn test_empty_scores_are_neutral() {
        let stats = CohortStats::from_scores(&[], true);
        assert_eq!(stats.cohort_size, 0);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.buckets, RiskBuckets::default());
        assert_eq!(stats.percentiles, Some(Percentiles::default()));
    }

    #[test]
    fn test_bucket_boundaries_are_medium() {
        let buckets = RiskBuckets::from_scores(&[0.3, 0.7, 0.2999, 0.7001]);
        assert_eq!(buckets, RiskBuckets { low: 1, medium: 2, high: 1 });
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [0.1, 0.2, 0.3, 0.4];
        assert!(approx(percentile(&sorted, 25.0), 0.175));
        assert!(approx(percentile(&sorted, 50.0), 0.25));
        assert!(approx(percentile(&sorted, 95.0), 0.385));
        assert!(approx(percentile(&[0.6], 75.0), 0.6));
    }

    #[test]
    fn test_population_std() {
        let stats = CohortStats::from_scores(&[0.2, 0.4], false);
        assert!(approx(stats.std, 0.1));
    }

    #[test]
    fn test_filter_predicates() {
        let records = vec![
            PatientRecord::new("P-1", 30, "F").with_medications(["Warfarin"]),
            PatientRecord::new("P-2", 55, "M")
                .with_medications(["Metformin"])
                .with_study_group("trial-a"),
            PatientRecord::new("P-3", 72, "M").with_medications(["Aspirin"]),
        ];

        let filter = CohortFilter {
            age_min: Some(40),
            sex: Some("M".into()),
            ..CohortFilter::default()
        };
        let ids: Vec<_> = filter.apply(&records).iter().map(|r| r.patient_id.as_str()).collect();
        assert_eq!(ids, ["P-2", "P-3"]);

        let filter = CohortFilter {
            medications: Some(vec!["Warfarin".into(), "Aspirin".into()]),
            ..CohortFilter::default()
        };
        assert_eq!(filter.apply(&records).len(), 2);

        let filter = CohortFilter {
            study_groups: Some(vec!["trial-a".into()]),
            ..CohortFilter::default()
        };
        assert_eq!(filter.apply(&records).len(), 1);
    }

    #[test]
    fn test_unmatchable_filter_is_empty() {
        let records = vec![PatientRecord::new("P-1", 30, "F"), PatientRecord::new("P-2", 60, "M")];
        let filter = CohortFilter {
            age_min: Some(90),
            ..CohortFilter::default()
        };
        assert!(filter.apply(&records).is_empty());
    }

    #[test]
    fn test_empty_predicates_are_ignored() {
        let records = vec![PatientRecord::new("P-1", 30, "F")];
        let filter = CohortFilter {
            sex: Some(String::new()),
            medications: Some(Vec::new()),
            study_groups: Some(Vec::new()),
            ..CohortFilter::default()
        };
        assert_eq!(filter.apply(&records).len(), 1);
    }
}
