//! Seeded synthetic intake histories.
//!
//! Each patient takes 2-4 distinct reference drugs per day, each 1-3 times
//! between 06:00 and 21:59, at 10-40% of the drug's daily maximum per dose.
//! Three doses at the upper end exceed the maximum, so generated data
//! regularly produces overdose warnings.

use chrono::{DateTime, Duration, NaiveDate, Offset, Utc};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use drug_intake_core::models::IntakeRecord;
use drug_intake_core::store::StoreResult;
use drug_intake_core::{DrugReferenceTable, Tracker};

/// Parameters for a generated history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleConfig {
    pub patients: Vec<String>,
    /// First day of the history
    pub start: NaiveDate,
    pub days: u32,
    pub seed: u64,
}

impl SampleConfig {
    /// Three patients (P001-P003) over the given number of days ending yesterday.
    pub fn recent(days: u32, seed: u64) -> Self {
        let start = Utc::now().date_naive() - Duration::days(i64::from(days));
        Self {
            patients: patient_ids(3),
            start,
            days,
            seed,
        }
    }
}

/// Patient IDs P001, P002, ... of the given length.
pub fn patient_ids(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("P{:03}", i)).collect()
}

/// Deterministic generator for a given seed.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    config: SampleConfig,
    rng: ChaCha8Rng,
}

impl SampleGenerator {
    pub fn new(config: SampleConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    pub fn config(&self) -> &SampleConfig {
        &self.config
    }

    /// Generate records for every configured patient and day.
    ///
    /// Drugs are drawn from the reference table, so every record classifies.
    pub fn generate(&mut self, reference: &DrugReferenceTable) -> Vec<IntakeRecord> {
        let drugs: Vec<(&str, f64)> = reference
            .iter()
            .map(|(name, entry)| (name, entry.max_daily_dose))
            .collect();
        if drugs.is_empty() {
            return Vec::new();
        }

        let mut records = Vec::new();
        for patient in &self.config.patients {
            for day in 0..self.config.days {
                let date = self.config.start + Duration::days(i64::from(day));
                let per_day = self.rng.gen_range(2..=4).min(drugs.len());
                let chosen: Vec<(&str, f64)> = drugs
                    .choose_multiple(&mut self.rng, per_day)
                    .copied()
                    .collect();

                for (drug, max) in chosen {
                    let doses = self.rng.gen_range(1..=3);
                    for _ in 0..doses {
                        let hour = self.rng.gen_range(6..22);
                        let minute = self.rng.gen_range(0..60);
                        let Some(naive) = date.and_hms_opt(hour, minute, 0) else {
                            continue;
                        };
                        let timestamp = DateTime::from_naive_utc_and_offset(naive, Utc.fix());
                        let dose = round_tenth(max * self.rng.gen_range(0.1..0.4));
                        records.push(IntakeRecord::new(patient.as_str(), drug, dose, timestamp));
                    }
                }
            }
        }

        tracing::debug!(
            records = records.len(),
            seed = self.config.seed,
            "Generated sample intake records"
        );
        records
    }

    /// Generate a history and record it into the tracker. Returns the number
    /// of events appended.
    pub fn populate(&mut self, tracker: &Tracker) -> StoreResult<usize> {
        let records = self.generate(tracker.reference());
        let count = records.len();
        for record in records {
            tracker.record(record)?;
        }
        tracing::info!(count, "Populated tracker with sample data");
        Ok(count)
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use std::collections::BTreeSet;

    fn config(seed: u64) -> SampleConfig {
        SampleConfig {
            patients: patient_ids(3),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            days: 30,
            seed,
        }
    }

    #[test]
    fn test_patient_ids() {
        assert_eq!(patient_ids(3), vec!["P001", "P002", "P003"]);
        assert!(patient_ids(0).is_empty());
    }

    #[test]
    fn test_same_seed_same_history() {
        let reference = DrugReferenceTable::with_defaults();
        let a = SampleGenerator::new(config(7)).generate(&reference);
        let b = SampleGenerator::new(config(7)).generate(&reference);
        assert_eq!(a, b);
    }

    #[test]
    fn test_records_stay_in_bounds() {
        let reference = DrugReferenceTable::with_defaults();
        let records = SampleGenerator::new(config(42)).generate(&reference);
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();

        assert!(!records.is_empty());
        for record in &records {
            let max = reference.max_daily_dose(&record.drug_name);
            assert!(record.dose >= (max * 0.1 * 10.0).round() / 10.0 - 0.05);
            assert!(record.dose <= max * 0.4 + 0.05);
            assert!((6..22).contains(&record.timestamp.hour()));
            let date = record.timestamp.date_naive();
            assert!(date >= first && date <= last);
        }
    }

    #[test]
    fn test_distinct_drugs_per_day() {
        let reference = DrugReferenceTable::with_defaults();
        let records = SampleGenerator::new(config(3)).generate(&reference);

        for patient in patient_ids(3) {
            for day in 1..=30 {
                let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
                let drugs: BTreeSet<&str> = records
                    .iter()
                    .filter(|r| r.patient_id == patient && r.timestamp.date_naive() == date)
                    .map(|r| r.drug_name.as_str())
                    .collect();
                assert!((2..=4).contains(&drugs.len()), "{} {}: {:?}", patient, date, drugs);
            }
        }
    }

    #[test]
    fn test_empty_reference_generates_nothing() {
        let records = SampleGenerator::new(config(1)).generate(&DrugReferenceTable::new());
        assert!(records.is_empty());
    }

    #[test]
    fn test_populate_tracker() {
        let tracker = Tracker::with_defaults();
        let count = SampleGenerator::new(config(11)).populate(&tracker).unwrap();

        assert_eq!(tracker.store().len(), count);
        assert_eq!(tracker.store().patients().len(), 3);
    }
}
