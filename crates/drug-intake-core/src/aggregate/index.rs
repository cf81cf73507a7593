//! Incremental daily index.
//!
//! Kept up to date on every append so repeated queries avoid a full rescan.
//! The store is append-only, so entries are never invalidated.

use std::collections::BTreeMap;

use crate::models::{DailyAggregate, DailyKey, IntakeEvent};

/// Running daily totals keyed by (patient, drug, date).
#[derive(Debug, Clone, Default)]
pub struct DailyIndex {
    totals: BTreeMap<DailyKey, DailyAggregate>,
}

impl DailyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into its daily total.
    pub fn record(&mut self, event: &IntakeEvent) {
        let aggregate = self
            .totals
            .entry(event.daily_key())
            .or_insert_with(|| DailyAggregate {
                patient_id: event.patient_id.clone(),
                drug_name: event.drug_name.clone(),
                date: event.date(),
                total_dose: 0.0,
                intake_count: 0,
                unit: event.unit.clone(),
            });
        aggregate.total_dose += event.dose;
        aggregate.intake_count += 1;
    }

    /// Current aggregates, sorted by key, optionally for one patient.
    pub fn aggregates(&self, patient_filter: Option<&str>) -> Vec<DailyAggregate> {
        self.totals
            .values()
            .filter(|a| patient_filter.map_or(true, |p| a.patient_id == p))
            .cloned()
            .collect()
    }

    pub fn get(&self, key: &DailyKey) -> Option<&DailyAggregate> {
        self.totals.get(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::daily_totals;
    use chrono::DateTime;

    fn event(drug: &str, dose: f64, ts: &str) -> IntakeEvent {
        IntakeEvent {
            event_id: ts.to_string(),
            patient_id: "P001".into(),
            drug_name: drug.into(),
            dose,
            timestamp: DateTime::parse_from_rfc3339(ts).unwrap(),
            drug_type: "Blood Pressure".into(),
            unit: "mg".into(),
        }
    }

    #[test]
    fn test_record_accumulates() {
        let mut index = DailyIndex::new();
        let first = event("Lisinopril", 25.0, "2024-01-01T08:00:00Z");
        index.record(&first);
        index.record(&event("Lisinopril", 20.0, "2024-01-01T20:00:00Z"));

        let aggregate = index.get(&first.daily_key()).unwrap();
        assert_eq!(aggregate.total_dose, 45.0);
        assert_eq!(aggregate.intake_count, 2);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_matches_full_scan() {
        let events = vec![
            event("Lisinopril", 25.0, "2024-01-01T08:00:00Z"),
            event("Metformin", 500.0, "2024-01-01T09:00:00Z"),
            event("Lisinopril", 20.0, "2024-01-02T08:00:00Z"),
            event("Lisinopril", 10.0, "2024-01-01T22:00:00Z"),
        ];

        let mut index = DailyIndex::new();
        for e in &events {
            index.record(e);
        }

        let indexed = index.aggregates(None);
        let scanned = daily_totals(&events, None);

        assert_eq!(indexed.len(), scanned.len());
        for (a, b) in indexed.iter().zip(&scanned) {
            assert_eq!(a.key(), b.key());
            assert_eq!(a.intake_count, b.intake_count);
            assert!((a.total_dose - b.total_dose).abs() <= 1e-9 * b.total_dose.abs().max(1.0));
        }
    }
}
