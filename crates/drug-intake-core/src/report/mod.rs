//! Report builder.
//!
//! Summaries are projections of the current store contents. Nothing is
//! cached here, so every call reflects the latest appends.

mod usage;

pub use usage::*;

use std::collections::{BTreeMap, BTreeSet};

use crate::aggregate::daily_totals;
use crate::models::{
    DailyAggregate, DrugUsage, FleetSummary, IntakeEvent, PatientSummary, TypeSummary, UsageSeries,
};
use crate::store::IntakeStore;

/// Builds patient and fleet summaries from an intake store.
pub struct ReportBuilder<'a> {
    store: &'a IntakeStore,
}

impl<'a> ReportBuilder<'a> {
    /// Create a new report builder.
    pub fn new(store: &'a IntakeStore) -> Self {
        Self { store }
    }

    /// Per-drug usage for one patient.
    ///
    /// Returns `None` when the patient has no events; callers branch on that
    /// before formatting.
    pub fn patient_summary(&self, patient_id: &str) -> Option<PatientSummary> {
        self.store
            .with_events(|events| summarize_patient(events, patient_id))
    }

    /// Per-drug-type totals across the whole store.
    pub fn fleet_summary(&self) -> FleetSummary {
        self.store.with_events(summarize_fleet)
    }

    /// The `n` largest daily totals, largest first.
    pub fn top_daily_totals(&self, n: usize) -> Vec<DailyAggregate> {
        let mut totals = self.store.daily_totals(None);
        totals.sort_by(|a, b| {
            b.total_dose
                .total_cmp(&a.total_dose)
                .then_with(|| a.key().cmp(&b.key()))
        });
        totals.truncate(n);
        totals
    }

    /// The `n` most recent events by timestamp, newest first.
    pub fn recent_events(&self, n: usize) -> Vec<IntakeEvent> {
        let mut events = self.store.all();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(n);
        events
    }

    /// Chart-ready usage series over the whole store.
    pub fn usage_series(&self) -> UsageSeries {
        self.store.with_events(build_usage_series)
    }
}

/// Summarize one patient's events.
pub fn summarize_patient(events: &[IntakeEvent], patient_id: &str) -> Option<PatientSummary> {
    let patient_events: Vec<&IntakeEvent> =
        events.iter().filter(|e| e.patient_id == patient_id).collect();

    let first_date = patient_events.iter().map(|e| e.date()).min()?;
    let last_date = patient_events.iter().map(|e| e.date()).max()?;

    // Totals come from the daily aggregates, counts and labels from raw events.
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for aggregate in daily_totals(patient_events.iter().copied(), None) {
        *totals.entry(aggregate.drug_name).or_insert(0.0) += aggregate.total_dose;
    }

    let mut usage: BTreeMap<&str, (usize, &str, &str)> = BTreeMap::new();
    for event in &patient_events {
        usage
            .entry(event.drug_name.as_str())
            .or_insert((0, event.drug_type.as_str(), event.unit.as_str()))
            .0 += 1;
    }

    let drugs = usage
        .into_iter()
        .map(|(drug_name, (count, drug_type, unit))| {
            let total_dose = totals.get(drug_name).copied().unwrap_or(0.0);
            DrugUsage {
                drug_name: drug_name.to_string(),
                count,
                total_dose,
                mean_dose: total_dose / count as f64,
                drug_type: drug_type.to_string(),
                unit: unit.to_string(),
            }
        })
        .collect();

    Some(PatientSummary {
        patient_id: patient_id.to_string(),
        first_date,
        last_date,
        total_intakes: patient_events.len(),
        drugs,
    })
}

/// Summarize all events by drug type.
pub fn summarize_fleet(events: &[IntakeEvent]) -> FleetSummary {
    #[derive(Default)]
    struct TypeAcc<'e> {
        intakes: usize,
        total: f64,
        patients: BTreeSet<&'e str>,
    }

    let mut by_type: BTreeMap<&str, TypeAcc<'_>> = BTreeMap::new();
    for event in events {
        let acc = by_type.entry(event.drug_type.as_str()).or_default();
        acc.intakes += 1;
        acc.total += event.dose;
        acc.patients.insert(event.patient_id.as_str());
    }

    let patients: BTreeSet<&str> = events.iter().map(|e| e.patient_id.as_str()).collect();
    let drugs: BTreeSet<&str> = events.iter().map(|e| e.drug_name.as_str()).collect();

    FleetSummary {
        total_records: events.len(),
        distinct_patients: patients.len(),
        distinct_drugs: drugs.len(),
        first_date: events.iter().map(|e| e.date()).min(),
        last_date: events.iter().map(|e| e.date()).max(),
        by_type: by_type
            .into_iter()
            .map(|(drug_type, acc)| TypeSummary {
                drug_type: drug_type.to_string(),
                total_intakes: acc.intakes,
                total_dose: acc.total,
                distinct_patients: acc.patients.len(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::DrugReferenceTable;

    fn store_with(entries: &[(&str, &str, f64, &str)]) -> IntakeStore {
        let store = IntakeStore::new();
        let table = DrugReferenceTable::with_defaults();
        for (patient, drug, dose, ts) in entries {
            store.append_raw(patient, drug, *dose, ts, &table).unwrap();
        }
        store
    }

    #[test]
    fn test_patient_summary() {
        let store = store_with(&[
            ("P001", "Aspirin", 500.0, "2024-01-01 08:00"),
            ("P001", "Aspirin", 600.0, "2024-01-01 20:00"),
            ("P001", "Aspirin", 400.0, "2024-01-03 08:00"),
            ("P001", "Metformin", 850.0, "2024-01-02 08:00"),
            ("P002", "Aspirin", 900.0, "2024-01-05 08:00"),
        ]);

        let summary = ReportBuilder::new(&store).patient_summary("P001").unwrap();

        assert_eq!(summary.total_intakes, 4);
        assert_eq!(summary.first_date.to_string(), "2024-01-01");
        assert_eq!(summary.last_date.to_string(), "2024-01-03");
        assert_eq!(summary.drugs.len(), 2);

        let aspirin = summary.drug("Aspirin").unwrap();
        assert_eq!(aspirin.count, 3);
        assert!((aspirin.total_dose - 1500.0).abs() < 1e-9);
        assert!((aspirin.mean_dose - 500.0).abs() < 1e-9);
        assert_eq!(aspirin.drug_type, "Painkiller");
    }

    #[test]
    fn test_patient_summary_empty_is_none() {
        let store = store_with(&[("P001", "Aspirin", 500.0, "2024-01-01 08:00")]);

        assert!(ReportBuilder::new(&store).patient_summary("P999").is_none());
        assert!(ReportBuilder::new(&IntakeStore::new())
            .patient_summary("P001")
            .is_none());
    }

    #[test]
    fn test_fleet_summary_by_type() {
        let store = store_with(&[
            ("P001", "Aspirin", 500.0, "2024-01-01 08:00"),
            ("P002", "Acetaminophen", 1000.0, "2024-01-02 08:00"),
            ("P002", "Aspirin", 300.0, "2024-01-02 09:00"),
            ("P001", "Warfarin", 5.0, "2024-01-03 08:00"),
        ]);

        let fleet = ReportBuilder::new(&store).fleet_summary();

        assert_eq!(fleet.total_records, 4);
        assert_eq!(fleet.distinct_patients, 2);
        assert_eq!(fleet.distinct_drugs, 3);

        let painkillers = fleet.drug_type("Painkiller").unwrap();
        assert_eq!(painkillers.total_intakes, 3);
        assert!((painkillers.total_dose - 1800.0).abs() < 1e-9);
        assert_eq!(painkillers.distinct_patients, 2);

        let unknown = fleet.drug_type("Unknown").unwrap();
        assert_eq!(unknown.total_intakes, 1);
        assert_eq!(unknown.distinct_patients, 1);
    }

    #[test]
    fn test_fleet_summary_empty_store() {
        let fleet = ReportBuilder::new(&IntakeStore::new()).fleet_summary();

        assert!(fleet.is_empty());
        assert!(fleet.by_type.is_empty());
        assert_eq!(fleet.first_date, None);
    }

    #[test]
    fn test_summaries_reflect_new_appends() {
        let store = store_with(&[("P001", "Aspirin", 500.0, "2024-01-01 08:00")]);
        let builder = ReportBuilder::new(&store);
        assert_eq!(builder.patient_summary("P001").unwrap().total_intakes, 1);

        store
            .append_raw(
                "P001",
                "Aspirin",
                250.0,
                "2024-01-01 12:00",
                &DrugReferenceTable::with_defaults(),
            )
            .unwrap();

        let summary = builder.patient_summary("P001").unwrap();
        assert_eq!(summary.total_intakes, 2);
        assert!((summary.drugs[0].total_dose - 750.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_daily_totals_and_recent_events() {
        let store = store_with(&[
            ("P001", "Aspirin", 500.0, "2024-01-01 08:00"),
            ("P001", "Metformin", 1500.0, "2024-01-01 09:00"),
            ("P002", "Aspirin", 900.0, "2024-01-03 08:00"),
        ]);
        let builder = ReportBuilder::new(&store);

        let top = builder.top_daily_totals(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].drug_name, "Metformin");
        assert_eq!(top[1].total_dose, 900.0);

        let recent = builder.recent_events(1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].patient_id, "P002");
    }
}
