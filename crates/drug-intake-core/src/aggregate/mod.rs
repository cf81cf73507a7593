//! Aggregation engine.
//!
//! Groups intake events by (patient, drug, calendar day) and sums doses.
//! The calendar day is the date of the event timestamp in its own offset.

mod index;

pub use index::*;

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{DailyAggregate, DailyKey, DateRange, IntakeEvent};

/// Compute daily totals over a set of events.
///
/// Returns one aggregate per distinct key, sorted by patient, drug, date.
/// Doses within a key are summed in ascending order, so the result does not
/// depend on the order of `events`.
pub fn daily_totals<'a, I>(events: I, patient_filter: Option<&str>) -> Vec<DailyAggregate>
where
    I: IntoIterator<Item = &'a IntakeEvent>,
{
    let mut groups: BTreeMap<DailyKey, (Vec<f64>, &'a str)> = BTreeMap::new();

    for event in events {
        if patient_filter.is_some_and(|p| p != event.patient_id) {
            continue;
        }
        groups
            .entry(event.daily_key())
            .or_insert_with(|| (Vec::new(), event.unit.as_str()))
            .0
            .push(event.dose);
    }

    groups
        .into_iter()
        .map(|(key, (mut doses, unit))| {
            doses.sort_by(f64::total_cmp);
            DailyAggregate {
                patient_id: key.patient_id,
                drug_name: key.drug_name,
                date: key.date,
                total_dose: doses.iter().sum(),
                intake_count: doses.len(),
                unit: unit.to_string(),
            }
        })
        .collect()
}

/// Distinct drug names a patient took, optionally limited to a date range.
pub fn distinct_drugs<'a, I>(events: I, patient_id: &str, range: Option<DateRange>) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a IntakeEvent>,
{
    events
        .into_iter()
        .filter(|e| e.patient_id == patient_id)
        .filter(|e| range.map_or(true, |r| r.contains(e.date())))
        .map(|e| e.drug_name.clone())
        .collect()
}
