//! Usage series for charting.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{
    DrugFrequency, HourCount, IntakeEvent, PatientTotal, TypeDayPoint, UsageSeries,
};

/// Build all usage series in one pass over the events.
pub fn build_usage_series(events: &[IntakeEvent]) -> UsageSeries {
    let mut by_type_day: BTreeMap<(NaiveDate, &str), f64> = BTreeMap::new();
    let mut frequency: BTreeMap<&str, usize> = BTreeMap::new();
    let mut per_patient: BTreeMap<&str, f64> = BTreeMap::new();
    let mut hourly: BTreeMap<u32, usize> = BTreeMap::new();

    for event in events {
        *by_type_day
            .entry((event.date(), event.drug_type.as_str()))
            .or_insert(0.0) += event.dose;
        *frequency.entry(event.drug_name.as_str()).or_insert(0) += 1;
        *per_patient.entry(event.patient_id.as_str()).or_insert(0.0) += event.dose;
        *hourly.entry(event.hour()).or_insert(0) += 1;
    }

    let mut drug_frequency: Vec<DrugFrequency> = frequency
        .into_iter()
        .map(|(drug_name, count)| DrugFrequency {
            drug_name: drug_name.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps name order among equal counts
    drug_frequency.sort_by(|a, b| b.count.cmp(&a.count));

    UsageSeries {
        daily_by_type: by_type_day
            .into_iter()
            .map(|((date, drug_type), total_dose)| TypeDayPoint {
                date,
                drug_type: drug_type.to_string(),
                total_dose,
            })
            .collect(),
        drug_frequency,
        patient_totals: per_patient
            .into_iter()
            .map(|(patient_id, total_dose)| PatientTotal {
                patient_id: patient_id.to_string(),
                total_dose,
            })
            .collect(),
        hourly_intakes: hourly
            .into_iter()
            .map(|(hour, count)| HourCount { hour, count })
            .collect(),
    }
}
