//! Plain-text rendering of tracker results for the terminal.

use drug_intake_core::models::{
    DailyAggregate, FleetSummary, IntakeEvent, InteractionAdvisory, OverdoseWarning, PatientReport,
};
use drug_intake_core::DrugReferenceTable;

use crate::logbook::{LogEntry, LOG_TIME_FORMAT};

/// Record, patient and drug counts plus the covered date range.
pub fn overview(fleet: &FleetSummary) -> String {
    let mut out = String::from("SYSTEM OVERVIEW\n");
    out.push_str(&format!("Total Records: {}\n", fleet.total_records));
    out.push_str(&format!("Unique Patients: {}\n", fleet.distinct_patients));
    out.push_str(&format!("Unique Drugs: {}\n", fleet.distinct_drugs));
    if let (Some(first), Some(last)) = (fleet.first_date, fleet.last_date) {
        out.push_str(&format!("Date Range: {} to {}\n", first, last));
    }
    out
}

/// The reference table, one drug per line.
pub fn drug_database(reference: &DrugReferenceTable) -> String {
    let mut out = String::from("DRUG DATABASE\n");
    for (name, entry) in reference.iter() {
        out.push_str(&format!(
            "  {}: {} (Max: {} {}/day)\n",
            name, entry.drug_type, entry.max_daily_dose, entry.unit
        ));
    }
    out
}

/// Events as a table, in the order given.
pub fn recent_records(events: &[IntakeEvent]) -> String {
    let mut out = String::from("RECENT INTAKE RECORDS\n");
    out.push_str(&format!(
        "{:<8} {:<14} {:>10} {:<4} {}\n",
        "patient", "drug", "dose", "unit", "timestamp"
    ));
    for event in events {
        out.push_str(&format!(
            "{:<8} {:<14} {:>10.1} {:<4} {}\n",
            event.patient_id,
            event.drug_name,
            event.dose,
            event.unit,
            event.timestamp.format("%Y-%m-%d %H:%M")
        ));
    }
    out
}

/// Largest daily totals.
pub fn top_daily_totals(aggregates: &[DailyAggregate]) -> String {
    let mut out = String::from("DAILY INTAKE ANALYSIS\n");
    for a in aggregates {
        out.push_str(&format!(
            "  {} {} {}: {:.1} {} ({} intakes)\n",
            a.patient_id, a.drug_name, a.date, a.total_dose, a.unit, a.intake_count
        ));
    }
    out
}

/// Overdose warnings, or a line saying there are none.
pub fn overdose_warnings(warnings: &[OverdoseWarning]) -> String {
    if warnings.is_empty() {
        return "No overdose warnings detected\n".to_string();
    }

    let mut out = format!("OVERDOSE WARNINGS ({})\n", warnings.len());
    for w in warnings {
        out.push_str(&format!(
            "  {} - {} on {}: {:.1} > {} {}\n",
            w.patient_id, w.drug_name, w.date, w.actual_dose, w.max_dose, w.unit
        ));
    }
    out
}

fn advisories(advisories: &[InteractionAdvisory]) -> String {
    if advisories.is_empty() {
        return "No interaction advisories\n".to_string();
    }

    let mut out = String::new();
    for a in advisories {
        out.push_str(&format!("  [{:?}] {}: {}\n", a.severity, a.drugs.join(" + "), a.message));
    }
    out
}

/// Full report for one patient.
pub fn patient_report(report: &PatientReport) -> String {
    let summary = &report.summary;
    let mut out = format!("PATIENT REPORT: {}\n", summary.patient_id);
    out.push_str(&format!(
        "Report Period: {} to {}\n",
        summary.first_date, summary.last_date
    ));
    out.push_str(&format!("Total Drug Intakes: {}\n", summary.total_intakes));

    out.push_str("\n--- DRUG SUMMARY ---\n");
    out.push_str(&format!(
        "{:<14} {:>5} {:>10} {:>9} {}\n",
        "drug", "count", "total", "mean", "type"
    ));
    for drug in &summary.drugs {
        out.push_str(&format!(
            "{:<14} {:>5} {:>10.1} {:>9.2} {}\n",
            drug.drug_name, drug.count, drug.total_dose, drug.mean_dose, drug.drug_type
        ));
    }

    out.push_str("\n--- OVERDOSE WARNINGS ---\n");
    if report.warnings.is_empty() {
        out.push_str("No overdose warnings found\n");
    } else {
        for w in &report.warnings {
            out.push_str(&format!(
                "  {}: {} - {:.1} > {}\n",
                w.date, w.drug_name, w.actual_dose, w.max_dose
            ));
        }
    }

    out.push_str("\n--- DRUG INTERACTION CHECK ---\n");
    out.push_str(&advisories(&report.advisories));
    out
}

/// Per drug type totals.
pub fn type_analysis(fleet: &FleetSummary) -> String {
    let mut out = String::from("DRUG TYPE ANALYSIS\n");
    out.push_str(&format!(
        "{:<18} {:>13} {:>12} {:>15}\n",
        "drug_type", "total_intakes", "total_dose", "unique_patients"
    ));
    for t in &fleet.by_type {
        out.push_str(&format!(
            "{:<18} {:>13} {:>12.1} {:>15}\n",
            t.drug_type, t.total_intakes, t.total_dose, t.distinct_patients
        ));
    }
    out
}

/// Intake log entries, one per line.
pub fn history(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return "No logs found yet.\n".to_string();
    }

    let mut out = String::from("DRUG INTAKE HISTORY\n");
    for e in entries {
        out.push_str(&format!(
            "{} | {} | {}",
            e.time.format(LOG_TIME_FORMAT),
            e.drug_name,
            e.dosage
        ));
        if let Some(patient) = &e.patient_id {
            out.push_str(&format!(" | {}", patient));
        }
        if !e.notes.is_empty() {
            out.push_str(&format!(" | {}", e.notes));
        }
        out.push('\n');
    }
    out
}
