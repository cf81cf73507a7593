//! CSV rendering of events, daily totals and warnings.

use crate::models::{DailyAggregate, IntakeEvent, OverdoseWarning};

/// Header for [`events_to_csv`].
pub const EVENTS_CSV_HEADER: &str = "event_id,patient_id,drug_name,dose,unit,drug_type,timestamp";

/// Header for [`daily_totals_to_csv`].
pub const DAILY_TOTALS_CSV_HEADER: &str = "patient_id,drug_name,date,total_dose,intake_count,unit";

/// Header for [`warnings_to_csv`].
pub const WARNINGS_CSV_HEADER: &str = "patient_id,drug_name,date,actual_dose,max_dose,unit";

/// Render intake events as CSV.
pub fn events_to_csv(events: &[IntakeEvent]) -> String {
    let mut csv = String::new();
    csv.push_str(EVENTS_CSV_HEADER);
    csv.push('\n');

    for event in events {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            escape_csv(&event.event_id),
            escape_csv(&event.patient_id),
            escape_csv(&event.drug_name),
            event.dose,
            escape_csv(&event.unit),
            escape_csv(&event.drug_type),
            event.timestamp.to_rfc3339(),
        ));
    }

    csv
}

/// Render daily totals as CSV.
pub fn daily_totals_to_csv(aggregates: &[DailyAggregate]) -> String {
    let mut csv = String::new();
    csv.push_str(DAILY_TOTALS_CSV_HEADER);
    csv.push('\n');

    for aggregate in aggregates {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            escape_csv(&aggregate.patient_id),
            escape_csv(&aggregate.drug_name),
            aggregate.date,
            aggregate.total_dose,
            aggregate.intake_count,
            escape_csv(&aggregate.unit),
        ));
    }

    csv
}

/// Render overdose warnings as CSV.
pub fn warnings_to_csv(warnings: &[OverdoseWarning]) -> String {
    let mut csv = String::new();
    csv.push_str(WARNINGS_CSV_HEADER);
    csv.push('\n');

    for warning in warnings {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            escape_csv(&warning.patient_id),
            escape_csv(&warning.drug_name),
            warning.date,
            warning.actual_dose,
            warning.max_dose,
            escape_csv(&warning.unit),
        ));
    }

    csv
}

/// Escape a string for CSV output.
pub fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_daily_totals_csv() {
        let aggregates = vec![DailyAggregate {
            patient_id: "P001".into(),
            drug_name: "Vitamin D".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            total_dose: 2000.0,
            intake_count: 2,
            unit: "IU".into(),
        }];

        let csv = daily_totals_to_csv(&aggregates);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2); // Header + 1 row
        assert_eq!(lines[0], DAILY_TOTALS_CSV_HEADER);
        assert_eq!(lines[1], "P001,Vitamin D,2024-01-01,2000,2,IU");
    }

    #[test]
    fn test_warnings_csv() {
        let warnings = vec![OverdoseWarning {
            patient_id: "P001".into(),
            drug_name: "Lisinopril".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            actual_dose: 45.0,
            max_dose: 40.0,
            unit: "mg".into(),
        }];

        let csv = warnings_to_csv(&warnings);
        assert!(csv.ends_with("P001,Lisinopril,2024-01-01,45,40,mg\n"));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape_csv("carriage\rreturn"), "\"carriage\rreturn\"");
    }

    #[test]
    fn test_empty_exports_have_header_only() {
        assert_eq!(events_to_csv(&[]).lines().count(), 1);
        assert_eq!(warnings_to_csv(&[]).lines().count(), 1);
    }
}
