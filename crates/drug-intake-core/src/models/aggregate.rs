//! Daily aggregate models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Grouping key: one patient, one drug, one calendar day.
///
/// Field order defines the sort order (patient, then drug, then date).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DailyKey {
    pub patient_id: String,
    pub drug_name: String,
    pub date: NaiveDate,
}

/// Summed dose of one drug for one patient within one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyAggregate {
    /// Patient identifier
    pub patient_id: String,
    /// Drug name
    pub drug_name: String,
    /// Calendar day
    pub date: NaiveDate,
    /// Sum of all doses for the key
    pub total_dose: f64,
    /// Number of intake events summed
    pub intake_count: usize,
    /// Unit recorded on the events
    pub unit: String,
}

impl DailyAggregate {
    /// Key this aggregate was grouped by.
    pub fn key(&self) -> DailyKey {
        DailyKey {
            patient_id: self.patient_id.clone(),
            drug_name: self.drug_name.clone(),
            date: self.date,
        }
    }
}

/// Inclusive calendar range used to scope queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range. Bounds are swapped if given in reverse.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_key_ordering() {
        let a = DailyKey {
            patient_id: "P001".into(),
            drug_name: "Aspirin".into(),
            date: day(2),
        };
        let b = DailyKey {
            patient_id: "P001".into(),
            drug_name: "Ibuprofen".into(),
            date: day(1),
        };
        let c = DailyKey {
            patient_id: "P002".into(),
            drug_name: "Aspirin".into(),
            date: day(1),
        };

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_date_range_inclusive() {
        let range = DateRange::new(day(5), day(3));

        assert_eq!(range.start, day(3));
        assert!(range.contains(day(3)));
        assert!(range.contains(day(5)));
        assert!(!range.contains(day(6)));
    }
}
