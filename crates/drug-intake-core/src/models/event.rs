//! Intake event models.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use super::aggregate::DailyKey;
use super::reference::DrugLookup;

/// An intake as supplied by an ingestion collaborator, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeRecord {
    /// Patient identifier
    pub patient_id: String,
    /// Drug name, matched exactly against the reference table
    pub drug_name: String,
    /// Dose in the drug's reference unit
    pub dose: f64,
    /// When the dose was taken, in the recorder's own offset
    pub timestamp: DateTime<FixedOffset>,
}

impl IntakeRecord {
    /// Create a new intake record.
    pub fn new(
        patient_id: impl Into<String>,
        drug_name: impl Into<String>,
        dose: f64,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            drug_name: drug_name.into(),
            dose,
            timestamp,
        }
    }
}

/// A stored intake event. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeEvent {
    /// Unique event ID
    pub event_id: String,
    /// Patient identifier
    pub patient_id: String,
    /// Drug name as recorded
    pub drug_name: String,
    /// Dose amount
    pub dose: f64,
    /// When the dose was taken
    pub timestamp: DateTime<FixedOffset>,
    /// Drug type resolved at append time
    pub drug_type: String,
    /// Unit resolved at append time
    pub unit: String,
}

impl IntakeEvent {
    /// Build an event from a validated record, denormalizing type and unit.
    pub(crate) fn from_record(record: IntakeRecord, lookup: DrugLookup<'_>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            drug_type: lookup.drug_type().to_string(),
            unit: lookup.unit().to_string(),
            patient_id: record.patient_id,
            drug_name: record.drug_name,
            dose: record.dose,
            timestamp: record.timestamp,
        }
    }

    /// Calendar day in the event's own offset.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Hour of day (0-23) in the event's own offset.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Grouping key for daily aggregation.
    pub fn daily_key(&self) -> DailyKey {
        DailyKey {
            patient_id: self.patient_id.clone(),
            drug_name: self.drug_name.clone(),
            date: self.date(),
        }
    }
}
