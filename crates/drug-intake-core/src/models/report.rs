//! Report models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::safety::{InteractionAdvisory, OverdoseWarning};

/// Usage of one drug by one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugUsage {
    pub drug_name: String,
    /// Number of intakes
    pub count: usize,
    pub total_dose: f64,
    pub mean_dose: f64,
    /// Type recorded on the first event for the drug
    pub drug_type: String,
    pub unit: String,
}

/// Per-patient summary. Only built for patients with at least one event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    pub patient_id: String,
    /// First day with an intake
    pub first_date: NaiveDate,
    /// Last day with an intake
    pub last_date: NaiveDate,
    pub total_intakes: usize,
    /// Per-drug usage, sorted by drug name
    pub drugs: Vec<DrugUsage>,
}

impl PatientSummary {
    /// Usage for a single drug.
    pub fn drug(&self, drug_name: &str) -> Option<&DrugUsage> {
        self.drugs.iter().find(|d| d.drug_name == drug_name)
    }
}

/// Fleet-wide totals for one drug type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeSummary {
    pub drug_type: String,
    pub total_intakes: usize,
    pub total_dose: f64,
    pub distinct_patients: usize,
}

/// Summary across the whole store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FleetSummary {
    pub total_records: usize,
    pub distinct_patients: usize,
    pub distinct_drugs: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Per-type totals, sorted by type label
    pub by_type: Vec<TypeSummary>,
}

impl FleetSummary {
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }

    /// Totals for a single drug type.
    pub fn drug_type(&self, drug_type: &str) -> Option<&TypeSummary> {
        self.by_type.iter().find(|t| t.drug_type == drug_type)
    }
}

/// Everything known about one patient: usage plus safety signals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientReport {
    pub summary: PatientSummary,
    pub warnings: Vec<OverdoseWarning>,
    pub advisories: Vec<InteractionAdvisory>,
}

impl PatientReport {
    pub fn has_safety_signals(&self) -> bool {
        !self.warnings.is_empty() || !self.advisories.is_empty()
    }
}

/// Total dose of one drug type on one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeDayPoint {
    pub date: NaiveDate,
    pub drug_type: String,
    pub total_dose: f64,
}

/// Intake count for one drug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrugFrequency {
    pub drug_name: String,
    pub count: usize,
}

/// Total dose across all drugs for one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientTotal {
    pub patient_id: String,
    pub total_dose: f64,
}

/// Intake count for one hour of the day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

/// Chart-ready series. Rendering is left to the presentation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageSeries {
    /// Sorted by date, then type
    pub daily_by_type: Vec<TypeDayPoint>,
    /// Sorted by count descending, then name
    pub drug_frequency: Vec<DrugFrequency>,
    /// Sorted by patient
    pub patient_totals: Vec<PatientTotal>,
    /// Sorted by hour, hours without intakes omitted
    pub hourly_intakes: Vec<HourCount>,
}
