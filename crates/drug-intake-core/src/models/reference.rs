//! Drug reference models.

use serde::{Deserialize, Serialize};

/// Drug type assigned to names missing from the reference table.
pub const UNKNOWN_DRUG_TYPE: &str = "Unknown";

/// Unit assigned to names missing from the reference table.
pub const DEFAULT_UNIT: &str = "mg";

/// Reference data for a single drug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugReferenceEntry {
    /// Category label (e.g., "Painkiller")
    pub drug_type: String,
    /// Safety ceiling for the cumulative dose per patient per calendar day
    pub max_daily_dose: f64,
    /// Dose unit label (informational, no conversion is performed)
    pub unit: String,
}

impl DrugReferenceEntry {
    /// Create a new reference entry.
    pub fn new(drug_type: impl Into<String>, max_daily_dose: f64, unit: impl Into<String>) -> Self {
        Self {
            drug_type: drug_type.into(),
            max_daily_dose,
            unit: unit.into(),
        }
    }
}

/// Result of looking a drug name up in the reference table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrugLookup<'a> {
    /// The name has an entry.
    Known(&'a DrugReferenceEntry),
    /// The name is absent; resolves to "Unknown", "mg" and no ceiling.
    Unknown,
}

impl<'a> DrugLookup<'a> {
    /// Category label, "Unknown" for absent drugs.
    pub fn drug_type(&self) -> &'a str {
        match *self {
            DrugLookup::Known(entry) => &entry.drug_type,
            DrugLookup::Unknown => UNKNOWN_DRUG_TYPE,
        }
    }

    /// Dose unit, "mg" for absent drugs.
    pub fn unit(&self) -> &'a str {
        match *self {
            DrugLookup::Known(entry) => &entry.unit,
            DrugLookup::Unknown => DEFAULT_UNIT,
        }
    }

    /// Maximum daily dose. Absent drugs are unbounded so they never warn.
    pub fn max_daily_dose(&self) -> f64 {
        match *self {
            DrugLookup::Known(entry) => entry.max_daily_dose,
            DrugLookup::Unknown => f64::INFINITY,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, DrugLookup::Known(_))
    }
}
