//! Drug reference table.
//!
//! Maps drug names to type, unit and maximum safe daily dose. Lookup is an
//! exact, case-sensitive match. Names missing from the table resolve to
//! [`DrugLookup::Unknown`], which carries no dose ceiling: missing reference
//! data never produces an overdose warning on its own. That leniency is a
//! reviewable safety decision, see `DESIGN.md`.

use std::collections::BTreeMap;

use strsim::jaro_winkler;
use thiserror::Error;

use crate::models::{DrugLookup, DrugReferenceEntry};

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const MIN_SUGGESTION_SIMILARITY: f64 = 0.85;

/// Reference table errors.
#[derive(Error, Debug, PartialEq)]
pub enum ReferenceError {
    #[error("Drug name must not be empty")]
    EmptyName,

    #[error("Invalid maximum daily dose for {name}: {max}")]
    InvalidMaxDose { name: String, max: f64 },
}

pub type ReferenceResult<T> = Result<T, ReferenceError>;

/// Static mapping from drug name to reference data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrugReferenceTable {
    entries: BTreeMap<String, DrugReferenceEntry>,
}

impl DrugReferenceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the built-in drug list.
    pub fn with_defaults() -> Self {
        let mut entries = BTreeMap::new();

        for (name, drug_type, max, unit) in [
            ("Aspirin", "Painkiller", 4000.0, "mg"),
            ("Ibuprofen", "Anti-inflammatory", 2400.0, "mg"),
            ("Acetaminophen", "Painkiller", 3000.0, "mg"),
            ("Lisinopril", "Blood Pressure", 40.0, "mg"),
            ("Metformin", "Diabetes", 2000.0, "mg"),
            ("Atorvastatin", "Cholesterol", 80.0, "mg"),
            ("Omeprazole", "Acid Reducer", 40.0, "mg"),
            ("Vitamin D", "Supplement", 4000.0, "IU"),
        ] {
            entries.insert(name.to_string(), DrugReferenceEntry::new(drug_type, max, unit));
        }

        Self { entries }
    }

    /// Add or replace an entry. Events already stored keep the type and unit
    /// they were recorded with.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        entry: DrugReferenceEntry,
    ) -> ReferenceResult<Option<DrugReferenceEntry>> {
        let name = name.into();
        Self::validate_entry(&name, &entry)?;
        Ok(self.entries.insert(name, entry))
    }

    /// Check an entry the way `insert` would, without inserting it.
    pub fn validate_entry(name: &str, entry: &DrugReferenceEntry) -> ReferenceResult<()> {
        if name.trim().is_empty() {
            return Err(ReferenceError::EmptyName);
        }
        if !(entry.max_daily_dose.is_finite() && entry.max_daily_dose > 0.0) {
            return Err(ReferenceError::InvalidMaxDose {
                name: name.to_string(),
                max: entry.max_daily_dose,
            });
        }
        Ok(())
    }

    /// Look up a drug by exact name.
    pub fn lookup(&self, drug_name: &str) -> DrugLookup<'_> {
        match self.entries.get(drug_name) {
            Some(entry) => DrugLookup::Known(entry),
            None => DrugLookup::Unknown,
        }
    }

    /// Maximum daily dose, unbounded for unknown drugs.
    pub fn max_daily_dose(&self, drug_name: &str) -> f64 {
        self.lookup(drug_name).max_daily_dose()
    }

    pub fn contains(&self, drug_name: &str) -> bool {
        self.entries.contains_key(drug_name)
    }

    /// Closest known drug name for an unknown one.
    ///
    /// Only used to annotate unknown-drug notices; lookup never falls back to it.
    pub fn suggest(&self, drug_name: &str) -> Option<&str> {
        let needle = drug_name.to_lowercase();
        self.entries
            .keys()
            .map(|name| (name, jaro_winkler(&needle, &name.to_lowercase())))
            .filter(|(_, score)| *score >= MIN_SUGGESTION_SIMILARITY)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, _)| name.as_str())
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DrugReferenceEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Known drug names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
