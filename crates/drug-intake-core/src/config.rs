//! Tracker configuration.
//!
//! Loaded from JSON, e.g.:
//!
//! ```json
//! {
//!   "use_default_reference": true,
//!   "default_patient_id": "P001",
//!   "reference": [
//!     { "name": "Warfarin", "drug_type": "Anticoagulant", "max_daily_dose": 10, "unit": "mg" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DrugReferenceEntry;
use crate::reference::{DrugReferenceTable, ReferenceError};

/// Patient ID used when an ingestion collaborator does not supply one.
pub const DEFAULT_PATIENT_ID: &str = "P001";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid reference entry: {0}")]
    Reference(#[from] ReferenceError),

    #[error("default_patient_id must not be empty")]
    EmptyDefaultPatient,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A reference table entry supplied through configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceOverride {
    pub name: String,
    pub drug_type: String,
    pub max_daily_dose: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    crate::models::DEFAULT_UNIT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_patient_id() -> String {
    DEFAULT_PATIENT_ID.to_string()
}

/// Tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackerConfig {
    /// Start from the built-in drug list
    #[serde(default = "default_true")]
    pub use_default_reference: bool,
    /// Entries added on top of (or replacing) the built-in list
    #[serde(default)]
    pub reference: Vec<ReferenceOverride>,
    /// Patient assigned to intakes recorded without one
    #[serde(default = "default_patient_id")]
    pub default_patient_id: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            use_default_reference: true,
            reference: Vec::new(),
            default_patient_id: default_patient_id(),
        }
    }
}

impl TrackerConfig {
    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no tracker can run with.
    ///
    /// Intakes recorded without a patient ID take the default one, so it has
    /// to pass the same check a recorded patient ID does.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_patient_id.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultPatient);
        }
        Ok(())
    }

    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Build the reference table this configuration describes.
    pub fn reference_table(&self) -> ConfigResult<DrugReferenceTable> {
        let mut table = if self.use_default_reference {
            DrugReferenceTable::with_defaults()
        } else {
            DrugReferenceTable::new()
        };

        for entry in &self.reference {
            table.insert(
                entry.name.clone(),
                DrugReferenceEntry::new(entry.drug_type.clone(), entry.max_daily_dose, entry.unit.clone()),
            )?;
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = TrackerConfig::from_json("{}").unwrap();

        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.reference_table().unwrap().len(), 8);
    }

    #[test]
    fn test_overrides() {
        let config = TrackerConfig::from_json(
            r#"{
                "use_default_reference": false,
                "default_patient_id": "P042",
                "reference": [
                    { "name": "Warfarin", "drug_type": "Anticoagulant", "max_daily_dose": 10 }
                ]
            }"#,
        )
        .unwrap();

        let table = config.reference_table().unwrap();
        assert_eq!(config.default_patient_id, "P042");
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("Warfarin").unit(), "mg");
        assert_eq!(table.max_daily_dose("Warfarin"), 10.0);
    }

    #[test]
    fn test_invalid_max_rejected() {
        let config = TrackerConfig::from_json(
            r#"{ "reference": [ { "name": "X", "drug_type": "Y", "max_daily_dose": -5 } ] }"#,
        )
        .unwrap();

        assert!(matches!(
            config.reference_table(),
            Err(ConfigError::Reference(ReferenceError::InvalidMaxDose { .. }))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "default_patient_id": "P007" }}"#).unwrap();

        let config = TrackerConfig::load(file.path()).unwrap();
        assert_eq!(config.default_patient_id, "P007");
        assert!(config.use_default_reference);
    }

    #[test]
    fn test_blank_default_patient_rejected() {
        for json in [r#"{ "default_patient_id": "" }"#, r#"{ "default_patient_id": "  " }"#] {
            assert!(matches!(
                TrackerConfig::from_json(json),
                Err(ConfigError::EmptyDefaultPatient)
            ));
        }
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            TrackerConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
