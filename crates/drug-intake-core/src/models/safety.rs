//! Safety signal models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A daily aggregate that strictly exceeds the drug's maximum daily dose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverdoseWarning {
    pub patient_id: String,
    pub drug_name: String,
    pub date: NaiveDate,
    /// Summed dose for the day
    pub actual_dose: f64,
    /// Reference ceiling that was exceeded
    pub max_dose: f64,
    pub unit: String,
}

impl OverdoseWarning {
    /// Amount above the ceiling.
    pub fn excess(&self) -> f64 {
        self.actual_dose - self.max_dose
    }

    /// Actual dose as a multiple of the ceiling.
    pub fn ratio(&self) -> f64 {
        self.actual_dose / self.max_dose
    }
}

/// Kind of interaction advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdvisoryKind {
    /// Combined antiplatelet / NSAID use
    BleedingRisk,
    /// Acetaminophen alongside several other drugs
    LiverMonitoring,
}

/// How prominently an advisory should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdvisorySeverity {
    Info,
    Warning,
}

/// Informational flag raised by an interaction rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionAdvisory {
    /// Rule identifier for audit trail
    pub rule_id: String,
    pub kind: AdvisoryKind,
    pub severity: AdvisorySeverity,
    /// Drugs from the patient's set that triggered the rule
    pub drugs: Vec<String>,
    /// Human-readable description
    pub message: String,
}

/// Soft notice for a drug name absent from the reference table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnknownDrugNotice {
    pub drug_name: String,
    /// Closest known name, if any is similar enough
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_excess_and_ratio() {
        let warning = OverdoseWarning {
            patient_id: "P001".into(),
            drug_name: "Lisinopril".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            actual_dose: 45.0,
            max_dose: 40.0,
            unit: "mg".into(),
        };

        assert_eq!(warning.excess(), 5.0);
        assert!((warning.ratio() - 1.125).abs() < 1e-12);
    }
}
