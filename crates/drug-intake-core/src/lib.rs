//! Drug-Intake Core Library
//!
//! Records medication-intake events and derives safety signals from them.
//!
//! # Architecture
//!
//! ```text
//!   Ingestion (sample generator, intake log, FFI host)
//!                        │
//!                        ▼
//!             ┌─────────────────────┐      ┌──────────────────────┐
//!             │  IntakeStore        │◄─────│  DrugReferenceTable  │
//!             │  append-only events │      │  type / unit / max   │
//!             └──────────┬──────────┘      └──────────┬───────────┘
//!                        │                            │
//!                        ▼                            │
//!             ┌─────────────────────┐                 │
//!             │  Aggregation        │                 │
//!             │  (patient,drug,day) │                 │
//!             └──────────┬──────────┘                 │
//!                        │                            │
//!           ┌────────────┴────────────┐               │
//!           ▼                         ▼               │
//!   ┌───────────────┐        ┌─────────────────┐      │
//!   │ ReportBuilder │        │ SafetyEvaluator │◄─────┘
//!   │ summaries     │        │ overdose + DDI  │
//!   └───────────────┘        └─────────────────┘
//!           │                         │
//!           └────────────┬────────────┘
//!                        ▼
//!         Presentation (console, CSV, JSON, charts)
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (IntakeEvent, DailyAggregate, OverdoseWarning, etc.)
//! - [`reference`]: Drug reference table
//! - [`store`]: Append-only, internally locked event store
//! - [`aggregate`]: Daily grouping and summation
//! - [`safety`]: Overdose and interaction evaluation
//! - [`report`]: Patient and fleet summaries
//! - [`tracker`]: Context object composing the above
//! - [`config`]: JSON configuration
//! - [`export`]: CSV and JSON export
//! - [`db`]: Optional SQLite persistence

pub mod aggregate;
pub mod config;
pub mod db;
pub mod export;
pub mod models;
pub mod reference;
pub mod report;
pub mod safety;
pub mod store;
pub mod tracker;

// Re-export commonly used types
pub use config::TrackerConfig;
pub use db::Database;
pub use models::{
    DailyAggregate, DailyKey, DateRange, DrugReferenceEntry, FleetSummary, IntakeEvent,
    IntakeRecord, InteractionAdvisory, OverdoseWarning, PatientReport, PatientSummary,
};
pub use reference::DrugReferenceTable;
pub use report::ReportBuilder;
pub use safety::{InteractionRuleSet, SafetyEvaluator};
pub use store::{IntakeStore, ValidationError};
pub use tracker::{RecordOutcome, Tracker};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex, RwLock};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DrugIntakeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<store::ValidationError> for DrugIntakeError {
    fn from(e: store::ValidationError) -> Self {
        DrugIntakeError::Validation(e.to_string())
    }
}

impl From<reference::ReferenceError> for DrugIntakeError {
    fn from(e: reference::ReferenceError) -> Self {
        DrugIntakeError::InvalidInput(e.to_string())
    }
}

impl From<config::ConfigError> for DrugIntakeError {
    fn from(e: config::ConfigError) -> Self {
        DrugIntakeError::InvalidInput(e.to_string())
    }
}

impl From<db::DbError> for DrugIntakeError {
    fn from(e: db::DbError) -> Self {
        DrugIntakeError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for DrugIntakeError {
    fn from(e: serde_json::Error) -> Self {
        DrugIntakeError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DrugIntakeError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DrugIntakeError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create an in-memory tracker with the built-in drug list.
#[uniffi::export]
pub fn new_tracker() -> Arc<DrugIntakeCore> {
    Arc::new(DrugIntakeCore {
        tracker: RwLock::new(Tracker::with_defaults()),
        db: None,
    })
}

/// Create an in-memory tracker from a JSON configuration.
#[uniffi::export]
pub fn new_tracker_from_config(config_json: String) -> Result<Arc<DrugIntakeCore>, DrugIntakeError> {
    let config = TrackerConfig::from_json(&config_json)?;
    Ok(Arc::new(DrugIntakeCore {
        tracker: RwLock::new(Tracker::from_config(&config)?),
        db: None,
    }))
}

/// Open or create a database-backed tracker at the given path.
///
/// Stored reference entries are layered over the built-in list and stored
/// events are restored as they were recorded.
#[uniffi::export]
pub fn open_tracker(path: String) -> Result<Arc<DrugIntakeCore>, DrugIntakeError> {
    let db = Database::open(&path)?;

    let mut tracker = Tracker::with_defaults();
    let stored = db.load_reference_table()?;
    for (name, entry) in stored.iter() {
        tracker.set_reference_entry(name, entry.clone())?;
    }
    db.load_into(tracker.store())?;

    Ok(Arc::new(DrugIntakeCore {
        tracker: RwLock::new(tracker),
        db: Some(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe tracker wrapper for FFI.
#[derive(uniffi::Object)]
pub struct DrugIntakeCore {
    tracker: RwLock<Tracker>,
    db: Option<Mutex<Database>>,
}

#[uniffi::export]
impl DrugIntakeCore {
    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Record one intake. The timestamp accepts RFC 3339 or "YYYY-MM-DD HH:MM[:SS]".
    pub fn record_intake(
        &self,
        patient_id: Option<String>,
        drug_name: String,
        dose: f64,
        timestamp: String,
    ) -> Result<FfiRecordOutcome, DrugIntakeError> {
        let tracker = self.tracker.read()?;
        let outcome = tracker.prepare_raw(&drug_name, dose, &timestamp, patient_id.as_deref())?;
        match &self.db {
            // Stored before it becomes visible; the lock keeps disk and memory in the same order
            Some(db) => {
                let db = db.lock()?;
                db.insert_intake_event(&outcome.event)?;
                tracker.commit(outcome.event.clone())?;
            }
            None => tracker.commit(outcome.event.clone())?,
        }
        Ok(outcome.into())
    }

    /// Add or replace a reference entry. Already recorded events are unchanged.
    pub fn set_reference_entry(
        &self,
        name: String,
        drug_type: String,
        max_daily_dose: f64,
        unit: String,
    ) -> Result<(), DrugIntakeError> {
        let entry = DrugReferenceEntry::new(drug_type, max_daily_dose, unit);
        DrugReferenceTable::validate_entry(&name, &entry)?;

        let mut tracker = self.tracker.write()?;
        if let Some(db) = &self.db {
            db.lock()?.upsert_reference_entry(&name, &entry)?;
        }
        tracker.set_reference_entry(name, entry)?;
        Ok(())
    }

    /// Number of recorded events.
    pub fn event_count(&self) -> Result<u64, DrugIntakeError> {
        Ok(self.tracker.read()?.store().len() as u64)
    }

    // =========================================================================
    // Aggregation and Safety
    // =========================================================================

    /// Daily totals, optionally for one patient.
    pub fn daily_totals(
        &self,
        patient_id: Option<String>,
    ) -> Result<Vec<FfiDailyAggregate>, DrugIntakeError> {
        let tracker = self.tracker.read()?;
        let totals = tracker.daily_totals(patient_id.as_deref());
        Ok(totals.into_iter().map(|a| a.into()).collect())
    }

    /// Overdose warnings, optionally for one patient.
    pub fn overdose_warnings(
        &self,
        patient_id: Option<String>,
    ) -> Result<Vec<FfiOverdoseWarning>, DrugIntakeError> {
        let tracker = self.tracker.read()?;
        let warnings = tracker.overdose_warnings(patient_id.as_deref());
        Ok(warnings.into_iter().map(|w| w.into()).collect())
    }

    /// Interaction advisories for a patient.
    pub fn interaction_flags(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiInteractionAdvisory>, DrugIntakeError> {
        let tracker = self.tracker.read()?;
        let advisories = tracker.interaction_flags(&patient_id, None);
        Ok(advisories.into_iter().map(|a| a.into()).collect())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Per-drug summary for a patient; `None` if the patient has no events.
    pub fn patient_summary(
        &self,
        patient_id: String,
    ) -> Result<Option<FfiPatientSummary>, DrugIntakeError> {
        let tracker = self.tracker.read()?;
        Ok(tracker.patient_summary(&patient_id).map(|s| s.into()))
    }

    /// Per-drug-type summary across all patients.
    pub fn fleet_summary(&self) -> Result<FfiFleetSummary, DrugIntakeError> {
        let tracker = self.tracker.read()?;
        Ok(tracker.fleet_summary().into())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export all derived results as JSON.
    pub fn export_snapshot_json(&self) -> Result<String, DrugIntakeError> {
        let tracker = self.tracker.read()?;
        Ok(export::SafetySnapshot::capture(&tracker).to_json()?)
    }

    /// Export daily totals as CSV.
    pub fn export_daily_totals_csv(&self) -> Result<String, DrugIntakeError> {
        let tracker = self.tracker.read()?;
        Ok(export::daily_totals_to_csv(&tracker.daily_totals(None)))
    }

    /// Export all events as CSV.
    pub fn export_events_csv(&self) -> Result<String, DrugIntakeError> {
        let tracker = self.tracker.read()?;
        Ok(export::events_to_csv(&tracker.store().all()))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// Counts cross the FFI as `u32`; larger values clamp instead of wrapping.
fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// FFI-safe intake event.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIntakeEvent {
    pub event_id: String,
    pub patient_id: String,
    pub drug_name: String,
    pub dose: f64,
    pub timestamp: String,
    pub drug_type: String,
    pub unit: String,
}

impl From<IntakeEvent> for FfiIntakeEvent {
    fn from(event: IntakeEvent) -> Self {
        Self {
            timestamp: event.timestamp.to_rfc3339(),
            event_id: event.event_id,
            patient_id: event.patient_id,
            drug_name: event.drug_name,
            dose: event.dose,
            drug_type: event.drug_type,
            unit: event.unit,
        }
    }
}

/// FFI-safe record outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordOutcome {
    pub event: FfiIntakeEvent,
    pub unknown_drug: bool,
    pub suggestion: Option<String>,
}

impl From<RecordOutcome> for FfiRecordOutcome {
    fn from(outcome: RecordOutcome) -> Self {
        Self {
            event: outcome.event.into(),
            unknown_drug: outcome.unknown_drug.is_some(),
            suggestion: outcome.unknown_drug.and_then(|n| n.suggestion),
        }
    }
}

/// FFI-safe daily aggregate.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDailyAggregate {
    pub patient_id: String,
    pub drug_name: String,
    pub date: String,
    pub total_dose: f64,
    pub intake_count: u32,
    pub unit: String,
}

impl From<DailyAggregate> for FfiDailyAggregate {
    fn from(aggregate: DailyAggregate) -> Self {
        Self {
            patient_id: aggregate.patient_id,
            drug_name: aggregate.drug_name,
            date: aggregate.date.to_string(),
            total_dose: aggregate.total_dose,
            intake_count: saturating_u32(aggregate.intake_count),
            unit: aggregate.unit,
        }
    }
}

/// FFI-safe overdose warning.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOverdoseWarning {
    pub patient_id: String,
    pub drug_name: String,
    pub date: String,
    pub actual_dose: f64,
    pub max_dose: f64,
    pub unit: String,
}

impl From<OverdoseWarning> for FfiOverdoseWarning {
    fn from(warning: OverdoseWarning) -> Self {
        Self {
            patient_id: warning.patient_id,
            drug_name: warning.drug_name,
            date: warning.date.to_string(),
            actual_dose: warning.actual_dose,
            max_dose: warning.max_dose,
            unit: warning.unit,
        }
    }
}

/// FFI-safe interaction advisory.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInteractionAdvisory {
    pub rule_id: String,
    pub kind: String,
    pub severity: String,
    pub drugs: Vec<String>,
    pub message: String,
}

impl From<InteractionAdvisory> for FfiInteractionAdvisory {
    fn from(advisory: InteractionAdvisory) -> Self {
        Self {
            rule_id: advisory.rule_id,
            kind: format!("{:?}", advisory.kind),
            severity: format!("{:?}", advisory.severity),
            drugs: advisory.drugs,
            message: advisory.message,
        }
    }
}

/// FFI-safe per-drug usage.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDrugUsage {
    pub drug_name: String,
    pub count: u32,
    pub total_dose: f64,
    pub mean_dose: f64,
    pub drug_type: String,
    pub unit: String,
}

/// FFI-safe patient summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientSummary {
    pub patient_id: String,
    pub first_date: String,
    pub last_date: String,
    pub total_intakes: u32,
    pub drugs: Vec<FfiDrugUsage>,
}

impl From<PatientSummary> for FfiPatientSummary {
    fn from(summary: PatientSummary) -> Self {
        Self {
            patient_id: summary.patient_id,
            first_date: summary.first_date.to_string(),
            last_date: summary.last_date.to_string(),
            total_intakes: saturating_u32(summary.total_intakes),
            drugs: summary
                .drugs
                .into_iter()
                .map(|d| FfiDrugUsage {
                    drug_name: d.drug_name,
                    count: saturating_u32(d.count),
                    total_dose: d.total_dose,
                    mean_dose: d.mean_dose,
                    drug_type: d.drug_type,
                    unit: d.unit,
                })
                .collect(),
        }
    }
}

/// FFI-safe per-type summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTypeSummary {
    pub drug_type: String,
    pub total_intakes: u32,
    pub total_dose: f64,
    pub distinct_patients: u32,
}

/// FFI-safe fleet summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFleetSummary {
    pub total_records: u32,
    pub distinct_patients: u32,
    pub distinct_drugs: u32,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub by_type: Vec<FfiTypeSummary>,
}

impl From<FleetSummary> for FfiFleetSummary {
    fn from(fleet: FleetSummary) -> Self {
        Self {
            total_records: saturating_u32(fleet.total_records),
            distinct_patients: saturating_u32(fleet.distinct_patients),
            distinct_drugs: saturating_u32(fleet.distinct_drugs),
            first_date: fleet.first_date.map(|d| d.to_string()),
            last_date: fleet.last_date.map(|d| d.to_string()),
            by_type: fleet
                .by_type
                .into_iter()
                .map(|t| FfiTypeSummary {
                    drug_type: t.drug_type,
                    total_intakes: saturating_u32(t.total_intakes),
                    total_dose: t.total_dose,
                    distinct_patients: saturating_u32(t.distinct_patients),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_record_and_query() {
        let core = new_tracker();

        core.record_intake(Some("P001".into()), "Lisinopril".into(), 25.0, "2024-01-01 08:00".into())
            .unwrap();
        core.record_intake(None, "Lisinopril".into(), 20.0, "2024-01-01 18:00".into())
            .unwrap();

        let warnings = core.overdose_warnings(None).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].date, "2024-01-01");
        assert_eq!(warnings[0].actual_dose, 45.0);

        let summary = core.patient_summary("P001".into()).unwrap().unwrap();
        assert_eq!(summary.total_intakes, 2);
        assert!(core.patient_summary("P404".into()).unwrap().is_none());
    }

    #[test]
    fn test_ffi_validation_error() {
        let core = new_tracker();

        let err = core
            .record_intake(None, "Aspirin".into(), -1.0, "2024-01-01 08:00".into())
            .unwrap_err();

        assert!(matches!(err, DrugIntakeError::Validation(_)));
        assert_eq!(core.event_count().unwrap(), 0);
    }

    #[test]
    fn test_ffi_config() {
        let core = new_tracker_from_config(
            r#"{ "reference": [ { "name": "Warfarin", "drug_type": "Anticoagulant", "max_daily_dose": 10 } ] }"#
                .into(),
        )
        .unwrap();

        let outcome = core
            .record_intake(None, "Warfarin".into(), 12.0, "2024-01-01 08:00".into())
            .unwrap();
        assert!(!outcome.unknown_drug);
        assert_eq!(core.overdose_warnings(None).unwrap().len(), 1);

        assert!(new_tracker_from_config("{".into()).is_err());
    }

    #[test]
    fn test_ffi_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.db").to_string_lossy().to_string();

        {
            let core = open_tracker(path.clone()).unwrap();
            core.set_reference_entry("Warfarin".into(), "Anticoagulant".into(), 10.0, "mg".into())
                .unwrap();
            core.record_intake(Some("P001".into()), "Warfarin".into(), 6.0, "2024-01-01 08:00".into())
                .unwrap();
            core.record_intake(Some("P001".into()), "Warfarin".into(), 6.0, "2024-01-01 20:00".into())
                .unwrap();
        }

        let core = open_tracker(path).unwrap();
        assert_eq!(core.event_count().unwrap(), 2);
        assert_eq!(core.overdose_warnings(Some("P001".into())).unwrap().len(), 1);
        assert!(core.export_events_csv().unwrap().contains("Anticoagulant"));
    }

    #[test]
    fn test_ffi_failed_insert_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.db").to_string_lossy().to_string();
        let core = open_tracker(path.clone()).unwrap();

        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_insert BEFORE INSERT ON intake_events
                 BEGIN SELECT RAISE(ABORT, 'read-only volume'); END;",
            )
            .unwrap();

        let err = core
            .record_intake(Some("P001".into()), "Aspirin".into(), 500.0, "2024-01-01 08:00".into())
            .unwrap_err();

        assert!(matches!(err, DrugIntakeError::DatabaseError(_)));
        assert_eq!(core.event_count().unwrap(), 0);
        assert!(core.daily_totals(None).unwrap().is_empty());
        drop(core);

        assert_eq!(open_tracker(path).unwrap().event_count().unwrap(), 0);
    }

    #[test]
    fn test_ffi_failed_reference_upsert_leaves_table_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.db").to_string_lossy().to_string();
        let core = open_tracker(path.clone()).unwrap();

        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_reference BEFORE INSERT ON drug_reference
                 BEGIN SELECT RAISE(ABORT, 'read-only volume'); END;",
            )
            .unwrap();

        let err = core
            .set_reference_entry("Warfarin".into(), "Anticoagulant".into(), 10.0, "mg".into())
            .unwrap_err();
        assert!(matches!(err, DrugIntakeError::DatabaseError(_)));

        let outcome = core
            .record_intake(Some("P001".into()), "Warfarin".into(), 12.0, "2024-01-01 08:00".into())
            .unwrap();
        assert!(outcome.unknown_drug);
        assert!(core.overdose_warnings(None).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_reference_entry_never_reaches_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intake.db").to_string_lossy().to_string();

        {
            let core = open_tracker(path.clone()).unwrap();
            let err = core
                .set_reference_entry("Warfarin".into(), "Anticoagulant".into(), -1.0, "mg".into())
                .unwrap_err();
            assert!(matches!(err, DrugIntakeError::InvalidInput(_)));
        }

        let db = Database::open(&path).unwrap();
        assert!(db.load_reference_table().unwrap().is_empty());
    }

    #[test]
    fn test_counts_clamp_at_u32_max() {
        assert_eq!(saturating_u32(7), 7);
        assert_eq!(saturating_u32(usize::MAX), u32::MAX);

        let fleet = FleetSummary {
            total_records: usize::MAX,
            distinct_patients: 3,
            ..FleetSummary::default()
        };
        let ffi: FfiFleetSummary = fleet.into();
        assert_eq!(ffi.total_records, u32::MAX);
        assert_eq!(ffi.distinct_patients, 3);
    }
}
