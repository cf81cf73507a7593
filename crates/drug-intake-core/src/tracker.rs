//! Tracker context.
//!
//! Owns one reference table, one rule set and one event store, and hands
//! borrowed views of them to the evaluator and report builder. Whoever
//! composes the system (a test, the CLI, the FFI object) owns the tracker.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::aggregate::{daily_totals, distinct_drugs};
use crate::config::{ConfigResult, TrackerConfig, DEFAULT_PATIENT_ID};
use crate::models::{
    DailyAggregate, DateRange, DrugReferenceEntry, InteractionAdvisory, IntakeEvent,
    FleetSummary, IntakeRecord, OverdoseWarning, PatientReport, PatientSummary,
    UnknownDrugNotice,
};
use crate::reference::{DrugReferenceTable, ReferenceResult};
use crate::report::{summarize_patient, ReportBuilder};
use crate::safety::{InteractionRuleSet, SafetyEvaluator};
use crate::store::{parse_timestamp, IntakeStore, StoreResult};

/// Outcome of recording one intake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordOutcome {
    pub event: IntakeEvent,
    /// Set when the drug was not in the reference table
    pub unknown_drug: Option<UnknownDrugNotice>,
}

/// Daily totals together with the warnings they produce.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyAnalysis {
    pub aggregates: Vec<DailyAggregate>,
    pub warnings: Vec<OverdoseWarning>,
}

/// Explicit context for one tracking session.
#[derive(Debug)]
pub struct Tracker {
    reference: DrugReferenceTable,
    rules: InteractionRuleSet,
    store: IntakeStore,
    default_patient_id: String,
}

impl Tracker {
    /// Create a tracker with the given reference table and built-in rules.
    pub fn new(reference: DrugReferenceTable) -> Self {
        Self {
            reference,
            rules: InteractionRuleSet::builtin(),
            store: IntakeStore::new(),
            default_patient_id: DEFAULT_PATIENT_ID.to_string(),
        }
    }

    /// Create a tracker with the built-in drug list.
    pub fn with_defaults() -> Self {
        Self::new(DrugReferenceTable::with_defaults())
    }

    /// Create a tracker from configuration.
    pub fn from_config(config: &TrackerConfig) -> ConfigResult<Self> {
        config.validate()?;
        let mut tracker = Self::new(config.reference_table()?);
        tracker.default_patient_id = config.default_patient_id.clone();
        Ok(tracker)
    }

    pub fn reference(&self) -> &DrugReferenceTable {
        &self.reference
    }

    /// Add or replace a reference entry. Existing events are not re-resolved.
    pub fn set_reference_entry(
        &mut self,
        name: impl Into<String>,
        entry: DrugReferenceEntry,
    ) -> ReferenceResult<Option<DrugReferenceEntry>> {
        self.reference.insert(name, entry)
    }

    pub fn rules(&self) -> &InteractionRuleSet {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut InteractionRuleSet {
        &mut self.rules
    }

    pub fn store(&self) -> &IntakeStore {
        &self.store
    }

    pub fn default_patient_id(&self) -> &str {
        &self.default_patient_id
    }

    /// Safety evaluator over this tracker's reference table and rules.
    pub fn evaluator(&self) -> SafetyEvaluator<'_> {
        SafetyEvaluator::new(&self.reference, &self.rules)
    }

    /// Report builder over this tracker's store.
    pub fn reports(&self) -> ReportBuilder<'_> {
        ReportBuilder::new(&self.store)
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Record a validated intake.
    pub fn record(&self, record: IntakeRecord) -> StoreResult<RecordOutcome> {
        let outcome = self.prepare(record)?;
        self.commit(outcome.event.clone())?;
        Ok(outcome)
    }

    /// Record from raw parts. A missing patient ID uses the default patient.
    pub fn record_raw(
        &self,
        drug_name: &str,
        dose: f64,
        timestamp: &str,
        patient_id: Option<&str>,
    ) -> StoreResult<RecordOutcome> {
        let outcome = self.prepare_raw(drug_name, dose, timestamp, patient_id)?;
        self.commit(outcome.event.clone())?;
        Ok(outcome)
    }

    /// Validate and resolve a record without storing it.
    ///
    /// Callers that persist elsewhere first (the SQLite-backed FFI object)
    /// write the returned event out and then [`Tracker::commit`] it.
    pub fn prepare(&self, record: IntakeRecord) -> StoreResult<RecordOutcome> {
        let unknown_drug = (!self.reference.contains(&record.drug_name)).then(|| UnknownDrugNotice {
            suggestion: self.reference.suggest(&record.drug_name).map(str::to_string),
            drug_name: record.drug_name.clone(),
        });
        let event = IntakeStore::prepare(record, &self.reference)?;
        Ok(RecordOutcome {
            event,
            unknown_drug,
        })
    }

    /// [`Tracker::prepare`] from raw parts, applying the default patient.
    pub fn prepare_raw(
        &self,
        drug_name: &str,
        dose: f64,
        timestamp: &str,
        patient_id: Option<&str>,
    ) -> StoreResult<RecordOutcome> {
        let timestamp = parse_timestamp(timestamp)?;
        let patient_id = patient_id.unwrap_or(&self.default_patient_id);
        self.prepare(IntakeRecord::new(patient_id, drug_name, dose, timestamp))
    }

    /// Store a prepared event.
    pub fn commit(&self, event: IntakeEvent) -> StoreResult<()> {
        tracing::debug!(
            event_id = %event.event_id,
            patient = %event.patient_id,
            drug = %event.drug_name,
            dose = event.dose,
            "intake recorded"
        );
        self.store.restore(event)
    }

    // =========================================================================
    // Aggregation and safety
    // =========================================================================

    /// Daily totals, optionally for one patient.
    pub fn daily_totals(&self, patient_filter: Option<&str>) -> Vec<DailyAggregate> {
        self.store.daily_totals(patient_filter)
    }

    /// Overdose warnings, optionally for one patient.
    pub fn overdose_warnings(&self, patient_filter: Option<&str>) -> Vec<OverdoseWarning> {
        self.evaluator()
            .overdose_warnings(&self.daily_totals(patient_filter))
    }

    /// Daily totals and the warnings derived from them, from one snapshot.
    pub fn analyze_daily_intake(&self, patient_filter: Option<&str>) -> DailyAnalysis {
        let aggregates = self.daily_totals(patient_filter);
        let warnings = self.evaluator().overdose_warnings(&aggregates);
        DailyAnalysis {
            aggregates,
            warnings,
        }
    }

    /// Distinct drugs a patient took, optionally within a date range.
    pub fn distinct_drugs(&self, patient_id: &str, range: Option<DateRange>) -> BTreeSet<String> {
        self.store
            .with_events(|events| distinct_drugs(events, patient_id, range))
    }

    /// Interaction advisories for a patient's distinct drug set.
    pub fn interaction_flags(
        &self,
        patient_id: &str,
        range: Option<DateRange>,
    ) -> Vec<InteractionAdvisory> {
        self.evaluator()
            .interaction_flags(&self.distinct_drugs(patient_id, range))
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Per-drug summary for a patient; `None` if the patient has no events.
    pub fn patient_summary(&self, patient_id: &str) -> Option<PatientSummary> {
        self.reports().patient_summary(patient_id)
    }

    /// Per-drug-type summary across all patients.
    pub fn fleet_summary(&self) -> FleetSummary {
        self.reports().fleet_summary()
    }

    /// Summary plus safety signals for a patient; `None` if no events.
    ///
    /// Summary, warnings and advisories come from the same read of the store.
    pub fn patient_report(&self, patient_id: &str) -> Option<PatientReport> {
        self.store
            .with_events(|events| self.patient_report_in(events, patient_id))
    }

    /// [`Tracker::patient_report`] over an event slice the caller already holds.
    pub fn patient_report_in(&self, events: &[IntakeEvent], patient_id: &str) -> Option<PatientReport> {
        let summary = summarize_patient(events, patient_id)?;
        let evaluator = self.evaluator();
        Some(PatientReport {
            warnings: evaluator.overdose_warnings(&daily_totals(events, Some(patient_id))),
            advisories: evaluator.interaction_flags(&distinct_drugs(events, patient_id, None)),
            summary,
        })
    }
}
