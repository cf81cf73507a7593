//! Append-only intake event store.
//!
//! Appends take the write lock, reads take the read lock and copy out a
//! consistent snapshot. Readers never observe a half-applied append.

mod timestamp;

pub use timestamp::*;

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use crate::aggregate::DailyIndex;
use crate::models::{DailyAggregate, IntakeEvent, IntakeRecord};
use crate::reference::DrugReferenceTable;

/// Rejections raised at append time. The store is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Patient ID must not be empty")]
    EmptyPatientId,

    #[error("Dose must be a finite, non-negative number (got {0})")]
    InvalidDose(f64),

    #[error("Unparseable timestamp: {0}")]
    InvalidTimestamp(String),
}

pub type StoreResult<T> = Result<T, ValidationError>;

#[derive(Debug, Default)]
struct StoreState {
    events: Vec<IntakeEvent>,
    index: DailyIndex,
}

impl StoreState {
    fn push(&mut self, event: IntakeEvent) {
        self.index.record(&event);
        self.events.push(event);
    }
}

/// Ordered, append-only collection of intake events.
#[derive(Debug, Default)]
pub struct IntakeStore {
    state: RwLock<StoreState>,
}

impl IntakeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a record.
    ///
    /// Drug type and unit are resolved from `reference` now and stored on the
    /// event; later reference changes do not touch existing events.
    pub fn append(
        &self,
        record: IntakeRecord,
        reference: &DrugReferenceTable,
    ) -> StoreResult<IntakeEvent> {
        let event = Self::prepare(record, reference)?;
        self.write().push(event.clone());

        tracing::debug!(
            event_id = %event.event_id,
            patient = %event.patient_id,
            drug = %event.drug_name,
            dose = event.dose,
            "intake appended"
        );
        Ok(event)
    }

    /// Validate a record and build the event `append` would store, without
    /// storing it. Pair with [`IntakeStore::restore`] once the event has been
    /// persisted elsewhere.
    pub fn prepare(record: IntakeRecord, reference: &DrugReferenceTable) -> StoreResult<IntakeEvent> {
        validate_record(&record)?;

        let lookup = reference.lookup(&record.drug_name);
        if !lookup.is_known() {
            tracing::warn!(
                drug = %record.drug_name,
                patient = %record.patient_id,
                "drug not in reference table; recorded as Unknown with no daily limit"
            );
        }

        Ok(IntakeEvent::from_record(record, lookup))
    }

    /// Append from raw parts, parsing the timestamp first.
    pub fn append_raw(
        &self,
        patient_id: &str,
        drug_name: &str,
        dose: f64,
        timestamp: &str,
        reference: &DrugReferenceTable,
    ) -> StoreResult<IntakeEvent> {
        let timestamp = parse_timestamp(timestamp)?;
        self.append(IntakeRecord::new(patient_id, drug_name, dose, timestamp), reference)
    }

    /// Insert an already-built event as-is (ID, type and unit kept).
    pub fn restore(&self, event: IntakeEvent) -> StoreResult<()> {
        validate_parts(&event.patient_id, event.dose)?;
        self.write().push(event);
        Ok(())
    }

    /// All events in insertion order.
    pub fn all(&self) -> Vec<IntakeEvent> {
        self.read().events.clone()
    }

    /// Events for one patient, in insertion order.
    pub fn filter(&self, patient_id: &str) -> Vec<IntakeEvent> {
        self.read()
            .events
            .iter()
            .filter(|e| e.patient_id == patient_id)
            .cloned()
            .collect()
    }

    /// Run a read-only computation against a consistent view of the events.
    pub fn with_events<R>(&self, f: impl FnOnce(&[IntakeEvent]) -> R) -> R {
        f(&self.read().events)
    }

    /// Daily totals from the incremental index.
    pub fn daily_totals(&self, patient_filter: Option<&str>) -> Vec<DailyAggregate> {
        self.read().index.aggregates(patient_filter)
    }

    /// Distinct patient IDs.
    pub fn patients(&self) -> BTreeSet<String> {
        self.read()
            .events
            .iter()
            .map(|e| e.patient_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().events.is_empty()
    }

    // Poisoning is recovered: the only writer is `push`, which has no fallible steps.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Check a record before it is stored.
pub fn validate_record(record: &IntakeRecord) -> StoreResult<()> {
    validate_parts(&record.patient_id, record.dose)
}

fn validate_parts(patient_id: &str, dose: f64) -> StoreResult<()> {
    if patient_id.trim().is_empty() {
        return Err(ValidationError::EmptyPatientId);
    }
    if !dose.is_finite() || dose < 0.0 {
        return Err(ValidationError::InvalidDose(dose));
    }
    Ok(())
}
