//! JSON snapshot of everything the tracker derives.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::aggregate;
use crate::models::{DailyAggregate, FleetSummary, OverdoseWarning, PatientReport};
use crate::report::summarize_fleet;
use crate::tracker::Tracker;

/// Point-in-time export of derived results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetySnapshot {
    /// Export timestamp
    pub exported_at: String,
    pub fleet: FleetSummary,
    pub daily_totals: Vec<DailyAggregate>,
    pub warnings: Vec<OverdoseWarning>,
    /// One report per patient, sorted by patient ID
    pub patients: Vec<PatientReport>,
}

impl SafetySnapshot {
    /// Capture the tracker's current derived state.
    ///
    /// Every section is computed from one read of the store, so totals,
    /// warnings and per-patient reports describe the same set of events even
    /// while other threads keep recording.
    pub fn capture(tracker: &Tracker) -> Self {
        tracker.store().with_events(|events| {
            let daily_totals = aggregate::daily_totals(events, None);
            let warnings = tracker.evaluator().overdose_warnings(&daily_totals);
            let patient_ids: BTreeSet<&str> = events.iter().map(|e| e.patient_id.as_str()).collect();
            let patients = patient_ids
                .into_iter()
                .filter_map(|p| tracker.patient_report_in(events, p))
                .collect();

            Self {
                exported_at: chrono::Utc::now().to_rfc3339(),
                fleet: summarize_fleet(events),
                daily_totals,
                warnings,
                patients,
            }
        })
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
