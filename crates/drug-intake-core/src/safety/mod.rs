//! Safety evaluation.
//!
//! Two independent checks over aggregation output:
//! - Overdose: a daily total strictly above the drug's maximum daily dose.
//!   Equality is safe. Unknown drugs have no ceiling and never warn.
//! - Interactions: declarative rules over the distinct drugs a patient took.
//!   Advisories are informational and never block anything.

mod rules;

pub use rules::*;

use std::collections::BTreeSet;

use crate::models::{DailyAggregate, InteractionAdvisory, OverdoseWarning};
use crate::reference::DrugReferenceTable;

/// Evaluates aggregates and drug sets against reference data and rules.
pub struct SafetyEvaluator<'a> {
    reference: &'a DrugReferenceTable,
    rules: &'a InteractionRuleSet,
}

impl<'a> SafetyEvaluator<'a> {
    /// Create a new evaluator.
    pub fn new(reference: &'a DrugReferenceTable, rules: &'a InteractionRuleSet) -> Self {
        Self { reference, rules }
    }

    /// One warning per aggregate whose total strictly exceeds its ceiling.
    ///
    /// Sorted by patient, drug, date.
    pub fn overdose_warnings(&self, aggregates: &[DailyAggregate]) -> Vec<OverdoseWarning> {
        let mut warnings: Vec<OverdoseWarning> = aggregates
            .iter()
            .filter_map(|aggregate| self.check_aggregate(aggregate))
            .collect();

        warnings.sort_by(|a, b| {
            (&a.patient_id, &a.drug_name, a.date).cmp(&(&b.patient_id, &b.drug_name, b.date))
        });

        if !warnings.is_empty() {
            tracing::warn!(count = warnings.len(), "overdose warnings found");
        }
        warnings
    }

    /// Check a single aggregate.
    pub fn check_aggregate(&self, aggregate: &DailyAggregate) -> Option<OverdoseWarning> {
        let max_dose = self.reference.max_daily_dose(&aggregate.drug_name);
        (aggregate.total_dose > max_dose).then(|| OverdoseWarning {
            patient_id: aggregate.patient_id.clone(),
            drug_name: aggregate.drug_name.clone(),
            date: aggregate.date,
            actual_dose: aggregate.total_dose,
            max_dose,
            unit: aggregate.unit.clone(),
        })
    }

    /// Advisories raised by the rule table for a distinct drug set.
    pub fn interaction_flags(&self, drugs: &BTreeSet<String>) -> Vec<InteractionAdvisory> {
        self.rules.evaluate(drugs)
    }
}
