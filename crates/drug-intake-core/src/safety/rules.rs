//! Declarative interaction rules.
//!
//! Each rule pairs a predicate over a patient's distinct drug set with the
//! advisory it raises. Adding a rule means adding a table entry; the
//! evaluator does not change.

use std::collections::BTreeSet;

use crate::models::{AdvisoryKind, AdvisorySeverity, InteractionAdvisory};

/// Predicate over a set of distinct drug names.
#[derive(Debug, Clone, PartialEq)]
pub enum DrugSetCondition {
    /// Every listed drug is in the set.
    AllOf(Vec<String>),
    /// `drug` is in the set and the set holds strictly more than `min_exclusive` drugs.
    WithMoreThan { drug: String, min_exclusive: usize },
}

impl DrugSetCondition {
    /// Drugs that satisfied the condition, or `None` if it does not hold.
    fn matched(&self, drugs: &BTreeSet<String>) -> Option<Vec<String>> {
        match self {
            DrugSetCondition::AllOf(required) => required
                .iter()
                .all(|d| drugs.contains(d))
                .then(|| required.clone()),
            DrugSetCondition::WithMoreThan {
                drug,
                min_exclusive,
            } => (drugs.contains(drug) && drugs.len() > *min_exclusive)
                .then(|| drugs.iter().cloned().collect()),
        }
    }
}

/// A single interaction rule.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRule {
    /// Unique identifier for audit trail
    pub id: String,
    pub kind: AdvisoryKind,
    pub severity: AdvisorySeverity,
    pub condition: DrugSetCondition,
    pub message: String,
}

impl InteractionRule {
    /// Evaluate against a distinct drug set.
    pub fn evaluate(&self, drugs: &BTreeSet<String>) -> Option<InteractionAdvisory> {
        let matched = self.condition.matched(drugs)?;
        Some(InteractionAdvisory {
            rule_id: self.id.clone(),
            kind: self.kind,
            severity: self.severity,
            drugs: matched,
            message: self.message.clone(),
        })
    }
}

/// Ordered set of interaction rules.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRuleSet {
    rules: Vec<InteractionRule>,
}

impl Default for InteractionRuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl InteractionRuleSet {
    /// The built-in rules.
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                InteractionRule {
                    id: "ddi-aspirin-ibuprofen".into(),
                    kind: AdvisoryKind::BleedingRisk,
                    severity: AdvisorySeverity::Warning,
                    condition: DrugSetCondition::AllOf(vec!["Aspirin".into(), "Ibuprofen".into()]),
                    message: "Aspirin + Ibuprofen: increased bleeding risk".into(),
                },
                InteractionRule {
                    id: "ddi-acetaminophen-polypharmacy".into(),
                    kind: AdvisoryKind::LiverMonitoring,
                    severity: AdvisorySeverity::Info,
                    condition: DrugSetCondition::WithMoreThan {
                        drug: "Acetaminophen".into(),
                        min_exclusive: 3,
                    },
                    message: "Multiple drugs with Acetaminophen: monitor liver function".into(),
                },
            ],
        }
    }

    /// A rule set with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn push(&mut self, rule: InteractionRule) {
        self.rules.push(rule);
    }

    /// Evaluate every rule in table order.
    pub fn evaluate(&self, drugs: &BTreeSet<String>) -> Vec<InteractionAdvisory> {
        self.rules.iter().filter_map(|r| r.evaluate(drugs)).collect()
    }

    pub fn rules(&self) -> &[InteractionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
