//! Property tests for aggregation and threshold evaluation.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use proptest::prelude::*;

use drug_intake_core::aggregate::daily_totals;
use drug_intake_core::models::{DailyKey, IntakeRecord};
use drug_intake_core::{DrugReferenceTable, IntakeStore, InteractionRuleSet, SafetyEvaluator};

const PATIENTS: &[&str] = &["P001", "P002", "P003"];
const DRUGS: &[&str] = &["Aspirin", "Lisinopril", "Vitamin D", "Mystery Tonic"];

/// (patient index, drug index, dose, day of month, minute of day)
type RawIntake = (usize, usize, f64, u32, u32);

fn raw_intake() -> impl Strategy<Value = RawIntake> {
    (
        0..PATIENTS.len(),
        0..DRUGS.len(),
        0.0f64..5000.0,
        1u32..6,
        0u32..(24 * 60),
    )
}

fn to_record((p, d, dose, day, minute): RawIntake) -> IntakeRecord {
    let naive = NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(minute / 60, minute % 60, 0)
        .unwrap();
    let ts: DateTime<FixedOffset> = DateTime::from_naive_utc_and_offset(naive, Utc.fix());
    IntakeRecord::new(PATIENTS[p], DRUGS[d], dose, ts)
}

fn build_store(raw: &[RawIntake]) -> IntakeStore {
    let store = IntakeStore::new();
    let table = DrugReferenceTable::with_defaults();
    for r in raw {
        store.append(to_record(*r), &table).unwrap();
    }
    store
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn prop_daily_sums_match_event_sums(raw in prop::collection::vec(raw_intake(), 0..60)) {
        let store = build_store(&raw);
        let events = store.all();

        let mut expected: BTreeMap<(String, String), f64> = BTreeMap::new();
        for e in &events {
            *expected.entry((e.patient_id.clone(), e.drug_name.clone())).or_insert(0.0) += e.dose;
        }

        let mut actual: BTreeMap<(String, String), f64> = BTreeMap::new();
        let mut counted = 0;
        for a in daily_totals(&events, None) {
            counted += a.intake_count;
            *actual.entry((a.patient_id, a.drug_name)).or_insert(0.0) += a.total_dose;
        }

        prop_assert_eq!(counted, events.len());
        prop_assert_eq!(expected.len(), actual.len());
        for (key, total) in &expected {
            prop_assert!(close(*total, actual[key]), "{:?}: {} vs {}", key, total, actual[key]);
        }
    }

    #[test]
    fn prop_grouping_ignores_input_order(
        (raw, shuffled) in prop::collection::vec(raw_intake(), 0..40)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let original = build_store(&raw).all();
        let permuted = build_store(&shuffled).all();

        prop_assert_eq!(daily_totals(&original, None), daily_totals(&permuted, None));
    }

    #[test]
    fn prop_index_matches_full_scan(raw in prop::collection::vec(raw_intake(), 0..60)) {
        let store = build_store(&raw);
        let indexed = store.daily_totals(None);
        let scanned = daily_totals(&store.all(), None);

        prop_assert_eq!(indexed.len(), scanned.len());
        for (a, b) in indexed.iter().zip(&scanned) {
            prop_assert_eq!(a.key(), b.key());
            prop_assert_eq!(a.intake_count, b.intake_count);
            prop_assert!(close(a.total_dose, b.total_dose));
        }
    }

    #[test]
    fn prop_append_is_monotonic(
        raw in prop::collection::vec(raw_intake(), 0..40),
        extra in raw_intake(),
    ) {
        let store = build_store(&raw);
        let before: BTreeMap<DailyKey, f64> = store
            .daily_totals(None)
            .into_iter()
            .map(|a| (a.key(), a.total_dose))
            .collect();

        let event = store.append(to_record(extra), &DrugReferenceTable::with_defaults()).unwrap();
        let target = event.daily_key();

        for aggregate in store.daily_totals(None) {
            let key = aggregate.key();
            let previous = before.get(&key).copied();
            if key == target {
                let expected = previous.unwrap_or(0.0) + event.dose;
                prop_assert!(close(aggregate.total_dose, expected));
            } else {
                prop_assert_eq!(Some(aggregate.total_dose), previous);
            }
        }
    }

    #[test]
    fn prop_unknown_drug_never_warns(dose in 0.0f64..1.0e15, day in 1u32..28) {
        let store = IntakeStore::new();
        let table = DrugReferenceTable::with_defaults();
        let rules = InteractionRuleSet::builtin();
        store.append(to_record((0, 3, dose, day, 600)), &table).unwrap();
        store.append(to_record((0, 3, dose, day, 660)), &table).unwrap();

        let warnings = SafetyEvaluator::new(&table, &rules).overdose_warnings(&store.daily_totals(None));
        prop_assert!(warnings.is_empty());
    }

    #[test]
    fn prop_warning_iff_strictly_above(doses in prop::collection::vec(0.0f64..30.0, 1..6)) {
        let store = IntakeStore::new();
        let table = DrugReferenceTable::with_defaults();
        let rules = InteractionRuleSet::builtin();
        for (i, dose) in doses.iter().enumerate() {
            store.append(to_record((0, 1, *dose, 1, i as u32 * 60)), &table).unwrap();
        }

        let totals = store.daily_totals(None);
        let warnings = SafetyEvaluator::new(&table, &rules).overdose_warnings(&totals);

        prop_assert_eq!(totals.len(), 1);
        prop_assert_eq!(warnings.len(), usize::from(totals[0].total_dose > 40.0));
    }
}
