//! Single-shift suggestion over stored service history.

use chrono::NaiveDate;
use rota_core::{
    calendar::DayCategory,
    ledger::{PointsEntry, PointsOrigin},
    model::{AllocationRole, Person, Role, ScoreWeights, Unavailability},
    plan::WeekPlan,
    ports::{PersistencePort, ServiceHistoryProvider},
    store::RotaStore,
    suggestion::ShiftSuggester,
};

const SCOPE: &str = "ops";

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

fn store() -> RotaStore {
    let store = RotaStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    for id in ["ana", "bia", "caio"] {
        store
            .upsert_person(&Person {
                id: id.into(),
                name: id.to_uppercase(),
                scope: SCOPE.into(),
                role: Role::Operator,
                qualifications: Default::default(),
            })
            .unwrap();
    }
    store
        .upsert_person(&Person {
            id: "boss".into(),
            name: "BOSS".into(),
            scope: SCOPE.into(),
            role: Role::Supervisor,
            qualifications: Default::default(),
        })
        .unwrap();
    store
}

#[test]
fn history_is_grouped_per_person_in_date_order() {
    let store = store();
    let mut plan = WeekPlan::skeleton(SCOPE, date(12));
    plan.assign(2, "ana", AllocationRole::Titular).unwrap();
    plan.assign(0, "ana", AllocationRole::Titular).unwrap();
    plan.assign(1, "bia", AllocationRole::Reserve).unwrap();
    store.commit_week(&plan, &store).unwrap();

    let history = store.service_history(SCOPE).unwrap();
    let ana: Vec<NaiveDate> = history["ana"].iter().map(|e| e.date).collect();
    assert_eq!(ana, vec![date(12), date(13)]);
    assert_eq!(history["bia"].len(), 1);
    assert!(!history.contains_key("caio"));
}

#[test]
fn never_served_operator_is_suggested_first() {
    let store = store();
    let mut plan = WeekPlan::skeleton(SCOPE, date(12));
    plan.assign(0, "ana", AllocationRole::Titular).unwrap();
    plan.assign(1, "bia", AllocationRole::Titular).unwrap();
    store.commit_week(&plan, &store).unwrap();

    let pick = ShiftSuggester::new(7)
        .suggest_for_scope(&store, SCOPE, &ScoreWeights::default(), date(21), date(19))
        .unwrap()
        .unwrap();
    assert_eq!(pick.person_id, "caio");
}

#[test]
fn unavailable_operators_are_not_suggested() {
    let store = store();
    store
        .add_unavailability(&Unavailability {
            person_id: "caio".into(),
            start: date(20),
            end: date(22),
            reason: "course".into(),
        })
        .unwrap();
    let mut plan = WeekPlan::skeleton(SCOPE, date(12));
    plan.assign(0, "ana", AllocationRole::Titular).unwrap(); // EARLY, weight 3
    plan.assign(1, "bia", AllocationRole::Titular).unwrap(); // LATE, weight 2
    store.commit_week(&plan, &store).unwrap();

    let pick = ShiftSuggester::new(7)
        .suggest_for_scope(&store, SCOPE, &ScoreWeights::default(), date(21), date(19))
        .unwrap()
        .unwrap();
    assert_eq!(pick.person_id, "bia");
}

#[test]
fn nobody_available_yields_none() {
    let store = store();
    for id in ["ana", "bia", "caio"] {
        store
            .add_unavailability(&Unavailability {
                person_id: id.into(),
                start: date(21),
                end: date(21),
                reason: String::new(),
            })
            .unwrap();
    }
    let pick = ShiftSuggester::new(7)
        .suggest_for_scope(&store, SCOPE, &ScoreWeights::default(), date(21), date(19))
        .unwrap();
    assert!(pick.is_none());
}

#[test]
fn active_weights_decide_ties() {
    let store = store();
    store
        .add_unavailability(&Unavailability {
            person_id: "caio".into(),
            start: date(21),
            end: date(21),
            reason: String::new(),
        })
        .unwrap();
    // neither has served, so both score the same
    store
        .add_points_entry(&PointsEntry {
            allocation_id: None,
            person_id: "ana".into(),
            category: DayCategory::Regular,
            origin: PointsOrigin::Manual,
            points: 2,
        })
        .unwrap();
    store
        .add_points_entry(&PointsEntry {
            allocation_id: None,
            person_id: "bia".into(),
            category: DayCategory::Special,
            origin: PointsOrigin::Manual,
            points: 1,
        })
        .unwrap();

    let suggester = ShiftSuggester::new(7);
    let pick = |weights: &ScoreWeights| {
        suggester
            .suggest_for_scope(&store, SCOPE, weights, date(21), date(19))
            .unwrap()
            .unwrap()
            .person_id
    };

    // ana 2.0 vs bia 1.0 + 1.5
    assert_eq!(pick(&ScoreWeights::default()), "ana");
    let ignore_specials = ScoreWeights {
        special_weight: 0.0,
        ..ScoreWeights::default()
    };
    assert_eq!(pick(&ignore_specials), "bia");
}
