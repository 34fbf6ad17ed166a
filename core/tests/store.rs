//! RotaStore: constraints, stats window, lifecycle and close-out settlement.

use chrono::NaiveDate;
use rota_core::{
    calendar::DayCategory,
    error::RotaError,
    ledger::{PointsEntry, PointsOrigin},
    model::{AllocationRole, Person, Role, ScheduleStatus, ScoreWeights},
    plan::{PlannedAllocation, WeekPlan},
    ports::{HistoricalStatsProvider, OperatorDirectory, PersistencePort, PointsLedger},
    store::RotaStore,
};

const SCOPE: &str = "ops";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monday() -> NaiveDate {
    date(2026, 10, 19)
}

fn operator(id: &str) -> Person {
    Person {
        id: id.into(),
        name: id.to_uppercase(),
        scope: SCOPE.into(),
        role: Role::Operator,
        qualifications: ["FLOOR", "MAINT"].iter().map(|q| q.to_string()).collect(),
    }
}

fn store() -> RotaStore {
    let store = RotaStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    for id in ["ana", "bia", "caio", "duda"] {
        store.upsert_person(&operator(id)).unwrap();
    }
    store
}

#[test]
fn migrate_is_idempotent() {
    let store = store();
    store.migrate().unwrap();
    assert_eq!(store.people(SCOPE).unwrap().len(), 4);
}

#[test]
fn upsert_replaces_qualifications() {
    let store = store();
    let mut ana = operator("ana");
    ana.qualifications = ["FLOOR"].iter().map(|q| q.to_string()).collect();
    store.upsert_person(&ana).unwrap();

    let loaded = store.person("ana").unwrap().unwrap();
    assert!(loaded.holds("FLOOR"));
    assert!(!loaded.holds("MAINT"));
    assert!(store.person("nobody").unwrap().is_none());
}

#[test]
fn duplicate_daily_duty_is_rejected_and_rolled_back() {
    let store = store();
    let mut plan = WeekPlan::skeleton(SCOPE, monday());
    // bypass WeekPlan::assign so only the database guards the rule
    plan.allocations.push(PlannedAllocation {
        shift: 0,
        person_id: "ana".into(),
        role: AllocationRole::Titular,
    });
    plan.allocations.push(PlannedAllocation {
        shift: 1,
        person_id: "ana".into(),
        role: AllocationRole::Reserve,
    });

    let err = store.commit_week(&plan, &store).unwrap_err();
    match err {
        RotaError::DuplicateAssignment { person_id, date } => {
            assert_eq!(person_id, "ana");
            assert_eq!(date, monday());
        }
        other => panic!("expected DuplicateAssignment, got {other:?}"),
    }
    assert!(store.schedules(SCOPE).unwrap().is_empty());
}

#[test]
fn second_reserve_on_a_shift_is_rejected() {
    let store = store();
    let mut plan = WeekPlan::skeleton(SCOPE, monday());
    for id in ["ana", "bia"] {
        plan.allocations.push(PlannedAllocation {
            shift: 0,
            person_id: id.into(),
            role: AllocationRole::Reserve,
        });
    }
    let err = store.commit_week(&plan, &store).unwrap_err();
    assert!(matches!(err, RotaError::DuplicateAssignment { .. }));
}

#[test]
fn stats_window_is_half_open() {
    let store = store();

    // Monday 17 Aug .. Friday 21 Aug: only Thu 20 and Fri 21 fall in the window
    let old_monday = date(2026, 8, 17);
    let mut old = WeekPlan::skeleton(SCOPE, old_monday);
    for shift in [0, 2, 4, 6, 8] {
        old.assign(shift, "ana", AllocationRole::Titular).unwrap();
    }
    old.assign(9, "bia", AllocationRole::Reserve).unwrap();
    store.commit_week(&old, &store).unwrap();

    // as_of itself is excluded
    let mut current = WeekPlan::skeleton(SCOPE, monday());
    current.assign(0, "ana", AllocationRole::Titular).unwrap();
    store.commit_week(&current, &store).unwrap();

    let stats = store.cohort_stats(SCOPE, monday(), 60).unwrap();
    let ana = stats["ana"];
    assert_eq!(ana.total, 2);
    assert_eq!(ana.regular, 1);
    assert_eq!(ana.special, 1);
    assert!(!stats.contains_key("bia"), "reserves are not titular history");
}

#[test]
fn ledger_recording_is_idempotent() {
    let store = store();
    let mut plan = WeekPlan::skeleton(SCOPE, monday());
    plan.assign(8, "ana", AllocationRole::Titular).unwrap(); // Friday EARLY
    let week = store.commit_week(&plan, &store).unwrap();

    store.record(&week.records[0]).unwrap();
    store.record(&week.records[0]).unwrap();
    assert_eq!(store.points_total("ana").unwrap(), 2);

    let entries = store.points_entries("ana").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, DayCategory::Special);
    assert_eq!(entries[0].origin, PointsOrigin::Schedule);
}

#[test]
fn lifecycle_moves_forward_only() {
    let store = store();
    let mut plan = WeekPlan::skeleton(SCOPE, monday());
    plan.assign(0, "ana", AllocationRole::Titular).unwrap();
    let week = store.commit_week(&plan, &store).unwrap();
    let id = week.schedule_id.as_str();

    assert_eq!(store.schedule_status(id).unwrap(), ScheduleStatus::Draft);
    assert!(matches!(
        store.close_schedule(id).unwrap_err(),
        RotaError::InvalidTransition { .. }
    ));

    store.publish_schedule(id).unwrap();
    assert!(matches!(
        store.publish_schedule(id).unwrap_err(),
        RotaError::InvalidTransition { .. }
    ));

    store.close_schedule(id).unwrap();
    assert_eq!(store.schedule_status(id).unwrap(), ScheduleStatus::Closed);
    assert!(store.close_schedule(id).is_err());

    assert!(matches!(
        store.publish_schedule("missing").unwrap_err(),
        RotaError::ScheduleNotFound { .. }
    ));
}

#[test]
fn close_out_settles_substitutions_and_triggered_reserves() {
    let store = store();
    let mut plan = WeekPlan::skeleton(SCOPE, monday());
    plan.assign(0, "ana", AllocationRole::Titular).unwrap();
    plan.assign(0, "bia", AllocationRole::Reserve).unwrap();
    plan.assign(1, "caio", AllocationRole::Titular).unwrap();
    plan.assign(1, "duda", AllocationRole::Reserve).unwrap();
    let week = store.commit_week(&plan, &store).unwrap();
    assert_eq!(store.points_total("ana").unwrap(), 1);

    let id_of = |person: &str| {
        week.records
            .iter()
            .find(|r| r.person_id == person)
            .and_then(|r| r.id)
            .unwrap()
    };
    store.mark_substituted(id_of("ana")).unwrap();
    store.trigger_reserve(id_of("bia")).unwrap();
    assert!(matches!(
        store.trigger_reserve(id_of("caio")).unwrap_err(),
        RotaError::IneligibleRole { .. }
    ));

    store.publish_schedule(&week.schedule_id).unwrap();
    store.close_schedule(&week.schedule_id).unwrap();

    assert_eq!(store.points_total("ana").unwrap(), 0);
    assert_eq!(store.points_total("bia").unwrap(), 1);
    assert_eq!(store.points_total("caio").unwrap(), 1);
    assert_eq!(store.points_total("duda").unwrap(), 0);
}

#[test]
fn unknown_allocation_is_reported() {
    let store = store();
    assert!(matches!(
        store.mark_substituted(999).unwrap_err(),
        RotaError::AllocationNotFound { allocation_id: 999 }
    ));
    assert!(matches!(
        store.trigger_standby(999).unwrap_err(),
        RotaError::AllocationNotFound { .. }
    ));
}

#[test]
fn eligible_list_follows_weighted_load() {
    let store = store();
    store
        .add_points_entry(&PointsEntry {
            allocation_id: None,
            person_id: "ana".into(),
            category: DayCategory::Regular,
            origin: PointsOrigin::Manual,
            points: 10,
        })
        .unwrap();

    let ids = |weights: &ScoreWeights| -> Vec<String> {
        store
            .list_eligible(SCOPE, Role::Operator, weights)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect()
    };
    assert_eq!(ids(&ScoreWeights::default()), vec!["bia", "caio", "duda", "ana"]);

    let ignore_points = ScoreWeights {
        points_weight: 0.0,
        ..ScoreWeights::default()
    };
    assert_eq!(ids(&ignore_points), vec!["ana", "bia", "caio", "duda"]);
}

#[test]
fn schedule_points_cannot_be_added_by_hand() {
    let store = store();
    let err = store
        .add_points_entry(&PointsEntry {
            allocation_id: None,
            person_id: "ana".into(),
            category: DayCategory::Regular,
            origin: PointsOrigin::Schedule,
            points: 1,
        })
        .unwrap_err();
    assert!(matches!(err, RotaError::Other(_)));
}
