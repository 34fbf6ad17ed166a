//! Standby days: rotation order, availability, triggering and close-out.

use chrono::NaiveDate;
use rota_core::{
    availability::UnavailabilityCalendar,
    calendar::DayCategory,
    error::RotaError,
    model::{AllocationRole, Person, Role, ScheduleKind, Unavailability},
    ports::{OperatorDirectory, RotaPorts},
    standby::{plan_standby_day, StandbyRotation},
    store::RotaStore,
};
use std::collections::HashSet;

const SCOPE: &str = "ops";

fn saturday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 24).unwrap()
}

fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 25).unwrap()
}

fn person(id: &str, role: Role) -> Person {
    Person {
        id: id.into(),
        name: id.to_uppercase(),
        scope: SCOPE.into(),
        role,
        qualifications: Default::default(),
    }
}

fn store() -> RotaStore {
    let store = RotaStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    for id in ["ana", "bia", "caio"] {
        store.upsert_person(&person(id, Role::Operator)).unwrap();
    }
    store.upsert_person(&person("boss", Role::Supervisor)).unwrap();
    store
}

fn on_call(week: &rota_core::plan::CommittedWeek) -> Vec<String> {
    week.records.iter().map(|r| r.person_id.clone()).collect()
}

#[test]
fn rotation_wraps_and_skips_excluded() {
    let people = vec![
        person("ana", Role::Operator),
        person("bia", Role::Operator),
        person("caio", Role::Operator),
    ];
    let calendar = UnavailabilityCalendar::new([Unavailability {
        person_id: "bia".into(),
        start: saturday(),
        end: saturday(),
        reason: String::new(),
    }]);
    let mut rotation = StandbyRotation::starting_at(people, 2);
    let mut excluded = HashSet::new();

    let first = rotation.next(saturday(), &excluded, &calendar).unwrap();
    assert_eq!(first.id, "caio");
    excluded.insert(first.id);

    // wraps to the head
    assert_eq!(rotation.next(saturday(), &excluded, &calendar).unwrap().id, "ana");
    assert_eq!(rotation.cursor(), 4);

    excluded.insert("ana".into());
    assert!(rotation.next(saturday(), &excluded, &calendar).is_none());
}

#[test]
fn standby_day_follows_prior_standby_counts() {
    let store = store();
    let ports = RotaPorts::from_store(&store);

    let first = plan_standby_day(&ports, SCOPE, saturday(), 2).unwrap();
    assert_eq!(on_call(&first), vec!["ana", "bia"]);
    assert_eq!(first.plan.kind, ScheduleKind::Standby);
    assert!(first.records.iter().all(|r| r.role == AllocationRole::Standby));

    // caio has the fewest standbys now
    let second = plan_standby_day(&ports, SCOPE, sunday(), 2).unwrap();
    assert_eq!(on_call(&second), vec!["caio", "ana"]);

    let rotation: Vec<String> = store
        .list_standby_rotation(SCOPE)
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(rotation, vec!["bia", "caio", "ana"]);
}

#[test]
fn standby_day_stops_when_rotation_runs_dry() {
    let store = store();
    store
        .add_unavailability(&Unavailability {
            person_id: "bia".into(),
            start: saturday(),
            end: sunday(),
            reason: "trip".into(),
        })
        .unwrap();

    let week = plan_standby_day(&RotaPorts::from_store(&store), SCOPE, saturday(), 5).unwrap();
    assert_eq!(on_call(&week), vec!["ana", "caio"]);
}

#[test]
fn triggered_standby_settles_to_ten_points() {
    let store = store();
    let week = plan_standby_day(&RotaPorts::from_store(&store), SCOPE, saturday(), 2).unwrap();
    let ana = week.records[0].id.unwrap();

    store.trigger_standby(ana).unwrap();
    store.trigger_standby(ana).unwrap();
    assert!(store.allocation(ana).unwrap().triggered);

    // nothing is awarded before close-out
    assert_eq!(store.points_total("ana").unwrap(), 0);

    store.publish_schedule(&week.schedule_id).unwrap();
    store.close_schedule(&week.schedule_id).unwrap();
    assert_eq!(store.points_total("ana").unwrap(), 10);
    assert_eq!(store.points_total("bia").unwrap(), 1);
    assert_eq!(store.points_total("caio").unwrap(), 0);
}

#[test]
fn only_standby_duties_can_be_triggered() {
    let store = store();
    let mut plan = rota_core::plan::WeekPlan::skeleton(SCOPE, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    plan.assign(0, "ana", AllocationRole::Titular).unwrap();
    let week = rota_core::ports::PersistencePort::commit_week(&store, &plan, &store).unwrap();

    let err = store.trigger_standby(week.records[0].id.unwrap()).unwrap_err();
    assert!(matches!(err, RotaError::IneligibleRole { .. }));
}

#[test]
fn friday_standby_settles_as_an_off_day() {
    let store = store();
    let friday = NaiveDate::from_ymd_opt(2026, 10, 23).unwrap();
    let week = plan_standby_day(&RotaPorts::from_store(&store), SCOPE, friday, 1).unwrap();

    assert_eq!(week.plan.days[0].category, DayCategory::Off);
    assert_eq!(week.records[0].category, DayCategory::Off);
    let ana = week.records[0].id.unwrap();
    assert_eq!(store.allocation(ana).unwrap().category, DayCategory::Off);

    store.publish_schedule(&week.schedule_id).unwrap();
    store.close_schedule(&week.schedule_id).unwrap();

    let entries = store.points_entries("ana").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, DayCategory::Off);
    assert_eq!(entries[0].points, 1);
}

#[test]
fn only_titulars_can_be_substituted() {
    let store = store();
    let week = plan_standby_day(&RotaPorts::from_store(&store), SCOPE, saturday(), 1).unwrap();
    let ana = week.records[0].id.unwrap();

    let err = store.mark_substituted(ana).unwrap_err();
    assert!(matches!(err, RotaError::IneligibleRole { .. }));
    assert!(!store.allocation(ana).unwrap().substituted);
}
