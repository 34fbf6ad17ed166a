//! On-call (standby) rotation for OFF days.
//!
//! Independent of the weekly allocator: a plain cursor over operators
//! pre-sorted by ascending prior standby count.

use crate::{
    error::RotaResult,
    model::{AllocationRole, Person},
    plan::{CommittedWeek, WeekPlan},
    ports::{AvailabilityOracle, RotaPorts},
    types::PersonId,
};
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct StandbyRotation {
    people: Vec<Person>,
    cursor: usize,
}

impl StandbyRotation {
    pub fn new(people: Vec<Person>) -> Self {
        Self::starting_at(people, 0)
    }

    pub fn starting_at(people: Vec<Person>, cursor: usize) -> Self {
        Self { people, cursor }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Walk at most one full lap from the cursor. Every inspected person
    /// advances the cursor by one, whether skipped or returned.
    pub fn next(
        &mut self,
        date: NaiveDate,
        excluded: &HashSet<PersonId>,
        availability: &dyn AvailabilityOracle,
    ) -> Option<Person> {
        let total = self.people.len();
        for _ in 0..total {
            let person = &self.people[self.cursor % total];
            self.cursor += 1;

            if excluded.contains(&person.id) {
                continue;
            }
            if !availability.is_available(&person.id, date) {
                continue;
            }
            return Some(person.clone());
        }
        None
    }
}

/// Create a standby schedule for one OFF day with up to `quantity`
/// standby records. Stops early when the rotation runs dry.
pub fn plan_standby_day(
    ports: &RotaPorts<'_>,
    scope: &str,
    date: NaiveDate,
    quantity: usize,
) -> RotaResult<CommittedWeek> {
    let people = ports.directory.list_standby_rotation(scope)?;
    for person in &people {
        person.ensure_allocatable()?;
    }
    let calendar = ports.directory.availability_calendar(scope)?;

    let mut rotation = StandbyRotation::new(people);
    let mut plan = WeekPlan::standby_day(scope, date);
    let mut used = HashSet::new();

    for _ in 0..quantity {
        let Some(person) = rotation.next(date, &used, &calendar) else {
            log::warn!("{date} standby: rotation exhausted after {} picks", used.len());
            break;
        };
        plan.assign(0, &person.id, AllocationRole::Standby)?;
        used.insert(person.id);
    }

    let committed = ports.persistence.commit_week(&plan, ports.ledger)?;
    log::info!(
        "scope={scope} standby {date}: committed {} ({} on call)",
        committed.schedule_id,
        committed.records.len()
    );
    Ok(committed)
}
