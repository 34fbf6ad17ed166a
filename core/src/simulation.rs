//! Simplified weekly allocation model for scoring candidate weights.
//!
//! Deliberately lighter than the real allocator: one assignee per
//! EARLY/LATE shift, picked by lowest weighted score
//! (`points*w_points + special*w_special + standby*w_standby`), no reserves
//! and no coverage abort. It only has to rank weight sets against each
//! other, quickly.

use crate::{
    calendar::{week_dates, DayCategory, DAYS_PER_WEEK},
    config::ShiftRequirements,
    model::{Person, Role, ScoreWeights, ShiftKind},
    ports::AvailabilityOracle,
    rng::RandomSource,
    types::{PersonId, QualificationCode},
};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Simulation-only counters; never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimulatedPerson {
    pub id: PersonId,
    pub qualifications: BTreeSet<QualificationCode>,
    pub points: f64,
    pub special_count: u32,
    pub standby_count: u32,
    pub standby_triggered: u32,
    pub assignments: u32,
}

impl SimulatedPerson {
    fn from_person(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            qualifications: person.qualifications.clone(),
            points: 0.0,
            special_count: 0,
            standby_count: 0,
            standby_triggered: 0,
            assignments: 0,
        }
    }

    fn can_work(&self, requirements: &ShiftRequirements, kind: ShiftKind) -> bool {
        requirements
            .simulated_for(kind)
            .map_or(true, |code| self.qualifications.contains(code))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    /// Titular shifts per person over the horizon. People never
    /// assigned are absent.
    pub loads: BTreeMap<PersonId, u32>,
    pub people: Vec<SimulatedPerson>,
}

impl SimulationOutcome {
    pub fn person(&self, id: &str) -> Option<&SimulatedPerson> {
        self.people.iter().find(|p| p.id == id)
    }
}

pub struct SimulationEngine<'a> {
    people: Vec<SimulatedPerson>,
    weights: ScoreWeights,
    requirements: &'a ShiftRequirements,
    availability: &'a dyn AvailabilityOracle,
    standby_activation: Option<f64>,
}

impl<'a> SimulationEngine<'a> {
    /// Operators only; supervisors and others never enter the model.
    pub fn new(
        roster: &[Person],
        weights: ScoreWeights,
        requirements: &'a ShiftRequirements,
        availability: &'a dyn AvailabilityOracle,
    ) -> Self {
        Self {
            people: roster
                .iter()
                .filter(|p| p.role == Role::Operator)
                .map(SimulatedPerson::from_person)
                .collect(),
            weights,
            requirements,
            availability,
            standby_activation: None,
        }
    }

    /// Also place one standby on every OFF day, triggered with `probability`.
    pub fn with_standby(mut self, probability: f64) -> Self {
        self.standby_activation = Some(probability);
        self
    }

    pub fn run(mut self, start: NaiveDate, weeks: usize, rng: &mut dyn RandomSource) -> SimulationOutcome {
        let mut loads: BTreeMap<PersonId, u32> = BTreeMap::new();

        for week in 0..weeks {
            let week_start = start + Duration::days(week as i64 * DAYS_PER_WEEK);
            self.simulate_week(week_start, &mut loads, rng);
        }

        log::debug!(
            "simulated {weeks} weeks for {} people, {} with load",
            self.people.len(),
            loads.len()
        );

        SimulationOutcome {
            loads,
            people: self.people,
        }
    }

    fn simulate_week(
        &mut self,
        week_start: NaiveDate,
        loads: &mut BTreeMap<PersonId, u32>,
        rng: &mut dyn RandomSource,
    ) {
        for date in week_dates(week_start) {
            let category = DayCategory::for_date(date);
            if !category.has_shifts() {
                if let Some(probability) = self.standby_activation {
                    self.simulate_standby(date, probability, rng);
                }
                continue;
            }

            let mut used: HashSet<usize> = HashSet::new();
            for kind in ShiftKind::WORKING {
                let Some(index) = self.pick(date, kind, &used) else {
                    continue;
                };
                used.insert(index);

                let person = &mut self.people[index];
                match category {
                    DayCategory::Regular => person.points += 1.0,
                    DayCategory::Special => {
                        person.points += 2.0;
                        person.special_count += 1;
                    }
                    DayCategory::Off => {}
                }
                person.assignments += 1;
                *loads.entry(person.id.clone()).or_insert(0) += 1;
            }
        }
    }

    fn score(&self, person: &SimulatedPerson) -> f64 {
        self.weights.weigh(
            person.points,
            f64::from(person.special_count),
            f64::from(person.standby_count),
        )
    }

    /// Lowest weighted score among eligible people; roster order breaks ties.
    fn pick(&self, date: NaiveDate, kind: ShiftKind, used: &HashSet<usize>) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for (index, person) in self.people.iter().enumerate() {
            if used.contains(&index)
                || !self.availability.is_available(&person.id, date)
                || !person.can_work(self.requirements, kind)
            {
                continue;
            }
            let score = self.score(person);
            if best.map_or(true, |(s, _)| score < s) {
                best = Some((score, index));
            }
        }
        best.map(|(_, index)| index)
    }

    fn simulate_standby(&mut self, date: NaiveDate, probability: f64, rng: &mut dyn RandomSource) {
        let chosen = self
            .people
            .iter()
            .enumerate()
            .filter(|(_, p)| self.availability.is_available(&p.id, date))
            .min_by_key(|(index, p)| (p.standby_count, *index))
            .map(|(index, _)| index);

        let Some(index) = chosen else { return };
        let person = &mut self.people[index];
        person.standby_count += 1;
        person.points += 1.0;
        if rng.chance(probability) {
            person.standby_triggered += 1;
            person.points += 9.0;
        }
    }
}
