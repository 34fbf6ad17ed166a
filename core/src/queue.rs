//! The rotating queue: fair selection with deterministic requeueing.
//!
//! One queue lives for one allocation run. A pull never changes the set of
//! members; the chosen person moves to the back and everyone else keeps
//! their relative order.
//!
//! Two strategies sit behind `pull`:
//!   - FairnessScored: scan the whole queue, score every eligible person,
//!     take the minimum by (score, fresh random draw).
//!   - RoundRobin: first eligible person from the head, no scoring.
//!
//! Both filter on daily usage, availability and (EARLY) qualification.
//! On a LATE shift that has no qualified titular yet, both restrict the
//! pool to qualified people when any are eligible.

use crate::{
    calendar::DayCategory,
    config::ShiftRequirements,
    error::{RotaError, RotaResult},
    model::{Person, ShiftKind},
    ports::{AvailabilityOracle, QualificationCheck},
    rng::RandomSource,
    scoring::FairnessScorer,
    stats::RunStats,
    types::PersonId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    #[default]
    FairnessScored,
    RoundRobin,
}

/// What is being filled.
pub struct PullRequest<'a> {
    pub date: NaiveDate,
    pub kind: ShiftKind,
    pub used_today: &'a HashSet<PersonId>,
    /// The target shift already holds a titular with the LATE qualification.
    pub late_covered: bool,
}

/// Collaborators consulted while filtering and ranking.
pub struct SelectionContext<'a> {
    pub availability: &'a dyn AvailabilityOracle,
    pub qualifications: &'a dyn QualificationCheck,
    pub requirements: &'a ShiftRequirements,
    pub scorer: &'a FairnessScorer,
    pub stats: &'a RunStats,
}

impl SelectionContext<'_> {
    fn is_eligible(&self, person: &Person, request: &PullRequest<'_>) -> bool {
        if request.used_today.contains(&person.id) {
            return false;
        }
        if !self.availability.is_available(&person.id, request.date) {
            return false;
        }
        match self.requirements.mandatory_for(request.kind) {
            Some(code) => self.qualifications.holds(person, code),
            None => true,
        }
    }

    fn needs_late_cover(&self, request: &PullRequest<'_>) -> Option<&str> {
        if request.kind == ShiftKind::Late && !request.late_covered {
            Some(self.requirements.late_qualification.as_str())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct RotatingQueue {
    members: VecDeque<Person>,
    strategy: SelectionStrategy,
}

impl RotatingQueue {
    /// Build a queue in the given order. Supervisors are rejected outright.
    pub fn new(people: Vec<Person>, strategy: SelectionStrategy) -> RotaResult<Self> {
        for person in &people {
            person.ensure_allocatable()?;
        }
        Ok(Self {
            members: people.into(),
            strategy,
        })
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &Person> + '_ {
        self.members.iter()
    }

    pub fn ids(&self) -> Vec<PersonId> {
        self.members.iter().map(|p| p.id.clone()).collect()
    }

    /// Drop a member for the rest of the run.
    pub fn remove(&mut self, person_id: &str) -> Option<Person> {
        let index = self.members.iter().position(|p| p.id == person_id)?;
        self.members.remove(index)
    }

    /// Select the next person, or `None` when nobody survives filtering.
    pub fn pull(
        &mut self,
        request: &PullRequest<'_>,
        ctx: &SelectionContext<'_>,
        rng: &mut dyn RandomSource,
    ) -> Option<Person> {
        let index = match self.strategy {
            SelectionStrategy::FairnessScored => self.select_scored(request, ctx, rng),
            SelectionStrategy::RoundRobin => self.select_round_robin(request, ctx),
        }?;
        self.rotate_to_back(index)
    }

    /// Like `pull`, but an empty result is an error.
    pub fn pull_required(
        &mut self,
        request: &PullRequest<'_>,
        ctx: &SelectionContext<'_>,
        rng: &mut dyn RandomSource,
    ) -> RotaResult<Person> {
        self.pull(request, ctx, rng).ok_or_else(|| RotaError::QueueExhausted {
            date: request.date,
            kind: request.kind.to_string(),
        })
    }

    fn select_scored(
        &self,
        request: &PullRequest<'_>,
        ctx: &SelectionContext<'_>,
        rng: &mut dyn RandomSource,
    ) -> Option<usize> {
        let eligible: Vec<usize> = (0..self.members.len())
            .filter(|&i| ctx.is_eligible(&self.members[i], request))
            .collect();
        if eligible.is_empty() {
            return None;
        }

        let pool = match ctx.needs_late_cover(request) {
            Some(code) => {
                let qualified: Vec<usize> = eligible
                    .iter()
                    .copied()
                    .filter(|&i| ctx.qualifications.holds(&self.members[i], code))
                    .collect();
                if qualified.is_empty() {
                    eligible
                } else {
                    qualified
                }
            }
            None => eligible,
        };

        let category = DayCategory::for_date(request.date);
        let averages = ctx.stats.averages(self.members.iter().map(|p| &p.id));

        let mut best: Option<(f64, f64, usize)> = None;
        for index in pool {
            let person = &self.members[index];
            let score = ctx.scorer.score(&ctx.stats.get(&person.id), &averages, category);
            let tie = rng.next_f64();
            let better = match best {
                None => true,
                Some((s, t, _)) => score.total_cmp(&s).then(tie.total_cmp(&t)).is_lt(),
            };
            if better {
                best = Some((score, tie, index));
            }
        }

        best.map(|(score, _, index)| {
            log::debug!(
                "{} {}: picked {} (score={score:.2})",
                request.date,
                request.kind,
                self.members[index].id
            );
            index
        })
    }

    fn select_round_robin(&self, request: &PullRequest<'_>, ctx: &SelectionContext<'_>) -> Option<usize> {
        let mut first_eligible = None;
        for (index, person) in self.members.iter().enumerate() {
            if !ctx.is_eligible(person, request) {
                continue;
            }
            match ctx.needs_late_cover(request) {
                Some(code) if !ctx.qualifications.holds(person, code) => {
                    first_eligible.get_or_insert(index);
                }
                _ => return Some(index),
            }
        }
        first_eligible
    }

    fn rotate_to_back(&mut self, index: usize) -> Option<Person> {
        let person = self.members.remove(index)?;
        self.members.push_back(person.clone());
        Some(person)
    }
}
