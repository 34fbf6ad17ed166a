//! Weekly schedule construction.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. Skeleton: 7 days, EARLY + LATE on REGULAR/SPECIAL days.
//!   2. TITULARs for SPECIAL-day shifts, from a fresh base queue.
//!   3. TITULARs for REGULAR-day shifts, continuing the same queue.
//!   4. Every LATE shift must hold a titular with the LATE qualification,
//!      otherwise the whole week fails.
//!   5. One RESERVE per shift, continuing the same queue.
//!   6. Commit the week and its titular points as one unit.
//!
//! Steps 1–5 touch nothing outside the in-memory plan, and step 6 rolls
//! back as a whole, so a failed week leaves no trace.

use crate::{
    availability::UnavailabilityCalendar,
    calendar::DayCategory,
    config::{RotaConfig, TitularCounts},
    error::{RotaError, RotaResult},
    locks::ScopeLocks,
    model::{AllocationRole, Person, Role, ScoreWeights, ShiftKind},
    plan::{CommittedWeek, WeekPlan},
    ports::{QualificationCheck, RotaPorts},
    queue::{PullRequest, RotatingQueue, SelectionContext},
    rng::RandomSource,
    scoring::FairnessScorer,
    stats::RunStats,
    types::PersonId,
};
use chrono::NaiveDate;
use std::collections::HashMap;

pub struct ShiftAllocator {
    config: RotaConfig,
    scorer: FairnessScorer,
    weights: ScoreWeights,
}

/// Mutable state threaded through the phases of one run.
struct AllocationRun<'a> {
    plan: WeekPlan,
    stats: RunStats,
    calendar: UnavailabilityCalendar,
    roster: HashMap<PersonId, Person>,
    qualifications: &'a dyn QualificationCheck,
}

impl AllocationRun<'_> {
    fn late_covered(&self, shift: usize, late_qualification: &str) -> bool {
        self.plan.holders(shift, AllocationRole::Titular).any(|id| {
            self.roster
                .get(id)
                .is_some_and(|p| self.qualifications.holds(p, late_qualification))
        })
    }
}

impl ShiftAllocator {
    pub fn new(config: RotaConfig, weights: ScoreWeights) -> Self {
        Self {
            scorer: FairnessScorer::new(config.coefficients),
            config,
            weights,
        }
    }

    pub fn config(&self) -> &RotaConfig {
        &self.config
    }

    /// Build, validate, commit and score one week.
    pub fn generate_week(
        &self,
        ports: &RotaPorts<'_>,
        scope: &str,
        week_start: NaiveDate,
        counts: TitularCounts,
        rng: &mut dyn RandomSource,
    ) -> RotaResult<CommittedWeek> {
        let plan = self.plan_week(ports, scope, week_start, counts, rng)?;
        let committed = ports.persistence.commit_week(&plan, ports.ledger)?;

        log::info!(
            "scope={scope} week={week_start}: committed schedule {} ({} allocations)",
            committed.schedule_id,
            committed.records.len()
        );
        Ok(committed)
    }

    /// `generate_week` serialized against other generations for `scope`.
    pub fn generate_week_locked(
        &self,
        locks: &ScopeLocks,
        ports: &RotaPorts<'_>,
        scope: &str,
        week_start: NaiveDate,
        counts: TitularCounts,
        rng: &mut dyn RandomSource,
    ) -> RotaResult<CommittedWeek> {
        locks.with_scope(scope, || self.generate_week(ports, scope, week_start, counts, rng))
    }

    /// Steps 1–5 in memory. Nothing is persisted.
    pub fn plan_week(
        &self,
        ports: &RotaPorts<'_>,
        scope: &str,
        week_start: NaiveDate,
        counts: TitularCounts,
        rng: &mut dyn RandomSource,
    ) -> RotaResult<WeekPlan> {
        let people = ports.directory.list_eligible(scope, Role::Operator, &self.weights)?;
        let base_stats = ports
            .history
            .cohort_stats(scope, week_start, self.config.stats_window_days)?;

        let mut run = AllocationRun {
            plan: WeekPlan::skeleton(scope, week_start),
            stats: RunStats::new(base_stats),
            calendar: ports.directory.availability_calendar(scope)?,
            roster: people.iter().map(|p| (p.id.clone(), p.clone())).collect(),
            qualifications: ports.qualifications,
        };

        let queue = RotatingQueue::new(people, self.config.strategy)?;
        log::debug!(
            "scope={scope} week={week_start}: {} in queue ({:?})",
            queue.len(),
            queue.strategy()
        );

        let queue = self.allocate_titulars(queue, &mut run, DayCategory::Special, counts, rng)?;
        let queue = self.allocate_titulars(queue, &mut run, DayCategory::Regular, counts, rng)?;
        self.verify_late_coverage(&run)?;
        self.allocate_reserves(queue, &mut run, rng)?;

        Ok(run.plan)
    }

    fn allocate_titulars(
        &self,
        mut queue: RotatingQueue,
        run: &mut AllocationRun<'_>,
        category: DayCategory,
        counts: TitularCounts,
        rng: &mut dyn RandomSource,
    ) -> RotaResult<RotatingQueue> {
        let late_qualification = self.config.requirements.late_qualification.as_str();

        for shift in run.plan.shifts_in(category) {
            let kind = run.plan.shifts[shift].kind;
            let date = run.plan.shift_date(shift);

            for _ in 0..counts.for_kind(kind) {
                let chosen = {
                    let used_today = run.plan.used_on(date);
                    let request = PullRequest {
                        date,
                        kind,
                        used_today: &used_today,
                        late_covered: run.late_covered(shift, late_qualification),
                    };
                    let ctx = self.selection_context(run);
                    queue.pull(&request, &ctx, rng)
                };

                let Some(person) = chosen else {
                    log::warn!("{date} {kind}: no eligible titular, slot left empty");
                    break;
                };
                run.plan.assign(shift, &person.id, AllocationRole::Titular)?;
                run.stats.note_titular(&person.id, category);
            }
        }

        Ok(queue)
    }

    fn verify_late_coverage(&self, run: &AllocationRun<'_>) -> RotaResult<()> {
        let late_qualification = &self.config.requirements.late_qualification;
        for shift in 0..run.plan.shifts.len() {
            if run.plan.shifts[shift].kind != ShiftKind::Late {
                continue;
            }
            if !run.late_covered(shift, late_qualification) {
                let date = run.plan.shift_date(shift);
                log::warn!("{date} late: no titular holds '{late_qualification}', aborting week");
                return Err(RotaError::CoverageViolation {
                    date,
                    qualification: late_qualification.clone(),
                });
            }
        }
        Ok(())
    }

    fn allocate_reserves(
        &self,
        mut queue: RotatingQueue,
        run: &mut AllocationRun<'_>,
        rng: &mut dyn RandomSource,
    ) -> RotaResult<()> {
        let late_qualification = self.config.requirements.late_qualification.as_str();
        let shifts: Vec<usize> = run
            .plan
            .shifts_in(DayCategory::Special)
            .into_iter()
            .chain(run.plan.shifts_in(DayCategory::Regular))
            .collect();

        for shift in shifts {
            let kind = run.plan.shifts[shift].kind;
            let date = run.plan.shift_date(shift);

            let chosen = {
                let used_today = run.plan.used_on(date);
                let request = PullRequest {
                    date,
                    kind,
                    used_today: &used_today,
                    late_covered: run.late_covered(shift, late_qualification),
                };
                let ctx = self.selection_context(run);
                queue.pull(&request, &ctx, rng)
            };

            match chosen {
                Some(person) => run.plan.assign(shift, &person.id, AllocationRole::Reserve)?,
                None => log::debug!("{date} {kind}: no reserve available"),
            }
        }
        Ok(())
    }

    fn selection_context<'r>(&'r self, run: &'r AllocationRun<'_>) -> SelectionContext<'r> {
        SelectionContext {
            availability: &run.calendar,
            qualifications: run.qualifications,
            requirements: &self.config.requirements,
            scorer: &self.scorer,
            stats: &run.stats,
        }
    }
}
