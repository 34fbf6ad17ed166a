//! Boundary traits for the collaborators the rota consults but does not own.
//!
//! RULE: The allocator, standby rotation and suggester only ever talk to
//! these traits. `RotaStore` implements all of them over SQLite; tests
//! may substitute their own.

use crate::{
    availability::UnavailabilityCalendar,
    error::RotaResult,
    model::{AllocationRecord, Person, Role, ScoreWeights},
    plan::{CommittedWeek, WeekPlan},
    stats::CohortStats,
    suggestion::ServiceEntry,
    types::PersonId,
};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Base population for a rotating queue.
pub trait OperatorDirectory {
    /// People of `role` in `scope`, ordered by ascending weighted
    /// historical load, then by id. Asking for supervisors is an error.
    fn list_eligible(
        &self,
        scope: &str,
        role: Role,
        weights: &ScoreWeights,
    ) -> RotaResult<Vec<Person>>;

    /// Operators of `scope` ordered by ascending prior standby count, then id.
    fn list_standby_rotation(&self, scope: &str) -> RotaResult<Vec<Person>>;

    /// Snapshot of every unavailability interval in `scope`.
    fn availability_calendar(&self, scope: &str) -> RotaResult<UnavailabilityCalendar>;
}

pub trait AvailabilityOracle {
    /// True unless an unavailability interval covers `date`.
    fn is_available(&self, person_id: &str, date: NaiveDate) -> bool;
}

pub trait QualificationCheck {
    fn holds(&self, person: &Person, code: &str) -> bool;
}

/// Qualifications as recorded on the person.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeldQualifications;

impl QualificationCheck for HeldQualifications {
    fn holds(&self, person: &Person, code: &str) -> bool {
        person.holds(code)
    }
}

pub trait HistoricalStatsProvider {
    /// Per-person TITULAR counts over `[as_of - window_days, as_of)`.
    fn cohort_stats(
        &self,
        scope: &str,
        as_of: NaiveDate,
        window_days: i64,
    ) -> RotaResult<HashMap<PersonId, CohortStats>>;
}

pub trait PointsLedger {
    /// Idempotent per allocation. A no-op for non-TITULAR roles.
    fn record(&self, allocation: &AllocationRecord) -> RotaResult<()>;
}

pub trait PersistencePort {
    /// Writes schedule → days → shifts → allocations, then passes every
    /// committed TITULAR to `ledger`, all in one unit. A ledger failure
    /// leaves nothing behind. The ledger must write through the same
    /// connection for its entries to roll back with the week.
    fn commit_week(&self, plan: &WeekPlan, ledger: &dyn PointsLedger) -> RotaResult<CommittedWeek>;
}

pub trait ParameterStore {
    fn load(&self) -> RotaResult<ScoreWeights>;
    fn save(&self, weights: &ScoreWeights) -> RotaResult<()>;
}

pub trait ServiceHistoryProvider {
    /// Every allocation ever held, per person in `scope`.
    fn service_history(&self, scope: &str) -> RotaResult<HashMap<PersonId, Vec<ServiceEntry>>>;
}

/// The collaborators one allocation run needs, borrowed for its duration.
pub struct RotaPorts<'a> {
    pub directory: &'a dyn OperatorDirectory,
    pub qualifications: &'a dyn QualificationCheck,
    pub history: &'a dyn HistoricalStatsProvider,
    pub persistence: &'a dyn PersistencePort,
    pub ledger: &'a dyn PointsLedger,
}

impl<'a> RotaPorts<'a> {
    /// Wire every port to the same backing store.
    pub fn from_store<S>(store: &'a S) -> Self
    where
        S: OperatorDirectory + HistoricalStatsProvider + PersistencePort + PointsLedger,
    {
        Self {
            directory: store,
            qualifications: &HeldQualifications,
            history: store,
            persistence: store,
            ledger: store,
        }
    }
}

