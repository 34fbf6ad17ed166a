use crate::{model::Unavailability, ports::AvailabilityOracle, types::PersonId};
use chrono::NaiveDate;
use std::collections::HashMap;

/// In-memory snapshot of unavailability intervals, indexed by person.
#[derive(Debug, Clone, Default)]
pub struct UnavailabilityCalendar {
    intervals: HashMap<PersonId, Vec<Unavailability>>,
}

impl UnavailabilityCalendar {
    pub fn new(intervals: impl IntoIterator<Item = Unavailability>) -> Self {
        let mut calendar = Self::default();
        for interval in intervals {
            calendar.add(interval);
        }
        calendar
    }

    pub fn add(&mut self, interval: Unavailability) {
        self.intervals
            .entry(interval.person_id.clone())
            .or_default()
            .push(interval);
    }

    pub fn len(&self) -> usize {
        self.intervals.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

impl AvailabilityOracle for UnavailabilityCalendar {
    fn is_available(&self, person_id: &str, date: NaiveDate) -> bool {
        self.intervals
            .get(person_id)
            .map_or(true, |list| !list.iter().any(|u| u.covers(date)))
    }
}
