//! The per-day view of the simulation handed to renderers and reports.

use serde::Serialize;

use crate::schedule::Day;
use crate::PersonIndex;

/// Population-wide counts.
///
/// `currently_infected == total_ever_infected - recovered - dead` holds after every operation on
/// the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateCounters {
    pub total_ever_infected: usize,
    pub currently_infected: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl AggregateCounters {
    #[must_use]
    pub fn reconciles(&self) -> bool {
        self.recovered + self.dead <= self.total_ever_infected
            && self.currently_infected == self.total_ever_infected - self.recovered - self.dead
    }
}

/// A newly infected individual together with its position in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InfectedPoint {
    pub index: PersonIndex,
    pub theta: f64,
    pub r: f64,
}

/// Everything that changed on one day, plus the counts at the end of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySnapshot {
    pub day: Day,
    pub newly_infected: Vec<InfectedPoint>,
    pub recovered_today: Vec<PersonIndex>,
    pub died_today: Vec<PersonIndex>,
    pub counters: AggregateCounters,
    pub exposed_count: usize,
}
