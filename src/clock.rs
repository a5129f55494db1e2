//! Day-by-day driver for an [`EpidemicEngine`].
//!
//! Each tick runs one whole day (exposure, severity assignment, resolution) and produces a
//! [`DaySnapshot`]. A day is never partially applied: if any part of it fails the tick returns
//! the error, the engine is left as it was before the day and the clock halts.

use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use crate::engine::EpidemicEngine;
use crate::error::OutbreakError;
use crate::health::TransitionKind;
use crate::schedule::Day;
use crate::snapshot::{AggregateCounters, DaySnapshot};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No events are outstanding and no exposure cycle can infect anyone else.
    Settled,
    /// The caller's day limit was reached.
    DayLimit,
    /// The last schedulable day has been simulated.
    Horizon,
    /// [`SimulationClock::halt`] was called.
    Halted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let reason = match self {
            StopReason::Settled => "settled",
            StopReason::DayLimit => "day limit reached",
            StopReason::Horizon => "horizon reached",
            StopReason::Halted => "halted",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub days_simulated: Day,
    pub counters: AggregateCounters,
    pub exposed_count: usize,
    pub stop_reason: StopReason,
}

pub struct SimulationClock {
    engine: EpidemicEngine,
    /// The next day to run.
    day: Day,
    max_days: Option<Day>,
    halted: bool,
}

impl SimulationClock {
    #[must_use]
    pub fn new(engine: EpidemicEngine) -> Self {
        SimulationClock {
            engine,
            day: 0,
            max_days: None,
            halted: false,
        }
    }

    /// Limits the run to days `0..max_days`.
    #[must_use]
    pub fn with_max_days(mut self, max_days: Day) -> Self {
        self.max_days = Some(max_days);
        self
    }

    #[must_use]
    pub fn engine(&self) -> &EpidemicEngine {
        &self.engine
    }

    #[must_use]
    pub fn into_engine(self) -> EpidemicEngine {
        self.engine
    }

    /// The next day [`SimulationClock::tick`] will run.
    #[must_use]
    pub fn current_day(&self) -> Day {
        self.day
    }

    /// Stops the clock. Subsequent calls to [`SimulationClock::run`] return immediately.
    pub fn halt(&mut self) {
        debug!("clock halted before day {}", self.day);
        self.halted = true;
    }

    /// Returns the reason the clock should not run another day, if any.
    #[must_use]
    pub fn stop_reason(&self) -> Option<StopReason> {
        if self.halted {
            Some(StopReason::Halted)
        } else if self.max_days.is_some_and(|max_days| self.day >= max_days) {
            Some(StopReason::DayLimit)
        } else if self.engine.is_settled() {
            Some(StopReason::Settled)
        } else if self
            .engine
            .schedule()
            .horizon()
            .is_some_and(|horizon| self.day >= horizon)
        {
            Some(StopReason::Horizon)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.stop_reason().is_some()
    }

    /// Runs exactly one day and advances the clock. Callers driving the clock by hand should
    /// stop once [`SimulationClock::is_finished`] is true.
    ///
    /// A failed day changes nothing but the random streams, and the clock halts: the day is not
    /// advanced and every later tick fails.
    ///
    /// # Errors
    ///
    /// Returns `OutbreakError::ScheduleOverflow` if a new event falls past a rejecting horizon,
    /// `OutbreakError::DayClosed` if the current day is at or past the horizon, or an error if
    /// the clock is halted.
    pub fn tick(&mut self) -> Result<DaySnapshot, OutbreakError> {
        let day = self.day;
        if self.halted {
            return Err(format!("the clock is halted before day {day}").into());
        }
        let outcome = match self.engine.advance_day(day) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("day {day} failed, halting the clock: {error}");
                self.halted = true;
                return Err(error);
            }
        };
        let exposure = outcome.exposure;
        let resolved = outcome.resolved;

        let mut newly_infected = exposure.newly_infected;
        if day == 0 {
            let mut seeded = self.engine.index_cases();
            seeded.append(&mut newly_infected);
            newly_infected = seeded;
        }

        let (recovered_today, died_today) = resolved.iter().fold(
            (Vec::new(), Vec::new()),
            |(mut recovered, mut died), event| {
                match event.kind {
                    TransitionKind::Recover => recovered.push(event.person),
                    TransitionKind::Die => died.push(event.person),
                }
                (recovered, died)
            },
        );

        self.day += 1;
        Ok(DaySnapshot {
            day,
            newly_infected,
            recovered_today,
            died_today,
            counters: self.engine.counters(),
            exposed_count: self.engine.exposed_count(),
        })
    }

    /// Ticks until the clock is finished, handing every snapshot to `observer`.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`SimulationClock::tick`] or from `observer`.
    pub fn run<F>(&mut self, mut observer: F) -> Result<RunSummary, OutbreakError>
    where
        F: FnMut(&DaySnapshot) -> Result<(), OutbreakError>,
    {
        let first_day = self.day;
        let stop_reason = loop {
            if let Some(reason) = self.stop_reason() {
                break reason;
            }
            let snapshot = self.tick()?;
            observer(&snapshot)?;
        };

        let summary = RunSummary {
            days_simulated: self.day - first_day,
            counters: self.engine.counters(),
            exposed_count: self.engine.exposed_count(),
            stop_reason,
        };
        info!(
            "run stopped ({}) after {} day(s): {} infected, {} recovered, {} dead",
            summary.stop_reason,
            summary.days_simulated,
            summary.counters.total_ever_infected,
            summary.counters.recovered,
            summary.counters.dead
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Parameters;
    use crate::schedule::OverflowPolicy;

    fn clock(parameters: Parameters, seed: u64) -> SimulationClock {
        SimulationClock::new(EpidemicEngine::new(parameters, seed).unwrap())
    }

    #[test]
    fn first_tick_reports_index_case() {
        let mut clock = clock(Parameters::covid19(), 0);
        let snapshot = clock.tick().unwrap();
        assert_eq!(snapshot.day, 0);
        assert_eq!(snapshot.newly_infected.len(), 3);
        assert_eq!(snapshot.newly_infected[0].index, 0);
        assert_eq!(snapshot.counters.total_ever_infected, 3);
        assert_eq!(clock.current_day(), 1);

        let snapshot = clock.tick().unwrap();
        assert_eq!(snapshot.day, 1);
        assert!(snapshot.newly_infected.is_empty());
    }

    #[test]
    fn runs_until_settled() {
        let mut clock = clock(Parameters::covid19(), 4);
        let mut days = Vec::new();
        let summary = clock
            .run(|snapshot| {
                days.push(snapshot.day);
                Ok(())
            })
            .unwrap();

        assert_eq!(summary.stop_reason, StopReason::Settled);
        assert_eq!(summary.exposed_count, 4500);
        assert_eq!(summary.counters.currently_infected, 0);
        assert_eq!(
            summary.counters.recovered + summary.counters.dead,
            summary.counters.total_ever_infected
        );
        assert_eq!(days, (0..summary.days_simulated).collect::<Vec<_>>());
        assert!(clock.engine().schedule().is_empty());
    }

    #[test]
    fn day_limit_stops_run() {
        let mut clock = clock(Parameters::covid19(), 4).with_max_days(10);
        let summary = clock.run(|_| Ok(())).unwrap();
        assert_eq!(summary.stop_reason, StopReason::DayLimit);
        assert_eq!(summary.days_simulated, 10);
        assert_eq!(clock.current_day(), 10);
    }

    #[test]
    fn halted_clock_does_not_run() {
        let mut clock = clock(Parameters::covid19(), 4);
        clock.halt();
        let summary = clock.run(|_| Ok(())).unwrap();
        assert_eq!(summary.stop_reason, StopReason::Halted);
        assert_eq!(summary.days_simulated, 0);
    }

    #[test]
    fn horizon_stops_run() {
        let parameters = Parameters {
            horizon_days: Some(30),
            schedule_overflow: OverflowPolicy::Clamp,
            ..Parameters::covid19()
        };
        let mut clock = clock(parameters, 4);
        let summary = clock.run(|_| Ok(())).unwrap();
        assert_eq!(summary.stop_reason, StopReason::Horizon);
        assert_eq!(summary.days_simulated, 30);
        // Every late event was clamped onto day 29, so nothing is left outstanding.
        assert!(clock.engine().schedule().is_empty());
        assert!(summary.counters.reconciles());
    }

    #[test]
    fn rejecting_horizon_aborts_run() {
        let parameters = Parameters {
            horizon_days: Some(30),
            schedule_overflow: OverflowPolicy::Reject,
            ..Parameters::covid19()
        };
        let mut clock = clock(parameters, 4);
        let result = clock.run(|_| Ok(()));
        assert!(matches!(result, Err(OutbreakError::ScheduleOverflow { .. })));
        assert_eq!(clock.stop_reason(), Some(StopReason::Halted));
    }

    #[test]
    fn failed_tick_leaves_engine_untouched() {
        let parameters = Parameters {
            horizon_days: Some(30),
            schedule_overflow: OverflowPolicy::Reject,
            ..Parameters::covid19()
        };
        let mut clock = clock(parameters, 4);
        let state = |clock: &SimulationClock| {
            let engine = clock.engine();
            (
                engine.counters(),
                engine.exposed_count(),
                engine.schedule().pending(),
                engine.schedule().resolved_through(),
                engine.statuses().to_vec(),
            )
        };

        let (error, before) = loop {
            let before = state(&clock);
            if let Err(error) = clock.tick() {
                break (error, before);
            }
        };
        // The first batch with a severe recovery is drawn on day 7, and its event lands past 30.
        assert!(matches!(error, OutbreakError::ScheduleOverflow { .. }));
        assert_eq!(clock.current_day(), 7);
        assert_eq!(state(&clock), before);
        assert_eq!(clock.stop_reason(), Some(StopReason::Halted));

        // Ticking again neither re-runs exposure nor moves the day.
        assert!(clock.tick().is_err());
        assert_eq!(clock.current_day(), 7);
        assert_eq!(state(&clock), before);
        let summary = clock.run(|_| Ok(())).unwrap();
        assert_eq!(summary.stop_reason, StopReason::Halted);
        assert_eq!(summary.days_simulated, 0);
    }

    #[test]
    fn tick_at_horizon_is_refused() {
        let parameters = Parameters {
            horizon_days: Some(10),
            schedule_overflow: OverflowPolicy::Clamp,
            ..Parameters::covid19()
        };
        let mut clock = clock(parameters, 4);
        for _ in 0..10 {
            clock.tick().unwrap();
        }
        assert_eq!(clock.stop_reason(), Some(StopReason::Horizon));
        let counters = clock.engine().counters();

        let result = clock.tick();
        assert!(matches!(result, Err(OutbreakError::DayClosed { day: 10, .. })));
        assert_eq!(clock.engine().counters(), counters);
        assert_eq!(clock.current_day(), 10);
    }

    #[test]
    fn observer_error_stops_run() {
        let mut clock = clock(Parameters::covid19(), 4);
        let result = clock.run(|snapshot| {
            if snapshot.day == 3 {
                Err("stop".into())
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(clock.current_day(), 4);
    }

    #[test]
    fn stalled_epidemic_settles() {
        let parameters = Parameters {
            r0: 0.3,
            ..Parameters::covid19()
        };
        let mut clock = clock(parameters, 4);
        let summary = clock.run(|_| Ok(())).unwrap();
        assert_eq!(summary.stop_reason, StopReason::Settled);
        // The index case recovers on day 12 and nobody else is ever infected.
        assert_eq!(summary.days_simulated, 13);
        assert_eq!(summary.counters.total_ever_infected, 1);
        assert_eq!(summary.counters.recovered, 1);
    }
}
