//! The epidemic-progression engine.
//!
//! `EpidemicEngine` owns all mutable simulation state: the per-individual health status, the
//! exposure pool, the aggregate counters, the event schedule and the random streams. A day is
//! advanced by [`EpidemicEngine::advance_day`], which runs three operations in this order and
//! commits nothing unless all of them succeed:
//!
//! 1. [`EpidemicEngine::step_day`] grows the exposure pool on serial-interval days and draws the
//!    newly infected from the freshly exposed slice of the population.
//! 2. [`EpidemicEngine::assign_severity`] splits those individuals into mild, severe-recovering and
//!    severe-dying buckets and schedules each one's recovery or death.
//! 3. [`EpidemicEngine::resolve_day`] fires every event scheduled for the day.
//!
//! The exposure pool is always the prefix `0..exposed_count` of the population, so growing it
//! never revisits an individual who has already been exposed.

use log::{debug, info, trace, warn};
use serde::Serialize;

use crate::error::OutbreakError;
use crate::hashing::HashSet;
use crate::health::{HealthStatus, Severity, TransitionKind};
use crate::layout::PopulationLayout;
use crate::parameters::Parameters;
use crate::random::{sample_multiple_from_known_length, split_sample, RngStore};
use crate::schedule::{Day, EventSchedule, ScheduledEvent};
use crate::snapshot::{AggregateCounters, InfectedPoint};
use crate::{define_rng, PersonIndex};

define_rng!(ExposureRng);
define_rng!(SeverityRng);
define_rng!(TimingRng);

/// Growth of the exposure pool relative to the expected number of new cases. The extra 10%
/// stands for exposures that never turn into a detected case.
const EXPOSURE_OVERSHOOT: f64 = 1.1;
/// Share of the remaining pool that is infected once growth reaches the population cap.
const CAPPED_INFECTION_SHARE: f64 = 0.9;

// Counts are rounded half to even.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_count(value: f64) -> usize {
    value.round_ties_even() as usize
}

/// The outcome of one exposure step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposureResult {
    pub day: Day,
    /// Whether the exposure cycle ran on this day.
    pub fired: bool,
    pub expected_new: usize,
    pub exposed_before: usize,
    pub exposed_after: usize,
    /// Whether growth was cut back to the population size.
    pub clamped: bool,
    pub newly_infected: Vec<InfectedPoint>,
}

impl ExposureResult {
    fn idle(day: Day, exposed_count: usize) -> Self {
        ExposureResult {
            day,
            fired: false,
            expected_new: 0,
            exposed_before: exposed_count,
            exposed_after: exposed_count,
            clamped: false,
            newly_infected: Vec::new(),
        }
    }

    #[must_use]
    pub fn indices(&self) -> Vec<PersonIndex> {
        self.newly_infected.iter().map(|point| point.index).collect()
    }

    #[must_use]
    pub fn new_infected_count(&self) -> usize {
        self.newly_infected.len()
    }
}

/// A terminal event placed on the schedule by severity assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlannedEvent {
    pub person: PersonIndex,
    pub severity: Severity,
    /// The day the event was stored on, after any clamping to the horizon.
    pub day: Day,
}

/// Summary of one call to [`EpidemicEngine::assign_severity`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeverityAssignment {
    pub mild: Vec<PersonIndex>,
    pub severe_recovering: Vec<PersonIndex>,
    pub severe_dying: Vec<PersonIndex>,
    pub events: Vec<PlannedEvent>,
    /// `input count - num_mild - num_severe`. The mild and severe counts are rounded
    /// independently, so this is not always zero.
    pub rounding_residual: i64,
}

/// Buckets and requested event days drawn for one severity assignment, not yet applied.
#[derive(Default)]
struct SeverityDraw {
    mild: Vec<PersonIndex>,
    severe_recovering: Vec<PersonIndex>,
    severe_dying: Vec<PersonIndex>,
    requested: Vec<(PersonIndex, Severity, Day)>,
    rounding_residual: i64,
}

/// Everything one call to [`EpidemicEngine::advance_day`] changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOutcome {
    pub exposure: ExposureResult,
    pub severity: SeverityAssignment,
    pub resolved: Vec<ScheduledEvent>,
}

pub struct EpidemicEngine {
    parameters: Parameters,
    layout: PopulationLayout,
    statuses: Vec<HealthStatus>,
    schedule: EventSchedule,
    counters: AggregateCounters,
    exposed_count: usize,
    index_cases: Vec<PersonIndex>,
    rngs: RngStore,
}

impl EpidemicEngine {
    /// Validates `parameters`, lays out the population and seeds the index cases.
    ///
    /// # Errors
    ///
    /// Returns `OutbreakError::InvalidConfiguration` for invalid parameters, or
    /// `OutbreakError::ScheduleOverflow` if the index cases' recovery falls past a rejecting
    /// horizon. No engine is built in either case.
    pub fn new(parameters: Parameters, base_seed: u64) -> Result<Self, OutbreakError> {
        parameters.validate()?;
        let population_size = parameters.population_size;
        let mut engine = EpidemicEngine {
            layout: PopulationLayout::generate(population_size),
            statuses: vec![HealthStatus::Susceptible; population_size],
            schedule: EventSchedule::new(parameters.horizon_days, parameters.schedule_overflow),
            counters: AggregateCounters::default(),
            exposed_count: 0,
            index_cases: Vec::new(),
            rngs: RngStore::new(base_seed),
            parameters,
        };
        engine.seed_index_cases()?;
        Ok(engine)
    }

    // Index cases take the first slots of the pool and recover on the first day of the mild
    // window.
    fn seed_index_cases(&mut self) -> Result<(), OutbreakError> {
        let count = self.parameters.initial_infections;
        let recovery_day = self.parameters.mild_window().min;
        self.schedule.admit(0, recovery_day)?;

        for person in 0..count {
            self.schedule
                .schedule(person, recovery_day, TransitionKind::Recover)?;
            self.statuses[person] = HealthStatus::Mild;
            self.index_cases.push(person);
        }
        self.exposed_count = count;
        self.counters.total_ever_infected = count;
        self.counters.currently_infected = count;
        info!("seeded {count} index case(s) recovering on day {recovery_day}");
        Ok(())
    }

    /// Runs one whole day: exposure, severity assignment and resolution.
    ///
    /// The day is applied fully or not at all. Every draw and every event day is checked before
    /// any status, counter or schedule entry changes, so on error the only thing that has moved
    /// is the random streams.
    ///
    /// # Errors
    ///
    /// Returns `OutbreakError::DayClosed` if `day` is at or past the horizon or has already been
    /// resolved, or `OutbreakError::ScheduleOverflow` if a new event falls past a rejecting
    /// horizon.
    pub fn advance_day(&mut self, day: Day) -> Result<DayOutcome, OutbreakError> {
        self.ensure_open_day(day)?;
        let exposure = self.draw_exposure(day);
        let draw = self.draw_severity(&exposure.indices(), day)?;

        self.apply_exposure(&exposure);
        let severity = self.apply_severity(draw, day)?;
        let resolved = self.resolve_day(day);
        Ok(DayOutcome {
            exposure,
            severity,
            resolved,
        })
    }

    fn ensure_open_day(&self, day: Day) -> Result<(), OutbreakError> {
        if let Some(horizon) = self.schedule.horizon().filter(|&horizon| day >= horizon) {
            return Err(OutbreakError::DayClosed {
                day,
                reason: format!("the schedule horizon is day {horizon}"),
            });
        }
        if let Some(resolved) = self.schedule.resolved_through().filter(|&resolved| day <= resolved)
        {
            return Err(OutbreakError::DayClosed {
                day,
                reason: format!("days through {resolved} are already resolved"),
            });
        }
        Ok(())
    }

    /// Runs the exposure cycle for `current_day`.
    ///
    /// The cycle fires only on multiples of the serial interval while the pool is not yet the
    /// whole population; on any other day this is a no-op returning an empty result. Callers
    /// driving the engine by hand should prefer [`EpidemicEngine::advance_day`], which never
    /// leaves infected individuals without a scheduled event.
    pub fn step_day(&mut self, current_day: Day) -> ExposureResult {
        let exposure = self.draw_exposure(current_day);
        self.apply_exposure(&exposure);
        exposure
    }

    // Only the exposure stream advances here.
    fn draw_exposure(&mut self, current_day: Day) -> ExposureResult {
        let population_size = self.parameters.population_size;
        let exposed_before = self.exposed_count;
        if current_day % self.parameters.serial_interval_days != 0
            || exposed_before >= population_size
        {
            return ExposureResult::idle(current_day, exposed_before);
        }

        let expected_new = self.expected_new_cases();
        let growth = round_count(expected_new as f64 * EXPOSURE_OVERSHOOT);
        let remaining = population_size - exposed_before;
        let (new_infected_count, exposed_after, clamped) = if growth > remaining {
            (
                round_count(remaining as f64 * CAPPED_INFECTION_SHARE),
                population_size,
                true,
            )
        } else {
            (expected_new, exposed_before + growth, false)
        };

        let infected = self.rngs.sample(ExposureRng, |rng| {
            sample_multiple_from_known_length(rng, exposed_before..exposed_after, new_infected_count)
        });
        let newly_infected = infected
            .into_iter()
            .map(|index| {
                let position = self.layout.position(index);
                InfectedPoint {
                    index,
                    theta: position.theta,
                    r: position.r,
                }
            })
            .collect();

        ExposureResult {
            day: current_day,
            fired: true,
            expected_new,
            exposed_before,
            exposed_after,
            clamped,
            newly_infected,
        }
    }

    fn apply_exposure(&mut self, exposure: &ExposureResult) {
        if !exposure.fired {
            return;
        }
        for status in &mut self.statuses[exposure.exposed_before..exposure.exposed_after] {
            *status = HealthStatus::Exposed;
        }
        for point in &exposure.newly_infected {
            self.statuses[point.index] = HealthStatus::Infected;
        }

        let new_infected_count = exposure.new_infected_count();
        self.exposed_count = exposure.exposed_after;
        self.counters.total_ever_infected += new_infected_count;
        self.counters.currently_infected += new_infected_count;
        debug!(
            "day {}: exposed {} -> {}, {new_infected_count} new infections{}",
            exposure.day,
            exposure.exposed_before,
            exposure.exposed_after,
            if exposure.clamped { " (capped)" } else { "" }
        );
    }

    /// Splits the individuals infected on `current_day` into severity buckets and schedules each
    /// one's recovery or death.
    ///
    /// Either every individual is scheduled or, on error, none is: all event days are checked
    /// against the horizon before anything is stored.
    ///
    /// # Errors
    ///
    /// Returns `OutbreakError::DayClosed` if `current_day` is at or past the horizon or already
    /// resolved, or `OutbreakError::ScheduleOverflow` if an event day is past the horizon and the
    /// schedule rejects overflow.
    ///
    /// # Panics
    ///
    /// Panics if an individual is not awaiting severity assignment or is listed twice.
    pub fn assign_severity(
        &mut self,
        new_infected: &[PersonIndex],
        current_day: Day,
    ) -> Result<SeverityAssignment, OutbreakError> {
        if new_infected.is_empty() {
            return Ok(SeverityAssignment::default());
        }
        self.ensure_open_day(current_day)?;
        let mut seen = HashSet::default();
        for &person in new_infected {
            assert_eq!(
                self.statuses[person],
                HealthStatus::Infected,
                "person {person} is not awaiting severity assignment"
            );
            assert!(
                seen.insert(person),
                "person {person} appears twice in one severity assignment"
            );
        }

        let draw = self.draw_severity(new_infected, current_day)?;
        self.apply_severity(draw, current_day)
    }

    // Draws the buckets and event days and checks every day against the horizon. Only the
    // severity and timing streams advance here.
    fn draw_severity(
        &mut self,
        new_infected: &[PersonIndex],
        current_day: Day,
    ) -> Result<SeverityDraw, OutbreakError> {
        if new_infected.is_empty() {
            return Ok(SeverityDraw::default());
        }
        let count = new_infected.len();
        let num_mild = round_count(self.parameters.mild_fraction * count as f64);
        let num_severe = round_count(self.parameters.severe_fraction * count as f64);
        let mut num_severe_recovered =
            round_count(self.parameters.severe_recovery_fraction() * num_severe as f64);

        let (mild, candidates) = self
            .rngs
            .sample(SeverityRng, |rng| split_sample(rng, new_infected, num_mild));
        let (severe_recovering, severe_dying) = if candidates.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            if num_severe_recovered > candidates.len() {
                warn!(
                    "day {current_day}: {num_severe_recovered} severe recoveries requested from {} candidates; rounding drift capped",
                    candidates.len()
                );
                num_severe_recovered = candidates.len();
            }
            self.rngs.sample(SeverityRng, |rng| {
                split_sample(rng, &candidates, num_severe_recovered)
            })
        };

        let buckets = [
            (Severity::Mild, &mild, self.parameters.mild_window()),
            (
                Severity::SevereRecovering,
                &severe_recovering,
                self.parameters.severe_recovery_window(),
            ),
            (
                Severity::SevereDying,
                &severe_dying,
                self.parameters.severe_death_window(),
            ),
        ];
        let mut requested = Vec::with_capacity(count);
        for (severity, bucket, window) in buckets {
            for &person in bucket {
                let offset: Day = self
                    .rngs
                    .sample_range(TimingRng, window.min..window.max);
                let day = current_day.saturating_add(offset);
                self.schedule.admit(person, day)?;
                requested.push((person, severity, day));
            }
        }

        #[allow(clippy::cast_possible_wrap)]
        let rounding_residual = count as i64 - num_mild as i64 - num_severe as i64;
        Ok(SeverityDraw {
            mild,
            severe_recovering,
            severe_dying,
            requested,
            rounding_residual,
        })
    }

    // Every requested day has passed `admit`, so scheduling cannot be refused here.
    fn apply_severity(
        &mut self,
        draw: SeverityDraw,
        current_day: Day,
    ) -> Result<SeverityAssignment, OutbreakError> {
        let mut events = Vec::with_capacity(draw.requested.len());
        for (person, severity, day) in draw.requested {
            let day = self.schedule.schedule(person, day, severity.outcome())?;
            self.statuses[person] = severity.into();
            events.push(PlannedEvent {
                person,
                severity,
                day,
            });
        }
        if !events.is_empty() {
            trace!(
                "day {current_day}: {} mild, {} severe recovering, {} severe dying",
                draw.mild.len(),
                draw.severe_recovering.len(),
                draw.severe_dying.len()
            );
        }

        Ok(SeverityAssignment {
            mild: draw.mild,
            severe_recovering: draw.severe_recovering,
            severe_dying: draw.severe_dying,
            events,
            rounding_residual: draw.rounding_residual,
        })
    }

    /// Fires every event scheduled for `day` and returns them. A day that has already been
    /// resolved yields nothing.
    pub fn resolve_day(&mut self, day: Day) -> Vec<ScheduledEvent> {
        let events = self.schedule.resolve_day(day);
        for event in &events {
            let status = &mut self.statuses[event.person];
            assert!(
                status.is_infected(),
                "person {} resolved while {:?}",
                event.person,
                status
            );
            *status = event.kind.into();
            self.counters.currently_infected -= 1;
            match event.kind {
                TransitionKind::Recover => self.counters.recovered += 1,
                TransitionKind::Die => self.counters.dead += 1,
            }
        }
        if !events.is_empty() {
            debug!("day {day}: resolved {} event(s)", events.len());
        }
        debug_assert!(self.counters.reconciles());
        events
    }

    /// `round(r0 * total_ever_infected)`: the size of the next exposure cycle before overshoot.
    #[must_use]
    pub fn expected_new_cases(&self) -> usize {
        round_count(self.parameters.r0 * self.counters.total_ever_infected as f64)
    }

    #[must_use]
    pub fn is_pool_exhausted(&self) -> bool {
        self.exposed_count >= self.parameters.population_size
    }

    /// True once nothing can change any more: no events are outstanding and no future exposure
    /// cycle can infect anyone.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.schedule.is_empty() && (self.is_pool_exhausted() || self.expected_new_cases() == 0)
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn layout(&self) -> &PopulationLayout {
        &self.layout
    }

    #[must_use]
    pub fn schedule(&self) -> &EventSchedule {
        &self.schedule
    }

    #[must_use]
    pub fn counters(&self) -> AggregateCounters {
        self.counters
    }

    #[must_use]
    pub fn exposed_count(&self) -> usize {
        self.exposed_count
    }

    #[must_use]
    pub fn status(&self, person: PersonIndex) -> HealthStatus {
        self.statuses[person]
    }

    #[must_use]
    pub fn statuses(&self) -> &[HealthStatus] {
        &self.statuses
    }

    #[must_use]
    pub fn count_status(&self, status: HealthStatus) -> usize {
        self.statuses.iter().filter(|s| **s == status).count()
    }

    /// The individuals infected before the first day, with their positions.
    #[must_use]
    pub fn index_cases(&self) -> Vec<InfectedPoint> {
        self.index_cases
            .iter()
            .map(|&index| {
                let position = self.layout.position(index);
                InfectedPoint {
                    index,
                    theta: position.theta,
                    r: position.r,
                }
            })
            .collect()
    }
}
