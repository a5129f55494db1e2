//! A day-stepped simulation of an epidemic spreading through a fixed population.
//!
//! Every individual has a fixed place in a [`PopulationLayout`] and a [`HealthStatus`]. The
//! [`EpidemicEngine`] owns all mutable state and advances it one day at a time:
//! * On serial-interval days the exposure pool grows in proportion to the number of people ever
//!   infected, and new infections are drawn from the freshly exposed slice of the population.
//! * Each new infection is assigned a severity (mild, severe and recovering, severe and dying)
//!   and a single terminal event, a recovery or a death, is placed on the [`EventSchedule`].
//! * Events due on the current day fire and update the aggregate counters.
//!
//! A [`SimulationClock`] drives the engine until the epidemic settles, a day limit or the
//! horizon is reached, handing a [`DaySnapshot`] of each day to an observer. The
//! [`runner`] module wires the clock to a command line and the CSV reports in [`report`].
//!
//! All randomness comes from named, independently seeded streams (see [`random`]), so a run is
//! fully determined by its parameters and base seed.
pub mod clock;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod health;
pub mod layout;
pub mod log;
pub mod parameters;
pub mod random;
pub mod report;
pub mod runner;
pub mod schedule;
pub mod snapshot;

/// The position of an individual in the population, `0..population_size`.
pub type PersonIndex = usize;

pub use clock::{RunSummary, SimulationClock, StopReason};
pub use engine::{DayOutcome, EpidemicEngine, ExposureResult, PlannedEvent, SeverityAssignment};
pub use error::OutbreakError;
pub use health::{HealthStatus, Severity, TransitionKind};
pub use layout::{PopulationLayout, Position};
pub use parameters::{DayRange, Parameters};
pub use report::{ReportOptions, ReportWriter, SimulationReports};
pub use runner::{run_with_args, run_with_custom_args, BaseArgs, RunOutcome};
pub use schedule::{Day, EventSchedule, OverflowPolicy, ScheduledEvent};
pub use snapshot::{AggregateCounters, DaySnapshot, InfectedPoint};

// Re-exports used by the `define_rng!` and `define_report!` macros.
pub use csv;
pub use rand;
