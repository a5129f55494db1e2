//! A sparse, day-bucketed schedule of terminal events.
//!
//! Defines an `EventSchedule` that holds, for each future day, the individuals whose recovery or
//! death fires on that day. Buckets are created lazily the first time an event lands on a day and
//! dropped when the day is resolved, so there is no fixed table of days. An optional horizon caps
//! the schedulable days; what happens to an event past the horizon is set by an
//! [`OverflowPolicy`].
//!
//! Adding an event is *O*(log(*d*)) in the number of occupied days and resolving a day is
//! *O*(log(*d*) + *k*) for the *k* events it holds.

use std::collections::BTreeMap;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::error::OutbreakError;
use crate::hashing::HashMap;
use crate::health::TransitionKind;
use crate::PersonIndex;

/// A simulated day, counted from zero.
pub type Day = u32;

/// What to do with an event whose day is at or past the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Move the event to the last schedulable day and log a warning.
    #[default]
    Clamp,
    /// Refuse the event with `OutbreakError::ScheduleOverflow`.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledEvent {
    pub person: PersonIndex,
    pub kind: TransitionKind,
}

pub struct EventSchedule {
    buckets: BTreeMap<Day, Vec<ScheduledEvent>>,
    /// The day each scheduled person's event fires on. An individual is only ever scheduled once.
    scheduled_days: HashMap<PersonIndex, Day>,
    /// Schedulable days are `0..horizon`.
    horizon: Option<Day>,
    policy: OverflowPolicy,
    resolved_through: Option<Day>,
    pending: usize,
}

impl EventSchedule {
    /// Create a new empty schedule. `horizon` of `None` accepts any day.
    #[must_use]
    pub fn new(horizon: Option<Day>, policy: OverflowPolicy) -> Self {
        EventSchedule {
            buckets: BTreeMap::new(),
            scheduled_days: HashMap::default(),
            horizon,
            policy,
            resolved_through: None,
            pending: 0,
        }
    }

    #[must_use]
    pub fn horizon(&self) -> Option<Day> {
        self.horizon
    }

    #[must_use]
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// The last day passed to [`EventSchedule::resolve_day`], if any. Nothing can be scheduled
    /// on or before it.
    #[must_use]
    pub fn resolved_through(&self) -> Option<Day> {
        self.resolved_through
    }

    /// Returns the day an event for `person` would actually be stored on, applying the overflow
    /// policy, without storing anything.
    ///
    /// # Errors
    ///
    /// Returns `OutbreakError::ScheduleOverflow` if `day` is past the horizon and the policy is
    /// `Reject`.
    pub fn admit(&self, person: PersonIndex, day: Day) -> Result<Day, OutbreakError> {
        match self.horizon {
            Some(horizon) if day >= horizon => match self.policy {
                OverflowPolicy::Clamp => Ok(horizon - 1),
                OverflowPolicy::Reject => Err(OutbreakError::ScheduleOverflow {
                    person,
                    day,
                    horizon,
                }),
            },
            _ => Ok(day),
        }
    }

    /// Add an event for `person` on `day`, returning the day it was stored on.
    ///
    /// # Errors
    ///
    /// Returns `OutbreakError::ScheduleOverflow` if `day` is past the horizon and the policy is
    /// `Reject`. Nothing is stored in that case.
    ///
    /// # Panics
    ///
    /// Panics if `person` already has an event or if the stored day has already been resolved.
    pub fn schedule(
        &mut self,
        person: PersonIndex,
        day: Day,
        kind: TransitionKind,
    ) -> Result<Day, OutbreakError> {
        let requested = day;
        let day = self.admit(person, requested)?;
        if day != requested {
            warn!(
                "event for person {person} on day {requested} is past the horizon; clamped to day {day}"
            );
        }
        if let Some(resolved) = self.resolved_through {
            assert!(
                day > resolved,
                "cannot schedule person {person} on day {day}: days through {resolved} are resolved"
            );
        }
        let previous = self.scheduled_days.insert(person, day);
        assert!(
            previous.is_none(),
            "person {person} already has a scheduled event"
        );

        trace!("scheduling {kind:?} for person {person} on day {day}");
        self.buckets
            .entry(day)
            .or_default()
            .push(ScheduledEvent { person, kind });
        self.pending += 1;
        Ok(day)
    }

    /// Removes and returns every event stored on `day`.
    ///
    /// Days are resolved in increasing order. Resolving a day that has already been resolved, or
    /// an earlier one, returns an empty list.
    pub fn resolve_day(&mut self, day: Day) -> Vec<ScheduledEvent> {
        if let Some(resolved) = self.resolved_through {
            if day <= resolved {
                debug!("day {day} already resolved (through day {resolved})");
                return Vec::new();
            }
        }
        self.resolved_through = Some(day);

        let events = self.buckets.remove(&day).unwrap_or_default();
        self.pending -= events.len();
        events
    }

    /// Events stored on `day` that have not been resolved.
    #[must_use]
    pub fn events_on(&self, day: Day) -> &[ScheduledEvent] {
        self.buckets.get(&day).map(Vec::as_slice).unwrap_or_default()
    }

    /// The day `person`'s event was stored on, whether or not it has fired.
    #[must_use]
    pub fn scheduled_day(&self, person: PersonIndex) -> Option<Day> {
        self.scheduled_days.get(&person).copied()
    }

    #[must_use]
    pub fn next_event_day(&self) -> Option<Day> {
        self.buckets.keys().next().copied()
    }

    #[must_use]
    pub fn last_event_day(&self) -> Option<Day> {
        self.buckets.keys().next_back().copied()
    }

    /// Number of events not yet resolved.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }
}

impl Default for EventSchedule {
    fn default() -> Self {
        Self::new(None, OverflowPolicy::Clamp)
    }
}
