//! # Weekly Trip Calendar
//!
//! Models the household's recurring travel schedule: for each weekday, an
//! ordered list of trips with a departure and an arrival time. Raw calendars
//! are snapped onto the simulation's step grid by [`NormalizedWeeklyTripProfile::normalize`]
//! so presence checks done at step boundaries never need interpolation.
//!
//! Times use the compact HHMM integer encoding (hours×100 + minutes) that the
//! calendar data arrives in; [`Hhmm`] makes the encoding a type so malformed
//! values are rejected at construction rather than at query time.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Trip-schedule validation errors
///
/// All of these are fatal configuration errors: they surface during
/// normalization, before the simulation starts, and abort construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid time-of-day {0}: minute part must be below 60")]
    InvalidMinutePart(u16),
    #[error("invalid time-of-day {0}: must not exceed 2359")]
    TimeOutOfRange(u16),
    #[error("weekday {weekday}: departure {departure} must be earlier than arrival {arrival}")]
    UnorderedTrip {
        weekday: u8,
        departure: Hhmm,
        arrival: Hhmm,
    },
    #[error("weekday {weekday}: trip departing {second} overlaps trip departing {first}")]
    OverlappingTrips {
        weekday: u8,
        first: Hhmm,
        second: Hhmm,
    },
    #[error("invalid step size {0} minutes: must be between 1 and 1440")]
    InvalidStepSize(u32),
}

/// Time of day in HHMM integer encoding (hours×100 + minutes, no colon).
///
/// `730` is 07:30, `1700` is 17:00. Valid values are `0..=2359` with a minute
/// part below 60; anything else is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Hhmm(u16);

impl Hhmm {
    pub const MIDNIGHT: Hhmm = Hhmm(0);

    /// Create from the raw HHMM encoding, validating both range and minute part.
    pub fn new(raw: u16) -> Result<Self, ScheduleError> {
        if raw > 2359 {
            return Err(ScheduleError::TimeOutOfRange(raw));
        }
        if raw % 100 >= 60 {
            return Err(ScheduleError::InvalidMinutePart(raw));
        }
        Ok(Self(raw))
    }

    /// Create from minutes since midnight. Values are taken modulo one day.
    pub fn from_minutes(total_minutes: u32) -> Self {
        let m = total_minutes % (24 * 60);
        Self((m / 60 * 100 + m % 60) as u16)
    }

    /// Minutes since midnight.
    pub fn minutes(&self) -> u32 {
        u32::from(self.0) / 100 * 60 + u32::from(self.0) % 100
    }

    /// Hour of day (0-23).
    pub fn hour(&self) -> u32 {
        u32::from(self.0) / 100
    }

    /// Minute of hour (0-59).
    pub fn minute(&self) -> u32 {
        u32::from(self.0) % 100
    }

    /// The raw HHMM encoding.
    pub fn raw(&self) -> u16 {
        self.0
    }

    /// Floor this time onto the step grid: convert to minutes since midnight,
    /// round down to the nearest multiple of `step_minutes`, re-encode.
    pub fn floor_to_step(&self, step_minutes: u32) -> Self {
        Self::from_minutes(self.minutes() / step_minutes * step_minutes)
    }
}

impl TryFrom<u16> for Hhmm {
    type Error = ScheduleError;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<Hhmm> for u16 {
    fn from(t: Hhmm) -> Self {
        t.0
    }
}

impl fmt::Display for Hhmm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// A single round trip away from home: the vehicle departs at `departure` and
/// is back (and connectable) at `arrival`. The away interval is half-open,
/// `[departure, arrival)` — the vehicle counts as home at the arrival instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub departure: Hhmm,
    pub arrival: Hhmm,
}

impl Trip {
    pub fn new(departure: Hhmm, arrival: Hhmm) -> Self {
        Self { departure, arrival }
    }

    /// Whether the vehicle is away on this trip at `time`.
    pub fn contains(&self, time: Hhmm) -> bool {
        self.departure <= time && time < self.arrival
    }

    /// Trip duration in minutes.
    pub fn duration_minutes(&self) -> u32 {
        self.arrival.minutes().saturating_sub(self.departure.minutes())
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.departure, self.arrival)
    }
}

/// The trips planned for one weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayPlan {
    pub trips: Vec<Trip>,
}

impl DayPlan {
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

/// Raw weekly schedule keyed by weekday index.
///
/// The key convention is fixed: Monday = 1 through Sunday = 7, matching
/// `chrono::Weekday::number_from_monday`. It is never inferred from locale or
/// calendar defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyTripProfile(pub BTreeMap<u8, DayPlan>);

impl WeeklyTripProfile {
    pub fn day(&self, weekday: u8) -> Option<&DayPlan> {
        self.0.get(&weekday)
    }
}

/// A weekly schedule whose trip boundaries all sit on the simulation step
/// grid. Built once per household via [`Self::normalize`] and immutable
/// afterwards; the household owns it exclusively for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedWeeklyTripProfile {
    profile: WeeklyTripProfile,
    step_minutes: u32,
}

impl NormalizedWeeklyTripProfile {
    /// Snap every trip boundary in `profile` down to the nearest multiple of
    /// `step_minutes` and re-validate the trip invariants.
    ///
    /// Rejected outright: step sizes outside `1..=1440`, trips whose
    /// normalized departure is not earlier than their arrival (this also
    /// excludes trips collapsed onto a single step boundary), and trips that
    /// overlap an earlier trip on the same day. Back-to-back trips, where one
    /// departure equals the previous arrival, are allowed. Trips never span
    /// midnight: `departure < arrival` holds within a single day.
    ///
    /// Pure: no side effects beyond the returned structure. Normalizing an
    /// already-normalized profile is an identity.
    pub fn normalize(
        profile: &WeeklyTripProfile,
        step_minutes: u32,
    ) -> Result<Self, ScheduleError> {
        if step_minutes == 0 || step_minutes > 24 * 60 {
            return Err(ScheduleError::InvalidStepSize(step_minutes));
        }

        let mut days = BTreeMap::new();
        for (&weekday, plan) in &profile.0 {
            let mut trips: Vec<Trip> = Vec::with_capacity(plan.trips.len());
            for trip in &plan.trips {
                let departure = trip.departure.floor_to_step(step_minutes);
                let arrival = trip.arrival.floor_to_step(step_minutes);
                if departure >= arrival {
                    return Err(ScheduleError::UnorderedTrip {
                        weekday,
                        departure,
                        arrival,
                    });
                }
                trips.push(Trip::new(departure, arrival));
            }

            trips.sort_by_key(|t| t.departure);
            if let Some((first, second)) = trips
                .iter()
                .tuple_windows()
                .find(|(a, b)| b.departure < a.arrival)
            {
                return Err(ScheduleError::OverlappingTrips {
                    weekday,
                    first: first.departure,
                    second: second.departure,
                });
            }

            days.insert(weekday, DayPlan { trips });
        }

        Ok(Self {
            profile: WeeklyTripProfile(days),
            step_minutes,
        })
    }

    /// The trips planned for `weekday` (Monday = 1 .. Sunday = 7).
    pub fn day(&self, weekday: u8) -> Option<&DayPlan> {
        self.profile.day(weekday)
    }

    /// The step grid this profile was normalized onto, in minutes.
    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    /// The underlying weekly schedule.
    pub fn profile(&self) -> &WeeklyTripProfile {
        &self.profile
    }
}
