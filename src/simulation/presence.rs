//! # Vehicle Presence Tracking
//!
//! Pure queries that answer, for one simulated timestamp, whether the
//! household's EV is away on a trip and whether it is arriving back at this
//! exact step. Presence is always derived from `(timestamp, profile)` — it is
//! returned as a value, never stored as mutable tracker state, so the result
//! cannot depend on call order.
//!
//! The away interval of a trip is half-open: at the arrival instant the
//! vehicle already counts as home, yet that same instant must be reported as
//! the arrival edge so the energy update fires for exactly one step. The two
//! queries are therefore evaluated independently.

use crate::domain::trip::{DayPlan, Hhmm, NormalizedWeeklyTripProfile, Trip};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use thiserror::Error;

/// Presence-tracking errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PresenceError {
    /// The weekly profile has no day record for the timestamp's weekday.
    /// Defensive: a correctly constructed calendar covers all seven days.
    #[error("weekly profile has no entry for weekday {weekday} (Monday=1 .. Sunday=7)")]
    UnmappedWeekday { weekday: u8 },
}

/// The vehicle's derived presence at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Presence {
    current_trip: Option<Trip>,
    completed_trip: Option<Trip>,
}

impl Presence {
    /// No trip in progress means the vehicle is home and connectable.
    pub fn is_home(&self) -> bool {
        self.current_trip.is_none()
    }

    /// True exactly at the one step whose time-of-day equals a trip's arrival.
    pub fn is_arriving(&self) -> bool {
        self.completed_trip.is_some()
    }

    /// The trip the vehicle is currently away on, if any.
    pub fn current_trip(&self) -> Option<&Trip> {
        self.current_trip.as_ref()
    }

    /// The trip that ends at this exact timestamp, if any.
    pub fn completed_trip(&self) -> Option<&Trip> {
        self.completed_trip.as_ref()
    }
}

/// Encode a timestamp's time-of-day as HHMM. Seconds are ignored; simulation
/// timestamps sit on step boundaries.
pub fn hhmm_of(timestamp: NaiveDateTime) -> Hhmm {
    Hhmm::from_minutes(timestamp.hour() * 60 + timestamp.minute())
}

/// The trip whose half-open interval `[departure, arrival)` contains `time`.
/// At most one trip can match: normalization rejects overlapping trips.
pub fn current_trip(plan: &DayPlan, time: Hhmm) -> Option<&Trip> {
    plan.trips.iter().find(|trip| trip.contains(time))
}

/// The trip whose arrival equals `time` exactly — the arrival edge.
pub fn completed_trip(plan: &DayPlan, time: Hhmm) -> Option<&Trip> {
    plan.trips.iter().find(|trip| trip.arrival == time)
}

/// Derive the vehicle's presence for `timestamp`.
///
/// The timestamp's weekday is mapped onto the profile's Monday=1 .. Sunday=7
/// keys via [`chrono::Weekday::number_from_monday`]. A missing day record is a
/// calendar/timestamp mismatch and fails with
/// [`PresenceError::UnmappedWeekday`].
pub fn observe(
    profile: &NormalizedWeeklyTripProfile,
    timestamp: NaiveDateTime,
) -> Result<Presence, PresenceError> {
    let weekday = timestamp.weekday().number_from_monday() as u8;
    let plan = profile
        .day(weekday)
        .ok_or(PresenceError::UnmappedWeekday { weekday })?;

    let time = hhmm_of(timestamp);
    Ok(Presence {
        current_trip: current_trip(plan, time).copied(),
        completed_trip: completed_trip(plan, time).copied(),
    })
}
