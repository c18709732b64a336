//! # Household Coordinator
//!
//! Composes the trip calendar, presence tracking, the EV and the charging
//! station into one per-step operation. Each [`Household::step`] call derives
//! presence for the given timestamp, fires the arrival hook when a trip has
//! just completed, writes the station's connector slot, and relays the control
//! action and price pair to the station — returning the station's outcome
//! untouched.
//!
//! The coordinator validates nothing itself: schedule and station errors
//! propagate unmodified, and there is no retry anywhere. A failed step is a
//! configuration or integration bug.

use crate::domain::ev::ElectricVehicle;
use crate::domain::station::{
    ActuationOutcome, ConnectorId, SharedEv, StationActuator, StationError,
};
use crate::domain::trip::{NormalizedWeeklyTripProfile, Trip};
use crate::simulation::presence::{self, Presence, PresenceError};
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors surfacing from a household step. Both variants are pass-throughs;
/// the coordinator has no recovery policy of its own.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Presence(#[from] PresenceError),
    #[error(transparent)]
    Station(#[from] StationError),
}

/// Energy update applied when the vehicle returns from a trip.
///
/// Invoked exactly once per arrival event, with the completed trip as
/// context, before the charging station applies any action for that step.
pub trait ArrivalPolicy {
    fn on_arrival(&self, ev: &mut ElectricVehicle, trip: &Trip, timestamp: NaiveDateTime);
}

/// Explicit no-op arrival policy: the vehicle returns with the same energy it
/// left with. This is a placeholder, not error suppression — the hook still
/// fires at the right step.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTripConsumption;

impl ArrivalPolicy for NoTripConsumption {
    fn on_arrival(&self, _ev: &mut ElectricVehicle, _trip: &Trip, _timestamp: NaiveDateTime) {}
}

/// Drains the battery by a fixed commute distance at a fixed consumption rate
/// on every arrival.
#[derive(Debug, Clone, Copy)]
pub struct CommuteConsumption {
    /// Distance driven over the whole trip (km).
    pub round_trip_km: f64,
    /// Vehicle energy efficiency (kWh/100km).
    pub consumption_kwh_per_100km: f64,
}

impl CommuteConsumption {
    pub fn trip_energy_kwh(&self) -> f64 {
        self.round_trip_km * self.consumption_kwh_per_100km / 100.0
    }
}

impl ArrivalPolicy for CommuteConsumption {
    fn on_arrival(&self, ev: &mut ElectricVehicle, trip: &Trip, _timestamp: NaiveDateTime) {
        debug!(%trip, energy_kwh = self.trip_energy_kwh(), "commute consumption on arrival");
        ev.drain(self.trip_energy_kwh());
    }
}

/// A household: one EV, one charging station, one weekly trip calendar.
///
/// The household exclusively owns its normalized profile; the EV and station
/// are shared with the broader environment and outlive any single step. One
/// step per invocation, driven by an external single-threaded loop.
pub struct Household<S: StationActuator> {
    name: String,
    station: Arc<RwLock<S>>,
    ev: SharedEv,
    profile: NormalizedWeeklyTripProfile,
    connector: ConnectorId,
    arrival_policy: Box<dyn ArrivalPolicy>,
    last_presence: Option<Presence>,
}

impl<S: StationActuator> Household<S> {
    /// Create a household with the no-op arrival policy.
    pub fn new(
        name: impl Into<String>,
        station: Arc<RwLock<S>>,
        ev: SharedEv,
        profile: NormalizedWeeklyTripProfile,
        connector: ConnectorId,
    ) -> Self {
        Self {
            name: name.into(),
            station,
            ev,
            profile,
            connector,
            arrival_policy: Box::new(NoTripConsumption),
            last_presence: None,
        }
    }

    /// Replace the arrival policy.
    pub fn with_arrival_policy(mut self, policy: impl ArrivalPolicy + 'static) -> Self {
        self.arrival_policy = Box::new(policy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ev(&self) -> &SharedEv {
        &self.ev
    }

    pub fn profile(&self) -> &NormalizedWeeklyTripProfile {
        &self.profile
    }

    pub fn connector(&self) -> ConnectorId {
        self.connector
    }

    /// Whether the vehicle was home at the last observed step. Households
    /// start out home, before any step has run.
    pub fn is_home(&self) -> bool {
        self.last_presence.map_or(true, |p| p.is_home())
    }

    /// Advance this household by one simulation step.
    ///
    /// Order of operations: derive presence, fire the arrival hook if a trip
    /// just completed, write the connector slot (home = plugged in, away =
    /// unplugged), then delegate to the station actuator and return its
    /// outcome unmodified.
    pub fn step(
        &mut self,
        action: f64,
        charge_price: f64,
        discharge_price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<ActuationOutcome, StepError> {
        let presence = presence::observe(&self.profile, timestamp)?;

        if let Some(trip) = presence.completed_trip() {
            debug!(
                household = %self.name,
                %trip,
                %timestamp,
                "vehicle arriving, applying energy update"
            );
            self.arrival_policy.on_arrival(&mut self.ev.write(), trip, timestamp);
        }

        let outcome = {
            let mut station = self.station.write();
            if presence.is_home() {
                station.plug_in(self.connector, Arc::clone(&self.ev))?;
            } else {
                station.unplug(self.connector)?;
            }
            station.actuate(action, charge_price, discharge_price, timestamp)?
        };

        self.last_presence = Some(presence);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::station::{SimulatedChargingStation, StationConfig};
    use crate::domain::trip::WeeklyTripProfile;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use parking_lot::Mutex;

    /// Arrival policy that records every invocation.
    #[derive(Clone, Default)]
    struct RecordingPolicy {
        arrivals: Arc<Mutex<Vec<NaiveDateTime>>>,
    }

    impl ArrivalPolicy for RecordingPolicy {
        fn on_arrival(&self, _ev: &mut ElectricVehicle, _trip: &Trip, timestamp: NaiveDateTime) {
            self.arrivals.lock().push(timestamp);
        }
    }

    fn normalized(yaml: &str, step_minutes: u32) -> NormalizedWeeklyTripProfile {
        let profile: WeeklyTripProfile = serde_yaml::from_str(yaml).unwrap();
        NormalizedWeeklyTripProfile::normalize(&profile, step_minutes).unwrap()
    }

    fn all_week(day_yaml: &str, step_minutes: u32) -> NormalizedWeeklyTripProfile {
        let yaml: String = (1..=7)
            .map(|d| format!("{d}: {day_yaml}\n"))
            .collect();
        normalized(&yaml, step_minutes)
    }

    fn household(
        profile: NormalizedWeeklyTripProfile,
    ) -> (
        Household<SimulatedChargingStation>,
        Arc<RwLock<SimulatedChargingStation>>,
        SharedEv,
    ) {
        let station = Arc::new(RwLock::new(SimulatedChargingStation::new(
            StationConfig::default(),
            profile.step_minutes(),
        )));
        let ev = Arc::new(RwLock::new(ElectricVehicle::new("ev-1", 60.0, 50.0)));
        let hh = Household::new("house-1", Arc::clone(&station), Arc::clone(&ev), profile, 1);
        (hh, station, ev)
    }

    fn monday_midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 17)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_connector_tracks_presence_across_a_day() {
        let profile = all_week("[{ departure: 900, arrival: 1700 }]", 15);
        let (hh, station, _ev) = household(profile);
        let policy = RecordingPolicy::default();
        let mut hh = hh.with_arrival_policy(policy.clone());

        let mut transitions = Vec::new();
        let mut was_occupied = None;
        let mut t = monday_midnight();
        for _ in 0..96 {
            hh.step(0.0, 1.0, 1.0, t).unwrap();
            let occupied = station.read().is_occupied(1);
            if was_occupied != Some(occupied) {
                transitions.push((t.time(), occupied));
                was_occupied = Some(occupied);
            }
            t += Duration::minutes(15);
        }

        use chrono::NaiveTime;
        assert_eq!(
            transitions,
            vec![
                (NaiveTime::from_hms_opt(0, 0, 0).unwrap(), true),
                (NaiveTime::from_hms_opt(9, 0, 0).unwrap(), false),
                (NaiveTime::from_hms_opt(17, 0, 0).unwrap(), true),
            ]
        );

        // The arrival hook fired exactly once, at 17:00.
        let arrivals = policy.arrivals.lock();
        assert_eq!(arrivals.len(), 1);
        assert_eq!(arrivals[0].time(), NaiveTime::from_hms_opt(17, 0, 0).unwrap());
    }

    #[test]
    fn test_day_without_trips_stays_home() {
        let profile = all_week("[]", 15);
        let (hh, station, _ev) = household(profile);
        let policy = RecordingPolicy::default();
        let mut hh = hh.with_arrival_policy(policy.clone());

        let mut t = monday_midnight();
        for _ in 0..96 {
            hh.step(0.0, 1.0, 1.0, t).unwrap();
            assert!(hh.is_home());
            assert!(station.read().is_occupied(1));
            t += Duration::minutes(15);
        }

        assert!(policy.arrivals.lock().is_empty());
    }

    #[test]
    fn test_arrival_hook_runs_before_actuation() {
        // At the arrival step the vehicle is home again; a charge command on
        // that same step must act on the post-trip energy level.
        let profile = all_week("[{ departure: 900, arrival: 1700 }]", 60);
        let (hh, _station, ev) = household(profile);
        let mut hh = hh.with_arrival_policy(CommuteConsumption {
            round_trip_km: 50.0,
            consumption_kwh_per_100km: 20.0,
        });

        let arrival = NaiveDate::from_ymd_opt(2024, 6, 17)
            .unwrap()
            .and_hms_opt(17, 0, 0)
            .unwrap();
        let outcome = hh.step(1.0, 2.0, 1.0, arrival).unwrap();

        // 10 kWh trip consumption applied, then one hour of charging at 11 kW.
        let expected = 30.0 - 10.0 + 11.0 * 0.92;
        assert!((ev.read().energy_kwh() - expected).abs() < 1e-9);
        assert!(outcome.money_spent_charging > 0.0);
    }

    #[test]
    fn test_away_vehicle_cannot_be_charged() {
        let profile = all_week("[{ departure: 900, arrival: 1700 }]", 15);
        let (mut hh, station, ev) = household(profile);

        let noon = NaiveDate::from_ymd_opt(2024, 6, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let outcome = hh.step(1.0, 2.0, 1.0, noon).unwrap();

        assert!(!hh.is_home());
        assert!(!station.read().is_occupied(1));
        assert_eq!(outcome.money_spent_charging, 0.0);
        assert_eq!(outcome.invalid_action_penalty, 1.0);
        assert_eq!(ev.read().soc_percent(), 50.0);
    }

    #[test]
    fn test_outcome_is_relayed_unmodified() {
        let profile = all_week("[]", 60);
        let (mut hh, _station, _ev) = household(profile);

        let t = monday_midnight();
        let from_household = hh.step(0.5, 2.0, 1.0, t).unwrap();

        // Replaying the same command directly on a fresh station with the
        // same EV state yields the identical outcome.
        let ev2: SharedEv = Arc::new(RwLock::new(ElectricVehicle::new("ev-1", 60.0, 50.0)));
        let mut direct = SimulatedChargingStation::new(StationConfig::default(), 60);
        direct.plug_in(1, ev2).unwrap();
        let from_station = direct.actuate(0.5, 2.0, 1.0, t).unwrap();

        assert_eq!(from_household, from_station);
    }

    #[test]
    fn test_presence_error_propagates() {
        let profile = normalized("1: [{ departure: 900, arrival: 1700 }]", 15);
        let (mut hh, _station, _ev) = household(profile);

        // Tuesday has no day record.
        let tuesday = NaiveDate::from_ymd_opt(2024, 6, 18)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let err = hh.step(0.0, 1.0, 1.0, tuesday).unwrap_err();
        assert!(matches!(
            err,
            StepError::Presence(PresenceError::UnmappedWeekday { weekday: 2 })
        ));
    }

    #[test]
    fn test_station_error_propagates() {
        let profile = all_week("[]", 15);
        let station = Arc::new(RwLock::new(SimulatedChargingStation::new(
            StationConfig::default(),
            15,
        )));
        let ev = Arc::new(RwLock::new(ElectricVehicle::new("ev-1", 60.0, 50.0)));
        // Connector 9 does not exist on a single-connector station.
        let mut hh = Household::new("house-1", station, ev, profile, 9);

        let err = hh.step(0.0, 1.0, 1.0, monday_midnight()).unwrap_err();
        assert!(matches!(
            err,
            StepError::Station(StationError::UnknownConnector(9))
        ));
    }
}
