use crate::domain::ev::ElectricVehicle;
use crate::domain::station::{ConnectorId, SimulatedChargingStation, StationConfig};
use crate::domain::trip::{NormalizedWeeklyTripProfile, WeeklyTripProfile};
use crate::simulation::household::{CommuteConsumption, Household};
use anyhow::Result;
use chrono::NaiveDateTime;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub households: Vec<HouseholdConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Step size in minutes; all trip calendars are snapped onto this grid.
    pub step_minutes: u32,
    /// First simulated timestamp.
    pub start: NaiveDateTime,
    /// Horizon in days.
    pub days: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvConfig {
    pub name: String,
    pub battery_capacity_kwh: f64,
    pub initial_soc_percent: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommuteConfig {
    pub round_trip_km: f64,
    pub consumption_kwh_per_100km: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HouseholdConfig {
    pub name: String,
    pub ev: EvConfig,
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default = "default_connector")]
    pub connector: ConnectorId,
    /// Trip consumption applied on arrival; omit for no consumption.
    #[serde(default)]
    pub commute: Option<CommuteConfig>,
    /// Weekly trip calendar, keyed Monday=1 .. Sunday=7.
    pub trips: WeeklyTripProfile,
}

fn default_connector() -> ConnectorId {
    1
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("HEVSIM__").split("__"));
        Ok(figment.extract()?)
    }
}

impl HouseholdConfig {
    /// Build the live household: normalize its calendar onto the step grid
    /// and wire up its own simulated station and EV.
    ///
    /// Schedule validation failures abort here, before any step runs.
    pub fn build(&self, step_minutes: u32) -> Result<Household<SimulatedChargingStation>> {
        let profile = NormalizedWeeklyTripProfile::normalize(&self.trips, step_minutes)?;
        let station = Arc::new(RwLock::new(SimulatedChargingStation::new(
            self.station.clone(),
            step_minutes,
        )));
        let ev = Arc::new(RwLock::new(ElectricVehicle::new(
            &self.ev.name,
            self.ev.battery_capacity_kwh,
            self.ev.initial_soc_percent,
        )));

        let household = Household::new(&self.name, station, ev, profile, self.connector);
        Ok(match &self.commute {
            Some(commute) => household.with_arrival_policy(CommuteConsumption {
                round_trip_km: commute.round_trip_km,
                consumption_kwh_per_100km: commute.consumption_kwh_per_100km,
            }),
            None => household,
        })
    }
}
