//! # Household Simulation Module
//!
//! Per-step simulation of EV availability at home and its effect on charging.
//!
//! ## Components
//!
//! - **Presence**: pure derivation of away/home status and arrival edges from
//!   a normalized weekly calendar and a timestamp
//! - **Household**: per-step orchestrator that wires presence, the arrival
//!   energy update, the connector slot and the station actuator together
//!
//! ## Usage
//!
//! ```rust
//! use household_ev_sim::domain::{
//!     ElectricVehicle, NormalizedWeeklyTripProfile, SimulatedChargingStation, StationConfig,
//!     WeeklyTripProfile,
//! };
//! use household_ev_sim::simulation::Household;
//! use chrono::NaiveDate;
//! use parking_lot::RwLock;
//! use std::sync::Arc;
//!
//! let trips: WeeklyTripProfile =
//!     serde_yaml::from_str("1: [{ departure: 800, arrival: 1700 }]").unwrap();
//! let profile = NormalizedWeeklyTripProfile::normalize(&trips, 15).unwrap();
//!
//! let station = Arc::new(RwLock::new(SimulatedChargingStation::new(
//!     StationConfig::default(),
//!     15,
//! )));
//! let ev = Arc::new(RwLock::new(ElectricVehicle::new("ev-1", 60.0, 50.0)));
//! let mut household = Household::new("house-1", station, ev, profile, 1);
//!
//! // A Monday at noon: the vehicle is away, charging is not possible.
//! let noon = NaiveDate::from_ymd_opt(2024, 6, 17)
//!     .unwrap()
//!     .and_hms_opt(12, 0, 0)
//!     .unwrap();
//! let outcome = household.step(0.0, 0.25, 0.20, noon).unwrap();
//! assert!(!household.is_home());
//! assert_eq!(outcome.money_spent_charging, 0.0);
//! ```

pub mod household;
pub mod presence;

pub use household::{ArrivalPolicy, CommuteConsumption, Household, NoTripConsumption, StepError};
pub use presence::{observe, Presence, PresenceError};
