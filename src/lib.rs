//! # Household EV Simulation Core
//!
//! Models how a household's electric vehicle alternates between "away on a
//! trip" and "available for charging/discharging" over a multi-day horizon
//! advanced in fixed discrete steps, and how that availability gates a
//! charging-station control action each step.
//!
//! The moving parts:
//!
//! - [`domain::trip`] — weekly trip calendars and their normalization onto
//!   the simulation step grid
//! - [`simulation::presence`] — pure away/home and arrival-edge queries
//! - [`domain::station`] — the charging-station actuator boundary and a
//!   simulated implementation
//! - [`simulation::household`] — the per-step coordinator tying it together
//!
//! Control policy is external: callers decide the action, this crate does the
//! deterministic bookkeeping.

pub mod config;
pub mod domain;
pub mod simulation;
pub mod telemetry;
