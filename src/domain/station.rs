//! # Charging-Station Actuator
//!
//! The boundary between the household core and the electrical world. The
//! household only ever does two things with its station: write the connector
//! slot (plug its EV in, or unplug it) and relay the per-step control action
//! together with the price pair. Everything electrical and financial happens
//! behind [`StationActuator`].
//!
//! [`SimulatedChargingStation`] is a deliberately simple implementation for
//! simulation and tests: linear power limits, a single efficiency factor per
//! direction, and a discharge floor on the vehicle's state of charge.

use crate::domain::ev::ElectricVehicle;
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Shared handle to an EV. The environment owns the vehicle; households and
/// stations hold non-owning references to it.
pub type SharedEv = Arc<RwLock<ElectricVehicle>>;

/// Connector index on a station, 1-based.
pub type ConnectorId = u8;

/// Station-specific errors
#[derive(Debug, Error)]
pub enum StationError {
    #[error("connector {0} does not exist on this station")]
    UnknownConnector(ConnectorId),
    #[error("control action {0} is not a finite number")]
    NonFiniteAction(f64),
}

/// Financial and validity outcome of one actuation step.
///
/// Returned by [`StationActuator::actuate`] and relayed unmodified through the
/// household coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuationOutcome {
    /// Money paid for grid energy drawn while charging.
    pub money_spent_charging: f64,
    /// Money earned for energy exported while discharging.
    pub money_earned_discharging: f64,
    /// Accumulated punishment for commands the station could not honor.
    pub invalid_action_penalty: f64,
}

/// Per-step charging-station contract.
///
/// `actuate` turns a control action in `[-1.0, 1.0]` (positive = charge,
/// negative = discharge, zero = idle) and a price pair into energy flows and
/// the resulting [`ActuationOutcome`]. The slot operations maintain the
/// connector → vehicle association; they are the only station state the
/// household writes.
pub trait StationActuator {
    fn plug_in(&mut self, connector: ConnectorId, ev: SharedEv) -> Result<(), StationError>;
    fn unplug(&mut self, connector: ConnectorId) -> Result<(), StationError>;
    fn is_occupied(&self, connector: ConnectorId) -> bool;
    fn actuate(
        &mut self,
        action: f64,
        charge_price: f64,
        discharge_price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<ActuationOutcome, StationError>;
}

/// Simulated charging-station configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Number of connectors (the household default is a single connector).
    pub connectors: u8,
    /// Maximum charging power per connector (kW).
    pub max_charge_kw: f64,
    /// Maximum discharging power per connector (kW).
    pub max_discharge_kw: f64,
    /// One-way conversion efficiency, applied in each flow direction.
    pub efficiency: f64,
    /// Vehicle state of charge below which discharge commands are refused (%).
    pub min_discharge_soc_percent: f64,
    /// Punishment added per command the station cannot honor.
    pub invalid_action_penalty: f64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            connectors: 1,
            max_charge_kw: 11.0,     // Typical home wallbox
            max_discharge_kw: 11.0,
            efficiency: 0.92,
            min_discharge_soc_percent: 20.0,
            invalid_action_penalty: 1.0,
        }
    }
}

/// Simulated charging station for development and testing
pub struct SimulatedChargingStation {
    config: StationConfig,
    step_minutes: u32,
    connectors: BTreeMap<ConnectorId, Option<SharedEv>>,
}

impl SimulatedChargingStation {
    /// Create a station with connectors `1..=config.connectors`, all empty.
    pub fn new(config: StationConfig, step_minutes: u32) -> Self {
        let connectors = (1..=config.connectors.max(1)).map(|id| (id, None)).collect();
        Self {
            config,
            step_minutes,
            connectors,
        }
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    fn step_hours(&self) -> f64 {
        f64::from(self.step_minutes) / 60.0
    }

    /// Charge one connected vehicle; returns (money spent, penalty).
    fn charge(&self, ev: &SharedEv, action: f64, charge_price: f64) -> (f64, f64) {
        let offered_kwh = action * self.config.max_charge_kw * self.step_hours();
        let mut ev = ev.write();
        let stored_kwh = ev.store(offered_kwh * self.config.efficiency);
        // Pay for what was drawn from the grid, not what reached the battery.
        let grid_kwh = stored_kwh / self.config.efficiency;
        (grid_kwh * charge_price, 0.0)
    }

    /// Discharge one connected vehicle; returns (money earned, penalty).
    fn discharge(&self, ev: &SharedEv, action: f64, discharge_price: f64) -> (f64, f64) {
        let requested_kwh = -action * self.config.max_discharge_kw * self.step_hours();
        let mut ev = ev.write();
        let floor_kwh = ev.battery_capacity_kwh * self.config.min_discharge_soc_percent / 100.0;
        let drawn_kwh = ev.draw(requested_kwh, floor_kwh);
        if drawn_kwh <= 0.0 {
            // Commanded to discharge a vehicle already at its floor.
            return (0.0, self.config.invalid_action_penalty);
        }
        let exported_kwh = drawn_kwh * self.config.efficiency;
        (exported_kwh * discharge_price, 0.0)
    }
}

impl StationActuator for SimulatedChargingStation {
    fn plug_in(&mut self, connector: ConnectorId, ev: SharedEv) -> Result<(), StationError> {
        let slot = self
            .connectors
            .get_mut(&connector)
            .ok_or(StationError::UnknownConnector(connector))?;
        *slot = Some(ev);
        Ok(())
    }

    fn unplug(&mut self, connector: ConnectorId) -> Result<(), StationError> {
        let slot = self
            .connectors
            .get_mut(&connector)
            .ok_or(StationError::UnknownConnector(connector))?;
        *slot = None;
        Ok(())
    }

    fn is_occupied(&self, connector: ConnectorId) -> bool {
        matches!(self.connectors.get(&connector), Some(Some(_)))
    }

    fn actuate(
        &mut self,
        action: f64,
        charge_price: f64,
        discharge_price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<ActuationOutcome, StationError> {
        if !action.is_finite() {
            return Err(StationError::NonFiniteAction(action));
        }
        let action = action.clamp(-1.0, 1.0);

        let mut outcome = ActuationOutcome::default();
        for (connector, slot) in &self.connectors {
            match slot {
                Some(ev) => {
                    if action > 0.0 {
                        let (spent, penalty) = self.charge(ev, action, charge_price);
                        outcome.money_spent_charging += spent;
                        outcome.invalid_action_penalty += penalty;
                    } else if action < 0.0 {
                        let (earned, penalty) = self.discharge(ev, action, discharge_price);
                        outcome.money_earned_discharging += earned;
                        outcome.invalid_action_penalty += penalty;
                    }
                }
                None => {
                    // Commanding power flow on an empty connector is invalid.
                    if action != 0.0 {
                        outcome.invalid_action_penalty += self.config.invalid_action_penalty;
                    }
                }
            }
            debug!(
                connector = *connector,
                action,
                %timestamp,
                occupied = slot.is_some(),
                "connector actuated"
            );
        }

        Ok(outcome)
    }
}
