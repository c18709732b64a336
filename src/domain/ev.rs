//! # Electric Vehicle Entity
//!
//! The EV as the household sees it: a stable identity plus one mutable
//! stored-energy level. Trip consumption (on arrival) and charging-station
//! energy flows both mutate the same level; the vehicle itself has no notion
//! of time or schedule.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// An electric vehicle with a battery.
///
/// Identity is stable across simulation steps; the stored-energy level is the
/// only state that changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectricVehicle {
    /// Name used in logs and reports.
    pub name: String,
    /// Usable battery capacity (kWh).
    pub battery_capacity_kwh: f64,
    /// Currently stored energy (kWh), kept within `0..=battery_capacity_kwh`.
    energy_kwh: f64,
}

impl ElectricVehicle {
    pub fn new(name: impl Into<String>, battery_capacity_kwh: f64, initial_soc_percent: f64) -> Self {
        let soc = initial_soc_percent.clamp(0.0, 100.0);
        Self {
            name: name.into(),
            battery_capacity_kwh,
            energy_kwh: battery_capacity_kwh * soc / 100.0,
        }
    }

    /// Currently stored energy (kWh).
    pub fn energy_kwh(&self) -> f64 {
        self.energy_kwh
    }

    /// State of charge (0-100%).
    pub fn soc_percent(&self) -> f64 {
        if self.battery_capacity_kwh <= 0.0 {
            return 0.0;
        }
        self.energy_kwh / self.battery_capacity_kwh * 100.0
    }

    /// Headroom left in the battery (kWh).
    pub fn remaining_capacity_kwh(&self) -> f64 {
        (self.battery_capacity_kwh - self.energy_kwh).max(0.0)
    }

    /// Store up to `kwh` of energy; returns the amount actually accepted
    /// (limited by remaining capacity).
    pub fn store(&mut self, kwh: f64) -> f64 {
        let accepted = kwh.max(0.0).min(self.remaining_capacity_kwh());
        self.energy_kwh += accepted;
        accepted
    }

    /// Draw up to `kwh` of energy, never below `floor_kwh`; returns the amount
    /// actually delivered.
    pub fn draw(&mut self, kwh: f64, floor_kwh: f64) -> f64 {
        let available = (self.energy_kwh - floor_kwh.max(0.0)).max(0.0);
        let delivered = kwh.max(0.0).min(available);
        self.energy_kwh -= delivered;
        delivered
    }

    /// Consume energy while away from home (trip consumption). Drains toward
    /// zero; a trip longer than the remaining charge empties the battery.
    pub fn drain(&mut self, kwh: f64) {
        let before = self.energy_kwh;
        self.energy_kwh = (self.energy_kwh - kwh.max(0.0)).max(0.0);
        debug!(
            ev = %self.name,
            drained_kwh = before - self.energy_kwh,
            soc_percent = self.soc_percent(),
            "trip consumption applied"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_soc() {
        let ev = ElectricVehicle::new("ev-1", 60.0, 50.0);
        assert_eq!(ev.energy_kwh(), 30.0);
        assert_eq!(ev.soc_percent(), 50.0);
    }

    #[test]
    fn test_initial_soc_is_clamped() {
        let ev = ElectricVehicle::new("ev-1", 60.0, 140.0);
        assert_eq!(ev.soc_percent(), 100.0);
    }

    #[test]
    fn test_store_respects_capacity() {
        let mut ev = ElectricVehicle::new("ev-1", 60.0, 90.0);
        let accepted = ev.store(10.0);
        assert!((accepted - 6.0).abs() < 1e-9);
        assert!((ev.energy_kwh() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_draw_respects_floor() {
        let mut ev = ElectricVehicle::new("ev-1", 60.0, 50.0);
        let delivered = ev.draw(20.0, 24.0);
        assert!((delivered - 6.0).abs() < 1e-9);
        assert!((ev.energy_kwh() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_drain_never_goes_negative() {
        let mut ev = ElectricVehicle::new("ev-1", 60.0, 10.0);
        ev.drain(20.0);
        assert_eq!(ev.energy_kwh(), 0.0);
        assert_eq!(ev.soc_percent(), 0.0);
    }
}
