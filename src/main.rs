use anyhow::Result;
use chrono::{Duration, NaiveDateTime, Timelike};
use household_ev_sim::config::SimConfig;
use household_ev_sim::telemetry::init_tracing;
use tracing::info;

/// Simple day/night tariff: cheap overnight, an evening peak, a flat export
/// price below the import price all day.
fn tariff(t: NaiveDateTime) -> (f64, f64) {
    let charge_price = match t.hour() {
        0..=5 | 22..=23 => 0.12,
        17..=21 => 0.35,
        _ => 0.22,
    };
    (charge_price, charge_price * 0.8)
}

fn main() -> Result<()> {
    init_tracing();

    let cfg = SimConfig::load("config/three_households.yaml")?;
    let step_minutes = cfg.simulation.step_minutes;

    let mut households = cfg
        .households
        .iter()
        .map(|household| household.build(step_minutes))
        .collect::<Result<Vec<_>>>()?;

    info!(
        households = households.len(),
        step_minutes,
        days = cfg.simulation.days,
        "starting household simulation"
    );

    let steps_per_day = 24 * 60 / step_minutes;
    let total_steps = steps_per_day * cfg.simulation.days;

    let mut spent = 0.0;
    let mut earned = 0.0;
    let mut penalties = 0.0;
    let mut timestamp = cfg.simulation.start;

    for _ in 0..total_steps {
        let (charge_price, discharge_price) = tariff(timestamp);
        for household in &mut households {
            // Charge-as-fast-as-possible heuristic: always request full power.
            let outcome = household.step(1.0, charge_price, discharge_price, timestamp)?;
            spent += outcome.money_spent_charging;
            earned += outcome.money_earned_discharging;
            penalties += outcome.invalid_action_penalty;
        }
        timestamp += Duration::minutes(i64::from(step_minutes));
    }

    info!(
        total_spent = %format!("{spent:.2}"),
        total_earned = %format!("{earned:.2}"),
        total_penalties = %format!("{penalties:.2}"),
        "simulation finished"
    );
    for household in &households {
        let ev = household.ev().read();
        info!(
            household = household.name(),
            ev = %ev.name,
            soc_percent = %format!("{:.1}", ev.soc_percent()),
            home = household.is_home(),
            "final state"
        );
    }

    Ok(())
}
