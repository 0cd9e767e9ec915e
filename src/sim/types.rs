//! Core simulation types: run configuration and per-hour records.

use std::fmt;

use serde::Serialize;

use super::clock::{HOURS_PER_DAY, Timeslot};
use crate::model::controller::BandPosition;

/// Timing and seeding of one simulation run.
///
/// # Examples
///
/// ```
/// use coldstore_sim::sim::clock::Timeslot;
/// use coldstore_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(2, 42, Timeslot(0));
/// assert_eq!(cfg.total_steps(), 48);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimConfig {
    /// Number of days to simulate.
    pub days: usize,
    /// Master random seed for reproducibility.
    pub seed: u64,
    /// First simulated hour.
    pub start: Timeslot,
}

impl SimConfig {
    pub fn new(days: usize, seed: u64, start: Timeslot) -> Self {
        Self { days, seed, start }
    }

    /// Total number of hourly steps across all days.
    pub fn total_steps(&self) -> usize {
        self.days * HOURS_PER_DAY
    }
}

/// Complete record of one simulated hour.
///
/// Energy fields are kWh over the hour. `cooling_kwh` and `total_kwh` are
/// electrical; `cooling_loss_kwh` and `cooling_energy_kwh` are thermal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub timeslot: Timeslot,
    pub hour_of_day: usize,
    /// Outside temperature (°C).
    pub outside_temp: f64,
    /// Regulation exercised against last hour's offer (kWh, signed).
    pub exercised_regulation_kwh: f64,
    /// Temperature change caused by exercised regulation (K).
    pub regulation_shock: f64,
    pub outgoing_stock: f64,
    pub incoming_stock: f64,
    /// Temperature change caused by blending in new stock (K).
    pub turnover_delta: f64,
    /// Stock on hand after turnover (t).
    pub stock: f64,
    pub ancillary_kwh: f64,
    pub cooling_loss_kwh: f64,
    pub cooling_energy_kwh: f64,
    pub cooling_kwh: f64,
    /// Band position seen by the controller.
    pub band: BandPosition,
    /// Temperature at the end of the hour (°C).
    pub temperature: f64,
    /// Consumption reported for the hour (kWh).
    pub total_kwh: f64,
    pub up_regulation_kwh: f64,
    pub down_regulation_kwh: f64,
    /// Billed charge for the hour.
    pub cost: f64,
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | out={:>5.1}°C  T={:>7.3}°C ({:?}) | stock={:>6.1} t \
             (-{:.1} +{:.1}) | anc={:>5.2}  cool={:>6.2}  total={:>6.2} kWh | \
             reg(up={:.2}, down={:.2}, ex={:.2}) | cost={:.3}",
            self.timeslot,
            self.outside_temp,
            self.temperature,
            self.band,
            self.stock,
            self.outgoing_stock,
            self.incoming_stock,
            self.ancillary_kwh,
            self.cooling_kwh,
            self.total_kwh,
            self.up_regulation_kwh,
            self.down_regulation_kwh,
            self.exercised_regulation_kwh,
            self.cost,
        )
    }
}

#[cfg(test)]
pub(crate) fn sample_result(slot: usize, temperature: f64, total_kwh: f64) -> StepResult {
    StepResult {
        timeslot: Timeslot(slot),
        hour_of_day: slot % HOURS_PER_DAY,
        outside_temp: 20.0,
        exercised_regulation_kwh: 0.0,
        regulation_shock: 0.0,
        outgoing_stock: 2.0,
        incoming_stock: 2.0,
        turnover_delta: 0.0,
        stock: 500.0,
        ancillary_kwh: 15.0,
        cooling_loss_kwh: (total_kwh - 15.0) * 1.5,
        cooling_energy_kwh: (total_kwh - 15.0) * 1.5,
        cooling_kwh: total_kwh - 15.0,
        band: BandPosition::InBand,
        temperature,
        total_kwh,
        up_regulation_kwh: total_kwh - 15.0,
        down_regulation_kwh: -10.0,
        cost: total_kwh * 0.1,
    }
}
