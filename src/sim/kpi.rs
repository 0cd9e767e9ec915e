//! Post-hoc KPI computation from simulation results.

use std::fmt;

use serde::Serialize;

use super::types::StepResult;
use crate::model::params::WarehouseParams;

/// Aggregate indicators derived from a complete run.
///
/// Computed post-hoc from the step records so reported metrics always agree
/// with exported data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiReport {
    pub steps: usize,
    /// Total reported consumption (kWh).
    pub total_energy_kwh: f64,
    /// Largest single-hour consumption (kWh).
    pub peak_hourly_kwh: f64,
    pub total_cost: f64,
    pub mean_temp: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    /// Hours that ended outside the hysteresis band.
    pub hours_outside_band: usize,
    /// Hours that ended below `min_temp` or above `max_temp`.
    pub hours_outside_limits: usize,
    pub offered_up_kwh: f64,
    pub offered_down_kwh: f64,
    /// Net exercised regulation (kWh, signed).
    pub exercised_kwh: f64,
}

impl KpiReport {
    /// Computes all KPIs from the complete step record vector.
    ///
    /// # Arguments
    ///
    /// * `results` - Complete simulation step results
    /// * `params` - Configuration the run used, for band and limit checks
    pub fn from_results(results: &[StepResult], params: &WarehouseParams) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let half_band = params.hysteresis() / 2.0;
        let nominal = params.nominal_temp();
        let mut report = Self {
            steps: results.len(),
            min_temp: f64::INFINITY,
            max_temp: f64::NEG_INFINITY,
            ..Self::default()
        };
        let mut temp_sum = 0.0;

        for r in results {
            report.total_energy_kwh += r.total_kwh;
            report.peak_hourly_kwh = report.peak_hourly_kwh.max(r.total_kwh);
            report.total_cost += r.cost;

            temp_sum += r.temperature;
            report.min_temp = report.min_temp.min(r.temperature);
            report.max_temp = report.max_temp.max(r.temperature);

            if (r.temperature - nominal).abs() > half_band {
                report.hours_outside_band += 1;
            }
            if r.temperature < params.min_temp() || r.temperature > params.max_temp() {
                report.hours_outside_limits += 1;
            }

            report.offered_up_kwh += r.up_regulation_kwh;
            report.offered_down_kwh += r.down_regulation_kwh;
            report.exercised_kwh += r.exercised_regulation_kwh;
        }

        report.mean_temp = temp_sum / results.len() as f64;
        report
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ({} h) ---", self.steps)?;
        writeln!(f, "Total energy:          {:.2} kWh", self.total_energy_kwh)?;
        writeln!(f, "Peak hourly energy:    {:.2} kWh", self.peak_hourly_kwh)?;
        writeln!(f, "Total cost:            {:.2}", self.total_cost)?;
        writeln!(
            f,
            "Temperature:           mean {:.2} °C (min {:.2}, max {:.2})",
            self.mean_temp, self.min_temp, self.max_temp
        )?;
        writeln!(f, "Hours outside band:    {}", self.hours_outside_band)?;
        writeln!(f, "Hours outside limits:  {}", self.hours_outside_limits)?;
        writeln!(
            f,
            "Regulation offered:    up {:.2} kWh, down {:.2} kWh",
            self.offered_up_kwh, self.offered_down_kwh
        )?;
        write!(f, "Regulation exercised:  {:.2} kWh", self.exercised_kwh)
    }
}
