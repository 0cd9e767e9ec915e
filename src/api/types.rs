//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::model::controller::BandPosition;
use crate::model::regulation::RegulationCapability;
use crate::model::state::ThermalSnapshot;
use crate::sim::kpi::KpiReport;
use crate::sim::types::{SimConfig, StepResult};
use crate::tariff::evaluation::TariffEvaluationSettings;
use crate::tariff::profile::{PriceStats, TariffInfo};

/// Run summary: configuration, capability, KPIs and latest step.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub name: String,
    pub sim: SimConfig,
    pub capability: RegulationCapability,
    pub settings: TariffEvaluationSettings,
    pub kpi: KpiReport,
    /// State at the end of the run.
    pub snapshot: ThermalSnapshot,
    /// Most recent telemetry record; `None` for an empty run.
    pub latest_step: Option<TelemetryRecord>,
}

/// Single telemetry record, using the CSV column names.
#[derive(Debug, Serialize)]
pub struct TelemetryRecord {
    pub timeslot: usize,
    pub hour_of_day: usize,
    pub outside_temp: f64,
    pub temperature: f64,
    pub band: BandPosition,
    pub stock: f64,
    pub ancillary_kwh: f64,
    pub cooling_kwh: f64,
    pub total_kwh: f64,
    pub up_regulation_kwh: f64,
    pub down_regulation_kwh: f64,
    pub exercised_regulation_kwh: f64,
    pub cost: f64,
}

impl From<&StepResult> for TelemetryRecord {
    fn from(r: &StepResult) -> Self {
        Self {
            timeslot: r.timeslot.0,
            hour_of_day: r.hour_of_day,
            outside_temp: r.outside_temp,
            temperature: r.temperature,
            band: r.band,
            stock: r.stock,
            ancillary_kwh: r.ancillary_kwh,
            cooling_kwh: r.cooling_kwh,
            total_kwh: r.total_kwh,
            up_regulation_kwh: r.up_regulation_kwh,
            down_regulation_kwh: r.down_regulation_kwh,
            exercised_regulation_kwh: r.exercised_regulation_kwh,
            cost: r.cost,
        }
    }
}

/// One entry of the profile listing.
#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub tariff_id: u64,
    pub time_of_use: bool,
    /// First hour of the profile window.
    pub start: usize,
    pub hours: usize,
    /// Sum of the profile (kWh).
    pub total_kwh: f64,
    pub price_stats: Option<PriceStats>,
}

impl From<&TariffInfo> for ProfileSummary {
    fn from(info: &TariffInfo) -> Self {
        Self {
            tariff_id: info.tariff_id().0,
            time_of_use: info.is_time_of_use(),
            start: info.start().0,
            hours: info.profile().len(),
            total_kwh: info.profile().iter().sum(),
            price_stats: info.stats(),
        }
    }
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// First timeslot (inclusive).
    pub from: Option<usize>,
    /// Last timeslot (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 4xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::model::controller::ThermalEnvelope;
    use crate::model::params::WarehouseParams;
    use crate::sim::clock::Timeslot;
    use crate::sim::types::sample_result;
    use crate::tariff::{ForwardProfileSynthesizer, RateTariff, TariffId};

    #[test]
    fn telemetry_record_copies_step_fields() {
        let record = TelemetryRecord::from(&sample_result(5, -19.8, 42.0));
        assert_eq!(record.timeslot, 5);
        assert_eq!(record.hour_of_day, 5);
        assert_eq!(record.temperature, -19.8);
        assert_eq!(record.total_kwh, 42.0);
        assert_eq!(record.band, BandPosition::InBand);
    }

    #[test]
    fn profile_summary_totals_the_profile() {
        let params = WarehouseParams::default();
        let synth = ForwardProfileSynthesizer::new(&params, &ThermalEnvelope::new(&params));
        let info = synth.synthesize(&RateTariff::flat(TariffId(4), "flat", 0.1), Timeslot(3));
        let summary = ProfileSummary::from(&info);
        assert_eq!(summary.tariff_id, 4);
        assert_eq!(summary.start, 3);
        assert_eq!(summary.hours, 168);
        assert_abs_diff_eq!(summary.total_kwh, 168.0 * synth.nominal().hourly_kwh(), epsilon = 1e-6);
        assert!(summary.price_stats.is_none());
    }
}
