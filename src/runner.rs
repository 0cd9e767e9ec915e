//! Builds a warehouse and its collaborators from a scenario and runs it.

use serde::Serialize;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::{ConfigError, SimError};
use crate::model::params::WarehouseParams;
use crate::model::random::RandomStreams;
use crate::model::regulation::RegulationCapability;
use crate::model::state::ThermalSnapshot;
use crate::sim::clock::Clock;
use crate::sim::engine::ColdStorage;
use crate::sim::kpi::KpiReport;
use crate::sim::subscription::SimulatedSubscription;
use crate::sim::types::{SimConfig, StepResult};
use crate::tariff::evaluation::{CustomerModelAccessor, TariffEvaluationSettings};
use crate::tariff::profile::TariffInfo;
use crate::tariff::TariffId;

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub config: ScenarioConfig,
    pub params: WarehouseParams,
    pub sim: SimConfig,
    pub capability: RegulationCapability,
    pub settings: TariffEvaluationSettings,
    pub results: Vec<StepResult>,
    pub kpi: KpiReport,
    /// Forward views of every configured tariff, from the hour after the run.
    pub profiles: Vec<TariffInfo>,
    /// State at the end of the run.
    pub snapshot: ThermalSnapshot,
    /// Warehouse overrides that were rejected and left at their defaults.
    pub rejected: Vec<ConfigError>,
}

impl RunOutput {
    pub fn profile(&self, id: TariffId) -> Option<&TariffInfo> {
        self.profiles.iter().find(|p| p.tariff_id() == id)
    }
}

/// Runs `config` to completion.
///
/// # Errors
///
/// Returns [`SimError::Config`] for the first scenario validation error,
/// [`SimError::UnknownTariff`] if the subscribed tariff does not exist and
/// [`SimError::WeatherUnavailable`] if a step has no weather report.
pub fn run_scenario(config: &ScenarioConfig) -> Result<RunOutput, SimError> {
    if let Some(first) = config.validate().into_iter().next() {
        return Err(first.into());
    }

    let (params, rejected) = config.warehouse_params();
    let s = &config.simulation;
    let sim = s.sim_config();
    let total = sim.total_steps();

    let tariff = config
        .subscribed_tariff()
        .cloned()
        .ok_or(SimError::UnknownTariff(TariffId(s.subscribed_tariff.unwrap_or_default())))?;
    let mut subscription =
        SimulatedSubscription::with_events(tariff, config.regulation_events.clone());
    let weather = config.weather.series(sim.start, total, sim.seed);

    let mut model = ColdStorage::new(
        s.name.clone(),
        params.clone(),
        RandomStreams::for_instance(sim.seed, &s.name),
        config.initial_state,
    )
    .starting_at(sim.start);

    info!(
        warehouse = %s.name,
        days = sim.days,
        seed = sim.seed,
        start = %sim.start,
        tariff = %subscription.tariff().id,
        "run started"
    );
    let mut results = Vec::with_capacity(total);
    Clock::new(sim.start, total).try_run(|slot| {
        results.push(model.step(slot, &weather, &mut subscription)?);
        Ok::<(), SimError>(())
    })?;

    let profiles = config
        .tariffs
        .iter()
        .map(|t| TariffInfo::clone(&model.tariff_info(t)))
        .collect();
    let kpi = KpiReport::from_results(&results, &params);
    info!(
        energy_kwh = kpi.total_energy_kwh,
        cost = kpi.total_cost,
        mean_temp = kpi.mean_temp,
        "run complete"
    );

    Ok(RunOutput {
        config: config.clone(),
        capability: model.regulation_capability(),
        settings: model.evaluation_settings(),
        snapshot: model.checkpoint(),
        params,
        sim,
        results,
        kpi,
        profiles,
        rejected,
    })
}
