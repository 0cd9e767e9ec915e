//! Hourly simulation of one cold-storage warehouse.

use std::sync::Arc;

use tracing::{debug, info};

use super::clock::Timeslot;
use super::subscription::Subscription;
use super::types::StepResult;
use super::weather::WeatherSource;
use crate::error::SimError;
use crate::model::ancillary::AncillaryLoadModel;
use crate::model::controller::HysteresisCoolingController;
use crate::model::params::WarehouseParams;
use crate::model::random::{RandomSource, RandomStreams};
use crate::model::regulation::{RegulationCapability, RegulationCapacity, RegulationCapacityCalculator};
use crate::model::state::{ThermalSnapshot, ThermalState};
use crate::model::turnover::StockTurnoverModel;
use crate::tariff::evaluation::{CustomerModelAccessor, TariffEvaluationSettings};
use crate::tariff::profile::{ForwardProfileSynthesizer, ProfileCache, TariffInfo};
use crate::tariff::Tariff;

/// Flexible-load model of a refrigerated warehouse.
///
/// Owns its thermal state, its sub-models and both random streams. Generic
/// over `R: RandomSource` so tests can script every draw. Market-side
/// collaborators are passed into [`ColdStorage::step`] rather than held.
///
/// # Examples
///
/// ```
/// use coldstore_sim::model::params::WarehouseParams;
/// use coldstore_sim::model::random::RandomStreams;
/// use coldstore_sim::model::state::ThermalSnapshot;
/// use coldstore_sim::sim::clock::Timeslot;
/// use coldstore_sim::sim::engine::ColdStorage;
/// use coldstore_sim::sim::subscription::SimulatedSubscription;
/// use coldstore_sim::sim::weather::ConstantWeather;
/// use coldstore_sim::tariff::{RateTariff, TariffId};
///
/// let mut warehouse = ColdStorage::new(
///     "cold-1",
///     WarehouseParams::default(),
///     RandomStreams::for_instance(42, "cold-1"),
///     Some(ThermalSnapshot { temperature: -20.0, stock: None }),
/// );
/// let mut sub = SimulatedSubscription::new(RateTariff::flat(TariffId(1), "flat", 0.1));
/// let step = warehouse.step(Timeslot(0), &ConstantWeather(20.0), &mut sub);
/// assert!(step.is_ok_and(|s| s.total_kwh > 0.0));
/// ```
#[derive(Debug)]
pub struct ColdStorage<R: RandomSource> {
    name: String,
    params: WarehouseParams,
    state: ThermalState,
    turnover: StockTurnoverModel,
    ancillary: AncillaryLoadModel,
    controller: HysteresisCoolingController,
    regulation: RegulationCapacityCalculator,
    synthesizer: ForwardProfileSynthesizer,
    capability: RegulationCapability,
    streams: RandomStreams<R>,
    profiles: ProfileCache,
    next_slot: Timeslot,
    last_capacity: RegulationCapacity,
}

impl<R: RandomSource> ColdStorage<R> {
    /// Builds the model from validated parameters.
    ///
    /// # Arguments
    ///
    /// * `name` - Instance name, used in logs
    /// * `params` - Physical configuration
    /// * `streams` - Model and evaluation random streams
    /// * `bootstrap` - Checkpointed state to resume from; without one the
    ///   temperature is drawn uniformly between the limits and the store
    ///   starts full
    pub fn new(
        name: impl Into<String>,
        params: WarehouseParams,
        mut streams: RandomStreams<R>,
        bootstrap: Option<ThermalSnapshot>,
    ) -> Self {
        let name = name.into();
        let state = match &bootstrap {
            Some(snapshot) => ThermalState::restored(&params, snapshot),
            None => ThermalState::randomized(&params, &mut streams.model),
        };
        let controller = HysteresisCoolingController::new(&params);
        let synthesizer = ForwardProfileSynthesizer::new(&params, controller.envelope());
        info!(
            warehouse = %name,
            temp = state.temperature(),
            stock = state.stock(),
            restored = bootstrap.is_some(),
            "cold storage initialized"
        );
        Self {
            turnover: StockTurnoverModel::new(&params),
            ancillary: AncillaryLoadModel::new(&params),
            regulation: RegulationCapacityCalculator::new(&params),
            capability: RegulationCapability::from_params(&params),
            controller,
            synthesizer,
            state,
            streams,
            params,
            name,
            profiles: ProfileCache::new(),
            next_slot: Timeslot(0),
            last_capacity: RegulationCapacity::default(),
        }
    }

    /// Sets the first hour the model will simulate.
    pub fn starting_at(mut self, slot: Timeslot) -> Self {
        self.next_slot = slot;
        self
    }

    /// Simulates the hour `slot`.
    ///
    /// In order: apply regulation exercised against last hour's offer,
    /// blend in this hour's stock turnover, advance the non-cooling load,
    /// run the controller against the outside temperature, publish the
    /// remaining regulation headroom and report total consumption.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::WeatherUnavailable`] if `weather` has no report
    /// for `slot`; the model is left untouched in that case.
    pub fn step(
        &mut self,
        slot: Timeslot,
        weather: &impl WeatherSource,
        subscription: &mut impl Subscription,
    ) -> Result<StepResult, SimError> {
        let outside_temp = weather
            .outside_temperature(slot)
            .ok_or(SimError::WeatherUnavailable { timeslot: slot })?;

        // 1. Exercised regulation
        let exercised = subscription.exercised_regulation(slot);
        let regulation_shock = if exercised != 0.0 {
            let shock = self.regulation.temperature_shock(exercised, self.state.stock());
            self.state.shift_temperature(shock);
            info!(%slot, kwh = exercised, shock, temp = self.state.temperature(), "regulation applied");
            shock
        } else {
            0.0
        };

        // 2. Stock turnover
        let turnover = self.turnover.apply(&mut self.state, &mut self.streams.model);
        self.state.shift_temperature(turnover.delta_temp);
        info!(
            %slot,
            outgoing = turnover.outgoing,
            incoming = turnover.incoming,
            delta = turnover.delta_temp,
            "stock turnover"
        );

        // 3. Non-cooling load
        let ancillary_kwh = self.ancillary.update(&mut self.streams.model);

        // 4-5. Controller
        let energy = self.controller.compute(
            &self.state,
            self.params.nominal_temp(),
            outside_temp,
            ancillary_kwh,
        );
        self.state.shift_temperature(energy.delta_temp);

        // 6. Regulation headroom
        let capacity = self.regulation.capacity(&energy, self.state.temperature());
        subscription.publish_regulation_capacity(slot, capacity);
        self.last_capacity = capacity;
        info!(%slot, up = capacity.up_kwh, down = capacity.down_kwh, "regulation capacity published");

        // 7. Consumption
        let cooling_kwh = energy.energy / self.params.cop();
        let total_kwh = ancillary_kwh + cooling_kwh;
        let cost = subscription.report_consumption(slot, total_kwh);
        debug!(%slot, ancillary_kwh, cooling_kwh, total_kwh, temp = self.state.temperature(), "hour complete");

        self.next_slot = slot.next();
        Ok(StepResult {
            timeslot: slot,
            hour_of_day: slot.hour_of_day(),
            outside_temp,
            exercised_regulation_kwh: exercised,
            regulation_shock,
            outgoing_stock: turnover.outgoing,
            incoming_stock: turnover.incoming,
            turnover_delta: turnover.delta_temp,
            stock: self.state.stock(),
            ancillary_kwh,
            cooling_loss_kwh: energy.cooling_loss,
            cooling_energy_kwh: energy.energy,
            cooling_kwh,
            band: energy.band,
            temperature: self.state.temperature(),
            total_kwh,
            up_regulation_kwh: capacity.up_kwh,
            down_regulation_kwh: capacity.down_kwh,
            cost,
        })
    }

    /// Forward view of `tariff` starting at the next unsimulated hour.
    ///
    /// Built on first request and shared until invalidated.
    pub fn tariff_info(&mut self, tariff: &dyn Tariff) -> Arc<TariffInfo> {
        let start = self.next_slot;
        let synthesizer = &self.synthesizer;
        self.profiles
            .get_or_build(tariff.id(), || synthesizer.synthesize(tariff, start))
    }

    /// Drops the cached view of `tariff`; returns whether one existed.
    pub fn invalidate_profile(&mut self, tariff: &dyn Tariff) -> bool {
        self.profiles.invalidate(tariff.id())
    }

    pub fn clear_profiles(&mut self) {
        self.profiles.clear();
    }

    /// Current state, for persisting and restoring later.
    pub fn checkpoint(&self) -> ThermalSnapshot {
        self.state.snapshot()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &WarehouseParams {
        &self.params
    }

    pub fn state(&self) -> &ThermalState {
        &self.state
    }

    /// Next hour `step` is expected to simulate.
    pub fn next_slot(&self) -> Timeslot {
        self.next_slot
    }

    /// Capacity published by the most recent step.
    pub fn last_capacity(&self) -> RegulationCapacity {
        self.last_capacity
    }
}

impl<R: RandomSource> CustomerModelAccessor for ColdStorage<R> {
    fn capacity_profile(&mut self, tariff: &dyn Tariff) -> Vec<f64> {
        self.tariff_info(tariff).profile().to_vec()
    }

    fn regulation_capability(&self) -> RegulationCapability {
        self.capability
    }

    fn tariff_choice_sample(&mut self) -> f64 {
        self.streams.eval.next_uniform()
    }

    fn inertia_sample(&mut self) -> f64 {
        self.streams.eval.next_uniform()
    }

    fn evaluation_settings(&self) -> TariffEvaluationSettings {
        TariffEvaluationSettings::for_plant(self.params.max_cooling_energy())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::model::controller::BandPosition;
    use crate::model::random::ScriptedStream;
    use crate::sim::event::RegulationEvent;
    use crate::sim::subscription::SimulatedSubscription;
    use crate::sim::weather::{ConstantWeather, WeatherSeries};
    use crate::tariff::{RateTariff, TariffId};

    fn quiet_streams() -> RandomStreams<ScriptedStream> {
        RandomStreams::new(
            ScriptedStream::constant(0.5, 0.0),
            ScriptedStream::constant(0.25, 0.0),
        )
    }

    fn at_setpoint() -> ColdStorage<ScriptedStream> {
        ColdStorage::new(
            "test",
            WarehouseParams::default(),
            quiet_streams(),
            Some(ThermalSnapshot {
                temperature: -20.0,
                stock: None,
            }),
        )
    }

    fn flat_sub() -> SimulatedSubscription<RateTariff> {
        SimulatedSubscription::new(RateTariff::flat(TariffId(1), "flat", 0.1))
    }

    #[test]
    fn missing_weather_is_an_error_and_leaves_state_alone() {
        let mut w = at_setpoint();
        let before = w.checkpoint();
        let res = w.step(Timeslot(3), &WeatherSeries::new(), &mut flat_sub());
        assert!(matches!(
            res,
            Err(SimError::WeatherUnavailable { timeslot: Timeslot(3) })
        ));
        assert_eq!(w.checkpoint(), before);
        assert_eq!(w.next_slot(), Timeslot(0));
    }

    #[test]
    fn energy_is_ancillary_plus_cooling() {
        let mut w = at_setpoint();
        let mut sub = flat_sub();
        let r = w.step(Timeslot(0), &ConstantWeather(20.0), &mut sub).unwrap();
        assert!(r.ancillary_kwh >= 0.0 && r.cooling_kwh >= 0.0);
        assert_abs_diff_eq!(r.total_kwh, r.ancillary_kwh + r.cooling_kwh, epsilon = 1e-12);
        assert_abs_diff_eq!(r.cooling_kwh, r.cooling_energy_kwh / 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(sub.total_kwh(), r.total_kwh, epsilon = 1e-12);
        assert_abs_diff_eq!(r.cost, r.total_kwh * 0.1, epsilon = 1e-12);
        assert_eq!(w.next_slot(), Timeslot(1));
    }

    #[test]
    fn published_capacity_matches_step_record() {
        let mut w = at_setpoint();
        let mut sub = flat_sub();
        let r = w.step(Timeslot(0), &ConstantWeather(20.0), &mut sub).unwrap();
        let (slot, offered) = sub.offered().unwrap();
        assert_eq!(slot, Timeslot(0));
        assert_eq!(offered.up_kwh, r.up_regulation_kwh);
        assert_eq!(offered.down_kwh, r.down_regulation_kwh);
        assert_eq!(w.last_capacity(), offered);
    }

    #[test]
    fn exercised_up_regulation_warms_next_hour() {
        let event = RegulationEvent::new(1, 2, 1.0).unwrap();
        let mut sub = SimulatedSubscription::with_events(RateTariff::flat(TariffId(1), "flat", 0.1), vec![event]);
        let mut w = at_setpoint();
        let first = w.step(Timeslot(0), &ConstantWeather(20.0), &mut sub).unwrap();
        let second = w.step(Timeslot(1), &ConstantWeather(20.0), &mut sub).unwrap();
        assert_abs_diff_eq!(second.exercised_regulation_kwh, first.up_regulation_kwh, epsilon = 1e-12);
        assert!(second.regulation_shock > 0.0);
        assert_eq!(second.band, BandPosition::TooWarm);
    }

    #[test]
    fn profile_window_starts_at_next_hour_and_is_cached() {
        let mut w = at_setpoint();
        w.step(Timeslot(0), &ConstantWeather(20.0), &mut flat_sub()).unwrap();
        let tou = RateTariff::daily(TariffId(2), "tou", (0..24).map(|h| h as f64 / 100.0).collect());
        let a = w.tariff_info(&tou);
        assert_eq!(a.start(), Timeslot(1));
        w.step(Timeslot(1), &ConstantWeather(20.0), &mut flat_sub()).unwrap();
        let b = w.tariff_info(&tou);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(w.invalidate_profile(&tou));
        let c = w.tariff_info(&tou);
        assert_eq!(c.start(), Timeslot(2));
    }

    #[test]
    fn synthesis_does_not_touch_state_or_streams() {
        let mut a = at_setpoint();
        let mut b = at_setpoint();
        let tou = RateTariff::daily(TariffId(2), "tou", (0..24).map(|h| h as f64 / 100.0).collect());
        let _ = a.capacity_profile(&tou);
        let ra = a.step(Timeslot(0), &ConstantWeather(20.0), &mut flat_sub()).unwrap();
        let rb = b.step(Timeslot(0), &ConstantWeather(20.0), &mut flat_sub()).unwrap();
        assert_eq!(ra, rb);
    }

    #[test]
    fn evaluation_samples_use_eval_stream() {
        let mut w = at_setpoint();
        assert_eq!(w.tariff_choice_sample(), 0.25);
        assert_eq!(w.inertia_sample(), 0.25);
        assert_eq!(w.streams.model.uniform_draws(), 0);
        assert_eq!(w.broker_switch_factor(true), 0.0);
        assert_eq!(w.broker_switch_factor(false), 0.02);
        assert_eq!(w.shifting_inconvenience_factor(&RateTariff::flat(TariffId(1), "f", 0.1)), 0.0);
    }

    #[test]
    fn random_start_is_within_limits() {
        let w = ColdStorage::new(
            "fresh",
            WarehouseParams::default(),
            RandomStreams::for_instance(7, "fresh"),
            None,
        );
        let t = w.state().temperature();
        assert!((-35.0..=-10.0).contains(&t));
        assert_eq!(w.state().stock(), 500.0);
    }

    #[test]
    fn checkpoint_round_trips_through_bootstrap() {
        let mut w = at_setpoint();
        for h in 0..5 {
            w.step(Timeslot(h), &ConstantWeather(25.0), &mut flat_sub()).unwrap();
        }
        let snap = w.checkpoint();
        let restored = ColdStorage::new("again", WarehouseParams::default(), quiet_streams(), Some(snap));
        assert_eq!(restored.state(), w.state());
    }
}
