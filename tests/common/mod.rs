//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use coldstore_sim::model::params::{WarehouseOverrides, WarehouseParams};
use coldstore_sim::model::random::{RandomSource, RandomStreams, SeededStream};
use coldstore_sim::model::state::ThermalSnapshot;
use coldstore_sim::sim::clock::{Clock, Timeslot};
use coldstore_sim::sim::engine::ColdStorage;
use coldstore_sim::sim::subscription::{SimulatedSubscription, Subscription};
use coldstore_sim::sim::types::StepResult;
use coldstore_sim::sim::weather::WeatherSource;
use coldstore_sim::tariff::{RateTariff, TariffId};

/// Random source that always returns the same draws.
///
/// A uniform of 0.5 and a Gaussian of 0.0 put every stochastic sub-model on
/// its mean.
#[derive(Debug, Clone, Copy)]
pub struct FixedDraws {
    pub uniform: f64,
    pub gaussian: f64,
}

impl RandomSource for FixedDraws {
    fn next_uniform(&mut self) -> f64 {
        self.uniform
    }

    fn next_gaussian(&mut self) -> f64 {
        self.gaussian
    }
}

pub fn mean_streams() -> RandomStreams<FixedDraws> {
    let draws = FixedDraws {
        uniform: 0.5,
        gaussian: 0.0,
    };
    RandomStreams::new(draws, draws)
}

/// Reference warehouse with `overrides` applied; panics on a rejected value.
pub fn params_with(overrides: WarehouseOverrides) -> WarehouseParams {
    let (params, rejected) = WarehouseParams::from_overrides(&overrides);
    assert!(rejected.is_empty(), "fixture overrides rejected: {rejected:?}");
    params
}

pub fn snapshot_at(temperature: f64) -> Option<ThermalSnapshot> {
    Some(ThermalSnapshot {
        temperature,
        stock: None,
    })
}

/// Warehouse starting at `temperature` with seeded streams.
pub fn seeded_warehouse(params: WarehouseParams, temperature: f64, seed: u64) -> ColdStorage<SeededStream> {
    ColdStorage::new(
        "it",
        params,
        RandomStreams::for_instance(seed, "it"),
        snapshot_at(temperature),
    )
}

/// Warehouse starting at `temperature` with every draw at its mean.
pub fn mean_warehouse(params: WarehouseParams, temperature: f64) -> ColdStorage<FixedDraws> {
    ColdStorage::new("it", params, mean_streams(), snapshot_at(temperature))
}

pub fn flat_subscription() -> SimulatedSubscription<RateTariff> {
    SimulatedSubscription::new(RateTariff::flat(TariffId(1), "flat", 0.12))
}

/// Steps `model` through `hours` consecutive slots from `start`.
pub fn run_hours<R: RandomSource>(
    model: &mut ColdStorage<R>,
    weather: &impl WeatherSource,
    subscription: &mut impl Subscription,
    start: Timeslot,
    hours: usize,
) -> Vec<StepResult> {
    let mut results = Vec::with_capacity(hours);
    Clock::new(start, hours).run(|slot| {
        let step = model.step(slot, weather, &mut *subscription);
        assert!(step.is_ok(), "step {slot} failed: {:?}", step.as_ref().err());
        if let Ok(r) = step {
            results.push(r);
        }
    });
    results
}

/// Half-day rate split: `first` for hours 0-11, `second` for 12-23.
pub fn half_day_rates(first: f64, second: f64) -> Vec<f64> {
    (0..24).map(|h| if h < 12 { first } else { second }).collect()
}
