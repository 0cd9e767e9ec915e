//! Surface an external tariff evaluator uses to compare offers.

use serde::Serialize;

use super::Tariff;
use crate::model::regulation::RegulationCapability;

/// How strongly the customer weighs non-price features of a tariff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InconvenienceFactors {
    pub time_of_use: f64,
    pub tiered_rate: f64,
    pub variable_pricing: f64,
    pub interruptibility: f64,
}

/// Regulation the evaluator should assume the customer will deliver (kWh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpectedRegulation {
    pub curtailment: f64,
    pub discharge: f64,
    pub down_regulation: f64,
}

/// Parameters handed to the evaluator along with the usage profiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TariffEvaluationSettings {
    /// Reluctance to switch tariffs, in [0, 1].
    pub inertia: f64,
    pub preferred_contract_days: u32,
    pub inconvenience: InconvenienceFactors,
    pub regulation: ExpectedRegulation,
}

impl TariffEvaluationSettings {
    /// Settings for a warehouse whose plant removes at most
    /// `max_cooling_energy` kWh per hour.
    pub fn for_plant(max_cooling_energy: f64) -> Self {
        Self {
            inertia: 0.7,
            preferred_contract_days: 14,
            inconvenience: InconvenienceFactors {
                time_of_use: 0.0,
                tiered_rate: 0.01,
                variable_pricing: 0.0,
                interruptibility: 0.0,
            },
            regulation: ExpectedRegulation {
                curtailment: -0.05 * max_cooling_energy,
                discharge: 0.0,
                down_regulation: 0.04 * max_cooling_energy,
            },
        }
    }
}

/// What a customer model exposes to tariff evaluation.
///
/// Sampling methods draw from the evaluation stream only, so evaluating
/// offers never perturbs the simulated trajectory.
pub trait CustomerModelAccessor {
    /// Forward hourly usage under `tariff` (kWh), starting next hour.
    fn capacity_profile(&mut self, tariff: &dyn Tariff) -> Vec<f64>;

    /// Capability declared when registering with the market.
    fn regulation_capability(&self) -> RegulationCapability;

    /// Extra reluctance to switch brokers; none when a tariff is being
    /// superseded by its own broker.
    fn broker_switch_factor(&self, is_superseding: bool) -> f64 {
        if is_superseding { 0.0 } else { 0.02 }
    }

    fn tariff_choice_sample(&mut self) -> f64;

    fn inertia_sample(&mut self) -> f64;

    /// Cost of the load shifting a tariff would induce; zero for a
    /// warehouse, whose goods do not notice.
    fn shifting_inconvenience_factor(&self, _tariff: &dyn Tariff) -> f64 {
        0.0
    }

    fn evaluation_settings(&self) -> TariffEvaluationSettings;
}
