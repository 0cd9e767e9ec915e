//! Regulation headroom offered to the balancing market.

use serde::Serialize;

use super::controller::EnergyInfo;
use super::params::{CP_ICE, WarehouseParams};

/// Regulation the warehouse can offer for the hour just simulated.
///
/// Sign convention: `up_kwh >= 0` is consumption the market may remove,
/// `down_kwh <= 0` is consumption it may add. A snapshot, not a commitment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RegulationCapacity {
    pub up_kwh: f64,
    pub down_kwh: f64,
}

/// Static regulation capability declared when the customer registers.
///
/// Uses the market's registration convention: capability that reduces
/// consumption is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegulationCapability {
    pub controllable_kw: f64,
    pub up_regulation_kw: f64,
    pub down_regulation_kw: f64,
    pub storage_capacity_kwh: f64,
}

impl RegulationCapability {
    /// Derives the capability from configuration.
    ///
    /// Power figures are the unit rating in tons divided by the COP, as
    /// registered with the market, not the plant's heat-removal rate.
    pub fn from_params(params: &WarehouseParams) -> Self {
        let rated_kw = params.unit_size() / params.cop();
        Self {
            controllable_kw: -rated_kw,
            up_regulation_kw: -rated_kw,
            down_regulation_kw: rated_kw,
            storage_capacity_kwh: params.stock_capacity()
                * CP_ICE
                * (params.max_temp() - params.min_temp()),
        }
    }
}

/// Turns controller slack into regulation bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RegulationCapacityCalculator {
    cop: f64,
    max_cooling_energy: f64,
    min_temp: f64,
    max_temp: f64,
}

impl RegulationCapacityCalculator {
    pub fn new(params: &WarehouseParams) -> Self {
        Self {
            cop: params.cop(),
            max_cooling_energy: params.max_cooling_energy(),
            min_temp: params.min_temp(),
            max_temp: params.max_temp(),
        }
    }

    /// Capacity after the controller has run, at end-of-step `temperature`.
    ///
    /// Only cooling is regulable. Up-regulation is withdrawn once the space
    /// is at or above the maximum temperature, down-regulation once it is at
    /// or below the minimum.
    pub fn capacity(&self, info: &EnergyInfo, temperature: f64) -> RegulationCapacity {
        let up_kwh = if temperature >= self.max_temp {
            0.0
        } else {
            info.energy / self.cop
        };
        let down_kwh = if temperature <= self.min_temp {
            0.0
        } else {
            -(self.max_cooling_energy - info.energy) / self.cop
        };
        RegulationCapacity { up_kwh, down_kwh }
    }

    /// Temperature shock caused by `regulation_kwh` of exercised regulation
    /// on a mass of `stock` tonnes. Positive (up) regulation warms the space.
    pub fn temperature_shock(&self, regulation_kwh: f64, stock: f64) -> f64 {
        let mass = stock * CP_ICE;
        if mass <= 0.0 {
            return 0.0;
        }
        regulation_kwh * self.cop / mass
    }
}
