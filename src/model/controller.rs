//! Proportional-band refrigeration control with a dead zone.

use serde::Serialize;
use tracing::debug;

use super::params::{GROUND_TEMP, R_CONVERSION, WarehouseParams};
use super::state::ThermalState;

/// Heat-loss rates of the building shell, computed once from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalEnvelope {
    /// Walls + roof + infiltration (kW per K of outside-inside difference).
    pub loss_per_k: f64,
    /// Floor slab to ground (kW per K of ground-inside difference).
    pub floor_loss_per_k: f64,
}

impl ThermalEnvelope {
    pub fn new(params: &WarehouseParams) -> Self {
        let roof = R_CONVERSION / params.roof_r_value() * params.roof_area();
        let wall = R_CONVERSION / params.wall_r_value() * params.wall_area();
        let infiltration = params.infiltration_ratio() * (roof + wall);
        debug!(roof, wall, infiltration, "heat loss per K");
        Self {
            loss_per_k: roof + wall + infiltration,
            // floor area equals roof area
            floor_loss_per_k: R_CONVERSION / params.floor_r_value() * params.roof_area(),
        }
    }

    /// Heat conducted into the space this hour (kWh), excluding internal gains.
    pub fn conducted_heat(&self, inside_temp: f64, outside_temp: f64) -> f64 {
        self.loss_per_k * (outside_temp - inside_temp)
            + self.floor_loss_per_k * (GROUND_TEMP - inside_temp)
    }
}

/// Where the temperature sits relative to the dead band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPosition {
    /// Below `nominal - hysteresis / 2`: ease off and let it warm.
    TooCold,
    /// Inside the band: hold steady.
    InBand,
    /// Above `nominal + hysteresis / 2`: cool harder.
    TooWarm,
}

/// Outcome of one controller evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyInfo {
    /// Heat removed by the plant this hour (kWh thermal, >= 0).
    pub energy: f64,
    /// Resulting change of the internal temperature (K).
    pub delta_temp: f64,
    /// Heat that must be removed just to hold the temperature (kWh).
    pub cooling_loss: f64,
    /// Cooling above (+) or below (-) the hold-steady level (kWh).
    pub adjustment: f64,
    pub band: BandPosition,
}

/// Decides how much refrigeration to apply each hour.
///
/// Returns a continuous energy quantity rather than simulating unit on/off
/// cycling. Outside the dead band the controller aims straight for the
/// setpoint, limited by plant capacity when too warm and by the rate at
/// which switching cooling off entirely would let it warm when too cold.
#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisCoolingController {
    envelope: ThermalEnvelope,
    hysteresis: f64,
    max_cooling_energy: f64,
}

impl HysteresisCoolingController {
    pub fn new(params: &WarehouseParams) -> Self {
        Self {
            envelope: ThermalEnvelope::new(params),
            hysteresis: params.hysteresis(),
            max_cooling_energy: params.max_cooling_energy(),
        }
    }

    pub fn envelope(&self) -> &ThermalEnvelope {
        &self.envelope
    }

    /// Most heat the plant can remove in one hour (kWh thermal).
    pub fn max_cooling_energy(&self) -> f64 {
        self.max_cooling_energy
    }

    /// Classifies `temp` against the band centred on `target`.
    pub fn band_position(&self, temp: f64, target: f64) -> BandPosition {
        let half = self.hysteresis / 2.0;
        if temp < target - half {
            BandPosition::TooCold
        } else if temp > target + half {
            BandPosition::TooWarm
        } else {
            BandPosition::InBand
        }
    }

    /// Energy needed to hold `inside_temp` steady for one hour (kWh).
    ///
    /// Conduction through the shell and floor plus the non-cooling load,
    /// which ends up as heat inside the space.
    pub fn cooling_loss(&self, inside_temp: f64, outside_temp: f64, ancillary_kwh: f64) -> f64 {
        self.envelope.conducted_heat(inside_temp, outside_temp) + ancillary_kwh
    }

    /// Evaluates the controller for one hour without changing `state`.
    pub fn compute(
        &self,
        state: &ThermalState,
        target: f64,
        outside_temp: f64,
        ancillary_kwh: f64,
    ) -> EnergyInfo {
        let temp = state.temperature();
        let mass = state.thermal_mass();
        let cooling_loss = self.cooling_loss(temp, outside_temp, ancillary_kwh);
        let band = self.band_position(temp, target);

        let adjustment = if mass <= 0.0 {
            0.0
        } else {
            match band {
                BandPosition::TooCold => {
                    let needed_warming = mass * (target - temp);
                    -cooling_loss.min(needed_warming)
                }
                BandPosition::TooWarm => {
                    let needed_cooling = mass * (temp - target);
                    needed_cooling.min(self.max_cooling_energy - cooling_loss)
                }
                BandPosition::InBand => 0.0,
            }
        };

        // the plant cannot add heat
        let energy = (cooling_loss + adjustment).max(0.0);
        let delta_temp = if mass > 0.0 {
            (cooling_loss - energy) / mass
        } else {
            0.0
        };

        debug!(
            temp,
            cooling_loss,
            adjustment,
            energy,
            delta_temp,
            ?band,
            "cooling energy"
        );
        EnergyInfo {
            energy,
            delta_temp,
            cooling_loss,
            adjustment,
            band,
        }
    }
}
