use serde::{Deserialize, Serialize};

use super::params::WarehouseParams;
use super::random::RandomSource;

/// Bootstrap state of a warehouse: the values last checkpointed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThermalSnapshot {
    /// Internal temperature (°C).
    pub temperature: f64,
    /// Stored mass (tonnes); `None` restores the configured capacity.
    pub stock: Option<f64>,
}

/// Mutable physical state of the warehouse.
///
/// Only the model that owns it can build one, from a fresh draw or a
/// snapshot. The temperature is *not* clamped to the allowable range; the
/// controller is responsible for steering it back.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalState {
    temperature: f64,
    stock: f64,
}

impl ThermalState {
    /// Fresh state: temperature uniform in `[min_temp, max_temp]`, full stock.
    pub(crate) fn randomized(params: &WarehouseParams, rng: &mut impl RandomSource) -> Self {
        let span = params.max_temp() - params.min_temp();
        Self {
            temperature: params.min_temp() + span * rng.next_uniform(),
            stock: params.stock_capacity(),
        }
    }

    /// State restored verbatim from a checkpoint.
    pub(crate) fn restored(params: &WarehouseParams, snapshot: &ThermalSnapshot) -> Self {
        Self {
            temperature: snapshot.temperature,
            stock: snapshot.stock.unwrap_or(params.stock_capacity()).max(0.0),
        }
    }

    /// Current internal temperature (°C).
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Current stored mass (tonnes).
    pub fn stock(&self) -> f64 {
        self.stock
    }

    /// Heat capacity of the stored mass (kWh/K).
    pub fn thermal_mass(&self) -> f64 {
        self.stock * super::params::CP_ICE
    }

    pub(crate) fn shift_temperature(&mut self, delta: f64) {
        self.temperature += delta;
    }

    pub(crate) fn set_stock(&mut self, stock: f64) {
        self.stock = stock.max(0.0);
    }

    /// Values to persist for a later restore.
    pub fn snapshot(&self) -> ThermalSnapshot {
        ThermalSnapshot {
            temperature: self.temperature,
            stock: Some(self.stock),
        }
    }

    /// Test-only constructor at an exact temperature and stock.
    #[cfg(test)]
    pub(crate) fn at(temperature: f64, stock: f64) -> Self {
        Self { temperature, stock }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::random::ScriptedStream;

    #[test]
    fn randomized_temperature_spans_limits() {
        let p = WarehouseParams::default();
        let low = ThermalState::randomized(&p, &mut ScriptedStream::constant(0.0, 0.0));
        assert_eq!(low.temperature(), p.min_temp());
        let mid = ThermalState::randomized(&p, &mut ScriptedStream::constant(0.5, 0.0));
        assert_eq!(mid.temperature(), -22.5);
        assert_eq!(mid.stock(), p.stock_capacity());
    }

    #[test]
    fn restored_uses_snapshot_verbatim() {
        let p = WarehouseParams::default();
        let s = ThermalState::restored(
            &p,
            &ThermalSnapshot {
                temperature: -8.25,
                stock: Some(420.0),
            },
        );
        assert_eq!(s.temperature(), -8.25);
        assert_eq!(s.stock(), 420.0);
        assert_eq!(s.snapshot().stock, Some(420.0));
    }

    #[test]
    fn restored_without_stock_defaults_to_capacity() {
        let p = WarehouseParams::default();
        let s = ThermalState::restored(
            &p,
            &ThermalSnapshot {
                temperature: -20.0,
                stock: None,
            },
        );
        assert_eq!(s.stock(), 500.0);
    }

    #[test]
    fn stock_never_goes_negative() {
        let mut s = ThermalState::at(-20.0, 10.0);
        s.set_stock(-3.0);
        assert_eq!(s.stock(), 0.0);
    }
}
