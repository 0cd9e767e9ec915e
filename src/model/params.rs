//! Physical constants and validated warehouse parameters.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Insulation conversion, kW per m²·K per unit of R-value.
pub const R_CONVERSION: f64 = 3.1545 / 1000.0;
/// Heat removal of one ton of refrigeration, kW.
pub const TON_CONVERSION: f64 = 3.504;
/// Specific heat of the stored medium (water ice), kWh per tonne·K.
pub const CP_ICE: f64 = 0.564;
/// Temperature under the floor slab, °C.
pub const GROUND_TEMP: f64 = 3.0;

/// Immutable physical parameters of one warehouse.
///
/// Fields are private; every change goes through a `set_*` method that
/// rejects physically impossible values and leaves the previous value in
/// place. [`WarehouseParams::apply`] applies a whole override set and logs
/// each rejection at warning level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseParams {
    min_temp: f64,
    max_temp: f64,
    nominal_temp: f64,
    shift_sag: f64,
    eval_env_temp: f64,

    roof_area: f64,
    roof_r_value: f64,
    wall_area: f64,
    wall_r_value: f64,
    floor_r_value: f64,
    infiltration_ratio: f64,

    cop: f64,
    stock_capacity: f64,
    turnover_ratio: f64,
    turnover_sd: f64,
    new_stock_temp: f64,
    non_cooling_usage: f64,
    nc_usage_variability: f64,
    nc_mean_reversion: f64,
    unit_size: f64,
    hysteresis: f64,

    profile_size: usize,
}

impl Default for WarehouseParams {
    fn default() -> Self {
        Self {
            min_temp: -35.0,
            max_temp: -10.0,
            nominal_temp: -20.0,
            shift_sag: 4.0,
            eval_env_temp: 20.0,
            roof_area: 900.0,
            roof_r_value: 40.0,
            wall_area: 1440.0,
            wall_r_value: 22.0,
            floor_r_value: 15.0,
            infiltration_ratio: 0.5,
            cop: 1.5,
            stock_capacity: 500.0,
            turnover_ratio: 0.1,
            turnover_sd: 0.015,
            new_stock_temp: -5.0,
            non_cooling_usage: 15.0,
            nc_usage_variability: 0.2,
            nc_mean_reversion: 0.06,
            unit_size: 40.0,
            hysteresis: 0.04,
            profile_size: 168,
        }
    }
}

/// Optional per-parameter overrides, as read from a scenario file.
///
/// Unset fields keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WarehouseOverrides {
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub nominal_temp: Option<f64>,
    pub shift_sag: Option<f64>,
    pub eval_env_temp: Option<f64>,
    pub roof_area: Option<f64>,
    pub roof_r_value: Option<f64>,
    pub wall_area: Option<f64>,
    pub wall_r_value: Option<f64>,
    pub floor_r_value: Option<f64>,
    pub infiltration_ratio: Option<f64>,
    pub cop: Option<f64>,
    pub stock_capacity: Option<f64>,
    pub turnover_ratio: Option<f64>,
    pub turnover_sd: Option<f64>,
    pub new_stock_temp: Option<f64>,
    pub non_cooling_usage: Option<f64>,
    pub nc_usage_variability: Option<f64>,
    pub nc_mean_reversion: Option<f64>,
    pub unit_size: Option<f64>,
    pub hysteresis: Option<f64>,
    pub profile_size: Option<usize>,
}

fn field(name: &str) -> String {
    format!("warehouse.{name}")
}

fn check_finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::new(field(name), "must be a finite number"))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    check_finite(name, value)?;
    if value < 0.0 {
        return Err(ConfigError::new(
            field(name),
            format!("{value} cannot be negative"),
        ));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    check_finite(name, value)?;
    if value <= 0.0 {
        return Err(ConfigError::new(field(name), format!("{value} must be > 0")));
    }
    Ok(())
}

fn check_unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    check_finite(name, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::new(
            field(name),
            format!("{value} out of range [0.0, 1.0]"),
        ));
    }
    Ok(())
}

macro_rules! validated_setter {
    ($(#[$doc:meta])* $setter:ident, $name:ident, $check:ident) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns a `ConfigError` and keeps the previous value if the new
        /// value is rejected.
        pub fn $setter(&mut self, value: f64) -> Result<(), ConfigError> {
            $check(stringify!($name), value)?;
            self.$name = value;
            Ok(())
        }
    };
}

impl WarehouseParams {
    /// Minimum allowable temperature (°C).
    pub fn min_temp(&self) -> f64 {
        self.min_temp
    }

    /// Maximum allowable temperature (°C).
    pub fn max_temp(&self) -> f64 {
        self.max_temp
    }

    /// Setpoint temperature (°C).
    pub fn nominal_temp(&self) -> f64 {
        self.nominal_temp
    }

    /// Temperature drift allowed for cost shifting (K).
    pub fn shift_sag(&self) -> f64 {
        self.shift_sag
    }

    /// Outside temperature assumed when evaluating tariffs (°C).
    pub fn eval_env_temp(&self) -> f64 {
        self.eval_env_temp
    }

    pub fn roof_area(&self) -> f64 {
        self.roof_area
    }

    pub fn roof_r_value(&self) -> f64 {
        self.roof_r_value
    }

    pub fn wall_area(&self) -> f64 {
        self.wall_area
    }

    pub fn wall_r_value(&self) -> f64 {
        self.wall_r_value
    }

    pub fn floor_r_value(&self) -> f64 {
        self.floor_r_value
    }

    /// Infiltration loss as a share of wall + roof loss.
    pub fn infiltration_ratio(&self) -> f64 {
        self.infiltration_ratio
    }

    /// Coefficient of performance of the refrigeration plant.
    pub fn cop(&self) -> f64 {
        self.cop
    }

    /// Typical inventory (tonnes).
    pub fn stock_capacity(&self) -> f64 {
        self.stock_capacity
    }

    /// Share of the stock replaced per day.
    pub fn turnover_ratio(&self) -> f64 {
        self.turnover_ratio
    }

    /// Standard deviation of the daily turnover share.
    pub fn turnover_sd(&self) -> f64 {
        self.turnover_sd
    }

    /// Temperature of incoming stock (°C).
    pub fn new_stock_temp(&self) -> f64 {
        self.new_stock_temp
    }

    /// Mean non-cooling load (kW).
    pub fn non_cooling_usage(&self) -> f64 {
        self.non_cooling_usage
    }

    pub fn nc_usage_variability(&self) -> f64 {
        self.nc_usage_variability
    }

    pub fn nc_mean_reversion(&self) -> f64 {
        self.nc_mean_reversion
    }

    /// Plant size in tons of refrigeration.
    pub fn unit_size(&self) -> f64 {
        self.unit_size
    }

    /// Width of the dead band around the setpoint (K).
    pub fn hysteresis(&self) -> f64 {
        self.hysteresis
    }

    /// Length of a synthesized forward profile (hours).
    pub fn profile_size(&self) -> usize {
        self.profile_size
    }

    /// Most heat the plant can remove in one hour (kWh thermal).
    pub fn max_cooling_energy(&self) -> f64 {
        self.unit_size * TON_CONVERSION
    }

    validated_setter!(
        /// Sets the temperature drift allowed for cost shifting.
        set_shift_sag, shift_sag, check_non_negative
    );
    validated_setter!(
        /// Sets the outside temperature assumed for tariff evaluation.
        set_eval_env_temp, eval_env_temp, check_finite
    );
    validated_setter!(set_roof_area, roof_area, check_non_negative);
    validated_setter!(set_roof_r_value, roof_r_value, check_positive);
    validated_setter!(set_wall_area, wall_area, check_non_negative);
    validated_setter!(set_wall_r_value, wall_r_value, check_positive);
    validated_setter!(set_floor_r_value, floor_r_value, check_positive);
    validated_setter!(set_infiltration_ratio, infiltration_ratio, check_non_negative);
    validated_setter!(set_cop, cop, check_positive);
    validated_setter!(set_stock_capacity, stock_capacity, check_non_negative);
    validated_setter!(set_turnover_ratio, turnover_ratio, check_unit_interval);
    validated_setter!(set_turnover_sd, turnover_sd, check_non_negative);
    validated_setter!(set_new_stock_temp, new_stock_temp, check_finite);
    validated_setter!(set_non_cooling_usage, non_cooling_usage, check_non_negative);
    validated_setter!(set_nc_usage_variability, nc_usage_variability, check_non_negative);
    validated_setter!(set_nc_mean_reversion, nc_mean_reversion, check_unit_interval);
    validated_setter!(set_unit_size, unit_size, check_non_negative);
    validated_setter!(set_hysteresis, hysteresis, check_non_negative);

    /// Sets the temperature limits and setpoint together.
    ///
    /// # Errors
    ///
    /// Rejects the whole triple unless `min <= nominal <= max` and all are finite.
    pub fn set_temperatures(&mut self, min: f64, nominal: f64, max: f64) -> Result<(), ConfigError> {
        check_finite("min_temp", min)?;
        check_finite("nominal_temp", nominal)?;
        check_finite("max_temp", max)?;
        if min > nominal || nominal > max {
            return Err(ConfigError::new(
                field("nominal_temp"),
                format!("requires min_temp <= nominal_temp <= max_temp, got {min} / {nominal} / {max}"),
            ));
        }
        self.min_temp = min;
        self.nominal_temp = nominal;
        self.max_temp = max;
        Ok(())
    }

    /// Sets the forward-profile window length.
    ///
    /// # Errors
    ///
    /// Rejects a zero-length window.
    pub fn set_profile_size(&mut self, hours: usize) -> Result<(), ConfigError> {
        if hours == 0 {
            return Err(ConfigError::new(field("profile_size"), "must be > 0"));
        }
        self.profile_size = hours;
        Ok(())
    }

    /// Applies every set override, keeping the previous value for each one
    /// that is rejected.
    ///
    /// Rejections are logged at warning level and returned so callers can
    /// report them; they never abort configuration.
    pub fn apply(&mut self, o: &WarehouseOverrides) -> Vec<ConfigError> {
        let mut rejected = Vec::new();
        let mut record = |res: Result<(), ConfigError>| {
            if let Err(e) = res {
                warn!(field = %e.field, reason = %e.message, "rejected warehouse setting");
                rejected.push(e);
            }
        };

        if o.min_temp.is_some() || o.nominal_temp.is_some() || o.max_temp.is_some() {
            record(self.set_temperatures(
                o.min_temp.unwrap_or(self.min_temp),
                o.nominal_temp.unwrap_or(self.nominal_temp),
                o.max_temp.unwrap_or(self.max_temp),
            ));
        }

        let scalars: [(Option<f64>, fn(&mut Self, f64) -> Result<(), ConfigError>); 18] = [
            (o.shift_sag, Self::set_shift_sag),
            (o.eval_env_temp, Self::set_eval_env_temp),
            (o.roof_area, Self::set_roof_area),
            (o.roof_r_value, Self::set_roof_r_value),
            (o.wall_area, Self::set_wall_area),
            (o.wall_r_value, Self::set_wall_r_value),
            (o.floor_r_value, Self::set_floor_r_value),
            (o.infiltration_ratio, Self::set_infiltration_ratio),
            (o.cop, Self::set_cop),
            (o.stock_capacity, Self::set_stock_capacity),
            (o.turnover_ratio, Self::set_turnover_ratio),
            (o.turnover_sd, Self::set_turnover_sd),
            (o.new_stock_temp, Self::set_new_stock_temp),
            (o.non_cooling_usage, Self::set_non_cooling_usage),
            (o.nc_usage_variability, Self::set_nc_usage_variability),
            (o.nc_mean_reversion, Self::set_nc_mean_reversion),
            (o.unit_size, Self::set_unit_size),
            (o.hysteresis, Self::set_hysteresis),
        ];
        for (value, setter) in scalars {
            if let Some(v) = value {
                record(setter(self, v));
            }
        }

        if let Some(hours) = o.profile_size {
            record(self.set_profile_size(hours));
        }

        rejected
    }

    /// Defaults with `overrides` applied; returns the rejected settings too.
    pub fn from_overrides(overrides: &WarehouseOverrides) -> (Self, Vec<ConfigError>) {
        let mut params = Self::default();
        let rejected = params.apply(overrides);
        (params, rejected)
    }
}
