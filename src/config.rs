//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::params::{WarehouseOverrides, WarehouseParams};
use crate::model::state::ThermalSnapshot;
use crate::sim::clock::Timeslot;
use crate::sim::event::RegulationEvent;
use crate::sim::types::SimConfig;
use crate::sim::weather::{DiurnalWeather, WeatherSeries};
use crate::tariff::{RateSchedule, RateTariff, Tariff, TariffId};

/// Top-level scenario configuration parsed from TOML.
///
/// All tables are optional and default to the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Per-parameter overrides of the reference warehouse.
    #[serde(default)]
    pub warehouse: WarehouseOverrides,
    /// State to resume from; omitted for a random start.
    #[serde(default)]
    pub initial_state: Option<ThermalSnapshot>,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default = "default_tariffs")]
    pub tariffs: Vec<RateTariff>,
    #[serde(default)]
    pub regulation_events: Vec<RegulationEvent>,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of days to simulate (must be > 0).
    pub days: usize,
    /// Master random seed.
    pub seed: u64,
    /// Warehouse instance name; also feeds the random stream seeds.
    pub name: String,
    /// First simulated hour (0 = Monday 00:00).
    pub start_timeslot: usize,
    /// Tariff the warehouse is billed under; the first tariff when unset.
    pub subscribed_tariff: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 7,
            seed: 42,
            name: "coldstore-1".to_string(),
            start_timeslot: 0,
            subscribed_tariff: None,
        }
    }
}

impl SimulationConfig {
    pub fn sim_config(&self) -> SimConfig {
        SimConfig::new(self.days, self.seed, Timeslot(self.start_timeslot))
    }
}

/// Outside-temperature model for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum WeatherConfig {
    Constant {
        temp_c: f64,
    },
    Diurnal {
        mean_c: f64,
        amplitude_c: f64,
        #[serde(default = "default_peak_hour")]
        peak_hour: f64,
        #[serde(default)]
        noise_sd_c: f64,
        /// Noise seed; derived from the master seed when unset.
        #[serde(default)]
        seed: Option<u64>,
    },
}

fn default_peak_hour() -> f64 {
    15.0
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self::Constant { temp_c: 20.0 }
    }
}

impl WeatherConfig {
    /// Hourly reports covering `hours` from `start`.
    pub fn series(&self, start: Timeslot, hours: usize, master_seed: u64) -> WeatherSeries {
        match *self {
            Self::Constant { temp_c } => {
                WeatherSeries::from_hourly(start, std::iter::repeat_n(temp_c, hours))
            }
            Self::Diurnal {
                mean_c,
                amplitude_c,
                peak_hour,
                noise_sd_c,
                seed,
            } => DiurnalWeather {
                mean_c,
                amplitude_c,
                peak_hour,
                noise_sd_c,
                seed: seed.unwrap_or(master_seed.wrapping_add(1)),
            }
            .series(start, hours),
        }
    }
}

fn default_tariffs() -> Vec<RateTariff> {
    vec![
        RateTariff::flat(TariffId(1), "flat", 0.12),
        RateTariff::daily(TariffId(2), "day-night", day_night_rates(0.16, 0.08)),
    ]
}

/// 24 rates: `day` from 07:00 to 23:00, `night` otherwise.
fn day_night_rates(day: f64, night: f64) -> Vec<f64> {
    (0..24)
        .map(|h| if (7..23).contains(&h) { day } else { night })
        .collect()
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

impl ScenarioConfig {
    /// Reference warehouse at 20 °C on a flat tariff for one week.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            warehouse: WarehouseOverrides::default(),
            initial_state: None,
            weather: WeatherConfig::default(),
            tariffs: default_tariffs(),
            regulation_events: Vec::new(),
        }
    }

    /// Hot week with a strong daily swing, starting at the setpoint.
    pub fn heatwave() -> Self {
        Self {
            initial_state: Some(ThermalSnapshot {
                temperature: -20.0,
                stock: None,
            }),
            weather: WeatherConfig::Diurnal {
                mean_c: 32.0,
                amplitude_c: 8.0,
                peak_hour: 15.0,
                noise_sd_c: 1.0,
                seed: None,
            },
            ..Self::baseline()
        }
    }

    /// Time-of-use billing with evening up-regulation calls.
    pub fn tou_shift() -> Self {
        let events = (0..7)
            .map(|day| RegulationEvent {
                start_slot: day * 24 + 17,
                end_slot: day * 24 + 20,
                fraction: 0.5,
            })
            .collect();
        Self {
            simulation: SimulationConfig {
                subscribed_tariff: Some(3),
                ..SimulationConfig::default()
            },
            warehouse: WarehouseOverrides {
                hysteresis: Some(1.0),
                ..WarehouseOverrides::default()
            },
            tariffs: vec![
                RateTariff::flat(TariffId(1), "flat", 0.12),
                RateTariff::daily(TariffId(3), "peak-evening", {
                    let mut rates = day_night_rates(0.14, 0.07);
                    rates[17..21].fill(0.30);
                    rates
                }),
            ],
            regulation_events: events,
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "heatwave", "tou_shift"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "heatwave" => Ok(Self::heatwave()),
            "tou_shift" => Ok(Self::tou_shift()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Warehouse parameters with the scenario's overrides applied.
    ///
    /// Rejected overrides keep the reference value and are returned
    /// alongside; they are warnings, not failures.
    pub fn warehouse_params(&self) -> (WarehouseParams, Vec<ConfigError>) {
        WarehouseParams::from_overrides(&self.warehouse)
    }

    /// Tariff the warehouse is billed under.
    pub fn subscribed_tariff(&self) -> Option<&RateTariff> {
        match self.simulation.subscribed_tariff {
            Some(id) => self.tariffs.iter().find(|t| t.id() == TariffId(id)),
            None => self.tariffs.first(),
        }
    }

    /// Validates scenario-level fields and returns a list of errors.
    ///
    /// Returns an empty vector if the scenario can run. Warehouse overrides
    /// are not checked here; see [`ScenarioConfig::warehouse_params`].
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.days == 0 {
            errors.push(ConfigError::new("simulation.days", "must be > 0"));
        }
        if s.name.trim().is_empty() {
            errors.push(ConfigError::new("simulation.name", "must not be empty"));
        }

        if let Some(init) = &self.initial_state {
            if !init.temperature.is_finite() {
                errors.push(ConfigError::new("initial_state.temperature", "must be a finite number"));
            }
            if init.stock.is_some_and(|st| !st.is_finite() || st < 0.0) {
                errors.push(ConfigError::new("initial_state.stock", "must be a finite number >= 0"));
            }
        }

        match &self.weather {
            WeatherConfig::Constant { temp_c } => {
                if !temp_c.is_finite() {
                    errors.push(ConfigError::new("weather.temp_c", "must be a finite number"));
                }
            }
            WeatherConfig::Diurnal {
                mean_c,
                amplitude_c,
                peak_hour,
                noise_sd_c,
                ..
            } => {
                if !mean_c.is_finite() || !amplitude_c.is_finite() {
                    errors.push(ConfigError::new("weather.mean_c", "mean and amplitude must be finite"));
                }
                if !(0.0..24.0).contains(peak_hour) {
                    errors.push(ConfigError::new("weather.peak_hour", "must be in [0, 24)"));
                }
                if !noise_sd_c.is_finite() || *noise_sd_c < 0.0 {
                    errors.push(ConfigError::new("weather.noise_sd_c", "must be a finite number >= 0"));
                }
            }
        }

        if self.tariffs.is_empty() {
            errors.push(ConfigError::new("tariffs", "at least one tariff is required"));
        }
        let mut seen = HashSet::new();
        for (i, t) in self.tariffs.iter().enumerate() {
            let field = format!("tariffs[{i}]");
            if !seen.insert(t.id) {
                errors.push(ConfigError::new(&field, format!("duplicate tariff id {}", t.id)));
            }
            if t.schedule.len() != t.schedule.expected_len() {
                errors.push(ConfigError::new(
                    format!("{field}.schedule"),
                    format!(
                        "expected {} rates, got {}",
                        t.schedule.expected_len(),
                        t.schedule.len()
                    ),
                ));
            }
            let rates_finite = match &t.schedule {
                RateSchedule::Flat { rate } => rate.is_finite(),
                RateSchedule::Daily { rates } | RateSchedule::Weekly { rates } => {
                    rates.iter().all(|r| r.is_finite())
                }
            };
            if !rates_finite {
                errors.push(ConfigError::new(format!("{field}.schedule"), "rates must be finite"));
            }
            if let Some(tier) = t.tier
                && (!tier.threshold_kwh.is_finite() || tier.threshold_kwh < 0.0 || !tier.rate.is_finite())
            {
                errors.push(ConfigError::new(
                    format!("{field}.tier"),
                    "threshold_kwh must be >= 0 and rate finite",
                ));
            }
        }
        if let Some(id) = s.subscribed_tariff
            && !self.tariffs.iter().any(|t| t.id == TariffId(id))
        {
            errors.push(ConfigError::new(
                "simulation.subscribed_tariff",
                format!("no tariff with id {id}"),
            ));
        }

        for (i, event) in self.regulation_events.iter().enumerate() {
            if let Err(e) = event.check(&format!("regulation_events[{i}]")) {
                errors.push(e);
            }
        }

        errors
    }
}
