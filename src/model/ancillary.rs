use tracing::debug;

use super::params::WarehouseParams;
use super::random::RandomSource;

/// Non-cooling electrical load (lighting, doors, forklifts) as a
/// mean-reverting random walk around a nominal level.
///
/// Each hour the usage moves by a uniform shock of at most
/// `nominal * variability` and is pulled back toward `nominal` by
/// `mean_reversion`. Usage never goes negative.
///
/// # Examples
///
/// ```
/// use coldstore_sim::model::ancillary::AncillaryLoadModel;
/// use coldstore_sim::model::random::SeededStream;
///
/// let mut load = AncillaryLoadModel::with_parameters(15.0, 0.2, 0.06);
/// let mut rng = SeededStream::new(42);
/// let kwh = load.update(&mut rng);
/// assert!(kwh >= 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AncillaryLoadModel {
    /// Long-run mean usage (kWh per hour)
    nominal: f64,
    /// Shock amplitude as a share of `nominal`
    variability: f64,
    /// Share of the gap to `nominal` closed each hour
    mean_reversion: f64,
    /// Usage in the current hour
    current: f64,
}

impl AncillaryLoadModel {
    pub fn new(params: &WarehouseParams) -> Self {
        Self::with_parameters(
            params.non_cooling_usage(),
            params.nc_usage_variability(),
            params.nc_mean_reversion(),
        )
    }

    /// Starts the walk at `nominal`.
    pub fn with_parameters(nominal: f64, variability: f64, mean_reversion: f64) -> Self {
        Self {
            nominal: nominal.max(0.0),
            variability: variability.max(0.0),
            mean_reversion: mean_reversion.clamp(0.0, 1.0),
            current: nominal.max(0.0),
        }
    }

    /// Usage in the current hour (kWh).
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Long-run mean usage (kWh per hour).
    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    /// Advances the walk by one hour and returns the new usage.
    ///
    /// With zero variability the load is a constant and no random draw is
    /// consumed.
    pub fn update(&mut self, rng: &mut impl RandomSource) -> f64 {
        if self.variability == 0.0 {
            return self.current;
        }
        let shock = self.nominal * self.variability * (2.0 * rng.next_uniform() - 1.0);
        let reversion = self.mean_reversion * (self.nominal - self.current);
        self.current = (self.current + shock + reversion).max(0.0);
        debug!(usage = self.current, "non-cooling usage");
        self.current
    }
}
