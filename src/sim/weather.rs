//! Outside-temperature reports seen by the warehouse.

use std::collections::BTreeMap;

use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::clock::{HOURS_PER_DAY, Timeslot};

/// Source of the outside temperature for each simulated hour.
pub trait WeatherSource {
    /// Temperature (°C) reported for `slot`, or `None` when no report exists.
    fn outside_temperature(&self, slot: Timeslot) -> Option<f64>;
}

/// Same temperature at every hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantWeather(pub f64);

impl WeatherSource for ConstantWeather {
    fn outside_temperature(&self, _slot: Timeslot) -> Option<f64> {
        Some(self.0)
    }
}

/// Hourly reports keyed by timeslot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSeries {
    reports: BTreeMap<Timeslot, f64>,
}

impl WeatherSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Series of consecutive hourly values starting at `start`.
    pub fn from_hourly(start: Timeslot, temps: impl IntoIterator<Item = f64>) -> Self {
        let reports = temps
            .into_iter()
            .enumerate()
            .map(|(h, t)| (start.plus(h), t))
            .collect();
        Self { reports }
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl WeatherSource for WeatherSeries {
    fn outside_temperature(&self, slot: Timeslot) -> Option<f64> {
        self.reports.get(&slot).copied()
    }
}

/// Daily temperature cycle with Gaussian noise.
///
/// The sinusoid peaks at `peak_hour` and bottoms out twelve hours later.
/// Noise is drawn from a generator seeded with `seed`, so a given
/// configuration always yields the same series.
///
/// # Examples
///
/// ```
/// use coldstore_sim::sim::clock::Timeslot;
/// use coldstore_sim::sim::weather::{DiurnalWeather, WeatherSource};
///
/// let weather = DiurnalWeather {
///     mean_c: 18.0,
///     amplitude_c: 6.0,
///     peak_hour: 15.0,
///     noise_sd_c: 0.0,
///     seed: 7,
/// };
/// let series = weather.series(Timeslot(0), 48);
/// let peak = series.outside_temperature(Timeslot(15)).unwrap_or_default();
/// assert!((peak - 24.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiurnalWeather {
    pub mean_c: f64,
    pub amplitude_c: f64,
    /// Hour of day (0-24) of the daily maximum.
    pub peak_hour: f64,
    pub noise_sd_c: f64,
    pub seed: u64,
}

impl DiurnalWeather {
    /// Noise-free temperature at `slot`.
    pub fn expected(&self, slot: Timeslot) -> f64 {
        let hours_from_peak = slot.hour_of_day() as f64 - self.peak_hour;
        let angle = 2.0 * std::f64::consts::PI * hours_from_peak / HOURS_PER_DAY as f64;
        self.mean_c + self.amplitude_c * angle.cos()
    }

    /// Generates `hours` consecutive reports starting at `start`.
    pub fn series(&self, start: Timeslot, hours: usize) -> WeatherSeries {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let noise = Normal::new(0.0, self.noise_sd_c.max(0.0)).ok();
        WeatherSeries::from_hourly(
            start,
            (0..hours).map(|h| {
                let slot = start.plus(h);
                let n = match &noise {
                    Some(dist) if self.noise_sd_c > 0.0 => dist.sample(&mut rng),
                    _ => 0.0,
                };
                self.expected(slot) + n
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn diurnal(noise: f64) -> DiurnalWeather {
        DiurnalWeather {
            mean_c: 20.0,
            amplitude_c: 5.0,
            peak_hour: 14.0,
            noise_sd_c: noise,
            seed: 11,
        }
    }

    #[test]
    fn constant_weather_always_reports() {
        let w = ConstantWeather(20.0);
        assert_eq!(w.outside_temperature(Timeslot(0)), Some(20.0));
        assert_eq!(w.outside_temperature(Timeslot(10_000)), Some(20.0));
    }

    #[test]
    fn series_reports_only_known_slots() {
        let w = WeatherSeries::from_hourly(Timeslot(5), [10.0, 11.0, 12.0]);
        assert_eq!(w.len(), 3);
        assert!(!w.is_empty());
        assert!(WeatherSeries::new().is_empty());
        assert_eq!(w.outside_temperature(Timeslot(4)), None);
        assert_eq!(w.outside_temperature(Timeslot(6)), Some(11.0));
        assert_eq!(w.outside_temperature(Timeslot(8)), None);
    }

    #[test]
    fn diurnal_peaks_and_troughs() {
        let w = diurnal(0.0);
        assert_abs_diff_eq!(w.expected(Timeslot(14)), 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(w.expected(Timeslot(2)), 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(w.expected(Timeslot(24 + 14)), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn noisy_series_is_reproducible() {
        let a = diurnal(1.0).series(Timeslot(0), 72);
        let b = diurnal(1.0).series(Timeslot(0), 72);
        assert_eq!(a, b);
        let quiet = diurnal(0.0).series(Timeslot(0), 72);
        assert_ne!(a, quiet);
    }
}
