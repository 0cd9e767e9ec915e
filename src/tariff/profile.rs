use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{Tariff, TariffId};
use crate::model::controller::ThermalEnvelope;
use crate::model::params::{CP_ICE, WarehouseParams};
use crate::sim::clock::{HOURS_PER_DAY, Timeslot};

/// Expected electrical consumption of one typical hour, split by source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NominalConsumption {
    /// Non-cooling load at its long-run mean (kWh).
    pub ancillary_kwh: f64,
    /// Electricity to cool an average hour's incoming stock to nominal (kWh).
    pub turnover_kwh: f64,
    /// Electricity to offset shell losses at the evaluation temperature (kWh).
    pub envelope_kwh: f64,
}

impl NominalConsumption {
    /// Floor losses are left out of the estimate.
    pub fn new(params: &WarehouseParams, envelope: &ThermalEnvelope) -> Self {
        let cop = params.cop();
        let nominal = params.nominal_temp();
        let hourly_stock = params.stock_capacity() * params.turnover_ratio() / HOURS_PER_DAY as f64;
        Self {
            ancillary_kwh: params.non_cooling_usage(),
            turnover_kwh: hourly_stock * CP_ICE * (params.new_stock_temp() - nominal) / cop,
            envelope_kwh: envelope.loss_per_k * (params.eval_env_temp() - nominal) / cop,
        }
    }

    /// Total expected consumption per hour (kWh).
    pub fn hourly_kwh(&self) -> f64 {
        self.ancillary_kwh + self.turnover_kwh + self.envelope_kwh
    }

    /// Portion of the hourly total that is refrigeration (kWh).
    pub fn cooling_kwh(&self) -> f64 {
        self.hourly_kwh() - self.ancillary_kwh
    }
}

/// Summary of a forward price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl PriceStats {
    /// `None` for an empty series.
    ///
    /// The mean takes a second correction pass over the residuals and is
    /// kept inside `[min, max]`, so a constant series has a mean equal to
    /// that constant.
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }
        let n = prices.len() as f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &p in prices {
            min = min.min(p);
            max = max.max(p);
            sum += p;
        }
        let rough = sum / n;
        let correction = prices.iter().map(|p| p - rough).sum::<f64>() / n;
        Some(Self {
            mean: (rough + correction).clamp(min, max),
            min,
            max,
        })
    }

    /// Largest distance of either extreme from the mean.
    pub fn range(&self) -> f64 {
        (self.max - self.mean).max(self.mean - self.min)
    }

    /// Whether the spread is within rounding noise of the price level.
    pub fn is_flat(&self) -> bool {
        let level = self.max.abs().max(self.min.abs());
        self.range() <= FLAT_PRICE_TOLERANCE * level
    }
}

/// Relative spread, in units of machine epsilon, treated as no spread.
const FLAT_PRICE_TOLERANCE: f64 = 4.0 * f64::EPSILON;

/// Forward view of one tariff: prices, their summary and the usage profile.
///
/// Built once and shared; never modified after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TariffInfo {
    tariff_id: TariffId,
    time_of_use: bool,
    start: Timeslot,
    /// Per-kWh prices over the window; empty for a non-time-of-use tariff.
    prices: Vec<f64>,
    stats: Option<PriceStats>,
    profile: Vec<f64>,
}

impl TariffInfo {
    pub fn tariff_id(&self) -> TariffId {
        self.tariff_id
    }

    pub fn is_time_of_use(&self) -> bool {
        self.time_of_use
    }

    /// First hour of the window.
    pub fn start(&self) -> Timeslot {
        self.start
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn stats(&self) -> Option<PriceStats> {
        self.stats
    }

    /// Expected hourly consumption over the window (kWh).
    pub fn profile(&self) -> &[f64] {
        &self.profile
    }
}

/// Builds forward usage profiles from tariff price shapes.
///
/// A flat tariff yields a constant profile at nominal consumption. A
/// time-of-use tariff moves refrigeration from expensive to cheap hours in
/// proportion to each hour's price distance from the mean, never moving more
/// than the plant could absorb in either direction. Synthesis reads only
/// configuration; it never touches the thermal state or a random stream.
///
/// # Examples
///
/// ```
/// use coldstore_sim::model::controller::ThermalEnvelope;
/// use coldstore_sim::model::params::WarehouseParams;
/// use coldstore_sim::sim::clock::Timeslot;
/// use coldstore_sim::tariff::{ForwardProfileSynthesizer, RateTariff, TariffId};
///
/// let params = WarehouseParams::default();
/// let synth = ForwardProfileSynthesizer::new(&params, &ThermalEnvelope::new(&params));
/// let info = synth.synthesize(&RateTariff::flat(TariffId(1), "flat", 0.1), Timeslot(1));
/// assert_eq!(info.profile().len(), params.profile_size());
/// assert!(info.profile().iter().all(|&kwh| kwh == synth.nominal().hourly_kwh()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardProfileSynthesizer {
    nominal: NominalConsumption,
    /// Plant rating in electrical terms (kWh per hour).
    max_cooling_kwh: f64,
    profile_size: usize,
}

impl ForwardProfileSynthesizer {
    pub fn new(params: &WarehouseParams, envelope: &ThermalEnvelope) -> Self {
        let nominal = NominalConsumption::new(params, envelope);
        debug!(
            nominal_kwh = nominal.hourly_kwh(),
            turnover_kwh = nominal.turnover_kwh,
            envelope_kwh = nominal.envelope_kwh,
            "nominal hourly consumption"
        );
        Self {
            nominal,
            max_cooling_kwh: params.max_cooling_energy() / params.cop(),
            profile_size: params.profile_size(),
        }
    }

    pub fn nominal(&self) -> &NominalConsumption {
        &self.nominal
    }

    pub fn profile_size(&self) -> usize {
        self.profile_size
    }

    /// Forward view of `tariff` over `profile_size` hours from `start`.
    pub fn synthesize(&self, tariff: &dyn Tariff, start: Timeslot) -> TariffInfo {
        let hourly = self.nominal.hourly_kwh();
        if !tariff.is_time_of_use() {
            return TariffInfo {
                tariff_id: tariff.id(),
                time_of_use: false,
                start,
                prices: Vec::new(),
                stats: None,
                profile: vec![hourly; self.profile_size],
            };
        }

        let prices = self.price_series(tariff, start);
        let stats = PriceStats::from_prices(&prices);
        let profile = match stats {
            Some(stats) => self.shift_toward_cheap_hours(&prices, &stats),
            None => Vec::new(),
        };
        debug!(tariff = %tariff.id(), ?stats, "time-of-use profile");
        TariffInfo {
            tariff_id: tariff.id(),
            time_of_use: true,
            start,
            prices,
            stats,
            profile,
        }
    }

    /// Effective per-kWh price of nominal consumption in each hour.
    ///
    /// Daily cumulative usage restarts at midnight so tiered rates see the
    /// same consumption they would in operation. Without positive nominal
    /// consumption there is nothing to price and the series is all zeros.
    pub fn price_series(&self, tariff: &dyn Tariff, start: Timeslot) -> Vec<f64> {
        let hourly = self.nominal.hourly_kwh();
        if hourly <= 0.0 {
            return vec![0.0; self.profile_size];
        }
        let mut cumulative = 0.0;
        (0..self.profile_size)
            .map(|h| {
                let slot = start.plus(h);
                if slot.hour_of_day() == 0 {
                    cumulative = 0.0;
                }
                let price = tariff.usage_charge(slot, hourly, cumulative) / hourly;
                cumulative += hourly;
                price
            })
            .collect()
    }

    fn shift_toward_cheap_hours(&self, prices: &[f64], stats: &PriceStats) -> Vec<f64> {
        let nominal_cooling = self.nominal.cooling_kwh();
        let kwh_range = nominal_cooling.min(self.max_cooling_kwh - nominal_cooling);
        let scale = if stats.is_flat() {
            0.0
        } else {
            kwh_range / stats.range()
        };
        prices
            .iter()
            .map(|price| nominal_cooling + (stats.mean - price) * scale + self.nominal.ancillary_kwh)
            .collect()
    }
}

/// Profiles already synthesized, keyed by tariff.
///
/// Entries are shared immutably; a stale entry is dropped with
/// [`ProfileCache::invalidate`] and rebuilt on the next request.
#[derive(Debug, Default)]
pub struct ProfileCache {
    entries: HashMap<TariffId, Arc<TariffInfo>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `id`, or the result of `build` stored under it.
    pub fn get_or_build(
        &mut self,
        id: TariffId,
        build: impl FnOnce() -> TariffInfo,
    ) -> Arc<TariffInfo> {
        Arc::clone(self.entries.entry(id).or_insert_with(|| Arc::new(build())))
    }

    /// Removes the entry for `id`; returns whether one existed.
    pub fn invalidate(&mut self, id: TariffId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::model::params::WarehouseOverrides;
    use crate::tariff::RateTariff;

    fn synthesizer(params: &WarehouseParams) -> ForwardProfileSynthesizer {
        ForwardProfileSynthesizer::new(params, &ThermalEnvelope::new(params))
    }

    fn half_day_rates() -> Vec<f64> {
        (0..24).map(|h| if h < 12 { 0.20 } else { 0.10 }).collect()
    }

    #[test]
    fn nominal_consumption_matches_formula() {
        let params = WarehouseParams::default();
        let env = ThermalEnvelope::new(&params);
        let nc = NominalConsumption::new(&params, &env);
        let expected = params.non_cooling_usage()
            + params.stock_capacity() * (params.turnover_ratio() / 24.0) * CP_ICE
                * (params.new_stock_temp() - params.nominal_temp())
                / params.cop()
            + env.loss_per_k * (params.eval_env_temp() - params.nominal_temp()) / params.cop();
        assert_abs_diff_eq!(nc.hourly_kwh(), expected, epsilon = 1e-9);
        assert_abs_diff_eq!(nc.cooling_kwh(), expected - params.non_cooling_usage(), epsilon = 1e-9);
    }

    #[test]
    fn flat_tariff_profile_is_constant() {
        let params = WarehouseParams::default();
        let synth = synthesizer(&params);
        let info = synth.synthesize(&RateTariff::flat(TariffId(1), "flat", 0.15), Timeslot(37));
        assert!(!info.is_time_of_use());
        assert!(info.prices().is_empty());
        assert!(info.stats().is_none());
        assert_eq!(info.profile().len(), 168);
        for &kwh in info.profile() {
            assert_eq!(kwh, synth.nominal().hourly_kwh());
        }
    }

    #[test]
    fn tou_profile_shifts_load_to_cheap_hours() {
        let params = WarehouseParams::default();
        let synth = synthesizer(&params);
        let info = synth.synthesize(&RateTariff::daily(TariffId(2), "tou", half_day_rates()), Timeslot(0));
        let stats = info.stats();
        assert!(stats.is_some());
        let p = info.profile();
        assert!(p[15] > p[3]);
        // same prices every day, so the profile repeats
        assert_abs_diff_eq!(p[3], p[27], epsilon = 1e-12);
        // symmetric prices: the shift averages out
        let mean = p.iter().sum::<f64>() / p.len() as f64;
        assert_abs_diff_eq!(mean, synth.nominal().hourly_kwh(), epsilon = 1e-9);
    }

    #[test]
    fn shift_is_bounded_by_plant_headroom() {
        let params = WarehouseParams::default();
        let synth = synthesizer(&params);
        let info = synth.synthesize(&RateTariff::daily(TariffId(2), "tou", half_day_rates()), Timeslot(0));
        let max_electric = params.max_cooling_energy() / params.cop();
        let anc = synth.nominal().ancillary_kwh;
        for &kwh in info.profile() {
            assert!(kwh - anc >= -1e-9);
            assert!(kwh - anc <= max_electric + 1e-9);
        }
    }

    fn uniform_rates() -> impl Iterator<Item = f64> {
        (1..=60).map(|cents| cents as f64 / 100.0)
    }

    #[test]
    fn uniform_tou_prices_give_nominal_profile() {
        let params = WarehouseParams::default();
        let synth = synthesizer(&params);
        let nominal = synth.nominal().hourly_kwh();
        for rate in uniform_rates() {
            let info = synth.synthesize(&RateTariff::daily(TariffId(3), "same", vec![rate; 24]), Timeslot(5));
            assert!(info.is_time_of_use());
            for &kwh in info.profile() {
                assert_abs_diff_eq!(kwh, nominal, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn tier_at_base_rate_keeps_nominal_profile() {
        let params = WarehouseParams::default();
        let synth = synthesizer(&params);
        let nominal = synth.nominal().hourly_kwh();
        for rate in uniform_rates() {
            // threshold falls mid-hour, so some hours are split across the tier
            let tariff =
                RateTariff::daily(TariffId(6), "tiered", vec![rate; 24]).with_tier(2.5 * nominal, rate);
            let info = synth.synthesize(&tariff, Timeslot(0));
            for &kwh in info.profile() {
                assert_abs_diff_eq!(kwh, nominal, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn constant_series_mean_equals_the_constant() {
        for rate in uniform_rates() {
            let stats = PriceStats::from_prices(&[rate; 168]);
            assert_eq!(stats.map(|s| s.mean), Some(rate));
            assert_eq!(stats.map(|s| s.range()), Some(0.0));
            assert!(stats.is_some_and(|s| s.is_flat()));
        }
        assert!(PriceStats::from_prices(&[]).is_none());
        assert!(PriceStats::from_prices(&[0.0; 24]).is_some_and(|s| s.is_flat()));
        assert!(!PriceStats::from_prices(&[0.1, 0.2]).is_some_and(|s| s.is_flat()));
    }

    #[test]
    fn tier_price_resets_at_midnight() {
        let params = WarehouseParams::default();
        let synth = synthesizer(&params);
        let hourly = synth.nominal().hourly_kwh();
        // threshold crossed after two hours of nominal consumption
        let tariff = RateTariff::daily(TariffId(4), "tiered", vec![0.1; 24]).with_tier(2.0 * hourly, 0.3);
        let prices = synth.price_series(&tariff, Timeslot(22));
        // 22:00 and 23:00 below threshold, midnight resets
        assert_abs_diff_eq!(prices[0], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(prices[1], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(prices[2], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(prices[3], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(prices[4], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn non_positive_nominal_consumption_prices_at_zero() {
        let overrides = WarehouseOverrides {
            non_cooling_usage: Some(0.0),
            turnover_ratio: Some(0.0),
            eval_env_temp: Some(-20.0),
            ..WarehouseOverrides::default()
        };
        let (params, errors) = WarehouseParams::from_overrides(&overrides);
        assert!(errors.is_empty());
        let synth = synthesizer(&params);
        assert_eq!(synth.nominal().hourly_kwh(), 0.0);
        let info = synth.synthesize(&RateTariff::daily(TariffId(5), "tou", half_day_rates()), Timeslot(0));
        assert!(info.prices().iter().all(|&p| p == 0.0));
        assert!(info.profile().iter().all(|&kwh| kwh == 0.0));
    }

    #[test]
    fn cache_returns_shared_entry_until_invalidated() {
        let mut cache = ProfileCache::new();
        let params = WarehouseParams::default();
        let synth = synthesizer(&params);
        let tariff = RateTariff::flat(TariffId(9), "flat", 0.1);
        let mut builds = 0;
        let a = cache.get_or_build(TariffId(9), || {
            builds += 1;
            synth.synthesize(&tariff, Timeslot(0))
        });
        let b = cache.get_or_build(TariffId(9), || {
            builds += 1;
            synth.synthesize(&tariff, Timeslot(0))
        });
        assert_eq!(builds, 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(cache.invalidate(TariffId(9)));
        assert!(!cache.invalidate(TariffId(9)));
        assert!(cache.is_empty());
        // the caller's handle stays valid after invalidation
        assert_eq!(a.profile().len(), 168);
    }
}
