//! Tariffs, forward-profile synthesis and the tariff-evaluation surface.

pub mod evaluation;
/// Price-shape driven forward usage profiles.
pub mod profile;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sim::clock::{HOURS_PER_DAY, HOURS_PER_WEEK, Timeslot};

pub use evaluation::{CustomerModelAccessor, TariffEvaluationSettings};
pub use profile::{ForwardProfileSynthesizer, NominalConsumption, PriceStats, ProfileCache, TariffInfo};

/// Identity of a tariff offered on the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TariffId(pub u64);

impl fmt::Display for TariffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pricing function of a tariff, as seen by the customer model.
pub trait Tariff {
    fn id(&self) -> TariffId;

    /// `true` if the per-kWh price varies with the time of use.
    fn is_time_of_use(&self) -> bool;

    /// Charge for consuming `kwh` during `slot`, given `cumulative_kwh`
    /// already consumed since the start of the day.
    ///
    /// Positive values are a cost to the customer.
    fn usage_charge(&self, slot: Timeslot, kwh: f64, cumulative_kwh: f64) -> f64;
}

/// Per-kWh energy rates over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum RateSchedule {
    /// One rate at all times.
    Flat { rate: f64 },
    /// 24 hourly rates repeated every day.
    Daily { rates: Vec<f64> },
    /// 168 hourly rates repeated every week, Monday 00:00 first.
    Weekly { rates: Vec<f64> },
}

impl RateSchedule {
    /// Rate in effect during `slot`.
    pub fn rate_at(&self, slot: Timeslot) -> f64 {
        match self {
            Self::Flat { rate } => *rate,
            Self::Daily { rates } => rates.get(slot.hour_of_day()).copied().unwrap_or(0.0),
            Self::Weekly { rates } => rates.get(slot.hour_of_week()).copied().unwrap_or(0.0),
        }
    }

    /// Number of rates a well-formed schedule carries.
    pub fn expected_len(&self) -> usize {
        match self {
            Self::Flat { .. } => 1,
            Self::Daily { .. } => HOURS_PER_DAY,
            Self::Weekly { .. } => HOURS_PER_WEEK,
        }
    }

    /// Number of rates actually present.
    pub fn len(&self) -> usize {
        match self {
            Self::Flat { .. } => 1,
            Self::Daily { rates } | Self::Weekly { rates } => rates.len(),
        }
    }

    /// `true` for a daily or weekly schedule with no rates.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Different rate for consumption above a daily threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateTier {
    /// Daily kWh after which `rate` applies.
    pub threshold_kwh: f64,
    pub rate: f64,
}

/// Tariff built from a rate schedule and an optional daily tier.
///
/// # Examples
///
/// ```
/// use coldstore_sim::sim::clock::Timeslot;
/// use coldstore_sim::tariff::{RateTariff, Tariff, TariffId};
///
/// let flat = RateTariff::flat(TariffId(1), "flat", 0.12);
/// assert!(!flat.is_time_of_use());
/// assert!((flat.usage_charge(Timeslot(0), 10.0, 0.0) - 1.2).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateTariff {
    pub id: TariffId,
    pub name: String,
    pub schedule: RateSchedule,
    #[serde(default)]
    pub tier: Option<RateTier>,
}

impl RateTariff {
    /// Single-rate tariff.
    pub fn flat(id: TariffId, name: impl Into<String>, rate: f64) -> Self {
        Self {
            id,
            name: name.into(),
            schedule: RateSchedule::Flat { rate },
            tier: None,
        }
    }

    /// Time-of-use tariff repeating `rates` (24 values) every day.
    pub fn daily(id: TariffId, name: impl Into<String>, rates: Vec<f64>) -> Self {
        Self {
            id,
            name: name.into(),
            schedule: RateSchedule::Daily { rates },
            tier: None,
        }
    }

    /// Time-of-use tariff repeating `rates` (168 values) every week.
    pub fn weekly(id: TariffId, name: impl Into<String>, rates: Vec<f64>) -> Self {
        Self {
            id,
            name: name.into(),
            schedule: RateSchedule::Weekly { rates },
            tier: None,
        }
    }

    /// Adds a daily consumption tier.
    pub fn with_tier(mut self, threshold_kwh: f64, rate: f64) -> Self {
        self.tier = Some(RateTier {
            threshold_kwh,
            rate,
        });
        self
    }
}

impl Tariff for RateTariff {
    fn id(&self) -> TariffId {
        self.id
    }

    fn is_time_of_use(&self) -> bool {
        !matches!(self.schedule, RateSchedule::Flat { .. })
    }

    fn usage_charge(&self, slot: Timeslot, kwh: f64, cumulative_kwh: f64) -> f64 {
        let base_rate = self.schedule.rate_at(slot);
        match self.tier {
            None => kwh * base_rate,
            Some(tier) => {
                let below = (tier.threshold_kwh - cumulative_kwh).clamp(0.0, kwh);
                below * base_rate + (kwh - below) * tier.rate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn peaky_day() -> Vec<f64> {
        (0..24).map(|h| if (8..20).contains(&h) { 0.20 } else { 0.10 }).collect()
    }

    #[test]
    fn daily_schedule_repeats() {
        let t = RateTariff::daily(TariffId(2), "tou", peaky_day());
        assert!(t.is_time_of_use());
        assert_eq!(t.usage_charge(Timeslot(9), 1.0, 0.0), 0.20);
        assert_eq!(t.usage_charge(Timeslot(24 + 9), 1.0, 0.0), 0.20);
        assert_eq!(t.usage_charge(Timeslot(24 + 2), 1.0, 0.0), 0.10);
    }

    #[test]
    fn weekly_schedule_uses_hour_of_week() {
        let mut rates = vec![0.1; HOURS_PER_WEEK];
        rates[HOURS_PER_DAY * 6] = 0.5;
        let t = RateTariff::weekly(TariffId(3), "weekly", rates);
        assert_eq!(t.usage_charge(Timeslot(HOURS_PER_DAY * 6), 2.0, 0.0), 1.0);
        assert_eq!(t.usage_charge(Timeslot(HOURS_PER_WEEK + HOURS_PER_DAY * 6), 2.0, 0.0), 1.0);
    }

    #[test]
    fn tier_splits_consumption_at_threshold() {
        let t = RateTariff::flat(TariffId(4), "tiered", 0.10).with_tier(100.0, 0.30);
        // 95 already used: 5 kWh at base, 5 kWh at tier
        let charge = t.usage_charge(Timeslot(0), 10.0, 95.0);
        assert_abs_diff_eq!(charge, 0.5 + 1.5, epsilon = 1e-12);
        // fully above threshold
        let charge = t.usage_charge(Timeslot(0), 10.0, 200.0);
        assert_abs_diff_eq!(charge, 3.0, epsilon = 1e-12);
        assert!(!t.is_time_of_use());
    }

    #[test]
    fn schedule_parses_from_toml() {
        let toml = r#"
id = 7
name = "night-saver"
schedule = { kind = "daily", rates = [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.2, 0.1, 0.1] }
tier = { threshold_kwh = 500.0, rate = 0.25 }
"#;
        let t: Result<RateTariff, _> = toml::from_str(toml);
        assert!(t.is_ok(), "tariff should parse: {:?}", t.err());
        let t = t.ok();
        assert_eq!(t.as_ref().map(|t| t.id), Some(TariffId(7)));
        assert_eq!(t.as_ref().map(|t| t.schedule.len()), Some(24));
    }
}
