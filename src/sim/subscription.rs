//! The warehouse's contract with its energy retailer and the balancing market.

use tracing::{debug, info, warn};

use super::clock::Timeslot;
use super::event::RegulationEvent;
use crate::model::regulation::RegulationCapacity;
use crate::tariff::Tariff;

/// Market-side collaborator the engine talks to once per hour.
pub trait Subscription {
    /// Regulation (kWh) the market exercised against the capacity
    /// published last hour. Positive removed consumption, negative added it.
    fn exercised_regulation(&mut self, slot: Timeslot) -> f64;

    /// Offers `capacity` for the market to exercise next hour.
    fn publish_regulation_capacity(&mut self, slot: Timeslot, capacity: RegulationCapacity);

    /// Records `kwh` consumed during `slot` and returns the charge.
    fn report_consumption(&mut self, slot: Timeslot, kwh: f64) -> f64;
}

/// Subscription that bills against a single tariff and replays scripted
/// regulation events.
///
/// Consumption counts toward the daily total used by tiered rates; the
/// total restarts at midnight.
#[derive(Debug, Clone)]
pub struct SimulatedSubscription<T: Tariff> {
    tariff: T,
    events: Vec<RegulationEvent>,
    offered: Option<(Timeslot, RegulationCapacity)>,
    daily_kwh: f64,
    day: Option<usize>,
    total_kwh: f64,
    total_cost: f64,
    total_exercised_kwh: f64,
}

impl<T: Tariff> SimulatedSubscription<T> {
    pub fn new(tariff: T) -> Self {
        Self::with_events(tariff, Vec::new())
    }

    pub fn with_events(tariff: T, events: Vec<RegulationEvent>) -> Self {
        Self {
            tariff,
            events,
            offered: None,
            daily_kwh: 0.0,
            day: None,
            total_kwh: 0.0,
            total_cost: 0.0,
            total_exercised_kwh: 0.0,
        }
    }

    pub fn tariff(&self) -> &T {
        &self.tariff
    }

    pub fn total_kwh(&self) -> f64 {
        self.total_kwh
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Sum of exercised regulation over the run (kWh, signed).
    pub fn total_exercised_kwh(&self) -> f64 {
        self.total_exercised_kwh
    }

    /// Capacity most recently published, with the slot it was published for.
    pub fn offered(&self) -> Option<(Timeslot, RegulationCapacity)> {
        self.offered
    }
}

impl<T: Tariff> Subscription for SimulatedSubscription<T> {
    fn exercised_regulation(&mut self, slot: Timeslot) -> f64 {
        let Some((_, offered)) = self.offered else {
            return 0.0;
        };
        let mut active = self.events.iter().filter(|e| e.is_active(slot));
        let Some(event) = active.next() else {
            return 0.0;
        };
        if active.next().is_some() {
            warn!(%slot, "overlapping regulation events, using the first");
        }
        let kwh = event.exercised_at(slot, &offered);
        if kwh != 0.0 {
            info!(%slot, kwh, fraction = event.fraction, "regulation exercised");
        }
        self.total_exercised_kwh += kwh;
        kwh
    }

    fn publish_regulation_capacity(&mut self, slot: Timeslot, capacity: RegulationCapacity) {
        self.offered = Some((slot, capacity));
    }

    fn report_consumption(&mut self, slot: Timeslot, kwh: f64) -> f64 {
        let day = slot.0 / super::clock::HOURS_PER_DAY;
        if self.day != Some(day) {
            self.day = Some(day);
            self.daily_kwh = 0.0;
        }
        let charge = self.tariff.usage_charge(slot, kwh, self.daily_kwh);
        self.daily_kwh += kwh;
        self.total_kwh += kwh;
        self.total_cost += charge;
        debug!(%slot, kwh, charge, "consumption billed");
        charge
    }
}
