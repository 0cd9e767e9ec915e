use serde::{Deserialize, Serialize};

use super::clock::Timeslot;
use crate::error::ConfigError;
use crate::model::regulation::RegulationCapacity;

/// Balancing-market call on the warehouse's offered regulation.
///
/// While active, the market exercises `fraction` of the capacity the
/// warehouse published for the previous hour: a positive fraction takes up
/// regulation (less consumption), a negative fraction takes down regulation
/// (more consumption).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegulationEvent {
    /// First timeslot (inclusive).
    pub start_slot: usize,
    /// Last timeslot (exclusive).
    pub end_slot: usize,
    /// Share of offered capacity exercised, in [-1, 1].
    pub fraction: f64,
}

impl RegulationEvent {
    /// Creates an event spanning `[start_slot, end_slot)`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an empty window or a fraction outside [-1, 1].
    pub fn new(start_slot: usize, end_slot: usize, fraction: f64) -> Result<Self, ConfigError> {
        let event = Self {
            start_slot,
            end_slot,
            fraction,
        };
        event.check("regulation_events")?;
        Ok(event)
    }

    /// Validates the window and fraction, reporting against `field`.
    pub fn check(&self, field: &str) -> Result<(), ConfigError> {
        if self.start_slot >= self.end_slot {
            return Err(ConfigError::new(
                field,
                format!(
                    "start_slot ({}) must be < end_slot ({})",
                    self.start_slot, self.end_slot
                ),
            ));
        }
        if !self.fraction.is_finite() || !(-1.0..=1.0).contains(&self.fraction) {
            return Err(ConfigError::new(
                field,
                format!("fraction {} out of range [-1.0, 1.0]", self.fraction),
            ));
        }
        Ok(())
    }

    pub fn is_active(&self, slot: Timeslot) -> bool {
        (self.start_slot..self.end_slot).contains(&slot.0)
    }

    /// Regulation (kWh) taken from `offered` if active at `slot`, else `0.0`.
    pub fn exercised_at(&self, slot: Timeslot, offered: &RegulationCapacity) -> f64 {
        if !self.is_active(slot) {
            return 0.0;
        }
        if self.fraction >= 0.0 {
            self.fraction * offered.up_kwh
        } else {
            -self.fraction * offered.down_kwh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offered() -> RegulationCapacity {
        RegulationCapacity {
            up_kwh: 30.0,
            down_kwh: -60.0,
        }
    }

    #[test]
    fn active_only_inside_window() {
        let event = RegulationEvent::new(5, 8, 0.5).unwrap();
        assert!(!event.is_active(Timeslot(4)));
        assert!(event.is_active(Timeslot(5)));
        assert!(event.is_active(Timeslot(7)));
        assert!(!event.is_active(Timeslot(8)));
    }

    #[test]
    fn up_and_down_fractions() {
        let up = RegulationEvent::new(0, 2, 0.5).unwrap();
        assert_eq!(up.exercised_at(Timeslot(1), &offered()), 15.0);
        assert_eq!(up.exercised_at(Timeslot(2), &offered()), 0.0);

        let down = RegulationEvent::new(0, 2, -0.25).unwrap();
        assert_eq!(down.exercised_at(Timeslot(0), &offered()), -15.0);
    }

    #[test]
    fn rejects_bad_windows_and_fractions() {
        assert!(RegulationEvent::new(3, 3, 0.5).is_err());
        assert!(RegulationEvent::new(4, 3, 0.5).is_err());
        assert!(RegulationEvent::new(0, 3, 1.5).is_err());
        assert!(RegulationEvent::new(0, 3, f64::NAN).is_err());
    }
}
