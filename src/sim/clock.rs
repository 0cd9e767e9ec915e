use std::fmt;

use serde::{Deserialize, Serialize};

/// Hours per simulated day.
pub const HOURS_PER_DAY: usize = 24;
/// Hours per simulated week.
pub const HOURS_PER_WEEK: usize = 7 * HOURS_PER_DAY;

/// One simulated hour, indexed from the start of the run.
///
/// Slot 0 is Monday 00:00, so hour-of-day and day-of-week follow directly
/// from the index.
///
/// # Examples
///
/// ```
/// use coldstore_sim::sim::clock::Timeslot;
///
/// let slot = Timeslot(26);
/// assert_eq!(slot.hour_of_day(), 2);
/// assert_eq!(slot.day_of_week(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timeslot(pub usize);

impl Timeslot {
    /// Hour of the day in `0..24`.
    pub fn hour_of_day(self) -> usize {
        self.0 % HOURS_PER_DAY
    }

    /// Day of the week in `0..7`, Monday = 0.
    pub fn day_of_week(self) -> usize {
        (self.0 / HOURS_PER_DAY) % 7
    }

    /// Hour of the week in `0..168`.
    pub fn hour_of_week(self) -> usize {
        self.0 % HOURS_PER_WEEK
    }

    /// The slot `hours` after this one.
    pub fn plus(self, hours: usize) -> Self {
        Self(self.0 + hours)
    }

    /// The following slot.
    pub fn next(self) -> Self {
        self.plus(1)
    }
}

impl fmt::Display for Timeslot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A simulation clock that hands out consecutive timeslots.
///
/// # Examples
///
/// ```
/// use coldstore_sim::sim::clock::{Clock, Timeslot};
///
/// let mut clock = Clock::new(Timeslot(5), 3);
/// let mut slots = Vec::new();
///
/// clock.run(|slot| slots.push(slot.0));
/// assert_eq!(slots, vec![5, 6, 7]);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Next slot to hand out
    current: Timeslot,
    /// Slots remaining
    remaining: usize,
}

impl Clock {
    /// Creates a clock starting at `start` that runs for `steps` slots.
    pub fn new(start: Timeslot, steps: usize) -> Self {
        Self {
            current: start,
            remaining: steps,
        }
    }

    /// Advances the clock by one slot.
    ///
    /// # Returns
    ///
    /// * `Some(slot)` - The slot to simulate now
    /// * `None` - If the clock has run out of slots
    pub fn tick(&mut self) -> Option<Timeslot> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.current;
        self.current = slot.next();
        self.remaining -= 1;
        Some(slot)
    }

    /// Runs a fallible function for each remaining slot, stopping at the first error.
    pub fn try_run<E>(&mut self, mut f: impl FnMut(Timeslot) -> Result<(), E>) -> Result<(), E> {
        while let Some(slot) = self.tick() {
            f(slot)?;
        }
        Ok(())
    }

    /// Runs a function for each remaining slot.
    pub fn run(&mut self, mut f: impl FnMut(Timeslot)) {
        while let Some(slot) = self.tick() {
            f(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_fields_wrap() {
        let slot = Timeslot(HOURS_PER_WEEK + 25);
        assert_eq!(slot.hour_of_day(), 1);
        assert_eq!(slot.day_of_week(), 1);
        assert_eq!(slot.hour_of_week(), 25);
    }

    #[test]
    fn tick_stops_after_steps() {
        let mut clock = Clock::new(Timeslot(0), 2);
        assert_eq!(clock.tick(), Some(Timeslot(0)));
        assert_eq!(clock.tick(), Some(Timeslot(1)));
        assert_eq!(clock.tick(), None);
    }

    #[test]
    fn try_run_stops_on_error() {
        let mut clock = Clock::new(Timeslot(0), 10);
        let mut seen = 0;
        let res: Result<(), &str> = clock.try_run(|slot| {
            seen += 1;
            if slot.0 == 3 { Err("boom") } else { Ok(()) }
        });
        assert_eq!(res, Err("boom"));
        assert_eq!(seen, 4);
    }

    #[test]
    fn zero_step_clock_never_runs() {
        let mut clock = Clock::new(Timeslot(0), 0);
        let mut called = false;
        clock.run(|_| called = true);
        assert!(!called);
    }
}
