//! Time-of-day sources for the weather model.

use chrono::{Local, Timelike};

/// Supplies the hour of day to the thermal loop.
pub trait Clock: Send {
    /// Hour of day in `[0, 24)`.
    fn hour_of_day(&self) -> f64;

    /// Called once per tick after the step.
    fn advance(&mut self, dt: f64);
}

/// Local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn hour_of_day(&self) -> f64 {
        let now = Local::now();
        now.hour() as f64 + now.minute() as f64 / 60.0 + now.second() as f64 / 3600.0
    }

    fn advance(&mut self, _dt: f64) {}
}

/// Clock driven by loop time, for accelerated and reproducible runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedClock {
    start_hour: f64,
    elapsed_s: f64,
}

impl SimulatedClock {
    pub fn new(start_hour: f64) -> Self {
        Self {
            start_hour,
            elapsed_s: 0.0,
        }
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }
}

impl Clock for SimulatedClock {
    fn hour_of_day(&self) -> f64 {
        (self.start_hour + self.elapsed_s / 3600.0).rem_euclid(24.0)
    }

    fn advance(&mut self, dt: f64) {
        self.elapsed_s += dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_clock_wraps_the_day() {
        let mut clock = SimulatedClock::new(23.0);
        assert_eq!(clock.hour_of_day(), 23.0);
        clock.advance(1800.0);
        assert!((clock.hour_of_day() - 23.5).abs() < 1e-12);
        clock.advance(3600.0);
        assert!((clock.hour_of_day() - 0.5).abs() < 1e-12);
        assert_eq!(clock.elapsed_s(), 5400.0);
    }

    #[test]
    fn system_clock_in_range() {
        let h = SystemClock.hour_of_day();
        assert!((0.0..24.0).contains(&h));
    }
}
