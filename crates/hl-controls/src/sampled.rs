//! Sampled execution primitives.
//!
//! Loops tick at a fixed period, but some work only happens every N seconds
//! of loop time (status reporting). A [`SampleClock`] tracks when that work is
//! due, driven by the loop's own time rather than the wall clock.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Sample configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub dt: f64,
}

impl SampleConfig {
    /// Create a new sample configuration.
    ///
    /// # Errors
    ///
    /// Returns error if `dt` is not positive.
    pub fn new(dt: f64) -> ControlResult<Self> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self { dt })
    }
}

/// Sample clock tracks when periodic work should execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    /// Sample configuration.
    pub config: SampleConfig,
    /// Time of next scheduled sample.
    pub next_sample_time: f64,
}

impl SampleClock {
    /// Create a new sample clock; the first sample is due one period after
    /// `initial_time`.
    pub fn new(config: SampleConfig, initial_time: f64) -> Self {
        Self {
            config,
            next_sample_time: initial_time + config.dt,
        }
    }

    /// Returns `true` if `current_time >= next_sample_time`.
    pub fn should_sample(&self, current_time: f64) -> bool {
        current_time >= self.next_sample_time
    }

    /// Advance to the next sample time.
    ///
    /// Should be called after a sample has been executed.
    pub fn advance(&mut self) {
        self.next_sample_time += self.config.dt;
    }

    /// Check and advance in one call. Missed samples are skipped, not replayed.
    pub fn poll(&mut self, current_time: f64) -> bool {
        if !self.should_sample(current_time) {
            return false;
        }
        while self.should_sample(current_time) {
            self.advance();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_creation() {
        let config = SampleConfig::new(0.1).unwrap();
        assert_eq!(config.dt, 0.1);
        assert!(SampleConfig::new(0.0).is_err());
        assert!(SampleConfig::new(f64::INFINITY).is_err());
    }

    #[test]
    fn sample_clock_basic() {
        let config = SampleConfig::new(10.0).unwrap();
        let mut clock = SampleClock::new(config, 0.0);

        assert!(!clock.should_sample(0.0));
        assert!(clock.should_sample(10.0));

        clock.advance();
        assert!(!clock.should_sample(10.0));
        assert!(clock.should_sample(20.0));
    }

    #[test]
    fn poll_skips_missed_samples() {
        let config = SampleConfig::new(10.0).unwrap();
        let mut clock = SampleClock::new(config, 0.0);

        assert!(!clock.poll(5.0));
        assert!(clock.poll(35.0));
        assert_eq!(clock.next_sample_time, 40.0);
        assert!(!clock.poll(36.0));
    }
}
