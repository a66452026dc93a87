//! Deterministic diurnal outdoor temperature.
//!
//! The day is split into a warming leg from the coldest hour to the warmest
//! hour and a cooling leg back. Each leg is half a cosine, so the curve is
//! continuous, has its minimum exactly at `min_hour` and its maximum exactly
//! at `max_hour`, and repeats every 24 hours.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

const DAY_HOURS: f64 = 24.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiurnalWeather {
    /// Daily mean temperature (°C)
    pub mean: f64,
    /// Half the daily swing (°C)
    pub amplitude: f64,
    /// Hour of the daily minimum
    pub min_hour: f64,
    /// Hour of the daily maximum
    pub max_hour: f64,
}

impl Default for DiurnalWeather {
    fn default() -> Self {
        Self {
            mean: 10.0,
            amplitude: 5.0,
            min_hour: 6.0,
            max_hour: 14.0,
        }
    }
}

impl DiurnalWeather {
    pub fn validate(&self) -> SimResult<()> {
        if !self.mean.is_finite() || !self.amplitude.is_finite() || self.amplitude < 0.0 {
            return Err(SimError::InvalidParam {
                field: "weather",
                reason: "mean must be finite and amplitude non-negative",
            });
        }
        let warm = self.warming_hours();
        if !(warm > 0.0 && warm < DAY_HOURS) {
            return Err(SimError::InvalidParam {
                field: "weather.max_hour",
                reason: "minimum and maximum must be at different hours",
            });
        }
        Ok(())
    }

    fn warming_hours(&self) -> f64 {
        (self.max_hour - self.min_hour).rem_euclid(DAY_HOURS)
    }

    /// Outdoor temperature at `hour` (any real value, wrapped to the day).
    pub fn temperature_at(&self, hour: f64) -> f64 {
        let warm = self.warming_hours();
        let since_min = (hour - self.min_hour).rem_euclid(DAY_HOURS);
        if since_min < warm {
            self.mean - self.amplitude * (PI * since_min / warm).cos()
        } else {
            let since_max = since_min - warm;
            self.mean + self.amplitude * (PI * since_max / (DAY_HOURS - warm)).cos()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn extremes_at_configured_hours() {
        let w = DiurnalWeather::default();
        assert!((w.temperature_at(6.0) - 5.0).abs() < EPS);
        assert!((w.temperature_at(14.0) - 15.0).abs() < EPS);
        assert!((w.temperature_at(10.0) - 10.0).abs() < EPS);
        assert!((w.temperature_at(22.0) - 10.0).abs() < EPS);
    }

    #[test]
    fn wraps_around_midnight() {
        let w = DiurnalWeather::default();
        assert!((w.temperature_at(30.0) - w.temperature_at(6.0)).abs() < EPS);
        assert!((w.temperature_at(-2.0) - w.temperature_at(22.0)).abs() < EPS);
        // Continuous at the wrap.
        assert!((w.temperature_at(23.999) - w.temperature_at(0.0)).abs() < 1e-2);
    }

    #[test]
    fn stays_within_amplitude() {
        let w = DiurnalWeather::default();
        for i in 0..=480 {
            let t = w.temperature_at(i as f64 * 0.05);
            assert!((5.0 - EPS..=15.0 + EPS).contains(&t));
        }
    }

    #[test]
    fn warms_in_the_morning_and_cools_at_night() {
        let w = DiurnalWeather::default();
        assert!(w.temperature_at(8.0) < w.temperature_at(12.0));
        assert!(w.temperature_at(18.0) > w.temperature_at(2.0));
    }

    #[test]
    fn rejects_coincident_extremes() {
        let w = DiurnalWeather {
            max_hour: 30.0,
            ..DiurnalWeather::default()
        };
        assert!(w.validate().is_err());
        assert!(DiurnalWeather::default().validate().is_ok());
    }
}
