//! Actuator dynamics for control systems.
//!
//! Actuators sit between a controller's target and the physical response:
//! - [`RateLimiter`]: moves toward the command by at most `max_rate * dt`
//!   per step and stays within position limits (burner ramp time)
//! - [`FirstOrderLag`]: exponential smoothing toward a target with a fixed
//!   per-step factor (thermal lag of the return water)

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Rate-limited actuator with position clamping.
///
/// # Example
///
/// ```
/// use hl_controls::RateLimiter;
///
/// let burner = RateLimiter::new(2.0, 0.0, 100.0).unwrap();
/// let mut modulation = 0.0;
/// for _ in 0..10 {
///     modulation = burner.step(modulation, 45.0, 1.0);
/// }
/// assert_eq!(modulation, 20.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateLimiter {
    /// Maximum rate of change (units per second), must be positive
    pub max_rate: f64,
    /// Lower position limit
    pub min: f64,
    /// Upper position limit
    pub max: f64,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// # Errors
    ///
    /// Returns error if `max_rate` is not positive or the limits are inverted.
    pub fn new(max_rate: f64, min: f64, max: f64) -> ControlResult<Self> {
        if !(max_rate > 0.0) || !max_rate.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "max_rate must be positive",
            });
        }
        if !(min < max) {
            return Err(ControlError::InvalidArg {
                what: "min must be less than max",
            });
        }
        Ok(Self { max_rate, min, max })
    }

    /// Largest allowed change over a step of `dt` seconds.
    pub fn max_step(&self, dt: f64) -> f64 {
        (self.max_rate * dt).max(0.0)
    }

    /// Advance the position toward `command` over `dt` seconds.
    ///
    /// The command is clamped into the position limits first, so the result
    /// never overshoots and always lies within `[min, max]`.
    pub fn step(&self, position: f64, command: f64, dt: f64) -> f64 {
        let command = if command.is_nan() {
            position
        } else {
            command.clamp(self.min, self.max)
        };
        let max_step = self.max_step(dt);
        let delta = (command - position).clamp(-max_step, max_step);
        (position + delta).clamp(self.min, self.max)
    }
}

/// Discrete first-order lag: `y += (target - y) * alpha` each step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FirstOrderLag {
    /// Smoothing factor in (0, 1]; 1 tracks the target instantly.
    pub alpha: f64,
}

impl FirstOrderLag {
    pub fn new(alpha: f64) -> ControlResult<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ControlError::InvalidArg {
                what: "alpha must be in (0, 1]",
            });
        }
        Ok(Self { alpha })
    }

    pub fn step(&self, current: f64, target: f64) -> f64 {
        current + (target - current) * self.alpha
    }

    /// Step over `dt` seconds, treating `alpha` as the factor for one second.
    ///
    /// `dt = 1` is exactly [`FirstOrderLag::step`]; other periods compound the
    /// factor so the time constant does not depend on the tick rate.
    pub fn step_over(&self, current: f64, target: f64, dt: f64) -> f64 {
        let alpha = 1.0 - (1.0 - self.alpha).powf(dt.max(0.0));
        current + (target - current) * alpha
    }
}
